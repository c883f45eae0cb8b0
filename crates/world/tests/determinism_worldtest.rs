//! Determinism Worldtest
//!
//! A mixed arena (melee, ranged, passive and teleporting mobs around two
//! players, with a wall and a pool) is replayed from the same seed and every
//! per-tick snapshot must match byte for byte.

use glam::{DVec3, IVec3};
use serde::Serialize;
use voxmob_testkit::{assert_deterministic_replay, MicroWorldtestConfig};
use voxmob_world::blocks::{BLOCK_STONE, BLOCK_WATER};
use voxmob_world::{Entity, MobKind, SimTime, Simulation, VoxelWorld, TICKS_PER_DAY};

const WORLD_SEED: u64 = 11_223_344_556_677;
const TICKS: u64 = 400;

#[derive(Debug, Serialize)]
struct MobSnap {
    id: u64,
    kind: MobKind,
    position: [f64; 3],
    yaw: f64,
    health: i32,
    target: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ArenaSnap {
    mobs: Vec<MobSnap>,
    entities: usize,
    events: usize,
    world_revision: u64,
}

fn arena() -> Simulation {
    // late afternoon, so the sun sets partway through the run
    let time = SimTime::starting_at(TICKS_PER_DAY, 0.74);
    let mut world = VoxelWorld::flat(2, 63, time);
    world.fill(IVec3::new(6, 64, -4), IVec3::new(6, 66, 4), BLOCK_STONE);
    world.fill(IVec3::new(-8, 61, -8), IVec3::new(-5, 63, -5), BLOCK_WATER);

    let mut sim = Simulation::new(world, WORLD_SEED);
    let near = sim.spawn_player(DVec3::new(12.5, 64.0, 0.5));
    sim.place_player(near, DVec3::new(12.5, 64.0, 0.5), std::f64::consts::FRAC_PI_2, 0.0);
    sim.spawn_player(DVec3::new(-14.5, 64.0, 10.5));

    sim.spawn_mob(MobKind::Zombie, DVec3::new(0.5, 64.0, 0.5), 0.0);
    sim.spawn_mob(MobKind::Zombie, DVec3::new(0.5, 64.0, -3.5), 1.0);
    sim.spawn_mob(MobKind::Skeleton, DVec3::new(-3.5, 64.0, 6.5), 2.0);
    sim.spawn_mob(MobKind::Pig, DVec3::new(3.5, 64.0, 8.5), 0.5);
    sim.spawn_mob(MobKind::Enderman, DVec3::new(-6.5, 61.0, -6.5), 0.0);
    sim.spawn_mob(MobKind::Enderman, DVec3::new(16.5, 64.0, -6.5), 3.0);
    sim
}

fn snapshot(sim: &Simulation) -> ArenaSnap {
    let mobs = sim
        .entities()
        .iter()
        .filter_map(|entity| match entity {
            Entity::Mob(mob) => Some(MobSnap {
                id: mob.id.0,
                kind: mob.kind,
                position: mob.body.position().to_array(),
                yaw: mob.body.yaw,
                health: mob.health,
                target: mob.agent.target.map(|id| id.0),
            }),
            _ => None,
        })
        .collect();
    ArenaSnap {
        mobs,
        entities: sim.entities().len(),
        events: sim.events().len(),
        world_revision: sim.world().revision(),
    }
}

#[test]
fn determinism_worldtest() {
    println!("\n=== Determinism Worldtest ===");
    let report = assert_deterministic_replay(
        MicroWorldtestConfig {
            name: "mixed_arena".to_string(),
            ticks: TICKS,
        },
        arena,
        |_, sim| sim.step(),
        |_, sim| snapshot(sim),
    )
    .expect("replays must match");
    println!("  Report: {} bytes", report.len());
}

#[test]
fn different_seeds_diverge() {
    let mut a = arena();
    let mut b = Simulation::new(a.world().clone(), WORLD_SEED + 1);
    for entity in a.entities().iter() {
        match entity {
            Entity::Player(player) => {
                b.spawn_player(player.body.position());
            }
            Entity::Mob(mob) => {
                b.spawn_mob(mob.kind, mob.body.position(), mob.body.yaw);
            }
            _ => {}
        }
    }
    a.run(TICKS);
    b.run(TICKS);
    let (sa, sb) = (snapshot(&a), snapshot(&b));
    let positions = |s: &ArenaSnap| s.mobs.iter().map(|m| m.position).collect::<Vec<_>>();
    assert_ne!(positions(&sa), positions(&sb));
}
