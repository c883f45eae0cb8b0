//! Obstacle Worldtest
//!
//! A wall too tall to jump stands between a melee mob and its target.
//! Focus areas:
//! - The mob leaves straight chase for a waypoint or a detour
//! - Waypoints expire instead of pinning the mob forever
//! - The mob moves sideways instead of pressing into the wall

use glam::{DVec3, IVec3};
use std::f64::consts::FRAC_PI_2;
use voxmob_world::ai::navigation::{STUCK_TICKS, WAYPOINT_TTL};
use voxmob_world::ai::Mode;
use voxmob_world::blocks::BLOCK_STONE;
use voxmob_world::{MobKind, MobProfile, SimEvent, SimTime, Simulation, VoxelWorld, WorldQuery};

const WORLD_SEED: u64 = 4_242;

fn walled_sim() -> (Simulation, voxmob_core::EntityId) {
    let mut world = VoxelWorld::flat(2, 63, SimTime::default());
    world.fill(IVec3::new(4, 64, -2), IVec3::new(4, 66, 2), BLOCK_STONE);
    let mut sim = Simulation::new(world, WORLD_SEED);
    sim.set_profile(
        MobKind::Zombie,
        MobProfile {
            acquisition_radius: 24.0,
            ..MobKind::Zombie.default_profile()
        },
    );
    sim.spawn_player(DVec3::new(10.5, 64.0, 0.5));
    let zombie = sim.spawn_mob(MobKind::Zombie, DVec3::new(0.5, 64.0, 0.5), -FRAC_PI_2);
    (sim, zombie)
}

#[test]
fn obstacle_worldtest() {
    println!("\n=== Obstacle Worldtest ===");
    let (mut sim, zombie) = walled_sim();
    let eye = sim.entities().mob(zombie).expect("zombie").eye_position();
    assert!(!sim
        .world()
        .line_of_sight(eye, DVec3::new(10.5, 64.9, 0.5)));

    let mut rerouted_at = None;
    for _ in 0..STUCK_TICKS + 5 {
        sim.step();
        let rerouted = sim.events().iter().any(|e| match e.event {
            SimEvent::WaypointSet { mob, .. } | SimEvent::DetourStarted { mob, .. } => mob == zombie,
            _ => false,
        });
        if rerouted {
            rerouted_at = Some(sim.tick());
            break;
        }
    }
    let tick = rerouted_at.expect("mob kept charging the wall");
    println!("  Rerouted at tick {}", tick.0);

    let mode = sim.controller(zombie).expect("controller").state.mode;
    assert!(
        matches!(mode, Mode::FollowWaypoint | Mode::Detour),
        "unexpected mode {mode:?}"
    );

    let mut max_offset: f64 = 0.0;
    for _ in 0..120 {
        sim.step();
        let mob = sim.entities().mob(zombie).expect("zombie");
        max_offset = max_offset.max((mob.body.position().z - 0.5).abs());
        assert!(!sim.world().aabb_collides_blocks(mob.body.bb()));
        if let Some(waypoint) = sim.controller(zombie).expect("controller").state.waypoint {
            assert!(waypoint.ttl <= WAYPOINT_TTL);
        }
    }
    println!("  Max lateral offset {max_offset:.2}");
    assert!(max_offset > 1.0, "mob never stepped around the wall");
}

#[test]
fn straight_chase_never_persists_while_blocked() {
    let (mut sim, zombie) = walled_sim();
    let mut chase_streak = 0;
    let mut longest = 0;
    for _ in 0..200 {
        sim.step();
        let mob = sim.entities().mob(zombie).expect("zombie");
        let blocked = mob.body.position().x < 3.5
            && !sim
                .world()
                .line_of_sight(mob.eye_position(), DVec3::new(10.5, 64.9, 0.5));
        let mode = sim.controller(zombie).expect("controller").state.mode;
        if blocked && mode == Mode::Chase {
            chase_streak += 1;
            longest = longest.max(chase_streak);
        } else {
            chase_streak = 0;
        }
    }
    assert!(
        longest <= STUCK_TICKS + 10,
        "blind straight chase ran {longest} ticks"
    );
}
