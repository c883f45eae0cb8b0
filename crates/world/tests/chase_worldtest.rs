//! Chase Worldtest
//!
//! A melee mob on open ground closes a 20 block gap to a standing player.
//! Focus areas:
//! - Target acquisition on the first tick
//! - Monotonic progress along the chase axis
//! - The first swing lands on the first tick in reach
//! - Dead targets are dropped before any further swing

use glam::DVec3;
use std::f64::consts::FRAC_PI_2;
use voxmob_world::{
    MobKind, MobProfile, SimEvent, SimTime, Simulation, VoxelWorld,
};

const WORLD_SEED: u64 = 20_250_101;
const MAX_TICKS: u64 = 300;

fn chase_sim() -> (Simulation, voxmob_core::EntityId, voxmob_core::EntityId) {
    let world = VoxelWorld::flat(2, 63, SimTime::default());
    let mut sim = Simulation::new(world, WORLD_SEED);
    sim.set_profile(
        MobKind::Zombie,
        MobProfile {
            run_speed: 0.7,
            acquisition_radius: 24.0,
            ..MobKind::Zombie.default_profile()
        },
    );
    let player = sim.spawn_player(DVec3::new(20.5, 64.0, 0.5));
    let zombie = sim.spawn_mob(MobKind::Zombie, DVec3::new(0.5, 64.0, 0.5), -FRAC_PI_2);
    (sim, zombie, player)
}

#[test]
fn chase_worldtest() {
    println!("\n=== Chase Worldtest ===");
    let (mut sim, zombie, player) = chase_sim();
    let reach = sim.profile(MobKind::Zombie).attack_reach;

    let mut last_x = sim.entities().mob(zombie).expect("zombie").body.position().x;
    let mut first_attack = None;
    for _ in 0..MAX_TICKS {
        let before = sim.entities().mob(zombie).expect("zombie").body.position();
        let target_feet = sim.entities().body(player).expect("player").position();
        let events_before = sim.events().len();
        sim.step();

        let attacked = sim.events()[events_before..].iter().any(|e| {
            matches!(e.event, SimEvent::Attack { attacker, victim, .. } if attacker == zombie && victim == player)
        });
        if attacked {
            assert!(
                before.distance(target_feet) < reach,
                "swing from {:.2} blocks away",
                before.distance(target_feet)
            );
            first_attack = Some(sim.tick());
            break;
        }

        let x = sim.entities().mob(zombie).expect("zombie").body.position().x;
        assert!(
            x > last_x,
            "x stalled at tick {}: {x} <= {last_x}",
            sim.tick().0
        );
        // the swing must come on the first tick in reach
        assert!(before.distance(target_feet) >= reach);
        last_x = x;
    }

    let tick = first_attack.expect("zombie never reached the player");
    println!("  First swing at tick {}", tick.0);
    assert!(sim.events().iter().any(|e| {
        e.tick.0 == 1
            && e.event
                == SimEvent::TargetAcquired {
                    mob: zombie,
                    target: player,
                }
    }));
    assert!(sim.entities().player(player).expect("player").health < 20);
}

#[test]
fn dead_target_is_dropped_before_the_next_swing() {
    let (mut sim, zombie, player) = chase_sim();
    for _ in 0..10 {
        sim.step();
    }
    assert_eq!(
        sim.entities().mob(zombie).expect("zombie").agent.target,
        Some(player)
    );

    sim.entities_mut().player_mut(player).expect("player").health = 0;
    let events_before = sim.events().len();
    sim.step();

    let mob = sim.entities().mob(zombie).expect("zombie");
    assert_eq!(mob.agent.target, None);
    let fresh = &sim.events()[events_before..];
    assert!(fresh.iter().any(|e| e.event
        == SimEvent::TargetLost {
            mob: zombie,
            target: player
        }));
    assert!(!fresh
        .iter()
        .any(|e| matches!(e.event, SimEvent::Attack { .. })));
}

#[test]
fn targets_always_resolve_to_living_entities() {
    let (mut sim, zombie, player) = chase_sim();
    for tick in 0..MAX_TICKS {
        if tick == 30 {
            sim.entities_mut().player_mut(player).expect("player").removed = true;
        }
        sim.step();
        let mob = sim.entities().mob(zombie).expect("zombie");
        if let Some(target) = mob.agent.target {
            assert!(
                voxmob_world::DamageSink::is_alive(sim.entities(), target),
                "tick {tick}: dangling target"
            );
        }
    }
}
