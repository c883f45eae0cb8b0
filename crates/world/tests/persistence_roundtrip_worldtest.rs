//! Persistence Round-Trip Worldtest
//!
//! Mobs saved mid-chase come back bit-exact into a fresh simulation, keep
//! their ids, and carry on from the restored state.

use glam::DVec3;
use std::time::{SystemTime, UNIX_EPOCH};
use voxmob_world::persist::{decode_agents, encode_agents, load_agents, save_agents};
use voxmob_world::{MobKind, SimTime, Simulation, VoxelWorld};

const WORLD_SEED: u64 = 314_159;

fn running_sim() -> Simulation {
    let world = VoxelWorld::flat(2, 63, SimTime::default());
    let mut sim = Simulation::new(world, WORLD_SEED);
    sim.spawn_player(DVec3::new(9.5, 64.0, 0.5));
    sim.spawn_mob(MobKind::Zombie, DVec3::new(0.5, 64.0, 0.5), 0.0);
    sim.spawn_mob(MobKind::Skeleton, DVec3::new(0.5, 64.0, 6.5), 0.0);
    sim.spawn_mob(MobKind::Pig, DVec3::new(-4.5, 64.0, -4.5), 0.0);
    sim.run(30);
    sim
}

#[test]
fn persistence_roundtrip_worldtest() {
    println!("\n=== Persistence Round-Trip Worldtest ===");
    let sim = running_sim();
    let records = sim.save_agents();
    assert_eq!(records.len(), 3);

    let bytes = encode_agents(&records).expect("encode");
    println!("  {} agents -> {} bytes", records.len(), bytes.len());
    let decoded = decode_agents(&bytes).expect("decode");
    assert_eq!(decoded, records);
    for (a, b) in decoded.iter().zip(&records) {
        assert_eq!(a.position.x.to_bits(), b.position.x.to_bits());
        assert_eq!(a.velocity.y.to_bits(), b.velocity.y.to_bits());
        assert_eq!(a.yaw.to_bits(), b.yaw.to_bits());
    }

    let mut restored = Simulation::new(VoxelWorld::flat(2, 63, SimTime::default()), WORLD_SEED);
    restored.spawn_player(DVec3::new(9.5, 64.0, 0.5));
    restored.restore_agents(&decoded);
    assert_eq!(restored.save_agents(), records);
    for record in &records {
        assert!(restored.controller(record.id).is_some());
    }

    restored.run(20);
    assert_eq!(restored.save_agents().len(), 3);
}

#[test]
fn agent_file_survives_disk() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir()
        .join(format!("voxmob-persist-{nanos}"))
        .join("agents.bin");
    let records = running_sim().save_agents();
    save_agents(&path, &records).expect("save");
    assert_eq!(load_agents(&path).expect("load"), records);
    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}
