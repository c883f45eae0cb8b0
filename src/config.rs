//! Scenario files for the headless runner.

use anyhow::{Context, Result};
use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;
use voxmob_world::blocks::{block_from_name, BLOCK_STONE, BLOCK_WATER};
use voxmob_world::{MobKind, MobProfile, SimTime, Simulation, VoxelWorld, TICKS_PER_DAY};

pub const DEFAULT_SCENARIO_PATH: &str = "config/scenario.toml";

/// Flat ground the scenario is built on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub chunk_radius: i32,
    pub surface_y: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_radius: 2,
            surface_y: 63,
        }
    }
}

/// Inclusive box of cells overwritten with one block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockFill {
    pub min: [i32; 3],
    pub max: [i32; 3],
    #[serde(default)]
    pub block: Option<String>,
}

impl BlockFill {
    fn block_id(&self, fallback: u16) -> Result<u16> {
        match &self.block {
            Some(name) => block_from_name(name)
                .with_context(|| format!("Unknown block name '{name}'")),
            None => Ok(fallback),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpawn {
    pub position: [f64; 3],
    /// Degrees.
    #[serde(default)]
    pub yaw: f64,
    /// Degrees, positive looks down.
    #[serde(default)]
    pub pitch: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobSpawn {
    pub kind: MobKind,
    pub position: [f64; 3],
    /// Degrees.
    #[serde(default)]
    pub yaw: f64,
}

/// Everything needed to build and run one simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub seed: u64,
    pub ticks: u64,
    pub ticks_per_day: u64,
    /// 0.0 is midnight, 0.5 is noon.
    pub time_of_day: f64,
    pub terrain: TerrainConfig,
    /// Solid fills; stone unless a block is named.
    pub walls: Vec<BlockFill>,
    /// Liquid fills; water unless a block is named.
    pub pools: Vec<BlockFill>,
    pub players: Vec<PlayerSpawn>,
    pub mobs: Vec<MobSpawn>,
    /// Partial profile tables merged over the built-in tuning, keyed by mob kind.
    pub profiles: BTreeMap<String, toml::Table>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            seed: 0,
            ticks: 200,
            ticks_per_day: TICKS_PER_DAY,
            time_of_day: 0.0,
            terrain: TerrainConfig::default(),
            walls: Vec::new(),
            pools: Vec::new(),
            players: vec![PlayerSpawn {
                position: [8.5, 64.0, 0.5],
                yaw: 90.0,
                pitch: 0.0,
            }],
            mobs: vec![MobSpawn {
                kind: MobKind::Zombie,
                position: [0.5, 64.0, 0.5],
                yaw: 0.0,
            }],
            profiles: BTreeMap::new(),
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ScenarioConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ScenarioConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_SCENARIO_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Scenario not found at {}. Using defaults", path.display());
                }
                ScenarioConfig::default()
            }
        }
    }

    /// Built-in profiles with this scenario's overrides applied. Overrides
    /// naming an unknown kind, or producing an invalid profile, are skipped.
    pub fn resolved_profiles(&self) -> Vec<(MobKind, MobProfile)> {
        let mut resolved = Vec::new();
        for (name, overrides) in &self.profiles {
            let Some(kind) = MobKind::parse(name) else {
                warn!(kind = %name, "Ignoring profile override for unknown mob kind");
                continue;
            };
            match merge_profile(kind.default_profile(), overrides) {
                Ok(profile) => resolved.push((kind, profile)),
                Err(err) => warn!(%kind, "Ignoring invalid profile override: {err:#}"),
            }
        }
        resolved
    }

    /// Build the world and populate it.
    pub fn build(&self) -> Result<Simulation> {
        let time = SimTime::starting_at(self.ticks_per_day, self.time_of_day);
        let mut world = VoxelWorld::flat(self.terrain.chunk_radius, self.terrain.surface_y, time);
        for fill in &self.walls {
            let id = fill.block_id(BLOCK_STONE)?;
            world.fill(IVec3::from_array(fill.min), IVec3::from_array(fill.max), id);
        }
        for fill in &self.pools {
            let id = fill.block_id(BLOCK_WATER)?;
            world.fill(IVec3::from_array(fill.min), IVec3::from_array(fill.max), id);
        }

        let mut sim = Simulation::new(world, self.seed);
        for (kind, profile) in self.resolved_profiles() {
            sim.set_profile(kind, profile);
        }
        for player in &self.players {
            let position = DVec3::from_array(player.position);
            let id = sim.spawn_player(position);
            sim.place_player(
                id,
                position,
                player.yaw.to_radians(),
                player.pitch.to_radians(),
            );
        }
        for mob in &self.mobs {
            sim.spawn_mob(mob.kind, DVec3::from_array(mob.position), mob.yaw.to_radians());
        }
        Ok(sim)
    }
}

fn merge_profile(base: MobProfile, overrides: &toml::Table) -> Result<MobProfile> {
    let mut value = toml::Value::try_from(base).context("Failed to encode base profile")?;
    if let toml::Value::Table(table) = &mut value {
        merge_tables(table, overrides);
    }
    value.try_into().context("Failed to decode merged profile")
}

fn merge_tables(into: &mut toml::Table, from: &toml::Table) {
    for (key, value) in from {
        match (into.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            _ => {
                into.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxmob_world::{AttackKind, WorldQuery};

    #[test]
    fn partial_scenario_keeps_defaults() {
        let cfg: ScenarioConfig = toml::from_str(
            r#"
            seed = 7
            [terrain]
            surface_y = 40
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.terrain.surface_y, 40);
        assert_eq!(cfg.terrain.chunk_radius, 2);
        assert_eq!(cfg.ticks, 200);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ScenarioConfig::load_from_path(Path::new("/nonexistent/voxmob/scenario.toml"));
        assert_eq!(cfg.name, "default");
        assert_eq!(cfg.mobs.len(), 1);
    }

    #[test]
    fn profile_overrides_merge_nested_tables() {
        let cfg: ScenarioConfig = toml::from_str(
            r#"
            [profiles.skeleton]
            run_speed = 0.3
            [profiles.skeleton.ranged]
            range = 14.0
            [profiles.creeper]
            run_speed = 1.0
            "#,
        )
        .expect("parse");
        let resolved = cfg.resolved_profiles();
        assert_eq!(resolved.len(), 1);
        let (kind, profile) = &resolved[0];
        assert_eq!(*kind, MobKind::Skeleton);
        assert_eq!(profile.run_speed, 0.3);
        assert_eq!(profile.ranged.range, 14.0);
        assert_eq!(profile.ranged.cooldown, 60);
        assert_eq!(profile.attack, AttackKind::Ranged);
    }

    #[test]
    fn invalid_override_is_skipped() {
        let cfg: ScenarioConfig = toml::from_str(
            r#"
            [profiles.zombie]
            attack = "laser"
            "#,
        )
        .expect("parse");
        assert!(cfg.resolved_profiles().is_empty());
    }

    #[test]
    fn build_places_walls_pools_and_entities() {
        let cfg: ScenarioConfig = toml::from_str(
            r#"
            [[walls]]
            min = [3, 64, -2]
            max = [3, 65, 2]
            [[pools]]
            min = [-4, 63, -4]
            max = [-3, 63, -3]
            [[players]]
            position = [8.5, 64.0, 0.5]
            [[mobs]]
            kind = "pig"
            position = [0.5, 64.0, 0.5]
            "#,
        )
        .expect("parse");
        let sim = cfg.build().expect("build");
        assert!(sim.world().is_solid(IVec3::new(3, 65, 0)));
        assert!(sim.world().liquid_at(IVec3::new(-4, 63, -4)).is_liquid());
        assert_eq!(sim.entities().len(), 2);
        assert_eq!(sim.entities().players().count(), 1);
    }

    #[test]
    fn unknown_block_name_fails_build() {
        let cfg: ScenarioConfig = toml::from_str(
            r#"
            [[walls]]
            min = [0, 64, 0]
            max = [0, 64, 0]
            block = "obsidian"
            "#,
        )
        .expect("parse");
        assert!(cfg.build().is_err());
    }
}
