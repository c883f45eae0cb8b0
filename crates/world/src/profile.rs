//! Per-kind mob tuning and the strategy selection that replaces subclassing.
//!
//! A [`MobProfile`] names which targeting, navigation, attack and hazard
//! strategies a controller is assembled from, plus the numbers they use.
//! Profiles deserialize from TOML with every field optional.

use crate::projectile::ProjectileKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mob species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobKind {
    Pig,
    Zombie,
    Skeleton,
    Enderman,
}

impl MobKind {
    pub const ALL: [MobKind; 4] = [
        MobKind::Pig,
        MobKind::Zombie,
        MobKind::Skeleton,
        MobKind::Enderman,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MobKind::Pig => "pig",
            MobKind::Zombie => "zombie",
            MobKind::Skeleton => "skeleton",
            MobKind::Enderman => "enderman",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Built-in tuning for this species.
    pub fn default_profile(self) -> MobProfile {
        let base = MobProfile::default();
        match self {
            MobKind::Pig => MobProfile {
                width: 0.9,
                height: 0.9,
                eye_height: 0.8,
                max_health: 10,
                run_speed: 0.5,
                base_damage: 0,
                retaliates: false,
                targeting: TargetingKind::None,
                navigation: NavigationKind::Direct,
                attack: AttackKind::None,
                hazards: Vec::new(),
                ..base
            },
            MobKind::Zombie => MobProfile {
                hazards: vec![HazardKind::Sunlight],
                ..base
            },
            MobKind::Skeleton => MobProfile {
                height: 1.99,
                eye_height: 1.74,
                base_damage: 2,
                attack: AttackKind::Ranged,
                hazards: vec![HazardKind::Sunlight],
                ..base
            },
            MobKind::Enderman => MobProfile {
                height: 2.9,
                eye_height: 2.55,
                max_health: 40,
                run_speed: 0.7,
                base_damage: 7,
                acquisition_radius: 64.0,
                targeting: TargetingKind::Gaze,
                navigation: NavigationKind::HazardAware,
                attack: AttackKind::CapsuleMelee,
                hazards: vec![
                    HazardKind::Submersion,
                    HazardKind::Sunlight,
                    HazardKind::ProjectileDodge,
                ],
                teleports: true,
                carries_blocks: true,
                ..base
            },
        }
    }
}

impl fmt::Display for MobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a mob picks its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingKind {
    /// Never targets; panics when hurt.
    None,
    /// Binds the nearest player inside the acquisition radius.
    NearestPlayer,
    /// Only turns hostile when a player stares at it.
    Gaze,
}

/// How a mob closes distance to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    /// Straight-line pursuit.
    Direct,
    /// Straight pursuit with stuck detection, local grid search and detours.
    LocalRouting,
    /// Liquid-avoiding A* routes with teleport fallback.
    HazardAware,
}

/// How a mob damages its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    None,
    Melee,
    Ranged,
    /// Melee measured to the closest point of the target box.
    CapsuleMelee,
}

/// Environmental threats a mob reacts to, checked in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Submersion,
    Sunlight,
    ProjectileDodge,
}

/// Ranged attack tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedProfile {
    pub projectile: ProjectileKind,
    /// Maximum firing distance.
    pub range: f64,
    /// Ticks between shots.
    pub cooldown: u32,
    /// Launch speed in blocks per tick.
    pub speed: f64,
    /// Stop advancing when closer than this with a clear shot.
    pub hold_distance: f64,
}

impl Default for RangedProfile {
    fn default() -> Self {
        Self {
            projectile: ProjectileKind::Arrow,
            range: 10.0,
            cooldown: 60,
            speed: 1.6,
            hold_distance: 6.0,
        }
    }
}

/// Tuning and strategy selection for one mob kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobProfile {
    pub width: f64,
    pub height: f64,
    pub eye_height: f64,
    pub max_health: i32,
    /// Forward input while chasing; scaled by 1.4 when running.
    pub run_speed: f64,
    pub base_damage: i32,
    pub attack_reach: f64,
    pub acquisition_radius: f64,
    /// Exempt from the despawn watchdog.
    pub persistent: bool,
    /// Hurt mobs turn on their attacker instead of panicking.
    pub retaliates: bool,
    pub targeting: TargetingKind,
    pub navigation: NavigationKind,
    pub attack: AttackKind,
    pub hazards: Vec<HazardKind>,
    pub ranged: RangedProfile,
    /// Hazard responses may relocate the mob.
    pub teleports: bool,
    /// Leave a decoy behind after dodging.
    pub spawns_decoys: bool,
    pub carries_blocks: bool,
}

impl Default for MobProfile {
    fn default() -> Self {
        Self {
            width: 0.6,
            height: 1.8,
            eye_height: 1.62,
            max_health: 20,
            run_speed: 0.5,
            base_damage: 4,
            attack_reach: 2.0,
            acquisition_radius: 16.0,
            persistent: false,
            retaliates: true,
            targeting: TargetingKind::NearestPlayer,
            navigation: NavigationKind::LocalRouting,
            attack: AttackKind::Melee,
            hazards: Vec::new(),
            ranged: RangedProfile::default(),
            teleports: false,
            spawns_decoys: false,
            carries_blocks: false,
        }
    }
}
