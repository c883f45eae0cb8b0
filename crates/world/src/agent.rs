//! Per-mob state shared between controllers and the movement integrator.

use crate::blocks::BlockId;
use crate::entity::Body;
use crate::profile::{MobKind, MobProfile};
use serde::{Deserialize, Serialize};
use voxmob_core::EntityId;

/// Ticks a dead mob lingers before it is reaped.
pub const DEATH_TICKS: u32 = 20;

/// Movement intent written by a controller and consumed by the integrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Steering {
    /// Input along the heading.
    pub forward: f64,
    /// Input perpendicular to the heading, positive to the left.
    pub strafe: f64,
    /// Yaw change (radians) applied before acceleration.
    pub turn_delta: f64,
    /// Pitch change (radians).
    pub pitch_delta: f64,
    pub jump: bool,
}

impl Steering {
    pub fn halt(&mut self) {
        *self = Steering::default();
    }
}

/// Tick-counted timers. Every field counts down toward zero unless noted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cooldowns {
    pub attack_delay: u32,
    pub teleport: u32,
    /// Counts up while stuck in liquid with nowhere to go.
    pub submersion_damage: u32,
    /// Counts up while exposed to the sun.
    pub sunlight_damage: u32,
    /// One-tick aggression pause after a committed teleport.
    pub calm: u32,
    /// Running/panic time left.
    pub running: u32,
}

impl Cooldowns {
    pub fn tick(&mut self) {
        self.attack_delay = self.attack_delay.saturating_sub(1);
        self.teleport = self.teleport.saturating_sub(1);
        self.calm = self.calm.saturating_sub(1);
        self.running = self.running.saturating_sub(1);
    }
}

/// Environmental damage causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Submersion,
    Sunlight,
}

/// Who or what dealt damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    /// Direct hit; `species` is `None` for players.
    Entity {
        attacker: EntityId,
        species: Option<MobKind>,
    },
    Projectile {
        projectile: EntityId,
        owner: Option<EntityId>,
    },
    Hazard(Hazard),
}

impl DamageSource {
    /// Entity responsible for the damage, if any.
    pub fn culprit(&self) -> Option<EntityId> {
        match *self {
            DamageSource::Entity { attacker, .. } => Some(attacker),
            DamageSource::Projectile { owner, .. } => owner,
            DamageSource::Hazard(_) => None,
        }
    }
}

/// Behavioural fields the controller reads and writes every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Non-owning handle; re-validated every tick.
    pub target: Option<EntityId>,
    pub steering: Steering,
    pub cooldowns: Cooldowns,
    /// Ticks since a player was last nearby.
    pub wander_time: u32,
    /// Last damage taken, applied by the owning controller on its next tick.
    pub pending_hurt: Option<DamageSource>,
    pub persistent: bool,
    pub death_ticks: u32,
    pub carried: Option<BlockId>,
}

/// A simulated creature.
#[derive(Debug, Clone)]
pub struct Mob {
    pub id: EntityId,
    pub kind: MobKind,
    pub body: Body,
    pub health: i32,
    pub max_health: i32,
    pub eye_height: f64,
    pub agent: AgentState,
    pub removed: bool,
}

impl Mob {
    pub fn new(id: EntityId, kind: MobKind, body: Body, profile: &MobProfile) -> Self {
        Self {
            id,
            kind,
            body,
            health: profile.max_health,
            max_health: profile.max_health,
            eye_height: profile.eye_height,
            agent: AgentState {
                persistent: profile.persistent,
                ..AgentState::default()
            },
            removed: false,
        }
    }

    pub fn eye_position(&self) -> glam::DVec3 {
        self.body.eye_position(self.eye_height)
    }

    pub fn is_dying(&self) -> bool {
        self.health <= 0
    }

    /// Self-inflicted or environmental damage, returning the health left.
    pub fn hurt(&mut self, amount: i32) -> i32 {
        self.health -= amount;
        self.health
    }
}
