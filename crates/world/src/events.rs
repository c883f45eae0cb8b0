//! Observable simulation events, streamed to logs and asserted on by tests.

use crate::agent::Hazard;
use crate::blocks::BlockId;
use glam::{DVec3, IVec3};
use serde::Serialize;
use voxmob_core::{EntityId, SimTick};

/// Why a mob relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeleportReason {
    Submersion,
    Sunlight,
    Dodge,
    Idle,
    Approach,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    TargetAcquired {
        mob: EntityId,
        target: EntityId,
    },
    TargetLost {
        mob: EntityId,
        target: EntityId,
    },
    Attack {
        attacker: EntityId,
        victim: EntityId,
        damage: i32,
    },
    ProjectileFired {
        shooter: EntityId,
        projectile: EntityId,
    },
    ProjectileHit {
        projectile: EntityId,
        victim: Option<EntityId>,
        cell: Option<IVec3>,
    },
    Teleported {
        mob: EntityId,
        from: DVec3,
        to: DVec3,
        reason: TeleportReason,
    },
    WaypointSet {
        mob: EntityId,
        cell: IVec3,
    },
    DetourStarted {
        mob: EntityId,
        side: i8,
    },
    RoutePlanned {
        mob: EntityId,
        goal: IVec3,
        length: usize,
    },
    HazardDamage {
        mob: EntityId,
        hazard: Hazard,
        health: i32,
    },
    BlockTaken {
        mob: EntityId,
        cell: IVec3,
        block: BlockId,
    },
    BlockPlaced {
        mob: EntityId,
        cell: IVec3,
        block: BlockId,
    },
    Despawned {
        mob: EntityId,
    },
    Died {
        id: EntityId,
    },
    TickSkipped {
        id: EntityId,
        reason: String,
    },
}

/// Event stamped with the tick it happened on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub tick: SimTick,
    #[serde(flatten)]
    pub event: SimEvent,
}

impl TimedEvent {
    /// Short label used as the JSONL record kind.
    pub fn label(&self) -> &'static str {
        match self.event {
            SimEvent::TargetAcquired { .. } => "target_acquired",
            SimEvent::TargetLost { .. } => "target_lost",
            SimEvent::Attack { .. } => "attack",
            SimEvent::ProjectileFired { .. } => "projectile_fired",
            SimEvent::ProjectileHit { .. } => "projectile_hit",
            SimEvent::Teleported { .. } => "teleported",
            SimEvent::WaypointSet { .. } => "waypoint_set",
            SimEvent::DetourStarted { .. } => "detour_started",
            SimEvent::RoutePlanned { .. } => "route_planned",
            SimEvent::HazardDamage { .. } => "hazard_damage",
            SimEvent::BlockTaken { .. } => "block_taken",
            SimEvent::BlockPlaced { .. } => "block_placed",
            SimEvent::Despawned { .. } => "despawned",
            SimEvent::Died { .. } => "died",
            SimEvent::TickSkipped { .. } => "tick_skipped",
        }
    }
}
