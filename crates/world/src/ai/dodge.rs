//! Teleporting out of the path of incoming projectiles.

use super::teleport::{commit_teleport, placement_is_safe};
use super::{BehaviorState, HazardOutcome, HazardPhase, HazardResponse, TickContext};
use crate::agent::Mob;
use crate::entity::Entity;
use crate::events::TeleportReason;
use crate::profile::MobProfile;
use crate::query::{cell_floor_center, cell_of};
use crate::store::{SpawnRequest, SpawnSink};
use glam::DVec3;
use rand::Rng;
use std::f64::consts::FRAC_PI_4;
use tracing::trace;
use voxmob_physics::Aabb;

/// Projectiles are only considered inside the mob's box grown by this much.
pub const SCAN_RADIUS: f64 = 12.0;
/// How far ahead a projectile's straight-line flight is extrapolated.
pub const PREDICT_TICKS: f64 = 10.0;
/// Ring distances around the predicted impact point.
pub const RING_RADII: [f64; 3] = [2.0, 4.0, 6.0];
/// Evenly spaced headings per ring.
pub const RING_ANGLES: u32 = 8;
/// Vertical offsets tried at each ring point, in order.
pub const RING_HEIGHTS: [i32; 5] = [0, 1, -1, 2, -2];
/// Random spots sampled once every ring point failed.
pub const RANDOM_ATTEMPTS: usize = 5;
pub const RANDOM_RANGE: i32 = 8;
/// Lifetime of a decoy left behind after a dodge.
pub const DECOY_TTL: u32 = 40;

/// Predicted flight segment of a projectile about to hit the mob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threat {
    pub from: DVec3,
    pub to: DVec3,
    /// Half the projectile's hitbox, used to widen boxes tested against the path.
    pub margin: f64,
    pub impact: DVec3,
}

impl Threat {
    /// Whether a body box at `bb` would still be on the flight path.
    pub fn crosses(&self, bb: &Aabb) -> bool {
        bb.inflate(DVec3::splat(self.margin))
            .segment_entry(self.from, self.to)
            .is_some()
    }
}

/// Earliest-hitting projectile heading for `mob` that it did not fire itself.
pub fn incoming_threat(ctx: &TickContext<'_>, mob: &Mob) -> Option<Threat> {
    let scan = mob.body.bb().inflate(DVec3::splat(SCAN_RADIUS));
    let mut best: Option<(f64, Threat)> = None;
    for id in ctx.entities.ids_in_box(&scan) {
        let Some(Entity::Projectile(projectile)) = ctx.entities.get(id) else {
            continue;
        };
        if !projectile.in_flight() || projectile.owner == Some(mob.id) {
            continue;
        }
        let from = projectile.body.bb().center();
        let to = from + projectile.body.velocity * PREDICT_TICKS;
        let margin = projectile.kind.hitbox_radius() * 0.5;
        let zone = mob.body.bb().inflate(DVec3::splat(margin));
        let Some(t) = zone.segment_entry(from, to) else {
            continue;
        };
        if best.map_or(true, |(earliest, _)| t < earliest) {
            best = Some((
                t,
                Threat {
                    from,
                    to,
                    margin,
                    impact: from.lerp(to, t),
                },
            ));
        }
    }
    best.map(|(_, threat)| threat)
}

#[derive(Debug)]
pub struct ProjectileDodge {
    spawns_decoys: bool,
}

impl ProjectileDodge {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            spawns_decoys: profile.spawns_decoys,
        }
    }

    fn spot_is_clear(ctx: &TickContext<'_>, mob: &Mob, threat: &Threat, feet: DVec3) -> bool {
        let (width, height) = (mob.body.width(), mob.body.height());
        placement_is_safe(&*ctx.world, &*ctx.entities, feet, width, height, &[])
            && !threat.crosses(&Aabb::from_feet(feet, width, height))
    }

    /// Nearest clear ring spot around the predicted impact point.
    fn ring_spot(ctx: &TickContext<'_>, mob: &Mob, threat: &Threat) -> Option<DVec3> {
        let here = mob.body.position();
        let mut best: Option<(f64, DVec3)> = None;
        for radius in RING_RADII {
            for step in 0..RING_ANGLES {
                let (sin, cos) = (f64::from(step) * FRAC_PI_4).sin_cos();
                for dy in RING_HEIGHTS {
                    let probe = DVec3::new(
                        threat.impact.x + radius * cos,
                        here.y + f64::from(dy) + 0.01,
                        threat.impact.z + radius * sin,
                    );
                    let feet = cell_floor_center(cell_of(probe));
                    if !Self::spot_is_clear(ctx, mob, threat, feet) {
                        continue;
                    }
                    let distance = feet.distance(here);
                    if best.map_or(true, |(closest, _)| distance < closest) {
                        best = Some((distance, feet));
                    }
                }
            }
        }
        best.map(|(_, feet)| feet)
    }

    fn random_spot(ctx: &mut TickContext<'_>, mob: &Mob, threat: &Threat) -> Option<DVec3> {
        let origin = mob.body.feet_cell();
        for _ in 0..RANDOM_ATTEMPTS {
            let offset = glam::IVec3::new(
                ctx.rng.gen_range(-RANDOM_RANGE..=RANDOM_RANGE),
                ctx.rng.gen_range(-2..=2),
                ctx.rng.gen_range(-RANDOM_RANGE..=RANDOM_RANGE),
            );
            let feet = cell_floor_center(origin + offset);
            if Self::spot_is_clear(ctx, mob, threat, feet) {
                return Some(feet);
            }
        }
        None
    }
}

impl HazardResponse for ProjectileDodge {
    fn phase(&self) -> HazardPhase {
        HazardPhase::Combat
    }

    fn respond(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
    ) -> HazardOutcome {
        let Some(threat) = incoming_threat(ctx, mob) else {
            return HazardOutcome::Clear;
        };
        trace!(mob = mob.id.0, impact = ?threat.impact, "projectile incoming");
        let spot = Self::ring_spot(ctx, mob, &threat).or_else(|| Self::random_spot(ctx, mob, &threat));
        let Some(to) = spot else {
            return HazardOutcome::Clear;
        };
        if self.spawns_decoys {
            ctx.entities.spawn_entity(SpawnRequest::Decoy {
                position: mob.body.position(),
                width: mob.body.width(),
                height: mob.body.height(),
                ttl: DECOY_TTL,
                source: mob.id,
            });
        }
        commit_teleport(ctx, mob, state, to, TeleportReason::Dodge);
        HazardOutcome::Handled
    }
}
