//! Environmental hazards: liquid submersion and sunlight.

use super::teleport::{random_teleport, TELEPORT_COOLDOWN};
use super::{BehaviorState, HazardOutcome, HazardPhase, HazardResponse, TickContext};
use crate::agent::{Hazard, Mob};
use crate::events::{SimEvent, TeleportReason};
use crate::profile::MobProfile;
use crate::query::{cell_of, WorldQuery};
use glam::DVec3;
use tracing::trace;

/// Landing spots sampled when escaping liquid.
pub const SUBMERSION_SAMPLES: usize = 64;
/// Ticks between drowning hits while stuck in liquid.
pub const SUBMERSION_DAMAGE_INTERVAL: u32 = 10;
/// Ticks between burn hits while exposed to the sun.
pub const SUNLIGHT_DAMAGE_INTERVAL: u32 = 20;
/// Samples spent looking for a spot out of the sun before settling for any spot.
pub const SHADED_SAMPLES: usize = 32;
pub const UNRESTRICTED_SAMPLES: usize = 16;

fn take_hazard_damage(ctx: &mut TickContext<'_>, mob: &mut Mob, hazard: Hazard) {
    let health = mob.hurt(1);
    trace!(mob = mob.id.0, ?hazard, health, "hazard damage");
    ctx.emit(SimEvent::HazardDamage {
        mob: mob.id,
        hazard,
        health,
    });
}

/// Teleports out of any liquid; stalls and takes periodic damage when no
/// dry spot is found.
#[derive(Debug)]
pub struct SubmersionEscape {
    teleports: bool,
}

impl SubmersionEscape {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            teleports: profile.teleports,
        }
    }
}

impl HazardResponse for SubmersionEscape {
    fn phase(&self) -> HazardPhase {
        HazardPhase::Environment
    }

    fn respond(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
    ) -> HazardOutcome {
        if !ctx.world.aabb_intersects_liquid(mob.body.bb()) {
            mob.agent.cooldowns.submersion_damage = 0;
            return HazardOutcome::Clear;
        }
        if self.teleports
            && random_teleport(
                ctx,
                mob,
                state,
                TeleportReason::Submersion,
                SUBMERSION_SAMPLES,
                |_, _| true,
            )
        {
            mob.agent.cooldowns.submersion_damage = 0;
            return HazardOutcome::Handled;
        }
        let timer = &mut mob.agent.cooldowns.submersion_damage;
        *timer += 1;
        if *timer >= SUBMERSION_DAMAGE_INTERVAL {
            *timer = 0;
            take_hazard_damage(ctx, mob, Hazard::Submersion);
        }
        HazardOutcome::Handled
    }
}

/// Burns in daylight and, for teleporting mobs, jumps into shade.
#[derive(Debug)]
pub struct SunlightResponse {
    teleports: bool,
    eye_height: f64,
}

impl SunlightResponse {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            teleports: profile.teleports,
            eye_height: profile.eye_height,
        }
    }

    fn exposed(&self, world: &dyn WorldQuery, feet: DVec3) -> bool {
        world.is_daytime() && world.sky_exposed(cell_of(feet + DVec3::new(0.0, self.eye_height, 0.0)))
    }
}

impl HazardResponse for SunlightResponse {
    fn phase(&self) -> HazardPhase {
        HazardPhase::Environment
    }

    fn respond(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
    ) -> HazardOutcome {
        if !self.exposed(&*ctx.world, mob.body.position()) {
            mob.agent.cooldowns.sunlight_damage = 0;
            return HazardOutcome::Clear;
        }

        mob.agent.cooldowns.sunlight_damage += 1;
        if mob.agent.cooldowns.sunlight_damage >= SUNLIGHT_DAMAGE_INTERVAL {
            mob.agent.cooldowns.sunlight_damage = 0;
            take_hazard_damage(ctx, mob, Hazard::Sunlight);
        }

        if !self.teleports || mob.agent.cooldowns.teleport > 0 {
            return HazardOutcome::Clear;
        }
        mob.agent.cooldowns.teleport = TELEPORT_COOLDOWN;
        let shaded = random_teleport(
            ctx,
            mob,
            state,
            TeleportReason::Sunlight,
            SHADED_SAMPLES,
            |world, feet| !self.exposed(world, feet),
        );
        if shaded
            || random_teleport(
                ctx,
                mob,
                state,
                TeleportReason::Sunlight,
                UNRESTRICTED_SAMPLES,
                |_, _| true,
            )
        {
            return HazardOutcome::Handled;
        }
        HazardOutcome::Clear
    }
}
