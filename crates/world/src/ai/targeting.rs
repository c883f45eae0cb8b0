//! Target acquisition, validation and hurt reactions.

use super::carry;
use super::teleport::random_teleport;
use super::{BehaviorState, TickContext, Targeting};
use crate::agent::{DamageSource, Mob};
use crate::events::{SimEvent, TeleportReason};
use crate::profile::MobProfile;
use crate::store::DamageSink;
use rand::Rng;
use tracing::debug;
use voxmob_core::EntityId;

/// Ticks a hurt passive mob keeps running.
pub const PANIC_TICKS: u32 = 60;
/// Per-tick chance of dropping a target beyond twice the acquisition radius.
pub const FAR_DROP_CHANCE: f64 = 1.0 / 20.0;
/// Furthest a player can provoke a gaze mob by looking at it.
pub const GAZE_RANGE: f64 = 64.0;
/// Look-vector slack at one block; it shrinks with distance.
pub const GAZE_TOLERANCE: f64 = 0.025;
/// Per-tick chance of an idle teleport for untargeted gaze mobs.
pub const IDLE_TELEPORT_CHANCE: f64 = 1.0 / 400.0;
const IDLE_TELEPORT_SAMPLES: usize = 1;

fn bind(ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState, target: EntityId) {
    if mob.agent.target == Some(target) {
        return;
    }
    if let Some(previous) = mob.agent.target.take() {
        ctx.emit(SimEvent::TargetLost {
            mob: mob.id,
            target: previous,
        });
    }
    state.clear_pursuit();
    mob.agent.target = Some(target);
    debug!(mob = mob.id.0, target = target.0, "target acquired");
    ctx.emit(SimEvent::TargetAcquired {
        mob: mob.id,
        target,
    });
}

fn drop_target(ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState) {
    if let Some(target) = mob.agent.target.take() {
        debug!(mob = mob.id.0, target = target.0, "target lost");
        state.clear_pursuit();
        ctx.emit(SimEvent::TargetLost {
            mob: mob.id,
            target,
        });
    }
}

/// Drop a target that died, was removed or is the mob itself.
///
/// Returns true when a target was dropped.
pub fn drop_dead_target(
    ctx: &mut TickContext<'_>,
    mob: &mut Mob,
    state: &mut BehaviorState,
) -> bool {
    let dead = mob
        .agent
        .target
        .is_some_and(|target| target == mob.id || !ctx.entities.is_alive(target));
    if dead {
        drop_target(ctx, mob, state);
    }
    dead
}

/// Drop a dead, removed or (sometimes) distant target. Runs before anything
/// else reads the target.
fn validate(ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState, radius: f64) {
    if drop_dead_target(ctx, mob, state) {
        return;
    }
    let Some(target) = mob.agent.target else {
        return;
    };
    let distance = ctx
        .entities
        .body(target)
        .map_or(f64::INFINITY, |body| body.distance_to(mob.body.position()));
    if distance > 2.0 * radius && ctx.rng.gen_bool(FAR_DROP_CHANCE) {
        drop_target(ctx, mob, state);
    }
}

/// Who a hurt mob should turn on, if anyone.
fn retaliation_target(mob: &Mob, source: DamageSource) -> Option<EntityId> {
    match source {
        DamageSource::Entity { species, .. } if species == Some(mob.kind) => None,
        _ => source.culprit().filter(|&id| id != mob.id),
    }
}

/// Never targets anything; runs from attackers for a while.
#[derive(Debug)]
pub struct Passive;

impl Targeting for Passive {
    fn on_hurt(
        &mut self,
        _ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        source: DamageSource,
    ) {
        mob.agent.cooldowns.running = PANIC_TICKS;
        state.flee_from = source.culprit();
    }

    fn update(&mut self, ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState) {
        drop_target(ctx, mob, state);
        if mob.agent.cooldowns.running == 0 {
            state.flee_from = None;
        }
    }
}

/// Binds the closest player inside the acquisition radius.
#[derive(Debug)]
pub struct NearestPlayer {
    radius: f64,
    retaliates: bool,
}

impl NearestPlayer {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            radius: profile.acquisition_radius,
            retaliates: profile.retaliates,
        }
    }
}

impl Targeting for NearestPlayer {
    fn on_hurt(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        source: DamageSource,
    ) {
        if !self.retaliates {
            return;
        }
        if let Some(culprit) = retaliation_target(mob, source) {
            if ctx.entities.is_alive(culprit) {
                bind(ctx, mob, state, culprit);
            }
        }
    }

    fn update(&mut self, ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState) {
        validate(ctx, mob, state, self.radius);
        if mob.agent.target.is_some() {
            return;
        }
        if let Some((player, _)) = ctx.entities.nearest_player(mob.body.position(), self.radius) {
            bind(ctx, mob, state, player);
        }
    }
}

/// Aggressive only once a player stares at the mob or hurts it.
#[derive(Debug)]
pub struct Gaze {
    carries_blocks: bool,
    teleports: bool,
}

impl Gaze {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            carries_blocks: profile.carries_blocks,
            teleports: profile.teleports,
        }
    }

    /// First player (id order) whose look vector points at the mob's eyes.
    fn staring_player(ctx: &TickContext<'_>, mob: &Mob) -> Option<EntityId> {
        let eye = mob.eye_position();
        ctx.entities.players().find_map(|player| {
            let player_eye = player.eye_position();
            let to_mob = eye - player_eye;
            let distance = to_mob.length();
            if distance > GAZE_RANGE || distance < 1e-6 {
                return None;
            }
            let alignment = player.body.look().dot(to_mob / distance);
            (alignment >= 1.0 - GAZE_TOLERANCE / distance
                && ctx.world.line_of_sight(player_eye, eye))
            .then_some(player.id)
        })
    }
}

impl Targeting for Gaze {
    fn on_hurt(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        source: DamageSource,
    ) {
        if let Some(culprit) = retaliation_target(mob, source) {
            if ctx.entities.is_alive(culprit) {
                state.hostile = true;
                bind(ctx, mob, state, culprit);
            }
        }
    }

    fn update(&mut self, ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState) {
        validate(ctx, mob, state, GAZE_RANGE);
        if mob.agent.target.is_none() {
            state.hostile = false;
        }
        if mob.agent.target.is_some() || mob.agent.cooldowns.calm > 0 {
            return;
        }
        if let Some(player) = Self::staring_player(ctx, mob) {
            state.hostile = true;
            bind(ctx, mob, state, player);
        }
    }

    fn idle(&mut self, ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState) -> bool {
        if self.teleports
            && ctx.rng.gen_bool(IDLE_TELEPORT_CHANCE)
            && random_teleport(
                ctx,
                mob,
                state,
                TeleportReason::Idle,
                IDLE_TELEPORT_SAMPLES,
                |_, _| true,
            )
        {
            return true;
        }
        if self.carries_blocks {
            carry::tick_carry(ctx, mob);
        }
        false
    }
}
