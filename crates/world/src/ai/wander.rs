//! Idle wandering, jump triggers, despawn watchdog and separation pushes.

use super::aim::{face_yaw, relax_pitch, yaw_toward};
use super::{BehaviorState, Mode, TickContext};
use crate::agent::Mob;
use crate::movement::wrap_angle;
use glam::DVec3;
use rand::Rng;

/// Per-tick chance of rolling fresh wander steering.
pub const REROLL_CHANCE: f64 = 0.05;
/// Factor applied to remembered wander steering on ticks without a re-roll.
pub const WANDER_DECAY: f64 = 0.9;
/// Largest yaw rate (radians per tick) a re-roll may pick.
pub const MAX_WANDER_TURN: f64 = 10.0 * std::f64::consts::PI / 180.0;
/// Speed scale while panicking or hostile.
pub const RUN_MULTIPLIER: f64 = 1.4;
/// Per-tick chance of a random hop while wandering.
pub const WANDER_JUMP_CHANCE: f64 = 0.01;
/// Per-tick chance of paddling upward while in liquid.
pub const LIQUID_JUMP_CHANCE: f64 = 0.8;

/// Players closer than this keep resetting the idle clock.
pub const DESPAWN_NEAR: f64 = 32.0;
/// With no player inside this range the mob despawns at once.
pub const DESPAWN_FAR: f64 = 128.0;
/// Idle ticks before the random despawn roll starts.
pub const DESPAWN_IDLE_TICKS: u32 = 600;
/// One-in-N odds of the despawn roll succeeding.
pub const DESPAWN_ROLL: u32 = 800;

/// Separation impulse within a block of a neighbour; it falls off beyond that.
pub const PUSH_STRENGTH: f64 = 0.05;
/// Horizontal inflation of the box used to find neighbours to push.
pub const PUSH_INFLATE: f64 = 0.2;

/// Random-walk steering. Panicking mobs run away from whoever hurt them instead.
pub fn wander(ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState, run_speed: f64) {
    state.mode = Mode::Wander;
    if mob.agent.cooldowns.running > 0 {
        flee(ctx, mob, state, run_speed);
        return;
    }

    let memory = &mut state.wander;
    if ctx.rng.gen_bool(REROLL_CHANCE) {
        memory.forward = ctx.rng.gen_range(0.0..=run_speed);
        let strafe = ctx.rng.gen_range(0.0..=run_speed);
        memory.strafe = if ctx.rng.gen_bool(0.5) { strafe } else { -strafe };
        memory.yaw_velocity = ctx.rng.gen_range(-MAX_WANDER_TURN..=MAX_WANDER_TURN);
    } else {
        memory.forward *= WANDER_DECAY;
        memory.strafe *= WANDER_DECAY;
        memory.yaw_velocity *= WANDER_DECAY;
    }

    let steering = &mut mob.agent.steering;
    steering.forward = memory.forward;
    steering.strafe = memory.strafe;
    steering.turn_delta = memory.yaw_velocity;
    relax_pitch(mob);
}

fn flee(ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState, run_speed: f64) {
    let threat = state
        .flee_from
        .and_then(|id| ctx.entities.body(id))
        .map(|body| body.position());
    let heading = match threat {
        Some(position) => wrap_angle(yaw_toward(mob.body.position(), position) + std::f64::consts::PI),
        None => mob.body.yaw,
    };
    face_yaw(mob, heading, Mode::Evade.aim_multiplier());
    mob.agent.steering.forward = run_speed * RUN_MULTIPLIER;
}

/// Advance the idle clock and decide whether a non-persistent mob should go.
pub fn should_despawn(ctx: &mut TickContext<'_>, mob: &mut Mob) -> bool {
    mob.agent.wander_time += 1;
    if ctx.entities.players().next().is_none() {
        return false;
    }
    match ctx.entities.nearest_player(mob.body.position(), DESPAWN_FAR) {
        None => true,
        Some((_, distance)) if distance < DESPAWN_NEAR => {
            mob.agent.wander_time = 0;
            false
        }
        Some(_) => {
            mob.agent.wander_time > DESPAWN_IDLE_TICKS && ctx.rng.gen_range(0..DESPAWN_ROLL) == 0
        }
    }
}

/// Set the jump flag for blocked, random and swimming jumps.
pub fn apply_jump_triggers(ctx: &mut TickContext<'_>, mob: &mut Mob, state: &BehaviorState) {
    let flags = mob.body.flags;
    let steering = &mut mob.agent.steering;
    if flags.contains(crate::entity::MoveFlags::COLLIDED_HORIZONTALLY) && mob.body.on_ground() {
        steering.jump = true;
    }
    if state.mode == Mode::Wander && ctx.rng.gen_bool(WANDER_JUMP_CHANCE) {
        steering.jump = true;
    }
    if flags.in_liquid() && ctx.rng.gen_bool(LIQUID_JUMP_CHANCE) {
        steering.jump = true;
    }
}

/// Horizontal separation impulse between two feet positions, applied to `a`.
pub fn separation(a: DVec3, b: DVec3) -> DVec3 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    let distance = (dx * dx + dz * dz).sqrt();
    if distance < 0.01 {
        return DVec3::ZERO;
    }
    let scale = PUSH_STRENGTH * (1.0 / distance).min(1.0) / distance;
    DVec3::new(dx * scale, 0.0, dz * scale)
}

/// Nudge overlapping pushable neighbours and the mob apart.
pub fn push_neighbours(ctx: &mut TickContext<'_>, mob: &mut Mob) {
    let zone = mob
        .body
        .bb()
        .inflate(DVec3::new(PUSH_INFLATE, 0.0, PUSH_INFLATE));
    for id in ctx.entities.ids_in_box(&zone) {
        if id == mob.id {
            continue;
        }
        let Some(other) = ctx.entities.get_mut(id) else {
            continue;
        };
        if !other.is_pushable() {
            continue;
        }
        let push = separation(mob.body.position(), other.body().position());
        other.body_mut().velocity -= push;
        mob.body.velocity += push;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separation_points_away_and_saturates() {
        let near = separation(DVec3::new(0.5, 0.0, 0.0), DVec3::ZERO);
        assert!((near.x - PUSH_STRENGTH).abs() < 1e-12);
        let far = separation(DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO);
        assert!((far.x - PUSH_STRENGTH * 0.5).abs() < 1e-12);
        let left = separation(DVec3::new(0.0, 0.0, -0.5), DVec3::ZERO);
        assert!(left.z < 0.0);
        assert_eq!(separation(DVec3::ZERO, DVec3::ZERO), DVec3::ZERO);
    }
}
