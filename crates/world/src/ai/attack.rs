//! Attack resolution: melee, ranged and capsule-reach melee.

use super::{AttackResolver, BehaviorState, TargetInfo, TickContext};
use crate::agent::{DamageSource, Mob};
use crate::events::SimEvent;
use crate::profile::{MobProfile, RangedProfile};
use crate::projectile::launch_velocity;
use crate::store::{DamageSink, SpawnRequest, SpawnSink};
use glam::DVec3;
use rand::Rng;
use std::ops::RangeInclusive;
use tracing::debug;

/// Ticks between melee swings, rolled after each hit.
pub const MELEE_DELAY: RangeInclusive<u32> = 20..=30;
/// Height above the feet that capsule reach is measured from.
pub const CAPSULE_ORIGIN_HEIGHT: f64 = 1.5;

fn roll_damage(ctx: &mut TickContext<'_>, base: i32) -> i32 {
    base + ctx.rng.gen_range(0..=(base / 2).max(0))
}

/// Deal a melee hit and restart the swing delay.
fn strike(ctx: &mut TickContext<'_>, mob: &mut Mob, target: &TargetInfo, base_damage: i32) -> bool {
    let damage = roll_damage(ctx, base_damage);
    let source = DamageSource::Entity {
        attacker: mob.id,
        species: Some(mob.kind),
    };
    if !ctx.entities.apply_damage(target.id, source, damage) {
        return false;
    }
    mob.agent.cooldowns.attack_delay = ctx.rng.gen_range(MELEE_DELAY);
    debug!(attacker = mob.id.0, victim = target.id.0, damage, "melee hit");
    ctx.emit(SimEvent::Attack {
        attacker: mob.id,
        victim: target.id,
        damage,
    });
    true
}

#[derive(Debug)]
pub struct NoAttack;

impl AttackResolver for NoAttack {
    fn try_attack(
        &mut self,
        _ctx: &mut TickContext<'_>,
        _mob: &mut Mob,
        _state: &mut BehaviorState,
        _target: &TargetInfo,
    ) -> bool {
        false
    }
}

/// Feet-to-feet reach check with line of sight from the eyes.
#[derive(Debug)]
pub struct Melee {
    reach: f64,
    base_damage: i32,
}

impl Melee {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            reach: profile.attack_reach,
            base_damage: profile.base_damage,
        }
    }
}

impl AttackResolver for Melee {
    fn try_attack(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        _state: &mut BehaviorState,
        target: &TargetInfo,
    ) -> bool {
        if mob.agent.cooldowns.attack_delay > 0
            || mob.body.distance_to(target.position) >= self.reach
            || !ctx.world.line_of_sight(mob.eye_position(), target.mid())
        {
            return false;
        }
        strike(ctx, mob, target, self.base_damage)
    }
}

/// Shoots projectiles from range and holds position with a clear shot.
#[derive(Debug)]
pub struct Ranged {
    tuning: RangedProfile,
}

impl Ranged {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            tuning: profile.ranged.clone(),
        }
    }
}

impl AttackResolver for Ranged {
    fn try_attack(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        _state: &mut BehaviorState,
        target: &TargetInfo,
    ) -> bool {
        let eye = mob.eye_position();
        let aim = target.mid();
        let distance = eye.distance(aim);
        if distance >= self.tuning.range || !ctx.world.line_of_sight(eye, aim) {
            return false;
        }
        if distance < self.tuning.hold_distance {
            mob.agent.steering.forward = 0.0;
        }
        if mob.agent.cooldowns.attack_delay > 0 {
            return false;
        }

        let kind = self.tuning.projectile;
        let muzzle = eye + mob.body.forward() * 0.5;
        let velocity = launch_velocity(kind, muzzle, aim, self.tuning.speed);
        let projectile = ctx.entities.spawn_entity(SpawnRequest::Projectile {
            kind,
            position: muzzle,
            velocity,
            owner: Some(mob.id),
        });
        mob.agent.cooldowns.attack_delay = self.tuning.cooldown;
        debug!(shooter = mob.id.0, projectile = projectile.0, ?kind, "projectile fired");
        ctx.emit(SimEvent::ProjectileFired {
            shooter: mob.id,
            projectile,
        });
        true
    }
}

/// Reach measured from a point above the feet to the nearest point of the
/// target's box, so tall mobs can hit targets standing above or below them.
#[derive(Debug)]
pub struct CapsuleMelee {
    reach: f64,
    base_damage: i32,
}

impl CapsuleMelee {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            reach: profile.attack_reach,
            base_damage: profile.base_damage,
        }
    }

    pub fn in_reach(&self, feet: DVec3, target: &TargetInfo) -> bool {
        let origin = feet + DVec3::new(0.0, CAPSULE_ORIGIN_HEIGHT, 0.0);
        target.bb.distance_to_point(origin) <= self.reach
    }
}

impl AttackResolver for CapsuleMelee {
    fn try_attack(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        _state: &mut BehaviorState,
        target: &TargetInfo,
    ) -> bool {
        if mob.agent.cooldowns.attack_delay > 0 || !self.in_reach(mob.body.position(), target) {
            return false;
        }
        let origin = mob.body.position() + DVec3::new(0.0, CAPSULE_ORIGIN_HEIGHT, 0.0);
        let contact = target.bb.closest_point(origin);
        let clear = ctx.world.line_of_sight(origin, contact)
            || ctx.world.line_of_sight(mob.eye_position(), target.mid());
        if !clear {
            return false;
        }
        strike(ctx, mob, target, self.base_damage)
    }
}
