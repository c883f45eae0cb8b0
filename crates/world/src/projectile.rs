//! Projectiles fired by ranged mobs.
//!
//! Provides projectile motion, block and entity hits, and damage hand-off to
//! the entity store.

use crate::agent::DamageSource;
use crate::entity::Body;
use crate::query::WorldQuery;
use crate::store::{DamageSink, EntityStore};
use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};
use voxmob_core::EntityId;
use voxmob_physics::Aabb;

/// Ticks during which a fresh projectile ignores its shooter.
pub const OWNER_GRACE_TICKS: u32 = 5;

/// Types of projectiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Arrow,
    Fireball,
}

impl ProjectileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectileKind::Arrow => "arrow",
            ProjectileKind::Fireball => "fireball",
        }
    }

    /// Base damage for this projectile type
    pub fn base_damage(self) -> i32 {
        match self {
            ProjectileKind::Arrow => 2,
            ProjectileKind::Fireball => 5,
        }
    }

    /// Gravity strength for this projectile
    pub fn gravity(self) -> f64 {
        match self {
            ProjectileKind::Arrow => 0.05,
            ProjectileKind::Fireball => 0.0,
        }
    }

    /// Drag coefficient (velocity multiplier per tick)
    pub fn drag(self) -> f64 {
        match self {
            ProjectileKind::Arrow => 0.99,
            ProjectileKind::Fireball => 0.95,
        }
    }

    /// Hitbox radius used against entity boxes
    pub fn hitbox_radius(self) -> f64 {
        match self {
            ProjectileKind::Arrow => 0.3,
            ProjectileKind::Fireball => 0.5,
        }
    }

    /// How long the projectile lives (in ticks at 20 TPS)
    pub fn lifetime_ticks(self) -> u32 {
        match self {
            ProjectileKind::Arrow => 1200,
            ProjectileKind::Fireball => 200,
        }
    }
}

/// A projectile in flight (or stuck in a block).
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub kind: ProjectileKind,
    pub body: Body,
    pub owner: Option<EntityId>,
    pub age: u32,
    pub stuck: bool,
    pub damage: i32,
    pub removed: bool,
}

impl Projectile {
    pub fn new(
        id: EntityId,
        kind: ProjectileKind,
        position: DVec3,
        velocity: DVec3,
        owner: Option<EntityId>,
    ) -> Self {
        let size = kind.hitbox_radius();
        let mut body = Body::new(position, size, size);
        body.velocity = velocity;
        Self {
            id,
            kind,
            body,
            owner,
            age: 0,
            stuck: false,
            damage: kind.base_damage(),
            removed: false,
        }
    }

    /// Whether the projectile is still travelling.
    pub fn in_flight(&self) -> bool {
        !self.stuck && !self.removed
    }
}

/// Velocity that sends a projectile from `from` toward `to`, lifted to offset gravity drop.
pub fn launch_velocity(kind: ProjectileKind, from: DVec3, to: DVec3, speed: f64) -> DVec3 {
    let delta = to - from;
    let horizontal = (delta.x * delta.x + delta.z * delta.z).sqrt();
    let lift = if kind.gravity() > 0.0 {
        horizontal * 0.2
    } else {
        0.0
    };
    let aim = DVec3::new(delta.x, delta.y + lift, delta.z);
    aim.normalize_or_zero() * speed
}

/// What a projectile struck this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileImpact {
    Block(IVec3),
    Entity { victim: EntityId, damage: i32 },
}

/// Advance one projectile by a tick.
///
/// The projectile must not be inside `entities` while it is being ticked.
pub fn tick_projectile(
    projectile: &mut Projectile,
    world: &dyn WorldQuery,
    entities: &mut EntityStore,
) -> Option<ProjectileImpact> {
    projectile.body.begin_tick();
    projectile.age += 1;
    if projectile.age > projectile.kind.lifetime_ticks() {
        projectile.removed = true;
        return None;
    }
    if projectile.stuck {
        return None;
    }

    let from = projectile.body.position();
    let to = from + projectile.body.velocity;
    let block_hit = world.raycast(from, to);
    let block_t = block_hit.map(|hit| hit.distance / (to - from).length().max(f64::EPSILON));

    let radius = projectile.kind.hitbox_radius();
    let sweep = Aabb::new(from.min(to), from.max(to)).inflate(DVec3::splat(radius + 1.0));
    let mut best: Option<(f64, EntityId)> = None;
    for id in entities.ids_in_box(&sweep) {
        let Some(entity) = entities.get(id) else {
            continue;
        };
        if !entity.is_alive() || matches!(entity, crate::entity::Entity::Projectile(_)) {
            continue;
        }
        if Some(id) == projectile.owner && projectile.age <= OWNER_GRACE_TICKS {
            continue;
        }
        let target = entity.body().bb().inflate(DVec3::splat(radius));
        if let Some(t) = target.segment_entry(from, to) {
            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, id));
            }
        }
    }

    match (best, block_hit, block_t) {
        (Some((t, victim)), _, bt) if bt.map_or(true, |bt| t <= bt) => {
            let source = DamageSource::Projectile {
                projectile: projectile.id,
                owner: projectile.owner,
            };
            let damage = projectile.damage;
            entities.apply_damage(victim, source, damage);
            projectile.body.set_position(from + (to - from) * t);
            projectile.removed = true;
            Some(ProjectileImpact::Entity { victim, damage })
        }
        (_, Some(hit), _) => {
            projectile.body.set_position(hit.hit_pos);
            projectile.body.velocity = DVec3::ZERO;
            projectile.stuck = true;
            Some(ProjectileImpact::Block(hit.block_pos))
        }
        _ => {
            projectile.body.set_position(to);
            let kind = projectile.kind;
            let velocity = &mut projectile.body.velocity;
            *velocity *= kind.drag();
            velocity.y -= kind.gravity();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BLOCK_STONE;
    use crate::entity::{Entity, Player};
    use crate::time::SimTime;
    use crate::voxel_world::VoxelWorld;

    fn setup() -> (VoxelWorld, EntityStore) {
        (VoxelWorld::flat(1, 63, SimTime::default()), EntityStore::new())
    }

    #[test]
    fn arrow_falls_and_slows() {
        let (world, mut entities) = setup();
        let mut arrow = Projectile::new(
            EntityId(50),
            ProjectileKind::Arrow,
            DVec3::new(0.5, 70.0, 0.5),
            DVec3::new(1.0, 0.0, 0.0),
            None,
        );
        assert!(tick_projectile(&mut arrow, &world, &mut entities).is_none());
        assert!((arrow.body.position().x - 1.5).abs() < 1e-9);
        assert!((arrow.body.velocity.x - 0.99).abs() < 1e-9);
        assert!((arrow.body.velocity.y + 0.05).abs() < 1e-9);
    }

    #[test]
    fn arrow_sticks_in_wall() {
        let (mut world, mut entities) = setup();
        world.fill(IVec3::new(3, 64, -1), IVec3::new(3, 66, 1), BLOCK_STONE);
        let mut arrow = Projectile::new(
            EntityId(50),
            ProjectileKind::Arrow,
            DVec3::new(0.5, 65.5, 0.5),
            DVec3::new(2.0, 0.0, 0.0),
            None,
        );
        tick_projectile(&mut arrow, &world, &mut entities);
        let impact = tick_projectile(&mut arrow, &world, &mut entities);
        assert_eq!(impact, Some(ProjectileImpact::Block(IVec3::new(3, 65, 0))));
        assert!(arrow.stuck);
        assert!(!arrow.in_flight());
    }

    #[test]
    fn arrow_damages_player_but_not_fresh_owner() {
        let (world, mut entities) = setup();
        let owner = entities
            .insert_with(|id| Entity::Player(Player::new(id, DVec3::new(0.5, 64.0, 0.5))));
        let victim = entities
            .insert_with(|id| Entity::Player(Player::new(id, DVec3::new(2.5, 64.0, 0.5))));
        let mut arrow = Projectile::new(
            EntityId(99),
            ProjectileKind::Arrow,
            DVec3::new(0.5, 65.0, 0.5),
            DVec3::new(3.0, 0.0, 0.0),
            Some(owner),
        );
        let impact = tick_projectile(&mut arrow, &world, &mut entities);
        assert_eq!(
            impact,
            Some(ProjectileImpact::Entity {
                victim,
                damage: 2
            })
        );
        assert!(arrow.removed);
        match entities.get(victim) {
            Some(Entity::Player(p)) => assert_eq!(p.health, Player::MAX_HEALTH - 2),
            other => panic!("unexpected entity {other:?}"),
        }
    }

    #[test]
    fn launch_velocity_has_requested_speed() {
        let v = launch_velocity(
            ProjectileKind::Arrow,
            DVec3::ZERO,
            DVec3::new(10.0, 0.0, 0.0),
            1.6,
        );
        assert!((v.length() - 1.6).abs() < 1e-9);
        assert!(v.y > 0.0);
    }
}
