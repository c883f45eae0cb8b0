//! Entity storage plus the damage and spawn sinks controllers write through.

use crate::agent::{DamageSource, Mob};
use crate::entity::{Body, Decoy, Entity, Player};
use crate::projectile::{Projectile, ProjectileKind};
use glam::DVec3;
use std::collections::BTreeMap;
use tracing::trace;
use voxmob_core::EntityId;
use voxmob_physics::Aabb;

/// Receives damage on behalf of a victim.
///
/// Implementations only record the hit; the victim's own controller reacts to
/// it on its next tick.
pub trait DamageSink {
    /// Apply `amount` to `victim`. Returns false if the victim is gone or immune.
    fn apply_damage(&mut self, victim: EntityId, source: DamageSource, amount: i32) -> bool;

    fn is_alive(&self, id: EntityId) -> bool;
}

/// Entities a controller may create mid-tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnRequest {
    Projectile {
        kind: ProjectileKind,
        position: DVec3,
        velocity: DVec3,
        owner: Option<EntityId>,
    },
    Decoy {
        position: DVec3,
        width: f64,
        height: f64,
        ttl: u32,
        source: EntityId,
    },
}

pub trait SpawnSink {
    fn spawn_entity(&mut self, request: SpawnRequest) -> EntityId;
}

/// All live entities keyed by id; iteration order is id order.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id. Ids start at 1 and are never reused.
    pub fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    /// Allocate an id and insert the entity built from it.
    pub fn insert_with(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let id = self.allocate_id();
        self.put(build(id));
        id
    }

    /// Insert (or put back) an entity under its own id.
    pub fn put(&mut self, entity: Entity) {
        let id = entity.id();
        self.next_id = self.next_id.max(id.0);
        self.entities.insert(id, entity);
    }

    /// Remove an entity for exclusive mutation; pair with [`EntityStore::put`].
    pub fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Snapshot of every id, safe to iterate while the store changes.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn mob(&self, id: EntityId) -> Option<&Mob> {
        match self.entities.get(&id) {
            Some(Entity::Mob(mob)) => Some(mob),
            _ => None,
        }
    }

    pub fn mob_mut(&mut self, id: EntityId) -> Option<&mut Mob> {
        match self.entities.get_mut(&id) {
            Some(Entity::Mob(mob)) => Some(mob),
            _ => None,
        }
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        match self.entities.get(&id) {
            Some(Entity::Player(player)) => Some(player),
            _ => None,
        }
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        match self.entities.get_mut(&id) {
            Some(Entity::Player(player)) => Some(player),
            _ => None,
        }
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.entities.get(&id).map(Entity::body)
    }

    /// Live players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.entities.values().filter_map(|entity| match entity {
            Entity::Player(player) if !player.removed && player.health > 0 => Some(player),
            _ => None,
        })
    }

    /// Closest live player within `max_distance` of `point` (lowest id wins ties).
    pub fn nearest_player(&self, point: DVec3, max_distance: f64) -> Option<(EntityId, f64)> {
        let mut best: Option<(EntityId, f64)> = None;
        for player in self.players() {
            let distance = player.body.position().distance(point);
            if distance <= max_distance && best.map_or(true, |(_, d)| distance < d) {
                best = Some((player.id, distance));
            }
        }
        best
    }

    /// Ids of entities whose box overlaps `bb`.
    pub fn ids_in_box(&self, bb: &Aabb) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, entity)| !entity.is_removed() && entity.body().bb().intersects(bb))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether any placement-blocking entity other than `ignore` overlaps `bb`.
    pub fn any_in_box(&self, bb: &Aabb, ignore: &[EntityId]) -> bool {
        self.entities.iter().any(|(id, entity)| {
            !ignore.contains(id) && entity.blocks_placement() && entity.body().bb().intersects(bb)
        })
    }

    /// Drop every entity flagged as removed, returning their ids.
    pub fn reap(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.is_removed())
            .map(|(id, _)| *id)
            .collect();
        for id in &dead {
            self.entities.remove(id);
        }
        dead
    }
}

impl DamageSink for EntityStore {
    fn apply_damage(&mut self, victim: EntityId, source: DamageSource, amount: i32) -> bool {
        let Some(entity) = self.entities.get_mut(&victim) else {
            return false;
        };
        if !entity.is_alive() {
            return false;
        }
        match entity {
            Entity::Player(player) => player.health -= amount,
            Entity::Mob(mob) => {
                mob.health -= amount;
                mob.agent.pending_hurt = Some(source);
            }
            Entity::Decoy(decoy) => decoy.removed = true,
            Entity::Projectile(_) => return false,
        }
        trace!(victim = victim.0, amount, ?source, "damage applied");
        true
    }

    fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(Entity::is_alive)
    }
}

impl SpawnSink for EntityStore {
    fn spawn_entity(&mut self, request: SpawnRequest) -> EntityId {
        match request {
            SpawnRequest::Projectile {
                kind,
                position,
                velocity,
                owner,
            } => self.insert_with(|id| {
                Entity::Projectile(Projectile::new(id, kind, position, velocity, owner))
            }),
            SpawnRequest::Decoy {
                position,
                width,
                height,
                ttl,
                source,
            } => self.insert_with(|id| {
                Entity::Decoy(Decoy {
                    id,
                    body: Body::new(position, width, height),
                    source,
                    ttl,
                    removed: false,
                })
            }),
        }
    }
}
