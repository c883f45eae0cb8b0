//! Fixed-rate simulation loop tying the world, entities and controllers together.

use crate::agent::Mob;
use crate::ai::{Controller, TickContext};
use crate::entity::{Body, Entity, Player};
use crate::events::{SimEvent, TimedEvent};
use crate::movement::integrate;
use crate::persist::AgentRecord;
use crate::profile::{MobKind, MobProfile};
use crate::projectile::{tick_projectile, ProjectileImpact};
use crate::query::WorldQuery;
use crate::store::EntityStore;
use crate::voxel_world::VoxelWorld;
use glam::{DVec3, IVec3};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use voxmob_core::{scoped_rng, EntityId, SimTick};

/// World state too inconsistent to run an agent's tick. The tick is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickError {
    #[error("entity {0} is not in the store")]
    MissingEntity(EntityId),
    #[error("mob {0} has no controller")]
    MissingController(EntityId),
    #[error("entity {0} is not a mob")]
    NotAMob(EntityId),
    #[error("mob {id} stands in unloaded cell {cell}")]
    WorldUnavailable { id: EntityId, cell: IVec3 },
}

pub struct Simulation {
    world: VoxelWorld,
    entities: EntityStore,
    controllers: BTreeMap<EntityId, Controller>,
    profiles: BTreeMap<MobKind, MobProfile>,
    seed: u64,
    tick: SimTick,
    events: Vec<TimedEvent>,
}

impl Simulation {
    pub fn new(world: VoxelWorld, seed: u64) -> Self {
        let profiles = MobKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.default_profile()))
            .collect();
        Self {
            world,
            entities: EntityStore::new(),
            controllers: BTreeMap::new(),
            profiles,
            seed,
            tick: SimTick::ZERO,
            events: Vec::new(),
        }
    }

    pub fn world(&self) -> &VoxelWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut VoxelWorld {
        &mut self.world
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    pub fn tick(&self) -> SimTick {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn controller(&self, id: EntityId) -> Option<&Controller> {
        self.controllers.get(&id)
    }

    pub fn profile(&self, kind: MobKind) -> &MobProfile {
        &self.profiles[&kind]
    }

    /// Replace a kind's tuning. Live mobs of that kind pick up the new
    /// dimensions and strategies but keep their behaviour state.
    pub fn set_profile(&mut self, kind: MobKind, profile: MobProfile) {
        for id in self.entities.ids() {
            let Some(mob) = self.entities.mob_mut(id) else {
                continue;
            };
            if mob.kind != kind {
                continue;
            }
            mob.body.set_dimensions(profile.width, profile.height);
            mob.eye_height = profile.eye_height;
            mob.max_health = profile.max_health;
            mob.agent.persistent = profile.persistent;
            let mut controller = Controller::from_profile(profile.clone());
            if let Some(previous) = self.controllers.remove(&id) {
                controller.state = previous.state;
            }
            self.controllers.insert(id, controller);
        }
        self.profiles.insert(kind, profile);
    }

    /// Create a mob and its controller together.
    pub fn spawn_mob(&mut self, kind: MobKind, position: DVec3, yaw: f64) -> EntityId {
        let profile = self.profiles[&kind].clone();
        let id = self.entities.insert_with(|id| {
            let body = Body::new(position, profile.width, profile.height).facing(yaw, 0.0);
            Entity::Mob(Mob::new(id, kind, body, &profile))
        });
        self.controllers.insert(id, Controller::from_profile(profile));
        debug!(mob = id.0, %kind, ?position, "mob spawned");
        id
    }

    pub fn spawn_player(&mut self, position: DVec3) -> EntityId {
        self.entities
            .insert_with(|id| Entity::Player(Player::new(id, position)))
    }

    /// Teleport a player and point its view.
    pub fn place_player(&mut self, id: EntityId, position: DVec3, yaw: f64, pitch: f64) -> bool {
        let Some(player) = self.entities.player_mut(id) else {
            return false;
        };
        player.body.teleport(position);
        player.body.yaw = yaw;
        player.body.pitch = pitch;
        true
    }

    /// Advance every entity by one tick.
    pub fn step(&mut self) {
        self.tick = self.tick.advance(1);
        self.world.time_mut().advance();

        for id in self.entities.ids() {
            match self.entities.get(id) {
                Some(Entity::Mob(_)) => {
                    if let Err(err) = self.tick_mob(id) {
                        warn!(mob = id.0, tick = self.tick.0, %err, "skipping agent tick");
                        self.push_event(SimEvent::TickSkipped {
                            id,
                            reason: err.to_string(),
                        });
                    }
                }
                Some(Entity::Projectile(_)) => self.tick_projectile(id),
                Some(Entity::Decoy(_)) => self.tick_decoy(id),
                Some(Entity::Player(_)) | None => {}
            }
        }

        for id in self.entities.reap() {
            self.controllers.remove(&id);
        }
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
        info!(
            tick = self.tick.0,
            entities = self.entities.len(),
            events = self.events.len(),
            "simulation advanced"
        );
    }

    fn push_event(&mut self, event: SimEvent) {
        self.events.push(TimedEvent {
            tick: self.tick,
            event,
        });
    }

    /// Run one mob's controller and integrate its movement.
    pub fn tick_mob(&mut self, id: EntityId) -> Result<(), TickError> {
        let entity = self.entities.take(id).ok_or(TickError::MissingEntity(id))?;
        let mut mob = match entity {
            Entity::Mob(mob) => mob,
            other => {
                self.entities.put(other);
                return Err(TickError::NotAMob(id));
            }
        };
        let Some(mut controller) = self.controllers.remove(&id) else {
            self.entities.put(Entity::Mob(mob));
            return Err(TickError::MissingController(id));
        };
        let cell = mob.body.feet_cell();
        if !self.world.is_loaded(cell) {
            self.entities.put(Entity::Mob(mob));
            self.controllers.insert(id, controller);
            return Err(TickError::WorldUnavailable { id, cell });
        }

        let mut ctx = TickContext {
            tick: self.tick,
            world: &mut self.world,
            entities: &mut self.entities,
            rng: scoped_rng(self.seed, id.rng_domain(), self.tick),
            events: &mut self.events,
        };
        controller.tick(&mut ctx, &mut mob);
        integrate(&self.world, &mut mob.body, &mob.agent.steering);

        self.entities.put(Entity::Mob(mob));
        self.controllers.insert(id, controller);
        Ok(())
    }

    fn tick_projectile(&mut self, id: EntityId) {
        let Some(Entity::Projectile(mut projectile)) = self.entities.take(id) else {
            return;
        };
        let impact = tick_projectile(&mut projectile, &self.world, &mut self.entities);
        self.entities.put(Entity::Projectile(projectile));
        match impact {
            Some(ProjectileImpact::Entity { victim, .. }) => self.push_event(SimEvent::ProjectileHit {
                projectile: id,
                victim: Some(victim),
                cell: None,
            }),
            Some(ProjectileImpact::Block(cell)) => self.push_event(SimEvent::ProjectileHit {
                projectile: id,
                victim: None,
                cell: Some(cell),
            }),
            None => {}
        }
    }

    fn tick_decoy(&mut self, id: EntityId) {
        if let Some(Entity::Decoy(decoy)) = self.entities.get_mut(id) {
            decoy.ttl = decoy.ttl.saturating_sub(1);
            if decoy.ttl == 0 {
                decoy.removed = true;
            }
        }
    }

    /// Snapshot every mob for persistence.
    pub fn save_agents(&self) -> Vec<AgentRecord> {
        self.entities
            .iter()
            .filter_map(|entity| match entity {
                Entity::Mob(mob) if !mob.removed => Some(AgentRecord::capture(mob)),
                _ => None,
            })
            .collect()
    }

    /// Recreate mobs (and fresh controllers) from saved records, keeping their ids.
    pub fn restore_agents(&mut self, records: &[AgentRecord]) {
        for record in records {
            let profile = self.profiles[&record.kind].clone();
            let mut body = Body::new(record.position, profile.width, profile.height)
                .facing(record.yaw, record.pitch);
            body.velocity = record.velocity;
            let mut mob = Mob::new(record.id, record.kind, body, &profile);
            mob.health = record.health;
            mob.agent.target = record.target;
            self.entities.put(Entity::Mob(mob));
            self.controllers
                .insert(record.id, Controller::from_profile(profile));
        }
        debug!(count = records.len(), "agents restored");
    }
}
