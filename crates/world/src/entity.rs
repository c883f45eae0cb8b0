//! Entity records and the kinematic body every entity carries.

use crate::agent::Mob;
use crate::projectile::Projectile;
use crate::query::cell_of;
use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};
use voxmob_core::EntityId;
use voxmob_physics::Aabb;

bitflags::bitflags! {
    /// Contact and medium flags produced by the movement integrator.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MoveFlags: u8 {
        const ON_GROUND = 0b0000_0001;
        const COLLIDED_HORIZONTALLY = 0b0000_0010;
        const COLLIDED_VERTICALLY = 0b0000_0100;
        const IN_WATER = 0b0000_1000;
        const IN_LAVA = 0b0001_0000;
    }
}

impl MoveFlags {
    pub fn in_liquid(self) -> bool {
        self.intersects(MoveFlags::IN_WATER | MoveFlags::IN_LAVA)
    }
}

/// Position, orientation and collision box of an entity.
///
/// The box is derived from the feet position and dimensions and is only ever
/// rewritten together with them.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    position: DVec3,
    prev_position: DVec3,
    /// Blocks per tick.
    pub velocity: DVec3,
    /// Radians; yaw 0 faces +Z and increasing yaw turns toward -X.
    pub yaw: f64,
    /// Radians; positive looks down.
    pub pitch: f64,
    pub prev_yaw: f64,
    pub prev_pitch: f64,
    width: f64,
    height: f64,
    bb: Aabb,
    pub flags: MoveFlags,
    walk_distance: f64,
}

impl Body {
    pub fn new(position: DVec3, width: f64, height: f64) -> Self {
        Self {
            position,
            prev_position: position,
            velocity: DVec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            prev_yaw: 0.0,
            prev_pitch: 0.0,
            width,
            height,
            bb: Aabb::from_feet(position, width, height),
            flags: MoveFlags::empty(),
            walk_distance: 0.0,
        }
    }

    /// Builder-style initial heading.
    pub fn facing(mut self, yaw: f64, pitch: f64) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self.prev_yaw = yaw;
        self.prev_pitch = pitch;
        self
    }

    /// Feet (bottom-centre) position.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Position at the start of the current tick, for render interpolation.
    pub fn prev_position(&self) -> DVec3 {
        self.prev_position
    }

    pub fn bb(&self) -> &Aabb {
        &self.bb
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn on_ground(&self) -> bool {
        self.flags.contains(MoveFlags::ON_GROUND)
    }

    /// Move the feet to `position`, keeping the box in step.
    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
        self.bb = Aabb::from_feet(position, self.width, self.height);
    }

    /// Instant relocation: no interpolation from the old spot and no carried momentum.
    pub fn teleport(&mut self, position: DVec3) {
        self.set_position(position);
        self.prev_position = position;
        self.velocity = DVec3::ZERO;
        self.flags = MoveFlags::empty();
    }

    /// Change dimensions (pose or profile change) and rebuild the box.
    pub fn set_dimensions(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.bb = Aabb::from_feet(self.position, width, height);
    }

    /// Record the previous pose; called once at the start of every tick.
    pub fn begin_tick(&mut self) {
        self.prev_position = self.position;
        self.prev_yaw = self.yaw;
        self.prev_pitch = self.pitch;
    }

    pub(crate) fn add_walk_distance(&mut self, distance: f64) {
        self.walk_distance += distance;
    }

    /// Walk-cycle phase in radians, advanced by horizontal distance travelled.
    pub fn walk_phase(&self) -> f64 {
        (self.walk_distance * 0.6662).rem_euclid(std::f64::consts::TAU)
    }

    pub fn eye_position(&self, eye_height: f64) -> DVec3 {
        self.position + DVec3::new(0.0, eye_height, 0.0)
    }

    /// Point halfway up the body.
    pub fn mid_position(&self) -> DVec3 {
        self.position + DVec3::new(0.0, self.height * 0.5, 0.0)
    }

    pub fn feet_cell(&self) -> IVec3 {
        cell_of(self.position + DVec3::new(0.0, 0.01, 0.0))
    }

    /// Unit vector of the horizontal heading.
    pub fn forward(&self) -> DVec3 {
        DVec3::new(-self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Unit look vector including pitch.
    pub fn look(&self) -> DVec3 {
        let cos_pitch = self.pitch.cos();
        DVec3::new(
            -self.yaw.sin() * cos_pitch,
            -self.pitch.sin(),
            self.yaw.cos() * cos_pitch,
        )
    }

    pub fn horizontal_distance_to(&self, point: DVec3) -> f64 {
        let d = point - self.position;
        (d.x * d.x + d.z * d.z).sqrt()
    }

    pub fn distance_to(&self, point: DVec3) -> f64 {
        self.position.distance(point)
    }
}

/// Externally driven player; only its body and health matter here.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub body: Body,
    pub health: i32,
    pub removed: bool,
}

impl Player {
    pub const WIDTH: f64 = 0.6;
    pub const HEIGHT: f64 = 1.8;
    pub const EYE_HEIGHT: f64 = 1.62;
    pub const MAX_HEALTH: i32 = 20;

    pub fn new(id: EntityId, position: DVec3) -> Self {
        Self {
            id,
            body: Body::new(position, Self::WIDTH, Self::HEIGHT),
            health: Self::MAX_HEALTH,
            removed: false,
        }
    }

    pub fn eye_position(&self) -> DVec3 {
        self.body.eye_position(Self::EYE_HEIGHT)
    }
}

/// Short-lived stand-in left at the spot a mob dodged away from.
#[derive(Debug, Clone)]
pub struct Decoy {
    pub id: EntityId,
    pub body: Body,
    pub source: EntityId,
    pub ttl: u32,
    pub removed: bool,
}

/// Every kind of entity the simulation tracks.
#[derive(Debug, Clone)]
pub enum Entity {
    Player(Player),
    Mob(Mob),
    Projectile(Projectile),
    Decoy(Decoy),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Player(p) => p.id,
            Entity::Mob(m) => m.id,
            Entity::Projectile(p) => p.id,
            Entity::Decoy(d) => d.id,
        }
    }

    pub fn body(&self) -> &Body {
        match self {
            Entity::Player(p) => &p.body,
            Entity::Mob(m) => &m.body,
            Entity::Projectile(p) => &p.body,
            Entity::Decoy(d) => &d.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            Entity::Player(p) => &mut p.body,
            Entity::Mob(m) => &mut m.body,
            Entity::Projectile(p) => &mut p.body,
            Entity::Decoy(d) => &mut d.body,
        }
    }

    pub fn is_removed(&self) -> bool {
        match self {
            Entity::Player(p) => p.removed,
            Entity::Mob(m) => m.removed,
            Entity::Projectile(p) => p.removed,
            Entity::Decoy(d) => d.removed,
        }
    }

    pub fn mark_removed(&mut self) {
        match self {
            Entity::Player(p) => p.removed = true,
            Entity::Mob(m) => m.removed = true,
            Entity::Projectile(p) => p.removed = true,
            Entity::Decoy(d) => d.removed = true,
        }
    }

    /// Present and not dying.
    pub fn is_alive(&self) -> bool {
        if self.is_removed() {
            return false;
        }
        match self {
            Entity::Player(p) => p.health > 0,
            Entity::Mob(m) => m.health > 0,
            Entity::Projectile(_) | Entity::Decoy(_) => true,
        }
    }

    /// Whether the entity takes part in separation pushes.
    pub fn is_pushable(&self) -> bool {
        matches!(self, Entity::Player(_) | Entity::Mob(_)) && self.is_alive()
    }

    /// Whether the entity blocks teleport and path placement.
    pub fn blocks_placement(&self) -> bool {
        !matches!(self, Entity::Projectile(_)) && !self.is_removed()
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Entity::Player(_) => "player",
            Entity::Mob(m) => m.kind.as_str(),
            Entity::Projectile(p) => p.kind.as_str(),
            Entity::Decoy(_) => "decoy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn set_position_keeps_box_in_step() {
        let mut body = Body::new(DVec3::new(0.5, 64.0, 0.5), 0.6, 1.8);
        body.set_position(DVec3::new(3.25, 70.0, -2.0));
        assert_eq!(*body.bb(), Aabb::from_feet(body.position(), 0.6, 1.8));
        body.set_dimensions(0.6, 2.9);
        assert_eq!(*body.bb(), Aabb::from_feet(body.position(), 0.6, 2.9));
    }

    #[test]
    fn teleport_clears_motion_and_interpolation() {
        let mut body = Body::new(DVec3::ZERO, 0.6, 1.8);
        body.velocity = DVec3::new(0.3, 0.0, 0.1);
        body.flags = MoveFlags::ON_GROUND;
        body.teleport(DVec3::new(10.0, 5.0, 0.0));
        assert_eq!(body.prev_position(), body.position());
        assert_eq!(body.velocity, DVec3::ZERO);
        assert!(!body.on_ground());
    }

    #[test]
    fn heading_convention() {
        let body = Body::new(DVec3::ZERO, 0.6, 1.8);
        assert!((body.forward() - DVec3::Z).length() < 1e-12);
        let turned = Body::new(DVec3::ZERO, 0.6, 1.8).facing(-FRAC_PI_2, 0.0);
        assert!((turned.forward() - DVec3::X).length() < 1e-12);
        let down = Body::new(DVec3::ZERO, 0.6, 1.8).facing(0.0, FRAC_PI_2);
        assert!((down.look() + DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn dead_player_is_not_alive() {
        let mut entity = Entity::Player(Player::new(EntityId(1), DVec3::ZERO));
        assert!(entity.is_alive());
        if let Entity::Player(p) = &mut entity {
            p.health = 0;
        }
        assert!(!entity.is_alive());
        assert!(entity.blocks_placement());
    }
}
