pub mod agent;
pub mod ai;
pub mod blocks;
mod chunk;
mod entity;
mod events;
mod movement;
pub mod pathfinding;
pub mod persist;
mod profile;
mod projectile;
mod query;
mod raycast;
mod sim;
mod store;
mod time;
mod voxel_world;

pub use agent::*;
pub use chunk::*;
pub use entity::*;
pub use events::*;
pub use movement::*;
pub use profile::*;
pub use projectile::*;
pub use query::*;
pub use raycast::*;
pub use sim::*;
pub use store::*;
pub use time::*;
pub use voxel_world::*;
