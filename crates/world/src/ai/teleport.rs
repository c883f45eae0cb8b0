//! Safe-placement tests and teleport commits shared by every relocating strategy.

use super::{BehaviorState, Mode, TickContext};
use crate::agent::Mob;
use crate::events::{SimEvent, TeleportReason};
use crate::query::{cell_floor_center, cell_of, WorldQuery};
use crate::store::EntityStore;
use glam::{DVec3, IVec3};
use rand::Rng;
use tracing::debug;
use voxmob_core::EntityId;
use voxmob_physics::Aabb;

/// Cooldown ticks armed by sunlight and approach teleports.
pub const TELEPORT_COOLDOWN: u32 = 40;
/// Ticks during which a freshly teleported mob stays calm (counts the current tick).
pub const CALM_TICKS: u32 = 2;
/// How far a landing search drops from the sampled cell.
const MAX_LANDING_DROP: i32 = 8;

/// Whether a `width` x `height` body could stand with its feet at `feet`.
///
/// The box must be inside the loaded world, clear of solid blocks, liquid and
/// other entities (except `ignore`), and have a solid non-liquid floor.
pub fn placement_is_safe(
    world: &dyn WorldQuery,
    entities: &EntityStore,
    feet: DVec3,
    width: f64,
    height: f64,
    ignore: &[EntityId],
) -> bool {
    let bb = Aabb::from_feet(feet, width, height);
    let feet_cell = cell_of(feet + DVec3::new(0.0, 0.01, 0.0));
    bb.cells().all(|cell| world.is_in_bounds(cell))
        && !world.aabb_collides_blocks(&bb)
        && !world.aabb_intersects_liquid(&bb)
        && world.has_support(feet_cell)
        && !entities.any_in_box(&bb, ignore)
}

/// Drop from `cell` to the first cell with a solid floor, MC-style.
pub fn landing_cell(world: &dyn WorldQuery, cell: IVec3) -> Option<IVec3> {
    let mut probe = cell;
    for _ in 0..=MAX_LANDING_DROP {
        if !world.is_in_bounds(probe) {
            return None;
        }
        if world.is_solid(probe - IVec3::Y) {
            return Some(probe);
        }
        probe.y -= 1;
    }
    None
}

/// Try `attempts` random landing spots in a box around `center`, keeping the
/// first one that is safe and passes `accept`.
pub fn sample_landing(
    ctx: &mut TickContext<'_>,
    mob: &Mob,
    center: DVec3,
    horizontal: i32,
    vertical: i32,
    attempts: usize,
    mut accept: impl FnMut(&dyn WorldQuery, DVec3) -> bool,
) -> Option<DVec3> {
    let origin = cell_of(center);
    for _ in 0..attempts {
        let offset = IVec3::new(
            ctx.rng.gen_range(-horizontal..=horizontal),
            ctx.rng.gen_range(-vertical..=vertical),
            ctx.rng.gen_range(-horizontal..=horizontal),
        );
        let world: &dyn WorldQuery = &*ctx.world;
        let Some(cell) = landing_cell(world, origin + offset) else {
            continue;
        };
        let feet = cell_floor_center(cell);
        if placement_is_safe(
            world,
            ctx.entities,
            feet,
            mob.body.width(),
            mob.body.height(),
            &[],
        ) && accept(world, feet)
        {
            return Some(feet);
        }
    }
    None
}

/// Move the mob, open the calm window and forget pursuit state.
pub fn commit_teleport(
    ctx: &mut TickContext<'_>,
    mob: &mut Mob,
    state: &mut BehaviorState,
    to: DVec3,
    reason: TeleportReason,
) {
    let from = mob.body.position();
    mob.body.teleport(to);
    mob.agent.cooldowns.calm = CALM_TICKS;
    state.clear_pursuit();
    state.mode = Mode::Evade;
    debug!(mob = mob.id.0, ?reason, ?from, ?to, "teleported");
    ctx.emit(SimEvent::Teleported {
        mob: mob.id,
        from,
        to,
        reason,
    });
}

/// Sample and, on success, commit a random teleport.
pub fn random_teleport(
    ctx: &mut TickContext<'_>,
    mob: &mut Mob,
    state: &mut BehaviorState,
    reason: TeleportReason,
    attempts: usize,
    accept: impl FnMut(&dyn WorldQuery, DVec3) -> bool,
) -> bool {
    let center = mob.body.position();
    match sample_landing(ctx, mob, center, 16, 8, attempts, accept) {
        Some(to) => {
            commit_teleport(ctx, mob, state, to, reason);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BLOCK_STONE, BLOCK_WATER};
    use crate::entity::{Entity, Player};
    use crate::time::SimTime;
    use crate::voxel_world::VoxelWorld;

    fn world() -> VoxelWorld {
        VoxelWorld::flat(1, 63, SimTime::default())
    }

    #[test]
    fn open_floor_is_safe() {
        let world = world();
        let store = EntityStore::new();
        assert!(placement_is_safe(&world, &store, DVec3::new(0.5, 64.0, 0.5), 0.6, 2.9, &[]));
        // floating
        assert!(!placement_is_safe(&world, &store, DVec3::new(0.5, 66.0, 0.5), 0.6, 2.9, &[]));
    }

    #[test]
    fn liquid_blocks_and_entities_are_unsafe() {
        let mut world = world();
        world.fill(IVec3::new(3, 64, 0), IVec3::new(3, 64, 0), BLOCK_WATER);
        world.fill(IVec3::new(5, 65, 0), IVec3::new(5, 65, 0), BLOCK_STONE);
        let mut store = EntityStore::new();
        let player = store.insert_with(|id| Entity::Player(Player::new(id, DVec3::new(8.5, 64.0, 0.5))));
        assert!(!placement_is_safe(&world, &store, DVec3::new(3.5, 64.0, 0.5), 0.6, 2.9, &[]));
        assert!(!placement_is_safe(&world, &store, DVec3::new(5.5, 64.0, 0.5), 0.6, 2.9, &[]));
        assert!(!placement_is_safe(&world, &store, DVec3::new(8.5, 64.0, 0.5), 0.6, 2.9, &[]));
        assert!(placement_is_safe(&world, &store, DVec3::new(8.5, 64.0, 0.5), 0.6, 2.9, &[player]));
    }

    #[test]
    fn landing_drops_to_floor() {
        let world = world();
        assert_eq!(landing_cell(&world, IVec3::new(0, 68, 0)), Some(IVec3::new(0, 64, 0)));
        assert_eq!(landing_cell(&world, IVec3::new(0, 90, 0)), None);
    }
}
