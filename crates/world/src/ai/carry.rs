//! Idle block carrying: pick up a nearby tile, later set it down elsewhere.

use super::TickContext;
use crate::agent::Mob;
use crate::blocks::{is_carriable, BLOCK_AIR};
use crate::events::SimEvent;
use crate::query::cell_of;
use glam::IVec3;
use rand::Rng;
use tracing::debug;
use voxmob_physics::Aabb;

pub const PICK_UP_CHANCE: f64 = 1.0 / 20.0;
pub const PLACE_CHANCE: f64 = 1.0 / 2000.0;

/// One roll of the carry behaviour for an idle mob.
pub fn tick_carry(ctx: &mut TickContext<'_>, mob: &mut Mob) {
    match mob.agent.carried {
        None => {
            if ctx.rng.gen_bool(PICK_UP_CHANCE) {
                try_pick_up(ctx, mob);
            }
        }
        Some(_) => {
            if ctx.rng.gen_bool(PLACE_CHANCE) {
                try_place(ctx, mob);
            }
        }
    }
}

fn try_pick_up(ctx: &mut TickContext<'_>, mob: &mut Mob) {
    let origin = cell_of(mob.body.position());
    let cell = origin
        + IVec3::new(
            ctx.rng.gen_range(-2..=2),
            ctx.rng.gen_range(-1..=2),
            ctx.rng.gen_range(-2..=2),
        );
    let block = ctx.world.tile_at(cell);
    if !is_carriable(block) || !ctx.world.is_in_bounds(cell) {
        return;
    }
    if ctx.world.set_tile(cell, BLOCK_AIR) {
        mob.agent.carried = Some(block);
        debug!(mob = mob.id.0, ?cell, block, "picked up block");
        ctx.emit(SimEvent::BlockTaken {
            mob: mob.id,
            cell,
            block,
        });
    }
}

fn try_place(ctx: &mut TickContext<'_>, mob: &mut Mob) {
    let Some(block) = mob.agent.carried else {
        return;
    };
    let origin = cell_of(mob.body.position());
    let cell = origin
        + IVec3::new(
            ctx.rng.gen_range(-1..=1),
            ctx.rng.gen_range(-1..=1),
            ctx.rng.gen_range(-1..=1),
        );
    let world = &*ctx.world;
    let free = world.is_in_bounds(cell)
        && world.tile_at(cell) == BLOCK_AIR
        && world.is_solid(cell - IVec3::Y)
        && !mob.body.bb().intersects(&Aabb::cell(cell))
        && !ctx.entities.any_in_box(&Aabb::cell(cell), &[]);
    if free && ctx.world.set_tile(cell, block) {
        mob.agent.carried = None;
        debug!(mob = mob.id.0, ?cell, block, "placed block");
        ctx.emit(SimEvent::BlockPlaced {
            mob: mob.id,
            cell,
            block,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TickContext;
    use crate::blocks::BLOCK_GRASS;
    use crate::entity::Body;
    use crate::profile::MobKind;
    use crate::query::WorldQuery;
    use crate::store::EntityStore;
    use crate::time::SimTime;
    use crate::voxel_world::VoxelWorld;
    use glam::DVec3;
    use voxmob_core::{scoped_rng, EntityId, SimTick};

    #[test]
    fn picked_block_leaves_the_world() {
        let mut world = VoxelWorld::flat(1, 63, SimTime::default());
        let mut entities = EntityStore::new();
        let mut events = Vec::new();
        let profile = MobKind::Enderman.default_profile();
        let body = Body::new(DVec3::new(0.5, 64.0, 0.5), profile.width, profile.height);
        let mut mob = Mob::new(EntityId(1), MobKind::Enderman, body, &profile);

        let mut picked = false;
        for tick in 0..2000u64 {
            let mut ctx = TickContext {
                tick: SimTick(tick),
                world: &mut world,
                entities: &mut entities,
                rng: scoped_rng(7, 1, SimTick(tick)),
                events: &mut events,
            };
            try_pick_up(&mut ctx, &mut mob);
            if mob.agent.carried.is_some() {
                picked = true;
                break;
            }
        }
        assert!(picked);
        assert_eq!(mob.agent.carried, Some(BLOCK_GRASS));
        let SimEvent::BlockTaken { cell, .. } = events[0].event else {
            panic!("expected a pick-up event");
        };
        assert_eq!(world.tile_at(cell), BLOCK_AIR);
    }
}
