//! Pursuit navigators: straight chase and chase with local obstacle routing.
//!
//! [`LocalRouting`] chases directly while it can see the target. When the view
//! is blocked or the mob stops making progress it asks the micro-pathfinder for
//! a single step (a waypoint); if that fails it strafes sideways for a while
//! (a detour). The two never run together:
//!
//! * a live waypoint always wins over starting a detour;
//! * no search runs while a detour is active;
//! * after a detour ends, or a search fails, a short hold keeps the mob on a
//!   straight chase before the next search;
//! * regaining line of sight clears all of it.

use super::aim::face_point;
use super::wander::RUN_MULTIPLIER;
use super::{BehaviorState, Detour, Mode, Navigator, TargetInfo, TickContext, Waypoint};
use crate::agent::Mob;
use crate::events::SimEvent;
use crate::pathfinding::{local_first_step, LocalSearch};
use crate::profile::MobProfile;
use crate::query::{cell_floor_center, cell_of, WorldQuery};
use glam::DVec3;
use rand::Rng;
use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// Ticks a waypoint may be followed before it is abandoned.
pub const WAYPOINT_TTL: u32 = 40;
/// Horizontal distance at which a waypoint counts as reached.
pub const WAYPOINT_REACHED: f64 = 0.4;
/// Range a detour's length is rolled from.
pub const DETOUR_TICKS: RangeInclusive<u32> = 20..=40;
/// Straight-chase ticks after a detour ends or a search fails.
pub const SEARCH_HOLD_TICKS: u32 = 10;
/// Moving less than this from the anchor counts as no progress.
pub const STUCK_RADIUS: f64 = 0.25;
/// No-progress ticks before the mob is flagged stuck.
pub const STUCK_TICKS: u32 = 20;
/// Mobs this close to their target are never flagged stuck.
pub const STUCK_MIN_TARGET_DISTANCE: f64 = 2.5;
/// Target height advantage that makes the search favour climbing.
pub const ASCENT_BIAS_HEIGHT: f64 = 2.0;

/// Forward input for a chase at this tick's pace.
pub fn pursuit_speed(mob: &Mob, state: &BehaviorState, run_speed: f64) -> f64 {
    if mob.agent.cooldowns.running > 0 || state.hostile {
        run_speed * RUN_MULTIPLIER
    } else {
        run_speed
    }
}

/// Face the target and walk at it.
pub fn chase(mob: &mut Mob, state: &mut BehaviorState, target: &TargetInfo, speed: f64) {
    state.mode = Mode::Chase;
    face_point(mob, target.mid(), Mode::Chase.aim_multiplier());
    mob.agent.steering.forward = speed;
}

/// Walk toward the centre of `cell` at the waypoint aim rate.
pub fn walk_to_cell(mob: &mut Mob, state: &mut BehaviorState, cell: glam::IVec3, speed: f64) {
    state.mode = Mode::FollowWaypoint;
    let goal = cell_floor_center(cell);
    face_point(mob, goal + DVec3::new(0.0, mob.eye_height, 0.0), Mode::FollowWaypoint.aim_multiplier());
    mob.agent.steering.forward = speed;
}

/// Open feet and head cells over a solid floor; the micro-pathfinder's test.
pub fn standable(world: &dyn WorldQuery, cell: glam::IVec3) -> bool {
    world.is_passable(cell)
        && world.is_passable(cell + glam::IVec3::Y)
        && world.is_solid(cell - glam::IVec3::Y)
}

/// Whether the feet are within reach of `cell`'s centre.
pub fn reached_cell(mob: &Mob, cell: glam::IVec3) -> bool {
    let center = cell_floor_center(cell);
    mob.body.horizontal_distance_to(center) < WAYPOINT_REACHED
        && (mob.body.position().y - center.y).abs() <= 1.0
}

#[derive(Debug)]
pub struct DirectPursuit {
    run_speed: f64,
}

impl DirectPursuit {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            run_speed: profile.run_speed,
        }
    }
}

impl Navigator for DirectPursuit {
    fn approach(
        &mut self,
        _ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        target: &TargetInfo,
    ) {
        let speed = pursuit_speed(mob, state, self.run_speed);
        chase(mob, state, target, speed);
    }
}

#[derive(Debug)]
pub struct LocalRouting {
    run_speed: f64,
    search: LocalSearch,
}

impl LocalRouting {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            run_speed: profile.run_speed,
            search: LocalSearch::default(),
        }
    }

    /// Update the progress watchdog; returns true on the tick the mob becomes stuck.
    fn track_progress(mob: &Mob, state: &mut BehaviorState, target: &TargetInfo) -> bool {
        let position = mob.body.position();
        let tracker = &mut state.stuck;
        match tracker.anchor {
            Some(anchor) if anchor.distance(position) <= STUCK_RADIUS => tracker.ticks += 1,
            _ => {
                tracker.anchor = Some(position);
                tracker.ticks = 0;
                tracker.stuck = false;
            }
        }
        if tracker.ticks > STUCK_TICKS
            && mob.body.distance_to(target.position) > STUCK_MIN_TARGET_DISTANCE
        {
            tracker.ticks = 0;
            let newly = !tracker.stuck;
            tracker.stuck = true;
            return newly;
        }
        false
    }

    /// Strafe destination one block to the detour side drops more than a block.
    fn detour_drops(world: &dyn WorldQuery, mob: &Mob, side: i8) -> bool {
        let (sin, cos) = mob.body.yaw.sin_cos();
        let left = DVec3::new(cos, 0.0, sin);
        let probe = cell_of(mob.body.position() + left * f64::from(side) + DVec3::new(0.0, 0.01, 0.0));
        !world.is_solid(probe - glam::IVec3::Y) && !world.is_solid(probe - glam::IVec3::Y * 2)
    }

    fn search(
        &self,
        ctx: &mut TickContext<'_>,
        mob: &Mob,
        target: &TargetInfo,
    ) -> Option<glam::IVec3> {
        let search = LocalSearch {
            prefer_ascent: target.position.y - mob.body.position().y > ASCENT_BIAS_HEIGHT,
            ..self.search
        };
        let world: &dyn WorldQuery = &*ctx.world;
        local_first_step(
            mob.body.feet_cell(),
            target.cell(),
            &search,
            |cell| world.is_passable(cell),
            |cell| world.is_solid(cell),
        )
    }

    fn start_detour(ctx: &mut TickContext<'_>, mob: &Mob, state: &mut BehaviorState) {
        let side = if state.last_detour_side > 0 { -1 } else { 1 };
        let limit = ctx.rng.gen_range(DETOUR_TICKS);
        state.last_detour_side = side;
        state.detour = Some(Detour {
            side,
            elapsed: 0,
            limit,
        });
        debug!(mob = mob.id.0, side, limit, "detour started");
        ctx.emit(SimEvent::DetourStarted { mob: mob.id, side });
    }
}

impl Navigator for LocalRouting {
    fn approach(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        target: &TargetInfo,
    ) {
        let speed = pursuit_speed(mob, state, self.run_speed);
        let newly_stuck = Self::track_progress(mob, state, target);
        let visible = ctx.world.line_of_sight(mob.eye_position(), target.mid());

        if visible && !state.stuck.stuck {
            state.waypoint = None;
            state.detour = None;
            state.search_hold = 0;
            chase(mob, state, target, speed);
            return;
        }

        if newly_stuck {
            state.waypoint = None;
        }
        if let Some(waypoint) = state.waypoint {
            let blocked = !standable(&*ctx.world, waypoint.cell);
            if blocked {
                trace!(mob = mob.id.0, cell = ?waypoint.cell, "waypoint no longer walkable");
            }
            if blocked || waypoint.ttl == 0 || reached_cell(mob, waypoint.cell) {
                state.waypoint = None;
            } else {
                walk_to_cell(mob, state, waypoint.cell, speed);
                return;
            }
        }

        if let Some(mut detour) = state.detour {
            detour.elapsed += 1;
            if detour.elapsed >= detour.limit || Self::detour_drops(&*ctx.world, mob, detour.side) {
                trace!(mob = mob.id.0, elapsed = detour.elapsed, "detour over");
                state.detour = None;
                state.search_hold = SEARCH_HOLD_TICKS;
            } else {
                state.detour = Some(detour);
                state.mode = Mode::Detour;
                face_point(mob, target.mid(), Mode::Detour.aim_multiplier());
                mob.agent.steering.strafe = f64::from(detour.side) * speed;
                return;
            }
        }

        if state.search_hold > 0 {
            chase(mob, state, target, speed);
            return;
        }

        match self.search(ctx, mob, target) {
            Some(cell) => {
                state.waypoint = Some(Waypoint {
                    cell,
                    ttl: WAYPOINT_TTL,
                });
                debug!(mob = mob.id.0, ?cell, "waypoint set");
                ctx.emit(SimEvent::WaypointSet { mob: mob.id, cell });
                walk_to_cell(mob, state, cell, speed);
            }
            None => {
                state.search_hold = SEARCH_HOLD_TICKS;
                Self::start_detour(ctx, mob, state);
                state.mode = Mode::Detour;
                face_point(mob, target.mid(), Mode::Detour.aim_multiplier());
                mob.agent.steering.strafe = f64::from(state.last_detour_side) * speed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BLOCK_AIR, BLOCK_STONE};
    use crate::entity::{Body, Entity, Player};
    use crate::profile::MobKind;
    use crate::store::EntityStore;
    use crate::time::SimTime;
    use crate::voxel_world::VoxelWorld;
    use glam::IVec3;
    use voxmob_core::{scoped_rng, EntityId, SimTick};

    struct Arena {
        world: VoxelWorld,
        entities: EntityStore,
        events: Vec<crate::events::TimedEvent>,
        mob: Mob,
        target: TargetInfo,
        routing: LocalRouting,
        state: BehaviorState,
    }

    /// Zombie at the origin, player at x = 8.5 behind a wall at x = 4.
    fn walled_arena() -> Arena {
        let mut world = VoxelWorld::flat(1, 63, SimTime::default());
        world.fill(IVec3::new(4, 64, -2), IVec3::new(4, 66, 2), BLOCK_STONE);
        let mut entities = EntityStore::new();
        let player =
            entities.insert_with(|id| Entity::Player(Player::new(id, DVec3::new(8.5, 64.0, 0.5))));
        let target = TargetInfo::resolve(&entities, player).expect("player");
        let profile = MobKind::Zombie.default_profile();
        let body = Body::new(DVec3::new(0.5, 64.0, 0.5), profile.width, profile.height);
        Arena {
            world,
            entities,
            events: Vec::new(),
            mob: Mob::new(EntityId(100), MobKind::Zombie, body, &profile),
            target,
            routing: LocalRouting::new(&profile),
            state: BehaviorState::default(),
        }
    }

    impl Arena {
        /// Age timers the way the controller does, then run the navigator.
        fn tick(&mut self, tick: u64) {
            self.state.tick_timers();
            self.mob.agent.steering.halt();
            let mut ctx = TickContext {
                tick: SimTick(tick),
                world: &mut self.world,
                entities: &mut self.entities,
                rng: scoped_rng(5, 100, SimTick(tick)),
                events: &mut self.events,
            };
            self.routing
                .approach(&mut ctx, &mut self.mob, &mut self.state, &self.target);
        }

        fn waypoints_set(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e.event, SimEvent::WaypointSet { .. }))
                .count()
        }
    }

    #[test]
    fn wall_blocks_the_view() {
        let arena = walled_arena();
        assert!(!arena
            .world
            .line_of_sight(arena.mob.eye_position(), arena.target.mid()));
    }

    #[test]
    fn waypoint_turned_solid_is_dropped() {
        let mut arena = walled_arena();
        let blocked = IVec3::new(1, 64, 0);
        arena.state.waypoint = Some(Waypoint {
            cell: blocked,
            ttl: 30,
        });
        arena.world.fill(blocked, blocked + IVec3::Y, BLOCK_STONE);
        assert!(!standable(&arena.world, blocked));

        arena.tick(1);

        assert_ne!(arena.state.waypoint.map(|w| w.cell), Some(blocked));
    }

    #[test]
    fn expired_waypoint_is_not_followed() {
        let mut arena = walled_arena();
        let cell = IVec3::new(0, 64, 1);
        arena.state.waypoint = Some(Waypoint { cell, ttl: 2 });
        arena.state.search_hold = SEARCH_HOLD_TICKS;

        arena.tick(1);
        assert_eq!(arena.state.mode, Mode::FollowWaypoint);
        assert_eq!(arena.state.waypoint, Some(Waypoint { cell, ttl: 1 }));

        arena.tick(2);
        assert_eq!(arena.state.waypoint, None);
        assert_eq!(arena.state.mode, Mode::Chase);
        assert_eq!(arena.mob.agent.steering.strafe, 0.0);
        assert!(arena.mob.agent.steering.forward > 0.0);
        assert_eq!(arena.waypoints_set(), 0);
    }

    #[test]
    fn search_waits_out_the_hold() {
        let mut arena = walled_arena();
        arena.state.search_hold = SEARCH_HOLD_TICKS;

        for tick in 1..SEARCH_HOLD_TICKS {
            arena.tick(u64::from(tick));
            assert_eq!(arena.state.mode, Mode::Chase, "tick {tick}");
            assert!(arena.state.waypoint.is_none());
            assert!(arena.state.detour.is_none());
        }
        assert_eq!(arena.waypoints_set(), 0);

        arena.tick(u64::from(SEARCH_HOLD_TICKS));
        assert_eq!(arena.waypoints_set(), 1);
        assert_eq!(arena.state.mode, Mode::FollowWaypoint);
    }

    #[test]
    fn regained_sight_clears_routing_state() {
        let mut arena = walled_arena();
        arena.world.fill(IVec3::new(4, 64, -2), IVec3::new(4, 66, 2), BLOCK_AIR);
        arena.state.waypoint = Some(Waypoint {
            cell: IVec3::new(0, 64, 1),
            ttl: WAYPOINT_TTL,
        });
        arena.state.search_hold = SEARCH_HOLD_TICKS;

        arena.tick(1);

        assert_eq!(arena.state.mode, Mode::Chase);
        assert!(arena.state.waypoint.is_none());
        assert_eq!(arena.state.search_hold, 0);
    }
}
