//! Liquid-avoiding approach: lookahead, dry-goal A* routing and a teleport
//! fallback when no dry route exists.

use super::navigation::{chase, pursuit_speed, reached_cell, walk_to_cell};
use super::teleport::{commit_teleport, placement_is_safe, sample_landing, TELEPORT_COOLDOWN};
use super::{BehaviorState, Mode, Navigator, Route, TargetInfo, TickContext};
use crate::agent::Mob;
use crate::events::{SimEvent, TeleportReason};
use crate::pathfinding::astar_path_3d;
use crate::profile::MobProfile;
use crate::query::{cell_floor_center, cell_of, WorldQuery};
use crate::store::EntityStore;
use glam::{DVec3, IVec3};
use tracing::debug;
use voxmob_core::EntityId;

/// Blocks ahead checked for liquid on the way to the target.
pub const LOOKAHEAD_STEPS: u32 = 3;
/// Ring radius searched around the target for a dry goal cell.
pub const DRY_GOAL_RADIUS: i32 = 4;
pub const ROUTE_MAX_EXPANSIONS: usize = 2000;
/// Ticks a planned route is followed before replanning.
pub const ROUTE_TTL: u32 = 80;
/// Box around the target searched by the approach teleport.
pub const APPROACH_TELEPORT_RANGE: i32 = 4;
const APPROACH_TELEPORT_SAMPLES: usize = 16;

/// Standing test used for both goal selection and route nodes.
struct Placement<'w> {
    world: &'w dyn WorldQuery,
    entities: &'w EntityStore,
    width: f64,
    height: f64,
    ignore: [EntityId; 1],
}

impl Placement<'_> {
    fn allows(&self, cell: IVec3) -> bool {
        placement_is_safe(
            self.world,
            self.entities,
            cell_floor_center(cell),
            self.width,
            self.height,
            &self.ignore,
        )
    }

    /// Closest dry standing cell around `center`, scanning rings outward.
    fn dry_goal(&self, center: IVec3) -> Option<IVec3> {
        for radius in 0..=DRY_GOAL_RADIUS {
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs().max(dz.abs()) != radius {
                        continue;
                    }
                    for dy in [0, 1, -1] {
                        let cell = center + IVec3::new(dx, dy, dz);
                        if self.allows(cell) {
                            return Some(cell);
                        }
                    }
                }
            }
        }
        None
    }
}

/// Whether walking 1..=3 blocks toward the target steps into or over liquid.
pub fn liquid_ahead(world: &dyn WorldQuery, from: DVec3, toward: DVec3) -> bool {
    let delta = DVec3::new(toward.x - from.x, 0.0, toward.z - from.z);
    let distance = delta.length();
    if distance < 1e-6 {
        return false;
    }
    let heading = delta / distance;
    (1..=LOOKAHEAD_STEPS)
        .map(f64::from)
        .take_while(|&step| step <= distance + 1.0)
        .any(|step| {
            let cell = cell_of(from + heading * step + DVec3::new(0.0, 0.01, 0.0));
            world.liquid_at(cell).is_liquid() || world.liquid_at(cell - IVec3::Y).is_liquid()
        })
}

#[derive(Debug)]
pub struct HazardAwareApproach {
    run_speed: f64,
    width: f64,
    height: f64,
}

impl HazardAwareApproach {
    pub fn new(profile: &MobProfile) -> Self {
        Self {
            run_speed: profile.run_speed,
            width: profile.width,
            height: profile.height,
        }
    }

    fn placement<'c>(&self, ctx: &'c TickContext<'_>, target: &TargetInfo) -> Placement<'c> {
        Placement {
            world: &*ctx.world,
            entities: &*ctx.entities,
            width: self.width,
            height: self.height,
            ignore: [target.id],
        }
    }

    fn plan(&self, ctx: &TickContext<'_>, mob: &Mob, target: &TargetInfo) -> Option<Route> {
        let placement = self.placement(ctx, target);
        let goal = placement.dry_goal(target.cell())?;
        let nodes = astar_path_3d(
            mob.body.feet_cell(),
            goal,
            |cell| placement.allows(cell),
            1,
            ROUTE_MAX_EXPANSIONS,
        )?;
        (nodes.len() > 1).then_some(Route {
            nodes,
            next: 1,
            ttl: ROUTE_TTL,
        })
    }

    /// Follow the current route; returns false once it is finished, stale or
    /// its next node can no longer be stood on.
    fn follow(
        &self,
        ctx: &TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        target: &TargetInfo,
        speed: f64,
    ) -> bool {
        let Some(route) = &mut state.route else {
            return false;
        };
        if route.ttl == 0 {
            state.route = None;
            return false;
        }
        while let Some(node) = route.current() {
            if !reached_cell(mob, node) {
                break;
            }
            route.next += 1;
        }
        match route.current() {
            Some(node) if self.placement(ctx, target).allows(node) => {
                walk_to_cell(mob, state, node, speed);
                true
            }
            Some(node) => {
                debug!(mob = mob.id.0, ?node, "route blocked");
                state.route = None;
                false
            }
            None => {
                state.route = None;
                false
            }
        }
    }
}

impl Navigator for HazardAwareApproach {
    fn approach(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        target: &TargetInfo,
    ) {
        let speed = pursuit_speed(mob, state, self.run_speed);
        if self.follow(ctx, mob, state, target, speed) {
            return;
        }
        if !liquid_ahead(&*ctx.world, mob.body.position(), target.position) {
            chase(mob, state, target, speed);
            return;
        }

        if let Some(route) = self.plan(ctx, mob, target) {
            if let Some(&goal) = route.nodes.last() {
                debug!(mob = mob.id.0, ?goal, length = route.nodes.len(), "route planned");
                ctx.emit(SimEvent::RoutePlanned {
                    mob: mob.id,
                    goal,
                    length: route.nodes.len(),
                });
            }
            state.route = Some(route);
            self.follow(ctx, mob, state, target, speed);
            return;
        }

        // no dry route: hold at the shore facing the target
        state.mode = Mode::Chase;
        super::aim::face_point(mob, target.mid(), Mode::Chase.aim_multiplier());
        if mob.agent.cooldowns.teleport > 0 {
            return;
        }
        mob.agent.cooldowns.teleport = TELEPORT_COOLDOWN;
        let landing = sample_landing(
            ctx,
            mob,
            target.position,
            APPROACH_TELEPORT_RANGE,
            2,
            APPROACH_TELEPORT_SAMPLES,
            |_, feet| feet.distance(target.position) <= f64::from(APPROACH_TELEPORT_RANGE),
        );
        if let Some(to) = landing {
            commit_teleport(ctx, mob, state, to, TeleportReason::Approach);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BLOCK_STONE, BLOCK_WATER};
    use crate::entity::{Body, Entity, Player};
    use crate::events::TimedEvent;
    use crate::profile::MobKind;
    use crate::time::SimTime;
    use crate::voxel_world::VoxelWorld;
    use voxmob_core::{scoped_rng, SimTick};

    struct Pursuit {
        world: VoxelWorld,
        entities: EntityStore,
        events: Vec<TimedEvent>,
        mob: Mob,
        target: TargetInfo,
        approach: HazardAwareApproach,
        state: BehaviorState,
    }

    /// Enderman at the origin already walking a straight route toward a
    /// player at x = 8.5.
    fn routed_pursuit(ttl: u32) -> Pursuit {
        let world = VoxelWorld::flat(1, 63, SimTime::default());
        let mut entities = EntityStore::new();
        let player =
            entities.insert_with(|id| Entity::Player(Player::new(id, DVec3::new(8.5, 64.0, 0.5))));
        let target = TargetInfo::resolve(&entities, player).expect("player");
        let profile = MobKind::Enderman.default_profile();
        let body = Body::new(DVec3::new(0.5, 64.0, 0.5), profile.width, profile.height);
        let state = BehaviorState {
            route: Some(Route {
                nodes: (0..4).map(|x| IVec3::new(x, 64, 0)).collect(),
                next: 1,
                ttl,
            }),
            ..BehaviorState::default()
        };
        Pursuit {
            world,
            entities,
            events: Vec::new(),
            mob: Mob::new(EntityId(100), MobKind::Enderman, body, &profile),
            target,
            approach: HazardAwareApproach::new(&profile),
            state,
        }
    }

    impl Pursuit {
        fn tick(&mut self, tick: u64) {
            self.state.tick_timers();
            self.mob.agent.steering.halt();
            let mut ctx = TickContext {
                tick: SimTick(tick),
                world: &mut self.world,
                entities: &mut self.entities,
                rng: scoped_rng(3, 100, SimTick(tick)),
                events: &mut self.events,
            };
            self.approach
                .approach(&mut ctx, &mut self.mob, &mut self.state, &self.target);
        }
    }

    #[test]
    fn route_is_followed_while_standable() {
        let mut pursuit = routed_pursuit(ROUTE_TTL);
        pursuit.tick(1);
        assert_eq!(pursuit.state.mode, Mode::FollowWaypoint);
        assert_eq!(
            pursuit.state.route.as_ref().and_then(Route::current),
            Some(IVec3::new(1, 64, 0))
        );
    }

    #[test]
    fn blocked_route_node_drops_the_route() {
        let mut pursuit = routed_pursuit(ROUTE_TTL);
        pursuit
            .world
            .fill(IVec3::new(1, 64, 0), IVec3::new(1, 64, 0), BLOCK_STONE);

        pursuit.tick(1);

        assert!(pursuit.state.route.is_none());
        assert_eq!(pursuit.state.mode, Mode::Chase);
    }

    #[test]
    fn expired_route_is_dropped() {
        let mut pursuit = routed_pursuit(2);

        pursuit.tick(1);
        assert_eq!(pursuit.state.mode, Mode::FollowWaypoint);
        assert_eq!(pursuit.state.route.as_ref().map(|r| r.ttl), Some(1));

        pursuit.tick(2);
        assert!(pursuit.state.route.is_none());
        assert_eq!(pursuit.state.mode, Mode::Chase);
    }

    #[test]
    fn lookahead_sees_pool_between_mob_and_target() {
        let mut world = VoxelWorld::flat(1, 63, SimTime::default());
        world.fill(IVec3::new(3, 63, -2), IVec3::new(4, 63, 2), BLOCK_WATER);
        let from = DVec3::new(1.5, 64.0, 0.5);
        assert!(liquid_ahead(&world, from, DVec3::new(10.5, 64.0, 0.5)));
        assert!(!liquid_ahead(&world, from, DVec3::new(-10.5, 64.0, 0.5)));
    }

    #[test]
    fn dry_goal_skips_flooded_target_cell() {
        let mut world = VoxelWorld::flat(1, 63, SimTime::default());
        world.fill(IVec3::new(5, 64, 0), IVec3::new(5, 64, 0), BLOCK_WATER);
        let entities = EntityStore::new();
        let placement = Placement {
            world: &world,
            entities: &entities,
            width: 0.6,
            height: 2.9,
            ignore: [EntityId(99)],
        };
        let center = IVec3::new(5, 64, 0);
        let goal = placement.dry_goal(center).expect("dry ring cell");
        let offset = goal - center;
        assert_eq!(offset.x.abs().max(offset.z.abs()), 1);
    }
}
