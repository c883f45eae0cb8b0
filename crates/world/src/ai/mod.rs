//! Mob controllers assembled from orthogonal strategies.
//!
//! Every mob kind runs the same [`Controller`] pipeline; what differs is which
//! [`Targeting`], [`Navigator`], [`AttackResolver`] and [`HazardResponse`]
//! implementations its [`MobProfile`] selects. A tick runs, in order:
//!
//! 1. bookkeeping (pose history, cooldowns, TTLs) and death/despawn checks
//! 2. hurt reaction and dropping of dead targets
//! 3. environmental hazards (first one that handles the tick wins)
//! 4. target validation and acquisition
//! 5. idle behaviour, or combat hazards, navigation and attack
//! 6. jump triggers and separation pushes

pub mod aim;
pub mod attack;
pub mod carry;
pub mod dodge;
pub mod hazard;
pub mod navigation;
pub mod route;
pub mod targeting;
pub mod teleport;
pub mod wander;

use crate::agent::{Mob, DEATH_TICKS};
use crate::entity::Entity;
use crate::events::{SimEvent, TimedEvent};
use crate::profile::{AttackKind, HazardKind, MobProfile, NavigationKind, TargetingKind};
use crate::query::WorldQuery;
use crate::store::EntityStore;
use glam::{DVec3, IVec3};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use voxmob_core::{EntityId, SimTick};
use voxmob_physics::Aabb;

/// Everything a controller may read or mutate besides the mob itself.
pub struct TickContext<'a> {
    /// Tick being simulated; stamped on every emitted event.
    pub tick: SimTick,
    /// Blocks, liquids and daylight; writable so mobs can carry blocks.
    pub world: &'a mut dyn WorldQuery,
    /// Every other entity. The ticking mob has been taken out of it.
    pub entities: &'a mut EntityStore,
    /// Scoped to this mob and tick.
    pub rng: StdRng,
    pub events: &'a mut Vec<TimedEvent>,
}

impl TickContext<'_> {
    /// Record `event` at the current tick.
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(TimedEvent {
            tick: self.tick,
            event,
        });
    }
}

/// Discrete behaviour mode, mostly for aim rate and observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No target; random walk or panic.
    #[default]
    Wander,
    /// Walking straight at the target.
    Chase,
    /// An attack landed this tick.
    Attack,
    /// Strafing sideways around an obstacle.
    Detour,
    /// Walking to a waypoint or route node.
    FollowWaypoint,
    /// Just teleported or dodged.
    Evade,
}

impl Mode {
    /// Scale applied to the base aim step.
    pub fn aim_multiplier(self) -> f64 {
        match self {
            Mode::Wander => 0.5,
            Mode::Chase | Mode::Attack => 1.0,
            Mode::Detour | Mode::FollowWaypoint | Mode::Evade => 3.0,
        }
    }
}

/// Micro-path step the mob is walking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Feet cell to walk to.
    pub cell: IVec3,
    /// Ticks left before the waypoint is abandoned.
    pub ttl: u32,
}

/// Timed sideways strafe used when no waypoint exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detour {
    /// +1 strafes left, -1 right.
    pub side: i8,
    pub elapsed: u32,
    /// Ticks after which the detour ends on its own.
    pub limit: u32,
}

/// Planned A* route around liquids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Standing cells from the mob's start cell to the goal.
    pub nodes: Vec<IVec3>,
    /// Index of the node being walked to.
    pub next: usize,
    pub ttl: u32,
}

impl Route {
    /// Node being walked to, `None` once the goal has been passed.
    pub fn current(&self) -> Option<IVec3> {
        self.nodes.get(self.next).copied()
    }
}

/// Wander steering memory that decays between re-rolls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WanderState {
    pub forward: f64,
    pub strafe: f64,
    pub yaw_velocity: f64,
}

/// Progress watchdog used while chasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StuckTracker {
    /// Position progress is measured from.
    pub anchor: Option<DVec3>,
    /// Ticks spent within [`navigation::STUCK_RADIUS`] of the anchor.
    pub ticks: u32,
    /// Set once the mob stalled; cleared when it moves away from the anchor.
    pub stuck: bool,
}

/// Controller-owned behaviour state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorState {
    pub mode: Mode,
    /// At most one of `waypoint` and `detour` is live.
    pub waypoint: Option<Waypoint>,
    pub detour: Option<Detour>,
    pub route: Option<Route>,
    /// Aggression gate for perception-triggered mobs.
    pub hostile: bool,
    pub wander: WanderState,
    pub stuck: StuckTracker,
    /// Ticks before another local search may start.
    pub search_hold: u32,
    /// Side of the most recent detour.
    pub last_detour_side: i8,
    /// Attacker to run from while panicking.
    pub flee_from: Option<EntityId>,
}

impl BehaviorState {
    fn tick_timers(&mut self) {
        self.search_hold = self.search_hold.saturating_sub(1);
        if let Some(waypoint) = &mut self.waypoint {
            waypoint.ttl = waypoint.ttl.saturating_sub(1);
        }
        if let Some(route) = &mut self.route {
            route.ttl = route.ttl.saturating_sub(1);
        }
    }

    /// Forget every pursuit artefact (target lost or changed).
    pub fn clear_pursuit(&mut self) {
        self.waypoint = None;
        self.detour = None;
        self.route = None;
        self.stuck = StuckTracker::default();
        self.search_hold = 0;
    }
}

/// Snapshot of the current target, resolved once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub id: EntityId,
    pub position: DVec3,
    pub bb: Aabb,
    pub eye: DVec3,
    pub look: DVec3,
    pub velocity: DVec3,
}

impl TargetInfo {
    /// Look up `id`, returning `None` for missing, removed or dead entities.
    pub fn resolve(entities: &EntityStore, id: EntityId) -> Option<Self> {
        let entity = entities.get(id)?;
        if !entity.is_alive() {
            return None;
        }
        let body = entity.body();
        let eye = match entity {
            Entity::Player(player) => player.eye_position(),
            Entity::Mob(mob) => mob.eye_position(),
            _ => body.mid_position(),
        };
        Some(Self {
            id,
            position: body.position(),
            bb: *body.bb(),
            eye,
            look: body.look(),
            velocity: body.velocity,
        })
    }

    /// Point halfway up the target box.
    pub fn mid(&self) -> DVec3 {
        DVec3::new(self.position.x, (self.bb.min.y + self.bb.max.y) * 0.5, self.position.z)
    }

    /// Feet cell of the target.
    pub fn cell(&self) -> IVec3 {
        crate::query::cell_of(self.position + DVec3::new(0.0, 0.01, 0.0))
    }
}

/// Whether a hazard consumed the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardOutcome {
    /// Nothing to do; later phases run as usual.
    Clear,
    /// The response steered or moved the mob and the tick ends here.
    Handled,
}

/// When a hazard response is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardPhase {
    /// Before targeting, every tick.
    Environment,
    /// After targeting, only while a target is bound and the mob is not calm.
    Combat,
}

/// Reaction to a danger the mob is in or about to be in.
pub trait HazardResponse: fmt::Debug {
    /// Where in the tick this response is consulted.
    fn phase(&self) -> HazardPhase;

    /// Check for the hazard and react to it.
    fn respond(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
    ) -> HazardOutcome;
}

/// Decides who, if anyone, the mob is after.
pub trait Targeting: fmt::Debug {
    /// React to the damage recorded since the last tick.
    fn on_hurt(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        source: crate::agent::DamageSource,
    );

    /// Drop invalid targets and bind new ones.
    fn update(&mut self, ctx: &mut TickContext<'_>, mob: &mut Mob, state: &mut BehaviorState);

    /// Extra idle behaviour; returns true when it replaced wandering this tick.
    fn idle(
        &mut self,
        _ctx: &mut TickContext<'_>,
        _mob: &mut Mob,
        _state: &mut BehaviorState,
    ) -> bool {
        false
    }
}

/// Moves a mob with a bound target toward it.
pub trait Navigator: fmt::Debug {
    /// Steer toward `target`, writing the mob's steering.
    fn approach(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        target: &TargetInfo,
    );
}

/// Decides whether and how the mob hurts its target.
pub trait AttackResolver: fmt::Debug {
    /// Attempt an attack this tick; returns true when one was made.
    fn try_attack(
        &mut self,
        ctx: &mut TickContext<'_>,
        mob: &mut Mob,
        state: &mut BehaviorState,
        target: &TargetInfo,
    ) -> bool;
}

/// Generic mob controller.
#[derive(Debug)]
pub struct Controller {
    profile: MobProfile,
    pub state: BehaviorState,
    hazards: Vec<Box<dyn HazardResponse>>,
    targeting: Box<dyn Targeting>,
    navigator: Box<dyn Navigator>,
    attack: Box<dyn AttackResolver>,
}

impl Controller {
    /// Assemble the strategies named by `profile`.
    pub fn from_profile(profile: MobProfile) -> Self {
        let hazards = profile
            .hazards
            .iter()
            .map(|kind| -> Box<dyn HazardResponse> {
                match kind {
                    HazardKind::Submersion => Box::new(hazard::SubmersionEscape::new(&profile)),
                    HazardKind::Sunlight => Box::new(hazard::SunlightResponse::new(&profile)),
                    HazardKind::ProjectileDodge => Box::new(dodge::ProjectileDodge::new(&profile)),
                }
            })
            .collect();
        let targeting: Box<dyn Targeting> = match profile.targeting {
            TargetingKind::None => Box::new(targeting::Passive),
            TargetingKind::NearestPlayer => Box::new(targeting::NearestPlayer::new(&profile)),
            TargetingKind::Gaze => Box::new(targeting::Gaze::new(&profile)),
        };
        let navigator: Box<dyn Navigator> = match profile.navigation {
            NavigationKind::Direct => Box::new(navigation::DirectPursuit::new(&profile)),
            NavigationKind::LocalRouting => Box::new(navigation::LocalRouting::new(&profile)),
            NavigationKind::HazardAware => Box::new(route::HazardAwareApproach::new(&profile)),
        };
        let attack: Box<dyn AttackResolver> = match profile.attack {
            AttackKind::None => Box::new(attack::NoAttack),
            AttackKind::Melee => Box::new(attack::Melee::new(&profile)),
            AttackKind::Ranged => Box::new(attack::Ranged::new(&profile)),
            AttackKind::CapsuleMelee => Box::new(attack::CapsuleMelee::new(&profile)),
        };
        Self {
            profile,
            state: BehaviorState::default(),
            hazards,
            targeting,
            navigator,
            attack,
        }
    }

    /// Tuning this controller was built from.
    pub fn profile(&self) -> &MobProfile {
        &self.profile
    }

    /// Run one tick of behaviour, leaving the result in `mob.agent.steering`.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>, mob: &mut Mob) {
        mob.body.begin_tick();
        mob.agent.cooldowns.tick();
        mob.agent.steering.halt();
        self.state.tick_timers();

        if mob.is_dying() {
            mob.agent.death_ticks += 1;
            if mob.agent.death_ticks >= DEATH_TICKS {
                mob.removed = true;
                ctx.emit(SimEvent::Died { id: mob.id });
            }
            return;
        }

        if !mob.agent.persistent && wander::should_despawn(ctx, mob) {
            debug!(mob = mob.id.0, kind = %mob.kind, "despawning idle mob");
            mob.removed = true;
            ctx.emit(SimEvent::Despawned { mob: mob.id });
            return;
        }

        if let Some(source) = mob.agent.pending_hurt.take() {
            self.targeting.on_hurt(ctx, mob, &mut self.state, source);
        }
        // environment hazards may end the tick before targeting runs
        targeting::drop_dead_target(ctx, mob, &mut self.state);

        for hazard in self
            .hazards
            .iter_mut()
            .filter(|h| h.phase() == HazardPhase::Environment)
        {
            if hazard.respond(ctx, mob, &mut self.state) == HazardOutcome::Handled {
                return;
            }
        }

        self.targeting.update(ctx, mob, &mut self.state);
        let target = mob
            .agent
            .target
            .and_then(|id| TargetInfo::resolve(ctx.entities, id));

        match target {
            None => {
                mob.agent.target = None;
                self.state.clear_pursuit();
                self.state.mode = Mode::Wander;
                if !self.targeting.idle(ctx, mob, &mut self.state) {
                    wander::wander(ctx, mob, &mut self.state, self.profile.run_speed);
                }
            }
            Some(target) => {
                let calm = mob.agent.cooldowns.calm > 0;
                if !calm {
                    for hazard in self
                        .hazards
                        .iter_mut()
                        .filter(|h| h.phase() == HazardPhase::Combat)
                    {
                        if hazard.respond(ctx, mob, &mut self.state) == HazardOutcome::Handled {
                            return;
                        }
                    }
                }
                self.navigator
                    .approach(ctx, mob, &mut self.state, &target);
                if !calm && self.attack.try_attack(ctx, mob, &mut self.state, &target) {
                    self.state.mode = Mode::Attack;
                }
            }
        }

        wander::apply_jump_triggers(ctx, mob, &self.state);
        wander::push_neighbours(ctx, mob);
    }
}
