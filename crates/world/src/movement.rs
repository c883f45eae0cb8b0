//! Movement integrator: steering intent in, swept position and velocity out.
//!
//! One call per entity per tick. The medium (air, water, lava) is sampled
//! before the move and picks the acceleration and damping constants; the move
//! itself is clipped per axis against the solid cells it sweeps through.

use crate::agent::Steering;
use crate::blocks::Liquid;
use crate::entity::{Body, MoveFlags};
use crate::query::WorldQuery;
use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use voxmob_physics::sweep;

pub const GRAVITY: f64 = 0.08;
pub const AIR_DRAG_Y: f64 = 0.98;
pub const AIR_FRICTION: f64 = 0.91;
/// Block slipperiness (0.6) times air friction.
pub const GROUND_FRICTION: f64 = 0.6 * AIR_FRICTION;
pub const AIR_ACCELERATION: f64 = 0.02;
pub const LIQUID_ACCELERATION: f64 = 0.02;
pub const WATER_DRAG: f64 = 0.8;
pub const LAVA_DRAG: f64 = 0.5;
pub const LIQUID_GRAVITY: f64 = 0.02;
pub const JUMP_IMPULSE: f64 = 0.42;
pub const LIQUID_JUMP_IMPULSE: f64 = 0.04;
/// Vertical kick when a swimmer pushes against a ledge.
pub const LEDGE_CLIMB_VELOCITY: f64 = 0.3;
pub const VELOCITY_SNAP: f64 = 0.003;

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Ground acceleration for a surface with the given combined friction.
fn ground_acceleration(friction: f64) -> f64 {
    0.1 * (0.162_771_36 / (friction * friction * friction))
}

/// Liquid the body counts as swimming in (box shrunk vertically so feet
/// dangling in a puddle do not count).
pub fn swimming_medium(world: &dyn WorldQuery, body: &Body) -> Liquid {
    let probe = body.bb().inflate(DVec3::new(-0.001, -0.4, -0.001));
    if probe.min.y > probe.max.y {
        return world.liquid_in_box(body.bb());
    }
    world.liquid_in_box(&probe)
}

fn move_relative(body: &mut Body, strafe: f64, forward: f64, acceleration: f64) {
    let mut magnitude = (strafe * strafe + forward * forward).sqrt();
    if magnitude < 0.01 {
        return;
    }
    magnitude = magnitude.max(1.0);
    let scale = acceleration / magnitude;
    let (strafe, forward) = (strafe * scale, forward * scale);
    let (sin, cos) = body.yaw.sin_cos();
    body.velocity.x += strafe * cos - forward * sin;
    body.velocity.z += forward * cos + strafe * sin;
}

/// Advance `body` by one tick of `steering`. Returns the flags also stored on the body.
pub fn integrate(world: &dyn WorldQuery, body: &mut Body, steering: &Steering) -> MoveFlags {
    body.yaw = wrap_angle(body.yaw + steering.turn_delta);
    body.pitch = (body.pitch + steering.pitch_delta).clamp(-FRAC_PI_2, FRAC_PI_2);

    let medium = swimming_medium(world, body);
    let was_on_ground = body.on_ground();

    if steering.jump {
        if medium.is_liquid() {
            body.velocity.y += LIQUID_JUMP_IMPULSE;
        } else if was_on_ground {
            body.velocity.y = JUMP_IMPULSE;
        }
    }

    let friction = if was_on_ground {
        GROUND_FRICTION
    } else {
        AIR_FRICTION
    };
    let acceleration = match medium {
        Liquid::Water | Liquid::Lava => LIQUID_ACCELERATION,
        Liquid::None if was_on_ground => ground_acceleration(friction),
        Liquid::None => AIR_ACCELERATION,
    };
    move_relative(body, steering.strafe, steering.forward, acceleration);

    let requested = body.velocity;
    let start = body.position();
    let region = body.bb().expand_towards(requested);
    let obstacles = world.collision_boxes(&region);
    let result = sweep(body.bb(), requested, &obstacles);
    body.set_position(start + result.motion);
    body.add_walk_distance((result.motion.x.powi(2) + result.motion.z.powi(2)).sqrt());

    let mut flags = MoveFlags::empty();
    if result.blocked.y {
        flags |= MoveFlags::COLLIDED_VERTICALLY;
        if requested.y < 0.0 {
            flags |= MoveFlags::ON_GROUND;
        }
        body.velocity.y = 0.0;
    }
    if result.blocked.x {
        body.velocity.x = 0.0;
    }
    if result.blocked.z {
        body.velocity.z = 0.0;
    }
    if result.blocked_horizontally() {
        flags |= MoveFlags::COLLIDED_HORIZONTALLY;
    }

    match medium {
        Liquid::Water | Liquid::Lava => {
            flags |= if medium == Liquid::Water {
                MoveFlags::IN_WATER
            } else {
                MoveFlags::IN_LAVA
            };
            let drag = if medium == Liquid::Water {
                WATER_DRAG
            } else {
                LAVA_DRAG
            };
            body.velocity *= drag;
            body.velocity.y -= LIQUID_GRAVITY;
            if flags.contains(MoveFlags::COLLIDED_HORIZONTALLY) {
                let lifted = body.bb().offset(DVec3::new(
                    body.velocity.x,
                    body.velocity.y + 0.6 - (body.position().y - start.y),
                    body.velocity.z,
                ));
                if !world.aabb_collides_blocks(&lifted) && !world.aabb_intersects_liquid(&lifted) {
                    body.velocity.y = LEDGE_CLIMB_VELOCITY;
                }
            }
        }
        Liquid::None => {
            body.velocity.y = (body.velocity.y - GRAVITY) * AIR_DRAG_Y;
            body.velocity.x *= friction;
            body.velocity.z *= friction;
        }
    }

    for axis in 0..3 {
        if body.velocity[axis].abs() < VELOCITY_SNAP {
            body.velocity[axis] = 0.0;
        }
    }

    body.flags = flags;
    flags
}
