//! Bearing math and rate-limited facing.

use crate::agent::Mob;
use crate::movement::wrap_angle;
use glam::DVec3;

/// Base aim step per tick before the mode multiplier.
pub const AIM_STEP: f64 = 10.0 * std::f64::consts::PI / 180.0;

/// Yaw that faces from `from` toward `to`.
pub fn yaw_toward(from: DVec3, to: DVec3) -> f64 {
    let d = to - from;
    (-d.x).atan2(d.z)
}

/// Pitch that looks from `from` toward `to` (positive is down).
pub fn pitch_toward(from: DVec3, to: DVec3) -> f64 {
    let d = to - from;
    let horizontal = (d.x * d.x + d.z * d.z).sqrt();
    -d.y.atan2(horizontal)
}

/// Signed step from `current` toward `goal`, clamped to `max_step`.
pub fn approach_angle(current: f64, goal: f64, max_step: f64) -> f64 {
    wrap_angle(goal - current).clamp(-max_step, max_step)
}

/// Turn the mob's steering toward `point` at `multiplier` times the base rate.
pub fn face_point(mob: &mut Mob, point: DVec3, multiplier: f64) {
    let step = AIM_STEP * multiplier;
    let eye = mob.eye_position();
    mob.agent.steering.turn_delta =
        approach_angle(mob.body.yaw, yaw_toward(mob.body.position(), point), step);
    mob.agent.steering.pitch_delta = approach_angle(mob.body.pitch, pitch_toward(eye, point), step);
}

/// Turn toward an absolute yaw, relaxing pitch.
pub fn face_yaw(mob: &mut Mob, yaw: f64, multiplier: f64) {
    let step = AIM_STEP * multiplier;
    mob.agent.steering.turn_delta = approach_angle(mob.body.yaw, yaw, step);
    relax_pitch(mob);
}

pub fn relax_pitch(mob: &mut Mob) {
    mob.agent.steering.pitch_delta = approach_angle(mob.body.pitch, 0.0, AIM_STEP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn yaw_matches_heading_convention() {
        let origin = DVec3::ZERO;
        assert!(yaw_toward(origin, DVec3::Z).abs() < 1e-12);
        assert!((yaw_toward(origin, DVec3::X) + FRAC_PI_2).abs() < 1e-12);
        assert!((yaw_toward(origin, -DVec3::X) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn pitch_is_positive_looking_down() {
        let from = DVec3::new(0.0, 2.0, 0.0);
        assert!(pitch_toward(from, DVec3::new(0.0, 0.0, 2.0)) > 0.0);
        assert!(pitch_toward(from, DVec3::new(0.0, 4.0, 2.0)) < 0.0);
    }

    #[test]
    fn approach_takes_short_way_round() {
        let step = approach_angle(PI - 0.1, -PI + 0.1, 1.0);
        assert!((step - 0.2).abs() < 1e-12);
        assert_eq!(approach_angle(0.0, 2.0, 0.5), 0.5);
        assert_eq!(approach_angle(0.0, -2.0, 0.5), -0.5);
    }
}
