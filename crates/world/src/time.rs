//! Deterministic simulation time and day/night cycle.
//!
//! The day phase feeds the sunlight hazard: undead mobs only burn while the
//! sun is above the horizon. All time advancement is tick-based so replays
//! see the same phase on the same tick.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use voxmob_core::SimTick;

/// Default day length (20 minutes real time at 20 TPS).
pub const TICKS_PER_DAY: u64 = 24_000;

/// Sun elevation (radians) above which exposed cells count as sunlit.
const DAYLIGHT_ELEVATION: f64 = 0.15;

/// Simulation time state tracking day/night cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current simulation tick.
    pub tick: SimTick,
    /// Ticks per in-game day.
    pub ticks_per_day: u64,
    /// Tick-of-day the clock started at, so scenarios can begin at noon.
    pub day_offset: u64,
}

impl SimTime {
    /// Create a new SimTime starting at tick 0 (midnight).
    pub fn new(ticks_per_day: u64) -> Self {
        Self {
            tick: SimTick::ZERO,
            ticks_per_day: ticks_per_day.max(1),
            day_offset: 0,
        }
    }

    /// Clock whose tick 0 falls at `time_of_day` (0.0 = midnight, 0.5 = noon).
    pub fn starting_at(ticks_per_day: u64, time_of_day: f64) -> Self {
        let mut time = Self::new(ticks_per_day);
        time.day_offset =
            (time_of_day.rem_euclid(1.0) * time.ticks_per_day as f64).floor() as u64;
        time
    }

    /// Advance time by one tick.
    pub fn advance(&mut self) {
        self.tick = self.tick.advance(1);
    }

    /// Current time of day as a fraction (0.0 = midnight, 0.5 = noon, 1.0 = next midnight).
    pub fn time_of_day(&self) -> f64 {
        let tick_in_day = (self.tick.0 + self.day_offset) % self.ticks_per_day;
        tick_in_day as f64 / self.ticks_per_day as f64
    }

    /// Sun elevation angle in radians (-π/2 at midnight, π/2 at noon).
    pub fn sun_elevation(&self) -> f64 {
        let angle = (self.time_of_day() - 0.25) * 2.0 * PI;
        (angle.sin() * PI / 2.0).clamp(-PI / 2.0, PI / 2.0)
    }

    /// Whether the sun is high enough to burn exposed mobs.
    pub fn is_daytime(&self) -> bool {
        self.sun_elevation() > DAYLIGHT_ELEVATION
    }
}

impl Default for SimTime {
    fn default() -> Self {
        Self::new(TICKS_PER_DAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_wraps_at_day_boundary() {
        let mut time = SimTime::new(100);
        assert_eq!(time.time_of_day(), 0.0);

        for _ in 0..50 {
            time.advance();
        }
        assert!((time.time_of_day() - 0.5).abs() < 0.01);

        for _ in 0..50 {
            time.advance();
        }
        assert!(time.time_of_day().abs() < 0.01);
    }

    #[test]
    fn sun_elevation_peaks_at_noon() {
        let time = SimTime::starting_at(TICKS_PER_DAY, 0.5);
        assert!((time.sun_elevation() - PI / 2.0).abs() < 0.1);
        assert!(time.is_daytime());
    }

    #[test]
    fn midnight_is_not_daytime() {
        let time = SimTime::default();
        assert!(!time.is_daytime());
    }

    #[test]
    fn offset_clock_reaches_dusk() {
        let mut time = SimTime::starting_at(1000, 0.7);
        assert!(time.is_daytime());
        for _ in 0..100 {
            time.advance();
        }
        // 0.8 of the day: sun below the horizon
        assert!(!time.is_daytime());
    }
}
