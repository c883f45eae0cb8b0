#![warn(missing_docs)]
//! Core primitives shared across the workspace.

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed tick type (20 TPS => 50 ms per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }

    /// Ticks elapsed since `earlier` (saturating at zero).
    pub fn since(self, earlier: SimTick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Stable handle for any simulated entity.
///
/// Handles are never reused within a simulation, so a stale handle simply
/// stops resolving once its entity is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Domain value used to scope per-entity randomness.
    pub fn rng_domain(self) -> u64 {
        // splitmix64 finaliser so neighbouring ids do not collide once XORed with the tick
        let mut z = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Helper to derive a reproducible RNG seeded by world + tick domains.
pub fn scoped_rng(world_seed: u64, domain: u64, tick: SimTick) -> StdRng {
    let seed = world_seed ^ domain ^ tick.0;
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn scoped_rng_is_reproducible() {
        let mut a = scoped_rng(42, EntityId(7).rng_domain(), SimTick(100));
        let mut b = scoped_rng(42, EntityId(7).rng_domain(), SimTick(100));
        for _ in 0..16 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }

    #[test]
    fn neighbouring_entities_get_distinct_streams() {
        // id 1 @ tick 2 and id 2 @ tick 1 would collide with a plain XOR
        let mut a = scoped_rng(0, EntityId(1).rng_domain(), SimTick(2));
        let mut b = scoped_rng(0, EntityId(2).rng_domain(), SimTick(1));
        assert_ne!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn tick_advance_and_since() {
        let start = SimTick::ZERO.advance(5);
        assert_eq!(start, SimTick(5));
        assert_eq!(start.advance(10).since(start), 10);
        assert_eq!(start.since(SimTick(9)), 0);
    }
}
