#![warn(missing_docs)]
//! Physics primitives (AABB, swept collisions, segment tests).

use glam::{BVec3, DVec3, IVec3};

/// Distance below which two faces are treated as touching rather than overlapping.
pub const COLLISION_EPSILON: f64 = 1.0e-7;

/// Axis-aligned bounding box used for collisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z).
    pub min: DVec3,
    /// Maximum corner (x, y, z).
    pub max: DVec3,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y && min.z <= max.z);
        Self { min, max }
    }

    /// Box of a body standing at `feet` (bottom-centre) with the given footprint and height.
    pub fn from_feet(feet: DVec3, width: f64, height: f64) -> Self {
        let half = width * 0.5;
        Self {
            min: DVec3::new(feet.x - half, feet.y, feet.z - half),
            max: DVec3::new(feet.x + half, feet.y + height, feet.z + half),
        }
    }

    /// Unit box occupying the voxel cell `cell`.
    pub fn cell(cell: IVec3) -> Self {
        let min = cell.as_dvec3();
        Self {
            min,
            max: min + DVec3::ONE,
        }
    }

    /// Translated copy.
    pub fn offset(&self, delta: DVec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Grow the box in the direction of `motion` so it covers the whole sweep.
    pub fn expand_towards(&self, motion: DVec3) -> Self {
        Self {
            min: self.min + motion.min(DVec3::ZERO),
            max: self.max + motion.max(DVec3::ZERO),
        }
    }

    /// Grow (or shrink, for negative values) symmetrically on every axis.
    pub fn inflate(&self, amount: DVec3) -> Self {
        Self {
            min: self.min - amount,
            max: self.max + amount,
        }
    }

    /// Centre point.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent per axis.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Tests for a real overlap; boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x - COLLISION_EPSILON
            && self.max.x > other.min.x + COLLISION_EPSILON
            && self.min.y < other.max.y - COLLISION_EPSILON
            && self.max.y > other.min.y + COLLISION_EPSILON
            && self.min.z < other.max.z - COLLISION_EPSILON
            && self.max.z > other.min.z + COLLISION_EPSILON
    }

    /// Whether `point` lies inside or on the box.
    pub fn contains_point(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Closest point on (or in) the box to `point`.
    pub fn closest_point(&self, point: DVec3) -> DVec3 {
        point.clamp(self.min, self.max)
    }

    /// Euclidean distance from `point` to the box (zero when inside).
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.closest_point(point).distance(point)
    }

    /// Slab test for the segment `from -> to`.
    ///
    /// Returns the entry parameter in `[0, 1]` along the segment when it touches the box.
    pub fn segment_entry(&self, from: DVec3, to: DVec3) -> Option<f64> {
        let dir = to - from;
        let mut t_min = 0.0_f64;
        let mut t_max = 1.0_f64;

        for axis in 0..3 {
            let origin = from[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < f64::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    /// Voxel cells the box overlaps (touching faces excluded).
    pub fn cells(&self) -> impl Iterator<Item = IVec3> {
        let lo = (self.min + DVec3::splat(COLLISION_EPSILON)).floor().as_ivec3();
        let hi = (self.max - DVec3::splat(COLLISION_EPSILON)).floor().as_ivec3();
        (lo.y..=hi.y).flat_map(move |y| {
            (lo.z..=hi.z).flat_map(move |z| (lo.x..=hi.x).map(move |x| IVec3::new(x, y, z)))
        })
    }

    /// Clip a movement along X of the box `moving` so it stops at this obstacle.
    pub fn clip_x_offset(&self, moving: &Aabb, mut dx: f64) -> f64 {
        if !self.overlaps_on(moving, 1) || !self.overlaps_on(moving, 2) {
            return dx;
        }
        if dx > 0.0 && moving.max.x <= self.min.x + COLLISION_EPSILON {
            dx = dx.min(self.min.x - moving.max.x);
        } else if dx < 0.0 && moving.min.x >= self.max.x - COLLISION_EPSILON {
            dx = dx.max(self.max.x - moving.min.x);
        }
        dx
    }

    /// Clip a movement along Y of the box `moving` so it stops at this obstacle.
    pub fn clip_y_offset(&self, moving: &Aabb, mut dy: f64) -> f64 {
        if !self.overlaps_on(moving, 0) || !self.overlaps_on(moving, 2) {
            return dy;
        }
        if dy > 0.0 && moving.max.y <= self.min.y + COLLISION_EPSILON {
            dy = dy.min(self.min.y - moving.max.y);
        } else if dy < 0.0 && moving.min.y >= self.max.y - COLLISION_EPSILON {
            dy = dy.max(self.max.y - moving.min.y);
        }
        dy
    }

    /// Clip a movement along Z of the box `moving` so it stops at this obstacle.
    pub fn clip_z_offset(&self, moving: &Aabb, mut dz: f64) -> f64 {
        if !self.overlaps_on(moving, 0) || !self.overlaps_on(moving, 1) {
            return dz;
        }
        if dz > 0.0 && moving.max.z <= self.min.z + COLLISION_EPSILON {
            dz = dz.min(self.min.z - moving.max.z);
        } else if dz < 0.0 && moving.min.z >= self.max.z - COLLISION_EPSILON {
            dz = dz.max(self.max.z - moving.min.z);
        }
        dz
    }

    fn overlaps_on(&self, other: &Aabb, axis: usize) -> bool {
        other.max[axis] > self.min[axis] + COLLISION_EPSILON
            && other.min[axis] < self.max[axis] - COLLISION_EPSILON
    }
}

/// Outcome of sweeping a box through a set of static obstacles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// Motion that was actually applied.
    pub motion: DVec3,
    /// Axes on which the requested motion was cut short.
    pub blocked: BVec3,
}

impl Sweep {
    /// Whether X or Z motion was clipped.
    pub fn blocked_horizontally(&self) -> bool {
        self.blocked.x || self.blocked.z
    }
}

/// Move `aabb` by `motion`, clipping per axis (Y first, then X, then Z) against `obstacles`.
///
/// `obstacles` should cover at least the volume returned by
/// [`Aabb::expand_towards`] for the same motion.
pub fn sweep(aabb: &Aabb, motion: DVec3, obstacles: &[Aabb]) -> Sweep {
    let mut moved = *aabb;

    let mut dy = motion.y;
    for obstacle in obstacles {
        dy = obstacle.clip_y_offset(&moved, dy);
    }
    moved = moved.offset(DVec3::new(0.0, dy, 0.0));

    let mut dx = motion.x;
    for obstacle in obstacles {
        dx = obstacle.clip_x_offset(&moved, dx);
    }
    moved = moved.offset(DVec3::new(dx, 0.0, 0.0));

    let mut dz = motion.z;
    for obstacle in obstacles {
        dz = obstacle.clip_z_offset(&moved, dz);
    }

    let applied = DVec3::new(dx, dy, dz);
    Sweep {
        motion: applied,
        blocked: BVec3::new(dx != motion.x, dy != motion.y, dz != motion.z),
    }
}
