//! Voxel raycasting using the DDA (Digital Differential Analyzer) algorithm.
//!
//! Used for line-of-sight gating and projectile block hits, so the cast is
//! bounded by a segment rather than a direction plus range.

use glam::{DVec3, IVec3};

/// Result of a raycast against the voxel world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The position of the block that was hit (in block coordinates).
    pub block_pos: IVec3,
    /// The normal of the face that was entered (zero when the origin cell is solid).
    pub face_normal: IVec3,
    /// The distance from the segment start to the hit point.
    pub distance: f64,
    /// World-space position of the hit point.
    pub hit_pos: DVec3,
}

/// Walk the cells crossed by the segment `from -> to` and return the first solid one.
pub fn raycast_segment<F>(from: DVec3, to: DVec3, mut is_solid: F) -> Option<RaycastHit>
where
    F: FnMut(IVec3) -> bool,
{
    let mut voxel = from.floor().as_ivec3();
    let delta = to - from;
    let length = delta.length();

    if is_solid(voxel) {
        return Some(RaycastHit {
            block_pos: voxel,
            face_normal: IVec3::ZERO,
            distance: 0.0,
            hit_pos: from,
        });
    }
    if length < f64::EPSILON {
        return None;
    }

    let direction = delta / length;
    let step = IVec3::new(
        if direction.x > 0.0 { 1 } else { -1 },
        if direction.y > 0.0 { 1 } else { -1 },
        if direction.z > 0.0 { 1 } else { -1 },
    );

    let axis_delta = |d: f64| if d != 0.0 { (1.0 / d).abs() } else { f64::INFINITY };
    let t_delta = DVec3::new(
        axis_delta(direction.x),
        axis_delta(direction.y),
        axis_delta(direction.z),
    );

    let boundary = |cell: i32, origin: f64, d: f64| {
        if d > 0.0 {
            ((cell + 1) as f64 - origin) / d
        } else if d < 0.0 {
            (cell as f64 - origin) / d
        } else {
            f64::INFINITY
        }
    };
    let mut t_max = DVec3::new(
        boundary(voxel.x, from.x, direction.x),
        boundary(voxel.y, from.y, direction.y),
        boundary(voxel.z, from.z, direction.z),
    );

    // every iteration crosses one boundary; the bound only guards degenerate input
    let max_steps = (length * 3.0) as usize + 3;
    for _ in 0..max_steps {
        let (distance, face_normal) = if t_max.x < t_max.y && t_max.x < t_max.z {
            let t = t_max.x;
            voxel.x += step.x;
            t_max.x += t_delta.x;
            (t, IVec3::new(-step.x, 0, 0))
        } else if t_max.y < t_max.z {
            let t = t_max.y;
            voxel.y += step.y;
            t_max.y += t_delta.y;
            (t, IVec3::new(0, -step.y, 0))
        } else {
            let t = t_max.z;
            voxel.z += step.z;
            t_max.z += t_delta.z;
            (t, IVec3::new(0, 0, -step.z))
        };

        if distance > length {
            break;
        }

        if is_solid(voxel) {
            return Some(RaycastHit {
                block_pos: voxel,
                face_normal,
                distance,
                hit_pos: from + direction * distance,
            });
        }
    }

    None
}
