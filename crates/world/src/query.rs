//! Read/write surface the AI uses to look at the voxel world.
//!
//! Controllers never touch chunk storage directly; everything goes through
//! [`WorldQuery`] so tests can swap in small hand-built worlds.

use crate::blocks::{self, BlockId, Liquid};
use crate::raycast::{raycast_segment, RaycastHit};
use glam::{DVec3, IVec3};
use voxmob_physics::Aabb;

/// World access needed by movement and behaviour code.
pub trait WorldQuery {
    /// Block id at `cell`. Cells outside the loaded world read as solid bedrock
    /// below the build range and as air above it.
    fn tile_at(&self, cell: IVec3) -> BlockId;

    /// Replace the block at `cell`. Returns false when the cell is not writable.
    fn set_tile(&mut self, cell: IVec3, id: BlockId) -> bool;

    /// Whether `cell` lies inside the loaded, buildable volume.
    fn is_in_bounds(&self, cell: IVec3) -> bool;

    /// Whether the column holding `cell` has world data at all.
    fn is_loaded(&self, cell: IVec3) -> bool;

    /// Topmost solid block in column (x, z).
    fn highest_solid_y(&self, x: i32, z: i32) -> Option<i32>;

    /// Whether the sun currently burns exposed undead.
    fn is_daytime(&self) -> bool;

    fn liquid_at(&self, cell: IVec3) -> Liquid {
        Liquid::of(self.tile_at(cell))
    }

    fn is_solid(&self, cell: IVec3) -> bool {
        blocks::is_solid(self.tile_at(cell))
    }

    /// Whether a body may stand inside `cell` (no collision, no lava).
    fn is_passable(&self, cell: IVec3) -> bool {
        blocks::is_passable(self.tile_at(cell))
    }

    /// First solid cell on the segment `from -> to`.
    fn raycast(&self, from: DVec3, to: DVec3) -> Option<RaycastHit> {
        raycast_segment(from, to, |cell| self.is_solid(cell))
    }

    fn line_of_sight(&self, from: DVec3, to: DVec3) -> bool {
        self.raycast(from, to).is_none()
    }

    /// Collision boxes of every solid cell overlapping `region`.
    fn collision_boxes(&self, region: &Aabb) -> Vec<Aabb> {
        region
            .cells()
            .filter(|&cell| self.is_solid(cell))
            .map(Aabb::cell)
            .collect()
    }

    fn aabb_collides_blocks(&self, bb: &Aabb) -> bool {
        bb.cells().any(|cell| self.is_solid(cell))
    }

    fn aabb_intersects_liquid(&self, bb: &Aabb) -> bool {
        bb.cells().any(|cell| self.liquid_at(cell).is_liquid())
    }

    /// Strongest liquid touching the box; lava wins over water.
    fn liquid_in_box(&self, bb: &Aabb) -> Liquid {
        let mut found = Liquid::None;
        for cell in bb.cells() {
            match self.liquid_at(cell) {
                Liquid::Lava => return Liquid::Lava,
                Liquid::Water => found = Liquid::Water,
                Liquid::None => {}
            }
        }
        found
    }

    /// Whether nothing above `cell` blocks sky light.
    fn sky_exposed(&self, cell: IVec3) -> bool {
        let mut probe = cell + IVec3::Y;
        while self.is_in_bounds(probe) {
            if !blocks::is_transparent(self.tile_at(probe)) {
                return false;
            }
            probe.y += 1;
        }
        true
    }

    /// Solid floor directly under a standing spot.
    fn has_support(&self, feet_cell: IVec3) -> bool {
        let below = feet_cell - IVec3::Y;
        self.is_solid(below) && !self.liquid_at(below).is_liquid()
    }
}

/// Integer cell containing a world-space point.
pub fn cell_of(point: DVec3) -> IVec3 {
    point.floor().as_ivec3()
}

/// World-space bottom-centre of a cell.
pub fn cell_floor_center(cell: IVec3) -> DVec3 {
    DVec3::new(cell.x as f64 + 0.5, cell.y as f64, cell.z as f64 + 0.5)
}
