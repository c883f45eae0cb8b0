//! Chunked in-memory voxel world implementing [`WorldQuery`].

use crate::blocks::{BlockId, BLOCK_AIR, BLOCK_BEDROCK, BLOCK_DIRT, BLOCK_GRASS, BLOCK_STONE};
use crate::chunk::{Chunk, ChunkPos, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use crate::query::WorldQuery;
use crate::time::SimTime;
use glam::IVec3;
use std::collections::BTreeMap;
use tracing::debug;

/// Loaded chunks plus the world clock.
#[derive(Clone, Default)]
pub struct VoxelWorld {
    chunks: BTreeMap<ChunkPos, Chunk>,
    time: SimTime,
    revision: u64,
}

impl VoxelWorld {
    /// Empty world with no loaded chunks.
    pub fn new(time: SimTime) -> Self {
        Self {
            chunks: BTreeMap::new(),
            time,
            revision: 0,
        }
    }

    /// Square of `(2r + 1)²` chunks of flat ground whose grass surface sits at `surface_y`.
    pub fn flat(chunk_radius: i32, surface_y: i32, time: SimTime) -> Self {
        let mut world = Self::new(time);
        let surface_y = surface_y.clamp(1, CHUNK_SIZE_Y as i32 - 2);
        for cx in -chunk_radius..=chunk_radius {
            for cz in -chunk_radius..=chunk_radius {
                let mut chunk = Chunk::new(ChunkPos::new(cx, cz));
                for x in 0..CHUNK_SIZE_X {
                    for z in 0..CHUNK_SIZE_Z {
                        for y in 0..=surface_y as usize {
                            let id = match y as i32 {
                                0 => BLOCK_BEDROCK,
                                y if y == surface_y => BLOCK_GRASS,
                                y if y >= surface_y - 3 => BLOCK_DIRT,
                                _ => BLOCK_STONE,
                            };
                            chunk.set_block(x, y, z, id);
                        }
                    }
                }
                world.chunks.insert(chunk.position(), chunk);
            }
        }
        debug!(
            chunks = world.chunks.len(),
            surface_y, "generated flat test world"
        );
        world
    }

    /// Load an empty (all-air) chunk if it is not present yet.
    pub fn ensure_chunk(&mut self, pos: ChunkPos) -> &mut Chunk {
        self.chunks.entry(pos).or_insert_with(|| Chunk::new(pos))
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Fill the inclusive box `a..=b` with `id`, returning the number of cells written.
    pub fn fill(&mut self, a: IVec3, b: IVec3, id: BlockId) -> usize {
        let (lo, hi) = (a.min(b), a.max(b));
        let mut written = 0;
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                for x in lo.x..=hi.x {
                    if self.set_tile(IVec3::new(x, y, z), id) {
                        written += 1;
                    }
                }
            }
        }
        written
    }

    pub fn time(&self) -> &SimTime {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut SimTime {
        &mut self.time
    }

    /// Counter bumped by every tile mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn locate(cell: IVec3) -> Option<(ChunkPos, usize, usize, usize)> {
        if cell.y < 0 || cell.y >= CHUNK_SIZE_Y as i32 {
            return None;
        }
        let pos = ChunkPos::containing(cell.x, cell.z);
        let (lx, lz) = ChunkPos::local_xz(cell.x, cell.z);
        Some((pos, lx, cell.y as usize, lz))
    }
}

impl WorldQuery for VoxelWorld {
    fn tile_at(&self, cell: IVec3) -> BlockId {
        if cell.y >= CHUNK_SIZE_Y as i32 {
            return BLOCK_AIR;
        }
        match Self::locate(cell) {
            Some((pos, x, y, z)) => self
                .chunks
                .get(&pos)
                .map_or(BLOCK_BEDROCK, |chunk| chunk.block(x, y, z)),
            None => BLOCK_BEDROCK,
        }
    }

    fn set_tile(&mut self, cell: IVec3, id: BlockId) -> bool {
        let Some((pos, x, y, z)) = Self::locate(cell) else {
            return false;
        };
        let Some(chunk) = self.chunks.get_mut(&pos) else {
            return false;
        };
        if chunk.set_block(x, y, z, id) != id {
            self.revision += 1;
        }
        true
    }

    fn is_in_bounds(&self, cell: IVec3) -> bool {
        Self::locate(cell).is_some_and(|(pos, ..)| self.chunks.contains_key(&pos))
    }

    fn is_loaded(&self, cell: IVec3) -> bool {
        self.chunks
            .contains_key(&ChunkPos::containing(cell.x, cell.z))
    }

    fn highest_solid_y(&self, x: i32, z: i32) -> Option<i32> {
        let chunk = self.chunks.get(&ChunkPos::containing(x, z))?;
        let (lx, lz) = ChunkPos::local_xz(x, z);
        chunk
            .highest_matching(lx, lz, crate::blocks::is_solid)
            .map(|y| y as i32)
    }

    fn is_daytime(&self) -> bool {
        self.time.is_daytime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Liquid, BLOCK_GLASS, BLOCK_WATER};
    use glam::DVec3;
    use voxmob_physics::Aabb;

    fn world() -> VoxelWorld {
        VoxelWorld::flat(1, 63, SimTime::default())
    }

    #[test]
    fn flat_world_has_grass_surface() {
        let world = world();
        assert_eq!(world.chunk_count(), 9);
        assert_eq!(world.tile_at(IVec3::new(3, 63, -7)), BLOCK_GRASS);
        assert_eq!(world.tile_at(IVec3::new(3, 64, -7)), BLOCK_AIR);
        assert_eq!(world.highest_solid_y(-10, 12), Some(63));
    }

    #[test]
    fn unloaded_columns_read_as_walls() {
        let world = world();
        let far = IVec3::new(100, 70, 0);
        assert!(world.is_solid(far));
        assert!(!world.is_in_bounds(far));
        assert!(!world.is_loaded(far));
        assert_eq!(world.highest_solid_y(100, 0), None);
    }

    #[test]
    fn set_tile_bumps_revision_only_on_change() {
        let mut world = world();
        let cell = IVec3::new(0, 64, 0);
        assert!(world.set_tile(cell, BLOCK_STONE));
        assert!(world.set_tile(cell, BLOCK_STONE));
        assert_eq!(world.revision(), 1);
        assert!(!world.set_tile(IVec3::new(0, 300, 0), BLOCK_STONE));
    }

    #[test]
    fn liquid_and_collision_queries() {
        let mut world = world();
        world.fill(IVec3::new(4, 64, 4), IVec3::new(6, 65, 6), BLOCK_WATER);
        let in_pool = Aabb::from_feet(DVec3::new(5.5, 64.0, 5.5), 0.6, 1.8);
        assert!(world.aabb_intersects_liquid(&in_pool));
        assert_eq!(world.liquid_in_box(&in_pool), Liquid::Water);
        assert!(!world.aabb_collides_blocks(&in_pool));

        let sunk = in_pool.offset(DVec3::new(0.0, -0.5, 0.0));
        assert!(world.aabb_collides_blocks(&sunk));
        assert!(!world.collision_boxes(&sunk).is_empty());
    }

    #[test]
    fn sky_exposure_ignores_glass() {
        let mut world = world();
        let cell = IVec3::new(2, 64, 2);
        assert!(world.sky_exposed(cell));
        world.set_tile(IVec3::new(2, 70, 2), BLOCK_GLASS);
        assert!(world.sky_exposed(cell));
        world.set_tile(IVec3::new(2, 71, 2), BLOCK_STONE);
        assert!(!world.sky_exposed(cell));
    }

    #[test]
    fn line_of_sight_blocked_by_wall() {
        let mut world = world();
        let eye = DVec3::new(0.5, 65.5, 0.5);
        let target = DVec3::new(8.5, 65.5, 0.5);
        assert!(world.line_of_sight(eye, target));
        world.fill(IVec3::new(4, 64, -1), IVec3::new(4, 66, 1), BLOCK_STONE);
        assert!(!world.line_of_sight(eye, target));
    }
}
