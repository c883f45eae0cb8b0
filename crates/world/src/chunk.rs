use crate::blocks::{BlockId, BLOCK_AIR};
use std::fmt;

/// Chunk width (X axis) in voxels.
pub const CHUNK_SIZE_X: usize = 16;
/// Chunk height (Y axis) in voxels.
pub const CHUNK_SIZE_Y: usize = 256;
/// Chunk depth (Z axis) in voxels.
pub const CHUNK_SIZE_Z: usize = 16;
/// Total voxel count per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Chunk-local position (X, Y, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl LocalPos {
    /// Convert to a linear index within the block array.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE_X);
        debug_assert!(self.y < CHUNK_SIZE_Y);
        debug_assert!(self.z < CHUNK_SIZE_Z);
        (self.y * CHUNK_SIZE_Z + self.z) * CHUNK_SIZE_X + self.x
    }
}

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the world column (x, z).
    pub fn containing(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE_X as i32),
            z: z.div_euclid(CHUNK_SIZE_Z as i32),
        }
    }

    /// Local column offsets of world column (x, z) inside its chunk.
    pub fn local_xz(x: i32, z: i32) -> (usize, usize) {
        (
            x.rem_euclid(CHUNK_SIZE_X as i32) as usize,
            z.rem_euclid(CHUNK_SIZE_Z as i32) as usize,
        )
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Chunk storing one block id per voxel.
#[derive(Clone)]
pub struct Chunk {
    position: ChunkPos,
    blocks: Vec<BlockId>,
}

impl Chunk {
    /// Allocate a fresh chunk filled with air.
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            blocks: vec![BLOCK_AIR; CHUNK_VOLUME],
        }
    }

    #[inline]
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        LocalPos { x, y, z }.index()
    }

    /// Fetch a block id.
    pub fn block(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    /// Set a block id, returning the previous one.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: BlockId) -> BlockId {
        let idx = Self::index(x, y, z);
        std::mem::replace(&mut self.blocks[idx], id)
    }

    /// Highest local y in column (x, z) for which `pred` holds.
    pub fn highest_matching(
        &self,
        x: usize,
        z: usize,
        pred: impl Fn(BlockId) -> bool,
    ) -> Option<usize> {
        (0..CHUNK_SIZE_Y).rev().find(|&y| pred(self.block(x, y, z)))
    }
}
