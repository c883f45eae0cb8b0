//! Block ids and the material classes the AI cares about.
//!
//! Only collision and liquid behaviour matter to mobs, so the table is a
//! handful of match arms rather than a data-driven registry.

use serde::{Deserialize, Serialize};

/// Block identifier.
pub type BlockId = u16;

pub const BLOCK_AIR: BlockId = 0;
pub const BLOCK_STONE: BlockId = 1;
pub const BLOCK_DIRT: BlockId = 2;
pub const BLOCK_GRASS: BlockId = 3;
pub const BLOCK_SAND: BlockId = 4;
pub const BLOCK_GRAVEL: BlockId = 5;
pub const BLOCK_WATER: BlockId = 6;
pub const BLOCK_ICE: BlockId = 7;
pub const BLOCK_SNOW: BlockId = 8;
pub const BLOCK_CLAY: BlockId = 9;
pub const BLOCK_BEDROCK: BlockId = 10;
pub const BLOCK_GLASS: BlockId = 11;
pub const BLOCK_TALL_GRASS: BlockId = 12;
pub const BLOCK_LAVA: BlockId = 20;
pub const BLOCK_WATER_FLOWING: BlockId = 21;
pub const BLOCK_LAVA_FLOWING: BlockId = 22;

/// Look up a block id by its scenario-file name.
pub fn block_from_name(name: &str) -> Option<BlockId> {
    let id = match name.trim().to_ascii_lowercase().as_str() {
        "air" => BLOCK_AIR,
        "stone" => BLOCK_STONE,
        "dirt" => BLOCK_DIRT,
        "grass" => BLOCK_GRASS,
        "sand" => BLOCK_SAND,
        "gravel" => BLOCK_GRAVEL,
        "water" => BLOCK_WATER,
        "ice" => BLOCK_ICE,
        "snow" => BLOCK_SNOW,
        "clay" => BLOCK_CLAY,
        "bedrock" => BLOCK_BEDROCK,
        "glass" => BLOCK_GLASS,
        "tall_grass" => BLOCK_TALL_GRASS,
        "lava" => BLOCK_LAVA,
        "flowing_water" => BLOCK_WATER_FLOWING,
        "flowing_lava" => BLOCK_LAVA_FLOWING,
        _ => return None,
    };
    Some(id)
}

/// Liquid classification of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Liquid {
    #[default]
    None,
    Water,
    Lava,
}

impl Liquid {
    /// Classify a block id.
    pub fn of(id: BlockId) -> Self {
        match id {
            BLOCK_WATER | BLOCK_WATER_FLOWING => Liquid::Water,
            BLOCK_LAVA | BLOCK_LAVA_FLOWING => Liquid::Lava,
            _ => Liquid::None,
        }
    }

    pub fn is_liquid(self) -> bool {
        self != Liquid::None
    }
}

/// Whether the block has a full collision cube.
pub fn is_solid(id: BlockId) -> bool {
    !matches!(
        id,
        BLOCK_AIR
            | BLOCK_TALL_GRASS
            | BLOCK_WATER
            | BLOCK_WATER_FLOWING
            | BLOCK_LAVA
            | BLOCK_LAVA_FLOWING
    )
}

/// Whether a body may occupy the cell (no collision and no lava).
pub fn is_passable(id: BlockId) -> bool {
    !is_solid(id) && Liquid::of(id) != Liquid::Lava
}

/// Blocks a carrying mob is allowed to lift out of the world.
pub fn is_carriable(id: BlockId) -> bool {
    matches!(
        id,
        BLOCK_GRASS | BLOCK_DIRT | BLOCK_SAND | BLOCK_GRAVEL | BLOCK_CLAY | BLOCK_TALL_GRASS
    )
}

/// Whether sky light passes through the block.
pub fn is_transparent(id: BlockId) -> bool {
    !is_solid(id) || matches!(id, BLOCK_GLASS | BLOCK_ICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liquids_are_classified() {
        assert_eq!(Liquid::of(BLOCK_WATER), Liquid::Water);
        assert_eq!(Liquid::of(BLOCK_WATER_FLOWING), Liquid::Water);
        assert_eq!(Liquid::of(BLOCK_LAVA_FLOWING), Liquid::Lava);
        assert_eq!(Liquid::of(BLOCK_STONE), Liquid::None);
    }

    #[test]
    fn liquids_and_air_are_not_solid() {
        assert!(!is_solid(BLOCK_AIR));
        assert!(!is_solid(BLOCK_WATER));
        assert!(!is_solid(BLOCK_TALL_GRASS));
        assert!(is_solid(BLOCK_GLASS));
    }

    #[test]
    fn lava_is_not_passable() {
        assert!(is_passable(BLOCK_WATER));
        assert!(!is_passable(BLOCK_LAVA));
        assert!(!is_passable(BLOCK_STONE));
    }

    #[test]
    fn glass_lets_sky_through() {
        assert!(is_transparent(BLOCK_GLASS));
        assert!(!is_transparent(BLOCK_DIRT));
        assert!(is_carriable(BLOCK_GRASS));
        assert!(!is_carriable(BLOCK_BEDROCK));
    }

    #[test]
    fn block_names_resolve() {
        assert_eq!(block_from_name("Stone"), Some(BLOCK_STONE));
        assert_eq!(block_from_name(" lava "), Some(BLOCK_LAVA));
        assert_eq!(block_from_name("obsidian"), None);
    }
}
