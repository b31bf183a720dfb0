//! # Block Registry
//!
//! Read-only per-type properties consulted by lighting, bounding-box
//! maintenance and meshing. Built once at startup and shared by reference
//! (`Arc<BlockRegistry>`); nothing reaches it through global state.

use super::{block_type::BlockType, pack_color, Block, BlockTypeSize, Rgb};

/// Opacity of a cell that blocks all light.
pub const FULLY_OPAQUE: u8 = 255;

/// Properties of one block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockProperties {
    /// Human readable name, used in edit logs.
    pub name: &'static str,
    /// Light absorbed when entering a cell of this type; 0 is clear, 255 opaque.
    pub opacity: u8,
    /// Light emitted by every block of this type.
    pub emission: Rgb,
    /// Default 4-4-4 tint given to blocks created through [`BlockRegistry::block`].
    pub tint: u16,
}

impl BlockProperties {
    const UNKNOWN: BlockProperties = BlockProperties {
        name: "unknown",
        opacity: FULLY_OPAQUE,
        emission: [0, 0, 0],
        tint: 0x0F0F,
    };

    /// `true` if any channel is emitted.
    pub fn is_emissive(&self) -> bool {
        self.emission.iter().any(|&channel| channel > 0)
    }
}

/// Lookup table from block type id to [`BlockProperties`].
///
/// Ids without an entry resolve to an opaque, non-emissive default so that
/// foreign data never leaks light.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    properties: Vec<BlockProperties>,
}

impl BlockRegistry {
    /// Registry of the built-in [`BlockType`]s.
    pub fn new() -> Self {
        let mut registry = BlockRegistry {
            properties: Vec::with_capacity(BlockType::ALL.len()),
        };
        for block_type in BlockType::ALL {
            registry.register(block_type.id(), Self::builtin(block_type));
        }
        registry
    }

    fn builtin(block_type: BlockType) -> BlockProperties {
        let solid = |name, tint| BlockProperties {
            name,
            opacity: FULLY_OPAQUE,
            emission: [0, 0, 0],
            tint,
        };
        match block_type {
            BlockType::AIR => BlockProperties {
                name: "air",
                opacity: 0,
                emission: [0, 0, 0],
                tint: 0,
            },
            BlockType::DIRT => solid("dirt", pack_color(8, 5, 3)),
            BlockType::GRASS => solid("grass", pack_color(4, 11, 3)),
            BlockType::WOOD => solid("wood", pack_color(9, 6, 3)),
            BlockType::WHITE => solid("white", pack_color(15, 15, 15)),
            BlockType::STONE => solid("stone", pack_color(7, 7, 7)),
            BlockType::GLASS => BlockProperties {
                name: "glass",
                opacity: 16,
                emission: [0, 0, 0],
                tint: pack_color(13, 15, 15),
            },
            BlockType::LEAVES => BlockProperties {
                name: "leaves",
                opacity: 96,
                emission: [0, 0, 0],
                tint: pack_color(3, 9, 2),
            },
            BlockType::LAMP => BlockProperties {
                name: "lamp",
                opacity: FULLY_OPAQUE,
                emission: [15, 12, 6],
                tint: pack_color(15, 13, 8),
            },
        }
    }

    /// Adds or replaces the properties for `id`.
    pub fn register(&mut self, id: BlockTypeSize, properties: BlockProperties) {
        let index = id as usize;
        if index >= self.properties.len() {
            self.properties.resize(index + 1, BlockProperties::UNKNOWN);
        }
        self.properties[index] = properties;
    }

    /// Properties for `id`, or the opaque default.
    pub fn properties(&self, id: BlockTypeSize) -> &BlockProperties {
        self.properties
            .get(id as usize)
            .unwrap_or(&BlockProperties::UNKNOWN)
    }

    /// An unlit block of `block_type` carrying the type's registered tint.
    pub fn block(&self, block_type: BlockType) -> Block {
        let id = block_type.id();
        Block::with_color(id, self.properties(id).tint)
    }

    /// Opacity in `0..=255`.
    #[inline]
    pub fn opacity(&self, id: BlockTypeSize) -> u8 {
        self.properties(id).opacity
    }

    /// Emitted light per channel.
    #[inline]
    pub fn emission(&self, id: BlockTypeSize) -> Rgb {
        self.properties(id).emission
    }

    /// `true` if the type hides faces behind it completely.
    #[inline]
    pub fn is_opaque(&self, id: BlockTypeSize) -> bool {
        self.opacity(id) == FULLY_OPAQUE
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
