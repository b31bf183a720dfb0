//! # Block Type Module
//!
//! This module defines the built-in block types of the voxel world and the
//! conversion between their compact integer ids and the rich enum.

use num_derive::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates the built-in block types.
///
/// The discriminant is the id stored in [`super::Block`]. `AIR` must stay at 0:
/// a type id of zero means "empty" everywhere in the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum BlockType {
    /// Empty space. Transparent, never meshed.
    AIR = 0,

    /// A basic dirt block, used as a common building material.
    DIRT = 1,

    /// A grass block; the top layer of generated terrain.
    GRASS = 2,

    /// A wooden block.
    WOOD = 3,

    /// A plain white block, often used for testing.
    WHITE = 4,

    /// Clear glass. Lets light through with a small loss.
    GLASS = 5,

    /// Foliage. Partially transparent.
    LEAVES = 6,

    /// A warm light-emitting block.
    LAMP = 7,

    /// Bedrock-like filler below the dirt layer.
    STONE = 8,
}

impl BlockType {
    /// Every built-in type, in id order.
    pub const ALL: [BlockType; 9] = [
        BlockType::AIR,
        BlockType::DIRT,
        BlockType::GRASS,
        BlockType::WOOD,
        BlockType::WHITE,
        BlockType::GLASS,
        BlockType::LEAVES,
        BlockType::LAMP,
        BlockType::STONE,
    ];

    /// Converts a stored id back to a `BlockType`.
    ///
    /// Returns `None` for ids that no built-in type uses.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u16(id)
    }

    /// The compact id for this type.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }
}
