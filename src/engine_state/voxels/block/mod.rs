//! # Block Module
//!
//! This module provides the core block-related functionality: the packed
//! [`Block`] cell value stored in the arena, block type ids, block faces and the
//! read-only [`BlockRegistry`](registry::BlockRegistry) of per-type properties.

use block_type::BlockType;

pub mod block_side;
pub mod block_type;
pub mod registry;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u16;

/// Three light channels in red, green, blue order.
pub type Rgb = [u8; 3];

/// Packs a 4-4-4 tint. Each channel is truncated to its low four bits.
pub fn pack_color(red: u8, green: u8, blue: u8) -> u16 {
    ((red as u16 & 0xF) << 8) | ((green as u16 & 0xF) << 4) | (blue as u16 & 0xF)
}

/// A single voxel cell.
///
/// Holds the block's type id, its packed tint and the four light channels the
/// lighting engine maintains. Equality is structural, so two cells compare
/// equal only if type, tint and all light levels match.
///
/// # Memory Layout
/// `#[repr(C)]` with no padding (2 + 2 + 4 bytes), so whole arena regions can
/// be viewed as bytes through `bytemuck` by a persistence layer.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct Block {
    block_type: BlockTypeSize,
    /// 4-4-4 packed tint, see [`pack_color`].
    pub color: u16,
    /// Sunlight level.
    pub sun: u8,
    /// Red point-light level.
    pub red: u8,
    /// Green point-light level.
    pub green: u8,
    /// Blue point-light level.
    pub blue: u8,
}

impl Block {
    /// An empty cell with no light.
    pub const AIR: Block = Block {
        block_type: 0,
        color: 0,
        sun: 0,
        red: 0,
        green: 0,
        blue: 0,
    };

    /// Creates an unlit block of the specified type with a white tint.
    ///
    /// Generators use [`registry::BlockRegistry::block`] instead, which applies
    /// the type's registered tint.
    pub fn new(block_type: BlockType) -> Self {
        Self::with_color(block_type.id(), pack_color(15, 15, 15))
    }

    /// Creates an unlit block from a raw type id and packed tint.
    pub fn with_color(block_type: BlockTypeSize, color: u16) -> Self {
        Block {
            block_type,
            color,
            ..Block::AIR
        }
    }

    /// The type id. Fixed for the lifetime of the value.
    pub fn block_type(&self) -> BlockTypeSize {
        self.block_type
    }

    /// `true` for air (type id 0).
    pub fn is_empty(&self) -> bool {
        self.block_type == BlockType::AIR.id()
    }

    /// Red, green and blue light levels.
    pub fn rgb(&self) -> Rgb {
        [self.red, self.green, self.blue]
    }

    /// Overwrites the red, green and blue light levels.
    pub fn set_rgb(&mut self, rgb: Rgb) {
        [self.red, self.green, self.blue] = rgb;
    }

    /// Same block with every light channel cleared.
    pub fn unlit(self) -> Self {
        Block {
            sun: 0,
            red: 0,
            green: 0,
            blue: 0,
            ..self
        }
    }
}
