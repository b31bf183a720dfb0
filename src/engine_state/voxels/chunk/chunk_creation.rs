//! # Chunk Creation Module
//!
//! The write handle a terrain generator receives for one chunk. It confines
//! generation to that chunk's region of the arena and offers a sequential
//! `push_block` builder in addition to random access.

use cgmath::Point3;

use crate::engine_state::voxels::{arena::BlockArena, block::Block};

use super::CHUNK_DIMENSION;

/// Write access to the cells of a single chunk.
///
/// Blocks pushed with [`ChunkWriter::push_block`] fill the chunk in x, then y,
/// then z order, starting at the origin. Every cell is written unlit; lighting
/// is the next pipeline stage.
pub struct ChunkWriter<'a> {
    arena: &'a mut BlockArena,
    /// World position of the chunk's lowest corner
    origin: Point3<i32>,
    /// Next local position for `push_block`
    local_x: i32,
    local_y: i32,
    local_z: i32,
}

impl<'a> ChunkWriter<'a> {
    /// Creates a writer for the chunk whose lowest corner is `origin`.
    pub fn new(arena: &'a mut BlockArena, origin: Point3<i32>) -> Self {
        ChunkWriter {
            arena,
            origin,
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// World position of the chunk's lowest corner.
    pub fn origin(&self) -> Point3<i32> {
        self.origin
    }

    /// Sets the cell at chunk-local coordinates. Out-of-chunk coordinates are ignored.
    pub fn set_local(&mut self, x: i32, y: i32, z: i32, block: Block) {
        let range = 0..CHUNK_DIMENSION;
        if !(range.contains(&x) && range.contains(&y) && range.contains(&z)) {
            return;
        }
        let pos = Point3::new(self.origin.x + x, self.origin.y + y, self.origin.z + z);
        self.arena.set(pos, block.unlit());
    }

    /// Fills every cell of the chunk with `block`.
    pub fn fill(&mut self, block: Block) {
        for z in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_DIMENSION {
                for x in 0..CHUNK_DIMENSION {
                    self.set_local(x, y, z, block);
                }
            }
        }
    }

    /// Writes `block` at the cursor and advances it. Returns `false` once the
    /// chunk is full and the block was dropped.
    pub fn push_block(&mut self, block: Block) -> bool {
        if self.local_z == CHUNK_DIMENSION {
            return false;
        }
        self.set_local(self.local_x, self.local_y, self.local_z, block);

        self.local_x += 1;
        if self.local_x == CHUNK_DIMENSION {
            self.local_x = 0;
            self.local_y += 1;
            if self.local_y == CHUNK_DIMENSION {
                self.local_y = 0;
                self.local_z += 1;
            }
        }
        true
    }
}
