//! # Block Arena
//!
//! One flat array holding every cell of the cached volume. World coordinates
//! are wrapped modulo the cache span on each axis before flattening, so a
//! lookup costs the same no matter how far the cache center has travelled and
//! a chunk entering the cache simply reuses the cells of the chunk that left.
//!
//! The arena has no notion of residency. Two chunk coordinates that differ by
//! a multiple of the span alias the same cells; the streaming cache guarantees
//! at most one of them is resident at a time.

use cgmath::Point3;

use super::block::Block;
use super::chunk::CHUNK_DIMENSION;

/// Wrap-addressed storage for the whole cache volume.
pub struct BlockArena {
    /// Edge length of the cube, in blocks.
    span: i32,
    blocks: Vec<Block>,
}

impl BlockArena {
    /// Creates an arena of `span³` air cells.
    ///
    /// # Panics
    /// Panics if `span` is not positive.
    pub fn new(span: i32) -> Self {
        assert!(span > 0, "arena span must be positive, got {span}");
        let len = (span as usize).pow(3);
        BlockArena {
            span,
            blocks: vec![Block::AIR; len],
        }
    }

    /// Arena large enough for every chunk within `cache_range` chunks of a center.
    pub fn for_cache_range(cache_range: i32) -> Self {
        Self::new((2 * cache_range + 1) * CHUNK_DIMENSION)
    }

    /// Edge length in blocks.
    pub fn span(&self) -> i32 {
        self.span
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`; an arena has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Flat index for a world position.
    #[inline]
    pub fn index(&self, pos: Point3<i32>) -> usize {
        let x = pos.x.rem_euclid(self.span) as usize;
        let y = pos.y.rem_euclid(self.span) as usize;
        let z = pos.z.rem_euclid(self.span) as usize;
        let span = self.span as usize;
        x + span * (y + span * z)
    }

    /// Copy of the cell at `pos`.
    #[inline]
    pub fn get(&self, pos: Point3<i32>) -> Block {
        self.blocks[self.index(pos)]
    }

    /// Mutable access to the cell at `pos`.
    #[inline]
    pub fn get_mut(&mut self, pos: Point3<i32>) -> &mut Block {
        let index = self.index(pos);
        &mut self.blocks[index]
    }

    /// Overwrites the cell at `pos`.
    #[inline]
    pub fn set(&mut self, pos: Point3<i32>, block: Block) {
        let index = self.index(pos);
        self.blocks[index] = block;
    }

    /// Raw bytes of the cells of one chunk, in x, then y, then z order.
    ///
    /// Intended for an external page store that persists whole regions.
    pub fn chunk_bytes(&self, origin: Point3<i32>) -> Vec<u8> {
        let mut cells = Vec::with_capacity((CHUNK_DIMENSION as usize).pow(3));
        for z in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_DIMENSION {
                for x in 0..CHUNK_DIMENSION {
                    cells.push(self.get(Point3::new(origin.x + x, origin.y + y, origin.z + z)));
                }
            }
        }
        bytemuck::cast_slice(&cells).to_vec()
    }
}
