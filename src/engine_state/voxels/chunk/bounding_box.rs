//! # Chunk Bounding Box
//!
//! Tracks the smallest box containing every non-empty block of a chunk so
//! meshing only scans the occupied part of the chunk. Growth is O(1); shrinking
//! needs a rescan because removing a block says nothing about what remains.

use cgmath::Point3;

use super::chunk_iteration::CellIterator;
use super::CHUNK_DIMENSION;
use crate::engine_state::voxels::arena::BlockArena;

/// Inclusive world-space box of non-empty blocks.
///
/// An empty chunk collapses to the single point at its origin with `empty`
/// set, so the first block added starts a fresh box instead of stretching
/// from the origin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    /// Lowest corner.
    pub min: Point3<i32>,
    /// Highest corner.
    pub max: Point3<i32>,
    empty: bool,
}

impl BoundingBox {
    /// The collapsed box of a chunk with no blocks.
    pub fn collapsed(origin: Point3<i32>) -> Self {
        BoundingBox {
            min: origin,
            max: origin,
            empty: true,
        }
    }

    /// `true` if the chunk holds no non-empty block.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Whether `pos` lies inside the box.
    pub fn contains(&self, pos: Point3<i32>) -> bool {
        !self.empty
            && (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// Grows the box to include `pos`.
    pub fn extend(&mut self, pos: Point3<i32>) {
        if self.empty {
            self.min = pos;
            self.max = pos;
            self.empty = false;
            return;
        }
        self.min = Point3::new(self.min.x.min(pos.x), self.min.y.min(pos.y), self.min.z.min(pos.z));
        self.max = Point3::new(self.max.x.max(pos.x), self.max.y.max(pos.y), self.max.z.max(pos.z));
    }

    /// Rebuilds the box from the chunk's cells in the arena.
    pub fn rescan(origin: Point3<i32>, arena: &BlockArena) -> Self {
        let last = Point3::new(
            origin.x + CHUNK_DIMENSION - 1,
            origin.y + CHUNK_DIMENSION - 1,
            origin.z + CHUNK_DIMENSION - 1,
        );
        let mut bounds = BoundingBox::collapsed(origin);
        for pos in CellIterator::new(origin, last) {
            if !arena.get(pos).is_empty() {
                bounds.extend(pos);
            }
        }
        bounds
    }

    /// Cells of the box, or nothing if it is empty.
    pub fn cells(&self) -> CellIterator {
        if self.empty {
            CellIterator::new(self.max, self.min - cgmath::Vector3::new(1, 1, 1))
        } else {
            CellIterator::new(self.min, self.max)
        }
    }
}
