//! # Chunk Iteration Module
//!
//! Walks the cells of an axis-aligned box of world positions in arena order
//! (x fastest, then y, then z). Used by bounding-box rescans, chunk lighting
//! and meshing, all of which visit a chunk's sub-volume cell by cell.

use cgmath::Point3;

/// An iterator over every position in the inclusive box `min..=max`.
///
/// Yields nothing if `min` exceeds `max` on any axis.
pub struct CellIterator {
    min: Point3<i32>,
    max: Point3<i32>,
    next: Option<Point3<i32>>,
}

impl CellIterator {
    /// Creates an iterator over `min..=max`.
    pub fn new(min: Point3<i32>, max: Point3<i32>) -> Self {
        let non_empty = min.x <= max.x && min.y <= max.y && min.z <= max.z;
        CellIterator {
            min,
            max,
            next: non_empty.then_some(min),
        }
    }
}

impl Iterator for CellIterator {
    type Item = Point3<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        let mut following = current;
        following.x += 1;
        if following.x > self.max.x {
            following.x = self.min.x;
            following.y += 1;
            if following.y > self.max.y {
                following.y = self.min.y;
                following.z += 1;
            }
        }
        self.next = (following.z <= self.max.z).then_some(following);

        Some(current)
    }
}
