//! FIFO queue of cells whose light must be spread to their neighbours.
//!
//! A bit per arena cell records whether the cell is already waiting, so a cell
//! is never queued twice at once. The bit is cleared when the cell is popped;
//! if its level rises again later it can be queued again, and the level that
//! gets spread is always the one in the arena at pop time.

use std::collections::VecDeque;

use bitvec::vec::BitVec;
use cgmath::Point3;

/// Deduplicating propagation queue.
#[derive(Debug)]
pub struct LightQueue {
    queue: VecDeque<(Point3<i32>, usize)>,
    queued: BitVec,
}

impl LightQueue {
    /// Creates a queue for an arena of `cells` cells.
    pub fn new(cells: usize) -> Self {
        LightQueue {
            queue: VecDeque::with_capacity(4096),
            queued: BitVec::repeat(false, cells),
        }
    }

    /// Queues `pos` (arena index `index`). Returns `false` if it was already waiting.
    #[inline]
    pub fn push(&mut self, pos: Point3<i32>, index: usize) -> bool {
        if self.queued[index] {
            return false;
        }
        self.queued.set(index, true);
        self.queue.push_back((pos, index));
        true
    }

    /// Takes the oldest waiting cell.
    #[inline]
    pub fn pop(&mut self) -> Option<Point3<i32>> {
        let (pos, index) = self.queue.pop_front()?;
        self.queued.set(index, false);
        Some(pos)
    }

    /// Number of waiting cells.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
