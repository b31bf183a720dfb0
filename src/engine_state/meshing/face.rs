use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;

/// A single quad on one side of a block.
///
/// Corners are in world coordinates. Seen from outside the block, `ll`, `lr`,
/// `ur`, `ul` run counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Lower-left corner
    pub ll: Point3<i32>,
    /// Lower-right corner
    pub lr: Point3<i32>,
    /// Upper-left corner
    pub ul: Point3<i32>,
    /// Upper-right corner
    pub ur: Point3<i32>,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face on `block_side` of the block at `pos`.
    ///
    /// # Arguments
    /// * `pos` - World position of the block
    /// * `block_side` - Which side of the block this face represents
    pub fn new(pos: Point3<i32>, block_side: BlockSide) -> Self {
        let (i, j, k) = (pos.x, pos.y, pos.z);
        match block_side {
            BlockSide::FRONT => Face {
                ll: Point3::new(i, j, k + 1),
                lr: Point3::new(i + 1, j, k + 1),
                ul: Point3::new(i, j + 1, k + 1),
                ur: Point3::new(i + 1, j + 1, k + 1),
                block_side,
            },

            BlockSide::BACK => Face {
                ll: Point3::new(i + 1, j, k),
                lr: Point3::new(i, j, k),
                ul: Point3::new(i + 1, j + 1, k),
                ur: Point3::new(i, j + 1, k),
                block_side,
            },

            BlockSide::BOTTOM => Face {
                ll: Point3::new(i, j, k),
                lr: Point3::new(i + 1, j, k),
                ul: Point3::new(i, j, k + 1),
                ur: Point3::new(i + 1, j, k + 1),
                block_side,
            },

            BlockSide::TOP => Face {
                ll: Point3::new(i, j + 1, k + 1),
                lr: Point3::new(i + 1, j + 1, k + 1),
                ul: Point3::new(i, j + 1, k),
                ur: Point3::new(i + 1, j + 1, k),
                block_side,
            },

            BlockSide::LEFT => Face {
                ll: Point3::new(i, j, k),
                lr: Point3::new(i, j, k + 1),
                ul: Point3::new(i, j + 1, k),
                ur: Point3::new(i, j + 1, k + 1),
                block_side,
            },

            BlockSide::RIGHT => Face {
                ll: Point3::new(i + 1, j, k + 1),
                lr: Point3::new(i + 1, j, k),
                ul: Point3::new(i + 1, j + 1, k + 1),
                ur: Point3::new(i + 1, j + 1, k),
                block_side,
            },
        }
    }

    /// Corners in vertex order: `ll`, `lr`, `ul`, `ur`.
    pub fn corners(&self) -> [Point3<i32>; 4] {
        [self.ll, self.lr, self.ul, self.ur]
    }

    /// Index data for a face, offset by the number of faces already emitted.
    ///
    /// Two triangles: `ll lr ur` and `ll ur ul`.
    pub fn indices(num_faces_generated: u32) -> [u32; 6] {
        let base = num_faces_generated * 4;
        [base, base + 1, base + 3, base, base + 3, base + 2]
    }
}
