//! Vertex format of a chunk mesh.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;

/// One corner of a block face.
///
/// # Memory Layout
/// - Position: 3x i32 (12 bytes)
/// - Side: u32 (4 bytes)
/// - Tint: u32, packed 4-4-4 colour in the low bits (4 bytes)
/// - Light: [sun, red, green, blue] of the cell in front of the face (4 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// X coordinate in world space
    pub x: i32,
    /// Y coordinate in world space
    pub y: i32,
    /// Z coordinate in world space
    pub z: i32,
    /// `BlockSide` discriminant of the face
    pub side: u32,
    /// Block tint
    pub tint: u32,
    /// Light levels sampled for the face
    pub light: [u8; 4],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `pos` - World position of the corner
    /// * `side` - The face this corner belongs to
    /// * `tint` - Packed block colour
    /// * `light` - `[sun, red, green, blue]` in front of the face
    pub fn new(pos: Point3<i32>, side: BlockSide, tint: u16, light: [u8; 4]) -> Self {
        Vertex {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            side: side as u32,
            tint: tint as u32,
            light,
        }
    }

    /// World position of the corner.
    pub fn position(&self) -> Point3<i32> {
        Point3::new(self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        let vertex = Vertex::new(Point3::new(-1, 2, 3), BlockSide::TOP, 0x0FFF, [15, 1, 2, 3]);
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 24);
        assert_eq!(vertex.position(), Point3::new(-1, 2, 3));
        assert_eq!(vertex.side, BlockSide::TOP as u32);
    }
}
