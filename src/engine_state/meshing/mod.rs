//! # Meshing
//!
//! Turns a lit chunk into CPU-side geometry. The cache treats the builder as an
//! external collaborator behind [`MeshBuilder`]; [`CulledMeshBuilder`] is the
//! stock implementation and emits one quad per visible block face.
//!
//! A face is visible unless the block across it is fully opaque. Across a chunk
//! border the builder asks a [`NeighborLookup`]; a neighbour that is not
//! resident or not generated counts as open, so border faces are emitted and
//! culled later when the neighbour's arrival dirties this chunk again.

use std::sync::Arc;

use cgmath::Point3;
use log::debug;
use web_time::Instant;

use crate::engine_state::voxels::{
    arena::BlockArena,
    block::{block_side::BlockSide, registry::BlockRegistry, Block},
    chunk::{Chunk, NeighborLookup},
};

pub mod face;
pub mod vertex;

pub use face::Face;
pub use vertex::Vertex;

/// Geometry of one chunk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    /// `true` for chunks with nothing visible. Such chunks still reach `Ready`.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of quads.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Appends a face lit by `light`.
    pub fn push_face(&mut self, face: &Face, tint: u16, light: [u8; 4]) {
        let faces_so_far = self.face_count() as u32;
        self.vertices.extend(
            face.corners()
                .into_iter()
                .map(|corner| Vertex::new(corner, face.block_side, tint, light)),
        );
        self.indices.extend(Face::indices(faces_so_far));
    }

    /// Raw vertex bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Notification sent to the consumer of built meshes.
#[derive(Debug, Clone)]
pub enum MeshEvent {
    /// A chunk finished building; replaces any earlier mesh for it.
    Built(Point3<i32>, Arc<ChunkMesh>),
    /// A chunk left the cache; its mesh must be dropped.
    Released(Point3<i32>),
}

impl MeshEvent {
    /// Chunk coordinate the event refers to.
    pub fn coordinate(&self) -> Point3<i32> {
        match self {
            MeshEvent::Built(coordinate, _) | MeshEvent::Released(coordinate) => *coordinate,
        }
    }
}

/// Builds a mesh for a lit chunk.
pub trait MeshBuilder: Send + Sync {
    /// Produces the geometry of `chunk`.
    ///
    /// # Arguments
    /// * `chunk` - The chunk to build; its blocks live in `arena`
    /// * `arena` - Block storage
    /// * `neighbors` - Lookup for blocks beyond the chunk's faces
    fn build(&self, chunk: &Chunk, arena: &BlockArena, neighbors: &dyn NeighborLookup) -> ChunkMesh;
}

/// One quad per block face that is not hidden by a fully opaque neighbour.
pub struct CulledMeshBuilder {
    registry: Arc<BlockRegistry>,
}

impl CulledMeshBuilder {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        CulledMeshBuilder { registry }
    }

    fn neighbor(
        chunk: &Chunk,
        arena: &BlockArena,
        neighbors: &dyn NeighborLookup,
        pos: Point3<i32>,
    ) -> Option<Block> {
        if chunk.contains(pos) {
            Some(arena.get(pos))
        } else {
            neighbors.block_at(pos)
        }
    }
}

impl MeshBuilder for CulledMeshBuilder {
    fn build(&self, chunk: &Chunk, arena: &BlockArena, neighbors: &dyn NeighborLookup) -> ChunkMesh {
        let start = Instant::now();
        let mut mesh = ChunkMesh::default();
        if chunk.bounds().is_empty() {
            return mesh;
        }

        for pos in chunk.bounds().cells() {
            let block = arena.get(pos);
            if block.is_empty() {
                continue;
            }
            for side in BlockSide::all() {
                let across = Self::neighbor(chunk, arena, neighbors, pos + side.offset());
                let hidden = across
                    .map(|neighbor| self.registry.is_opaque(neighbor.block_type()))
                    .unwrap_or(false);
                if hidden {
                    continue;
                }
                let light = across
                    .map(|neighbor| [neighbor.sun, neighbor.red, neighbor.green, neighbor.blue])
                    .unwrap_or_default();
                mesh.push_face(&Face::new(pos, side), block.color, light);
            }
        }

        debug!(
            "meshed chunk {:?}: {} faces in {:?}",
            chunk.coordinate(),
            mesh.face_count(),
            start.elapsed()
        );
        mesh
    }
}
