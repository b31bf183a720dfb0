//! # Chunk Module
//!
//! A chunk is a 32³ view over a region of the [`BlockArena`]. It owns no block
//! data; it carries the pipeline state, its coordinates, the bounding box of
//! its non-empty blocks, its registry of explicit light sources and, once
//! built, a CPU-side mesh.
//!
//! ## Coordinates
//! - *World position*: a block position in world space.
//! - *Chunk coordinate*: `floor(world / CHUNK_DIMENSION)` per axis. This is the
//!   key of the chunk store and stays stable while the cache recenters.
//! - *Origin*: chunk coordinate × `CHUNK_DIMENSION`, the chunk's lowest corner.
//! - *Local position*: world position minus origin, each axis in `0..32`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cgmath::{Point3, Vector3};

use super::block::{block_side::BlockSide, Block, Rgb};
use crate::engine_state::meshing::ChunkMesh;

pub mod bounding_box;
pub mod chunk_creation;
pub mod chunk_iteration;

pub use bounding_box::BoundingBox;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 32;

/// Chunk coordinate containing a world position. Floors, so `-1` maps to chunk `-1`.
pub fn world_to_chunk_coord(pos: Point3<i32>) -> Point3<i32> {
    Point3::new(
        pos.x.div_euclid(CHUNK_DIMENSION),
        pos.y.div_euclid(CHUNK_DIMENSION),
        pos.z.div_euclid(CHUNK_DIMENSION),
    )
}

/// Position of a world position inside its chunk.
pub fn world_to_local(pos: Point3<i32>) -> Point3<i32> {
    Point3::new(
        pos.x.rem_euclid(CHUNK_DIMENSION),
        pos.y.rem_euclid(CHUNK_DIMENSION),
        pos.z.rem_euclid(CHUNK_DIMENSION),
    )
}

/// Lowest world corner of the chunk at `coord`.
pub fn chunk_origin(coord: Point3<i32>) -> Point3<i32> {
    Point3::new(
        coord.x * CHUNK_DIMENSION,
        coord.y * CHUNK_DIMENSION,
        coord.z * CHUNK_DIMENSION,
    )
}

/// Faces of the chunk that a local position touches.
///
/// A position with a 0 or `CHUNK_DIMENSION - 1` component lies on that face;
/// corners touch up to three faces.
pub fn edge_sides(local: Point3<i32>) -> Vec<BlockSide> {
    BlockSide::all()
        .into_iter()
        .filter(|side| {
            let component = [local.x, local.y, local.z][side.axis()];
            if side.is_positive() {
                component == CHUNK_DIMENSION - 1
            } else {
                component == 0
            }
        })
        .collect()
}

/// Pipeline state of a chunk.
///
/// The forward path is `AwaitingGenerate → Generating → AwaitingLighting →
/// Lighting → AwaitingBuild → Building → Ready`. `Ready` falls back to
/// `AwaitingBuild` only when an edit or a light change touches the chunk.
/// Any state moves to `AwaitingRemoval` when the chunk leaves the cache range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChunkState {
    /// Resident, block data not yet produced.
    AwaitingGenerate,
    /// The terrain generator is filling the chunk.
    Generating,
    /// Block data present, light not yet computed.
    AwaitingLighting,
    /// The lighting engine is flooding the chunk.
    Lighting,
    /// Lit; needs a mesh.
    AwaitingBuild,
    /// The mesh builder is running.
    Building,
    /// Mesh built and handed off.
    Ready,
    /// Out of range; about to be dropped from the store.
    AwaitingRemoval,
}

impl ChunkState {
    /// Every state, in pipeline order.
    pub const ALL: [ChunkState; 8] = [
        ChunkState::AwaitingGenerate,
        ChunkState::Generating,
        ChunkState::AwaitingLighting,
        ChunkState::Lighting,
        ChunkState::AwaitingBuild,
        ChunkState::Building,
        ChunkState::Ready,
        ChunkState::AwaitingRemoval,
    ];

    /// Block data has been generated and the chunk is still resident.
    pub fn is_generated(self) -> bool {
        self >= ChunkState::AwaitingLighting && self != ChunkState::AwaitingRemoval
    }

    /// The chunk's cells take part in light propagation.
    pub fn is_lit(self) -> bool {
        self >= ChunkState::Lighting && self != ChunkState::AwaitingRemoval
    }
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Read access to blocks around a chunk, handed to the mesh builder.
///
/// Replaces a captured callback into the cache: the builder can look across
/// chunk borders without holding on to the cache itself.
pub trait NeighborLookup {
    /// The block at a world position, or `None` if its chunk is not resident
    /// or not yet generated.
    fn block_at(&self, pos: Point3<i32>) -> Option<Block>;
}

/// One 32³ region of the streamed world.
pub struct Chunk {
    /// Current pipeline state.
    state: ChunkState,
    /// Chunk coordinate; the key of the chunk store.
    coordinate: Point3<i32>,
    /// World position of the lowest corner.
    origin: Point3<i32>,
    /// Box of non-empty blocks.
    bounds: BoundingBox,
    /// Explicit light sources keyed by world position.
    light_sources: HashMap<Point3<i32>, Rgb>,
    /// Mesh from the last build, if any.
    mesh: Option<Arc<ChunkMesh>>,
}

impl Chunk {
    /// A fresh chunk awaiting generation.
    pub fn new(coordinate: Point3<i32>) -> Self {
        let origin = chunk_origin(coordinate);
        Chunk {
            state: ChunkState::AwaitingGenerate,
            coordinate,
            origin,
            bounds: BoundingBox::collapsed(origin),
            light_sources: HashMap::new(),
            mesh: None,
        }
    }

    /// Current pipeline state.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ChunkState) {
        if self.state != state {
            log::debug!("chunk {:?}: {} -> {}", self.coordinate, self.state, state);
            self.state = state;
        }
    }

    /// Moves a `Ready` chunk back to `AwaitingBuild`.
    ///
    /// Returns `true` only if that transition happened, so marking the same
    /// chunk twice is harmless.
    pub(crate) fn mark_dirty(&mut self) -> bool {
        if self.state == ChunkState::Ready {
            self.set_state(ChunkState::AwaitingBuild);
            true
        } else {
            false
        }
    }

    /// Chunk coordinate.
    pub fn coordinate(&self) -> Point3<i32> {
        self.coordinate
    }

    /// World position of the lowest corner.
    pub fn origin(&self) -> Point3<i32> {
        self.origin
    }

    /// World position of the highest corner.
    pub fn last_cell(&self) -> Point3<i32> {
        self.origin + Vector3::new(CHUNK_DIMENSION - 1, CHUNK_DIMENSION - 1, CHUNK_DIMENSION - 1)
    }

    /// Whether a world position falls inside this chunk.
    pub fn contains(&self, pos: Point3<i32>) -> bool {
        world_to_chunk_coord(pos) == self.coordinate
    }

    /// Box of non-empty blocks.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub(crate) fn bounds_mut(&mut self) -> &mut BoundingBox {
        &mut self.bounds
    }

    /// Explicit light sources registered in this chunk.
    pub fn light_sources(&self) -> &HashMap<Point3<i32>, Rgb> {
        &self.light_sources
    }

    pub(crate) fn light_sources_mut(&mut self) -> &mut HashMap<Point3<i32>, Rgb> {
        &mut self.light_sources
    }

    /// Mesh from the last build. `Ready` chunks with no visible faces hold an
    /// empty mesh.
    pub fn mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.mesh.as_ref()
    }

    pub(crate) fn set_mesh(&mut self, mesh: Arc<ChunkMesh>) {
        self.mesh = Some(mesh);
    }

    /// Drops the mesh, returning whether there was one.
    pub(crate) fn release_mesh(&mut self) -> bool {
        self.mesh.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_positions_floor_to_lower_chunk() {
        assert_eq!(world_to_chunk_coord(Point3::new(-1, 0, 31)), Point3::new(-1, 0, 0));
        assert_eq!(world_to_chunk_coord(Point3::new(-32, -33, 32)), Point3::new(-1, -2, 1));
        assert_eq!(world_to_local(Point3::new(-1, -33, 32)), Point3::new(31, 31, 0));
    }

    #[test]
    fn edge_sides_detects_faces_and_corners() {
        assert!(edge_sides(Point3::new(5, 6, 7)).is_empty());
        assert_eq!(edge_sides(Point3::new(0, 6, 7)), vec![BlockSide::LEFT]);
        assert_eq!(edge_sides(Point3::new(5, 31, 7)), vec![BlockSide::TOP]);

        let corner = edge_sides(Point3::new(31, 0, 31));
        assert_eq!(corner.len(), 3);
        assert!(corner.contains(&BlockSide::RIGHT));
        assert!(corner.contains(&BlockSide::BOTTOM));
        assert!(corner.contains(&BlockSide::FRONT));
    }

    #[test]
    fn mark_dirty_only_regresses_ready_chunks() {
        let mut chunk = Chunk::new(Point3::new(1, -1, 0));
        assert_eq!(chunk.origin(), Point3::new(32, -32, 0));
        assert!(!chunk.mark_dirty());
        assert_eq!(chunk.state(), ChunkState::AwaitingGenerate);

        chunk.set_state(ChunkState::Ready);
        assert!(chunk.mark_dirty());
        assert!(!chunk.mark_dirty());
        assert_eq!(chunk.state(), ChunkState::AwaitingBuild);
    }

    #[test]
    fn lit_and_generated_predicates_follow_pipeline() {
        assert!(!ChunkState::Generating.is_generated());
        assert!(ChunkState::AwaitingLighting.is_generated());
        assert!(!ChunkState::AwaitingLighting.is_lit());
        assert!(ChunkState::Lighting.is_lit());
        assert!(ChunkState::Ready.is_lit());
        assert!(!ChunkState::AwaitingRemoval.is_lit());
        assert!(!ChunkState::AwaitingRemoval.is_generated());
    }
}
