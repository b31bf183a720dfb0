//! # Chunk Streamer
//!
//! The synchronous core of the chunk cache. It owns the block arena, the
//! lighting engine and the sparse chunk store, and advances chunks through the
//! pipeline one sweep at a time. [`ChunkCache`](crate::engine_state::task_management::ChunkCache)
//! wraps it with a background worker; tests and tools can drive it directly.
//!
//! ## Ranges
//! Around the chunk containing the cache center lie two cubes of chunk
//! coordinates. Chunks inside the view range are generated, lit and built.
//! Chunks inside the cache range but outside the view range are only
//! generated. Chunks outside the cache range are evicted.
//!
//! ## Sweeps
//! A sweep evicts what left the cache range, advances pending chunks by one
//! stage each (nearest first, up to `max_chunks_per_sweep` stage advances),
//! then evicts again and creates whatever chunk coordinates are missing. The
//! center is re-read before every stage so a chunk leaving range is never
//! pushed further down the pipeline. Eviction always runs before creation, so
//! two resident chunks never share arena cells.
//!
//! ## Sky
//! Sunlight enters through the top layer of a lit chunk whose upper neighbour
//! is not lit. Lighting the upper neighbour revokes that sky; evicting it
//! seeds the sky again.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::{debug, info};
use web_time::Instant;

use crate::config::CacheConfig;
use crate::core::MtResource;
use crate::engine_state::generation::{PerlinTerrain, TerrainGenerator};
use crate::engine_state::lighting::{LightChanges, LightingEngine, LightingView};
use crate::engine_state::meshing::{ChunkMesh, CulledMeshBuilder, MeshBuilder, MeshEvent};
use crate::error::ConfigError;

use super::arena::BlockArena;
use super::block::{block_side::BlockSide, registry::BlockRegistry, Block, Rgb};
use super::chunk::{
    chunk_creation::ChunkWriter, chunk_iteration::CellIterator, chunk_origin, edge_sides,
    world_to_chunk_coord, world_to_local, BoundingBox, Chunk, ChunkState, NeighborLookup,
    CHUNK_DIMENSION,
};
use super::diagnostics::{StateCounts, SweepReport};

/// Latest requested cache center, shared with whoever moves the viewpoint.
pub type CenterSlot = MtResource<Option<Point3<f32>>>;

/// The view and cache cubes around a center, in chunk coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheRanges {
    center: Point3<i32>,
    view_range: i32,
    cache_range: i32,
}

impl CacheRanges {
    /// Ranges around the chunk containing the world position `center`.
    pub fn around(center: Point3<f32>, view_range: i32, cache_range: i32) -> Self {
        let block = Point3::new(
            center.x.floor() as i32,
            center.y.floor() as i32,
            center.z.floor() as i32,
        );
        CacheRanges {
            center: world_to_chunk_coord(block),
            view_range,
            cache_range,
        }
    }

    /// Chunk coordinate of the center.
    pub fn center(&self) -> Point3<i32> {
        self.center
    }

    /// Chebyshev distance from the center, in chunks.
    pub fn distance(&self, coord: Point3<i32>) -> i32 {
        let delta = coord - self.center;
        delta.x.abs().max(delta.y.abs()).max(delta.z.abs())
    }

    pub fn in_view(&self, coord: Point3<i32>) -> bool {
        self.distance(coord) <= self.view_range
    }

    pub fn in_cache(&self, coord: Point3<i32>) -> bool {
        self.distance(coord) <= self.cache_range
    }

    /// Lowest chunk coordinate of the cache cube.
    pub fn cache_min(&self) -> Point3<i32> {
        self.center - Vector3::new(self.cache_range, self.cache_range, self.cache_range)
    }

    /// Highest chunk coordinate of the cache cube.
    pub fn cache_max(&self) -> Point3<i32> {
        self.center + Vector3::new(self.cache_range, self.cache_range, self.cache_range)
    }
}

/// A world edit, as queued for the worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edit {
    AddBlock(Point3<i32>, Block),
    RemoveBlock(Point3<i32>),
    AddLightSource(Point3<i32>, Rgb),
    RemoveLightSource(Point3<i32>),
}

/// Cells of resident chunks, as seen by the lighting engine.
struct ResidentCells<'a> {
    chunks: &'a HashMap<Point3<i32>, Chunk>,
}

impl ResidentCells<'_> {
    fn chunk(&self, pos: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&world_to_chunk_coord(pos))
    }
}

impl LightingView for ResidentCells<'_> {
    fn is_lightable(&self, pos: Point3<i32>) -> bool {
        self.chunk(pos).is_some_and(|chunk| chunk.state().is_lit())
    }

    fn is_sky_exposed(&self, pos: Point3<i32>) -> bool {
        world_to_local(pos).y == CHUNK_DIMENSION - 1
            && self.is_lightable(pos)
            && !self.is_lightable(pos + BlockSide::TOP.offset())
    }

    fn registered_source(&self, pos: Point3<i32>) -> Option<Rgb> {
        self.chunk(pos)?.light_sources().get(&pos).copied()
    }
}

/// Blocks of generated resident chunks, as seen by the mesh builder.
struct ResidentBlocks<'a> {
    chunks: &'a HashMap<Point3<i32>, Chunk>,
    arena: &'a BlockArena,
}

impl NeighborLookup for ResidentBlocks<'_> {
    fn block_at(&self, pos: Point3<i32>) -> Option<Block> {
        let chunk = self.chunks.get(&world_to_chunk_coord(pos))?;
        chunk.state().is_generated().then(|| self.arena.get(pos))
    }
}

/// Top layer of cells of the chunk at `coord`.
fn top_layer(coord: Point3<i32>) -> Vec<Point3<i32>> {
    let origin = chunk_origin(coord);
    let top = origin.y + CHUNK_DIMENSION - 1;
    let first = Point3::new(origin.x, top, origin.z);
    let last = Point3::new(origin.x + CHUNK_DIMENSION - 1, top, origin.z + CHUNK_DIMENSION - 1);
    CellIterator::new(first, last).collect()
}

/// Chunk store, arena and pipeline driver.
pub struct ChunkStreamer {
    config: CacheConfig,
    registry: Arc<BlockRegistry>,
    arena: BlockArena,
    lighting: LightingEngine,
    chunks: HashMap<Point3<i32>, Chunk>,
    /// Ranges as of the last center refresh; `None` until a center is known.
    ranges: Option<CacheRanges>,
    center: CenterSlot,
    terrain: Arc<dyn TerrainGenerator>,
    mesher: Arc<dyn MeshBuilder>,
    mesh_events: Option<Sender<MeshEvent>>,
    rebuild_transitions: u64,
}

impl ChunkStreamer {
    /// Creates an empty streamer.
    ///
    /// # Arguments
    /// * `config` - Ranges and sweep budget; validated here
    /// * `registry` - Block optics shared with the mesh builder
    /// * `terrain` - Fills chunks as they are generated
    /// * `mesher` - Builds meshes for lit chunks
    ///
    /// # Returns
    /// The streamer, or the configuration error
    pub fn new(
        config: CacheConfig,
        registry: Arc<BlockRegistry>,
        terrain: Arc<dyn TerrainGenerator>,
        mesher: Arc<dyn MeshBuilder>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let arena = BlockArena::for_cache_range(config.cache_range);
        let lighting = LightingEngine::new(registry.clone(), arena.len());
        info!(
            "chunk streamer: view range {}, cache range {}, arena span {} blocks",
            config.view_range,
            config.cache_range,
            arena.span()
        );
        Ok(ChunkStreamer {
            config,
            registry,
            arena,
            lighting,
            chunks: HashMap::new(),
            ranges: None,
            center: MtResource::new(None),
            terrain,
            mesher,
            mesh_events: None,
            rebuild_transitions: 0,
        })
    }

    /// A streamer over Perlin terrain with the culled mesh builder.
    pub fn from_config(config: CacheConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(BlockRegistry::new());
        let terrain = Arc::new(PerlinTerrain::new(config.seed, registry.clone()));
        let mesher = Arc::new(CulledMeshBuilder::new(registry.clone()));
        Self::new(config, registry, terrain, mesher)
    }

    /// Starts delivering [`MeshEvent`]s to the returned receiver, replacing
    /// any earlier subscriber.
    pub fn subscribe_meshes(&mut self) -> Receiver<MeshEvent> {
        let (sender, receiver) = mpsc::channel();
        self.mesh_events = Some(sender);
        receiver
    }

    /// Handle to the center slot. Writing it takes effect at the next stage boundary.
    pub fn center_slot(&self) -> CenterSlot {
        self.center.clone()
    }

    /// Moves the cache center to the world position `(x, y, z)`.
    pub fn update_cache_position(&mut self, x: f32, y: f32, z: f32) {
        *self.center.get_mut() = Some(Point3::new(x, y, z));
        self.refresh_ranges();
    }

    fn refresh_ranges(&mut self) -> Option<CacheRanges> {
        let center = (*self.center.get())?;
        let ranges = CacheRanges::around(center, self.config.view_range, self.config.cache_range);
        if self.ranges.map(|current| current.center()) != Some(ranges.center()) {
            info!("cache centered on chunk {:?}", ranges.center());
        }
        self.ranges = Some(ranges);
        Some(ranges)
    }

    /// Runs one pass over the chunk store.
    pub fn sweep(&mut self) -> SweepReport {
        let start = Instant::now();
        let mut report = SweepReport::default();
        let Some(ranges) = self.refresh_ranges() else {
            return report;
        };
        self.evict_outside(ranges, &mut report);

        let mut pending: Vec<Point3<i32>> = self
            .chunks
            .iter()
            .filter(|(_, chunk)| {
                matches!(
                    chunk.state(),
                    ChunkState::AwaitingGenerate
                        | ChunkState::AwaitingLighting
                        | ChunkState::AwaitingBuild
                )
            })
            .map(|(coord, _)| *coord)
            .collect();
        pending.sort_by_key(|coord| ranges.distance(*coord));

        let mut budget = self.config.max_chunks_per_sweep;
        for coord in pending {
            if budget == 0 {
                break;
            }
            let Some(ranges) = self.refresh_ranges() else {
                break;
            };
            if self.advance(coord, ranges, &mut report) {
                budget -= 1;
            }
        }

        if let Some(ranges) = self.refresh_ranges() {
            self.evict_outside(ranges, &mut report);
            self.create_missing(ranges, &mut report);
        }

        report.elapsed = start.elapsed();
        if !report.is_idle() {
            debug!("sweep: {} stage advances, {report:?}", report.stage_advances());
        }
        report
    }

    /// Moves one chunk one stage forward. Returns whether a stage ran.
    fn advance(&mut self, coord: Point3<i32>, ranges: CacheRanges, report: &mut SweepReport) -> bool {
        if !ranges.in_cache(coord) {
            return false;
        }
        let Some(state) = self.chunks.get(&coord).map(Chunk::state) else {
            return false;
        };
        let in_view = ranges.in_view(coord);
        match state {
            ChunkState::AwaitingGenerate => {
                self.generate(coord);
                report.generated += 1;
                true
            }
            ChunkState::AwaitingLighting if in_view => {
                self.light(coord, report);
                report.lit += 1;
                true
            }
            ChunkState::AwaitingBuild if in_view && self.neighbors_generated(coord, ranges) => {
                self.build(coord);
                report.built += 1;
                true
            }
            _ => false,
        }
    }

    fn generate(&mut self, coord: Point3<i32>) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        chunk.set_state(ChunkState::Generating);
        let origin = chunk.origin();

        // The cells may still hold the chunk that last used this arena region.
        let mut writer = ChunkWriter::new(&mut self.arena, origin);
        writer.fill(Block::AIR);
        self.terrain.generate_data_for_chunk(&mut writer);

        *chunk.bounds_mut() = BoundingBox::rescan(origin, &self.arena);
        chunk.set_state(ChunkState::AwaitingLighting);
    }

    fn light(&mut self, coord: Point3<i32>, report: &mut SweepReport) {
        let below = coord - BlockSide::TOP.offset();
        let below_lit = self.is_lit(below);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        chunk.set_state(ChunkState::Lighting);
        let (origin, last) = (chunk.origin(), chunk.last_cell());

        let view = ResidentCells {
            chunks: &self.chunks,
        };
        let mut changes = Vec::with_capacity(2);
        if below_lit {
            changes.push(self.lighting.revoke_sky(&mut self.arena, &view, &top_layer(below)));
        }
        changes.push(self.lighting.light_region(&mut self.arena, &view, origin, last));

        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.set_state(ChunkState::AwaitingBuild);
        }
        for change in &changes {
            report.dirtied += self.mark_light_changes(change);
        }
    }

    /// Whether every face neighbour inside the cache range has its blocks,
    /// so border faces are culled against real data.
    fn neighbors_generated(&self, coord: Point3<i32>, ranges: CacheRanges) -> bool {
        BlockSide::all().into_iter().all(|side| {
            let neighbor = coord + side.offset();
            !ranges.in_cache(neighbor)
                || self
                    .chunks
                    .get(&neighbor)
                    .is_some_and(|chunk| chunk.state().is_generated())
        })
    }

    fn build(&mut self, coord: Point3<i32>) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        chunk.set_state(ChunkState::Building);

        let Some(chunk) = self.chunks.get(&coord) else {
            return;
        };
        let lookup = ResidentBlocks {
            chunks: &self.chunks,
            arena: &self.arena,
        };
        let mesh = Arc::new(self.mesher.build(chunk, &self.arena, &lookup));

        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.set_mesh(mesh.clone());
            chunk.set_state(ChunkState::Ready);
        }
        self.publish(MeshEvent::Built(coord, mesh));
    }

    fn evict_outside(&mut self, ranges: CacheRanges, report: &mut SweepReport) {
        let leaving: Vec<Point3<i32>> = self
            .chunks
            .keys()
            .filter(|coord| !ranges.in_cache(**coord))
            .copied()
            .collect();
        for coord in leaving {
            self.evict(coord, report);
        }
    }

    fn evict(&mut self, coord: Point3<i32>, report: &mut SweepReport) {
        let below = coord - BlockSide::TOP.offset();
        let below_lit = self.is_lit(below);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let was_lit = chunk.state().is_lit();
        chunk.set_state(ChunkState::AwaitingRemoval);
        let (origin, last) = (chunk.origin(), chunk.last_cell());
        let released = chunk.release_mesh();

        if was_lit {
            let view = ResidentCells {
                chunks: &self.chunks,
            };
            let mut changes = vec![self.lighting.unlight_region(&mut self.arena, &view, origin, last)];
            if below_lit {
                changes.push(self.lighting.seed_sky(&mut self.arena, &view, &top_layer(below)));
            }
            for change in &changes {
                report.dirtied += self.mark_light_changes(change);
            }
        }

        self.chunks.remove(&coord);
        if released {
            self.publish(MeshEvent::Released(coord));
        }
        report.evicted += 1;
        debug!("evicted chunk {coord:?}");
    }

    fn create_missing(&mut self, ranges: CacheRanges, report: &mut SweepReport) {
        let (min, max) = (ranges.cache_min(), ranges.cache_max());
        for coord in CellIterator::new(min, max) {
            if !self.chunks.contains_key(&coord) {
                self.chunks.insert(coord, Chunk::new(coord));
                report.created += 1;
            }
        }
    }

    fn publish(&mut self, event: MeshEvent) {
        if let Some(sender) = &self.mesh_events {
            if sender.send(event).is_err() {
                info!("mesh consumer went away; no longer publishing meshes");
                self.mesh_events = None;
            }
        }
    }

    fn is_lit(&self, coord: Point3<i32>) -> bool {
        self.chunks
            .get(&coord)
            .is_some_and(|chunk| chunk.state().is_lit())
    }

    /// Moves a `Ready` chunk back to `AwaitingBuild`. Returns whether it moved.
    pub fn mark_dirty(&mut self, coord: Point3<i32>) -> bool {
        let dirtied = self
            .chunks
            .get_mut(&coord)
            .is_some_and(|chunk| chunk.mark_dirty());
        if dirtied {
            self.rebuild_transitions += 1;
        }
        dirtied
    }

    fn mark_light_changes(&mut self, changes: &LightChanges) -> usize {
        changes
            .chunks()
            .filter(|coord| self.mark_dirty(**coord))
            .count()
    }

    /// Marks the chunk holding `pos`, any neighbour across a face `pos` touches
    /// and every chunk whose light changed.
    fn invalidate_edit(&mut self, pos: Point3<i32>, changes: &[LightChanges]) {
        let coord = world_to_chunk_coord(pos);
        self.mark_dirty(coord);
        for side in edge_sides(world_to_local(pos)) {
            self.mark_dirty(coord + side.offset());
        }
        for change in changes {
            self.mark_light_changes(change);
        }
    }

    /// The chunk holding `pos`, if it is resident and generated.
    fn loaded_chunk_mut(&mut self, pos: Point3<i32>) -> Option<&mut Chunk> {
        let coord = world_to_chunk_coord(pos);
        let chunk = self
            .chunks
            .get_mut(&coord)
            .filter(|chunk| chunk.state().is_generated());
        if chunk.is_none() {
            debug!("ignoring edit at {pos:?}: chunk {coord:?} is not loaded");
        }
        chunk
    }

    /// Applies a queued edit. Returns whether it took effect.
    pub fn apply(&mut self, edit: Edit) -> bool {
        match edit {
            Edit::AddBlock(pos, block) => self.add_block(pos, block),
            Edit::RemoveBlock(pos) => self.remove_block(pos),
            Edit::AddLightSource(pos, rgb) => self.add_light_source(pos, rgb),
            Edit::RemoveLightSource(pos) => self.remove_light_source(pos),
        }
    }

    /// Places `block` at `pos`.
    ///
    /// Ignored, returning `false`, when the chunk is not resident or not yet
    /// generated. Air is treated as [`ChunkStreamer::remove_block`].
    pub fn add_block(&mut self, pos: Point3<i32>, block: Block) -> bool {
        if block.is_empty() {
            return self.remove_block(pos);
        }
        let Some(chunk) = self.loaded_chunk_mut(pos) else {
            return false;
        };
        chunk.bounds_mut().extend(pos);
        let lit = chunk.state().is_lit();

        let previous = self.arena.get(pos);
        self.arena.set(pos, block.unlit());
        debug!(
            "placed {} at {pos:?}",
            self.registry.properties(block.block_type()).name
        );

        let mut changes = Vec::new();
        if lit {
            let view = ResidentCells {
                chunks: &self.chunks,
            };
            changes.push(self.lighting.on_block_added(&mut self.arena, &view, pos, previous));
        }
        self.invalidate_edit(pos, &changes);
        true
    }

    /// Clears the block at `pos`. Same residency rules as [`ChunkStreamer::add_block`].
    pub fn remove_block(&mut self, pos: Point3<i32>) -> bool {
        let Some(chunk) = self.loaded_chunk_mut(pos) else {
            return false;
        };
        let lit = chunk.state().is_lit();
        let origin = chunk.origin();

        let previous = self.arena.get(pos);
        if previous.is_empty() {
            return true;
        }
        self.arena.set(pos, Block::AIR);
        debug!(
            "removed {} at {pos:?}",
            self.registry.properties(previous.block_type()).name
        );
        if let Some(chunk) = self.chunks.get_mut(&world_to_chunk_coord(pos)) {
            *chunk.bounds_mut() = BoundingBox::rescan(origin, &self.arena);
        }

        let mut changes = Vec::new();
        if lit {
            let view = ResidentCells {
                chunks: &self.chunks,
            };
            changes.push(self.lighting.on_block_removed(&mut self.arena, &view, pos, previous));
        }
        self.invalidate_edit(pos, &changes);
        true
    }

    /// Registers a coloured light source at `pos`, replacing any source there.
    pub fn add_light_source(&mut self, pos: Point3<i32>, rgb: Rgb) -> bool {
        let Some(chunk) = self.loaded_chunk_mut(pos) else {
            return false;
        };
        let lit = chunk.state().is_lit();
        let replaced = chunk.light_sources_mut().remove(&pos).is_some();

        let mut changes = Vec::new();
        if lit && replaced {
            let view = ResidentCells {
                chunks: &self.chunks,
            };
            changes.push(self.lighting.remove_light_source(&mut self.arena, &view, pos));
        }
        if let Some(chunk) = self.chunks.get_mut(&world_to_chunk_coord(pos)) {
            chunk.light_sources_mut().insert(pos, rgb);
        }
        if lit {
            let view = ResidentCells {
                chunks: &self.chunks,
            };
            changes.push(self.lighting.add_light_source(&mut self.arena, &view, pos, rgb));
        }
        self.mark_dirty(world_to_chunk_coord(pos));
        for change in &changes {
            self.mark_light_changes(change);
        }
        true
    }

    /// Unregisters the light source at `pos`. Returns `false` if there was none.
    pub fn remove_light_source(&mut self, pos: Point3<i32>) -> bool {
        let Some(chunk) = self.loaded_chunk_mut(pos) else {
            return false;
        };
        let lit = chunk.state().is_lit();
        if chunk.light_sources_mut().remove(&pos).is_none() {
            return false;
        }

        if lit {
            let view = ResidentCells {
                chunks: &self.chunks,
            };
            let changes = self.lighting.remove_light_source(&mut self.arena, &view, pos);
            self.mark_light_changes(&changes);
        }
        self.mark_dirty(world_to_chunk_coord(pos));
        true
    }

    /// The chunk containing world position `pos`, if resident.
    pub fn get_chunk_by_world_position(&self, pos: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&world_to_chunk_coord(pos))
    }

    /// The chunk at chunk coordinate `coord`, if resident.
    pub fn get_chunk_by_relative_position(&self, coord: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// The resident chunk across `side` of the chunk whose lowest corner is `origin`.
    pub fn get_neighbor_chunk(&self, origin: Point3<i32>, side: BlockSide) -> Option<&Chunk> {
        self.chunks
            .get(&(world_to_chunk_coord(origin) + side.offset()))
    }

    /// The block at `pos`, if its chunk is resident and generated.
    pub fn block_at(&self, pos: Point3<i32>) -> Option<Block> {
        ResidentBlocks {
            chunks: &self.chunks,
            arena: &self.arena,
        }
        .block_at(pos)
    }

    /// Resident chunks per pipeline state.
    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for chunk in self.chunks.values() {
            counts.record(chunk.state());
        }
        counts
    }

    /// Meshes of `Ready` chunks, including empty ones.
    pub fn ready_meshes(&self) -> impl Iterator<Item = (Point3<i32>, &Arc<ChunkMesh>)> + '_ {
        self.chunks
            .values()
            .filter(|chunk| chunk.state() == ChunkState::Ready)
            .filter_map(|chunk| chunk.mesh().map(|mesh| (chunk.coordinate(), mesh)))
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Ranges as of the last refresh.
    pub fn ranges(&self) -> Option<CacheRanges> {
        self.ranges
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn arena(&self) -> &BlockArena {
        &self.arena
    }

    /// `Ready -> AwaitingBuild` transitions so far.
    pub fn rebuild_transitions(&self) -> u64 {
        self.rebuild_transitions
    }
}
