use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cgmath::Point3;
use voxel_streaming::engine_state::voxels::{
    chunk::chunk_creation::ChunkWriter, streamer::CenterSlot,
};
use voxel_streaming::{
    Block, BlockRegistry, BlockSide, BlockType, CacheConfig, ChunkState, ChunkStreamer, ConfigError,
    CulledMeshBuilder, FlatTerrain, MeshEvent, TerrainGenerator,
};

fn flat_streamer(view_range: i32, cache_range: i32, ground: i32) -> ChunkStreamer {
    let registry = Arc::new(BlockRegistry::new());
    let config = CacheConfig {
        view_range,
        cache_range,
        max_chunks_per_sweep: 1024,
        ..CacheConfig::default()
    };
    ChunkStreamer::new(
        config,
        registry.clone(),
        Arc::new(FlatTerrain::new(ground, BlockType::STONE, &registry)),
        Arc::new(CulledMeshBuilder::new(registry)),
    )
    .unwrap()
}

fn settle(streamer: &mut ChunkStreamer) {
    for _ in 0..64 {
        if streamer.sweep().is_idle() {
            return;
        }
    }
    panic!("streamer did not settle");
}

fn state_of(streamer: &ChunkStreamer, coord: Point3<i32>) -> ChunkState {
    streamer
        .get_chunk_by_relative_position(coord)
        .map(|chunk| chunk.state())
        .unwrap_or_else(|| panic!("chunk {coord:?} is not resident"))
}

#[test]
fn view_range_may_equal_cache_range_but_not_exceed_it() {
    let equal = CacheConfig {
        view_range: 1,
        cache_range: 1,
        ..CacheConfig::default()
    };
    assert!(ChunkStreamer::from_config(equal).is_ok());

    let over = CacheConfig {
        view_range: 2,
        cache_range: 1,
        ..CacheConfig::default()
    };
    assert!(matches!(
        ChunkStreamer::from_config(over),
        Err(ConfigError::ViewExceedsCache { view: 2, cache: 1 })
    ));
}

#[test]
fn world_and_relative_lookups_agree_across_negative_coordinates() {
    let mut streamer = flat_streamer(0, 1, 0);
    streamer.update_cache_position(-10.0, -10.0, -10.0);
    let report = streamer.sweep();
    assert_eq!(report.created, 27);

    for chunk in streamer.chunks() {
        for pos in [chunk.origin(), chunk.last_cell()] {
            let by_world = streamer.get_chunk_by_world_position(pos).unwrap();
            assert_eq!(by_world.coordinate(), chunk.coordinate());
        }
    }

    let pos = Point3::new(-1, -33, 5);
    let by_world = streamer.get_chunk_by_world_position(pos).unwrap();
    let by_coord = streamer
        .get_chunk_by_relative_position(Point3::new(-1, -2, 0))
        .unwrap();
    assert_eq!(by_world.coordinate(), by_coord.coordinate());
    assert_eq!(by_world.origin(), Point3::new(-32, -64, 0));

    let above = streamer
        .get_neighbor_chunk(by_world.origin(), BlockSide::TOP)
        .unwrap();
    assert_eq!(above.coordinate(), Point3::new(-1, -1, 0));
    assert!(streamer
        .get_neighbor_chunk(by_world.origin(), BlockSide::BOTTOM)
        .is_none());
}

#[test]
fn cache_only_chunks_stop_after_generation() {
    let mut streamer = flat_streamer(0, 1, 3);
    streamer.update_cache_position(5.0, 5.0, 5.0);
    settle(&mut streamer);

    let counts = streamer.state_counts();
    assert_eq!(counts.total(), 27);
    assert_eq!(counts.ready, 1);
    assert_eq!(counts.awaiting_lighting, 26);
    assert_eq!(state_of(&streamer, Point3::new(0, 0, 0)), ChunkState::Ready);
}

#[test]
fn chunks_without_geometry_still_reach_ready() {
    let mut streamer = flat_streamer(0, 0, -1000);
    streamer.update_cache_position(0.0, 0.0, 0.0);
    settle(&mut streamer);

    let meshes: Vec<_> = streamer.ready_meshes().collect();
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].0, Point3::new(0, 0, 0));
    assert!(meshes[0].1.is_empty());
    assert!(streamer
        .get_chunk_by_relative_position(Point3::new(0, 0, 0))
        .unwrap()
        .bounds()
        .is_empty());
}

#[test]
fn dirty_marking_is_idempotent() {
    let mut streamer = flat_streamer(0, 0, 3);
    streamer.update_cache_position(1.0, 1.0, 1.0);
    settle(&mut streamer);
    let origin = Point3::new(0, 0, 0);
    assert_eq!(state_of(&streamer, origin), ChunkState::Ready);

    assert!(streamer.mark_dirty(origin));
    assert!(!streamer.mark_dirty(origin));
    assert!(!streamer.mark_dirty(Point3::new(5, 5, 5)));
    assert_eq!(streamer.rebuild_transitions(), 1);
    assert_eq!(state_of(&streamer, origin), ChunkState::AwaitingBuild);

    assert_eq!(streamer.sweep().built, 1);
    assert_eq!(state_of(&streamer, origin), ChunkState::Ready);
}

#[test]
fn leaving_chunks_are_evicted_within_one_sweep() {
    let mut streamer = flat_streamer(0, 0, 3);
    let meshes = streamer.subscribe_meshes();
    streamer.update_cache_position(1.0, 1.0, 1.0);
    settle(&mut streamer);

    let built: Vec<_> = meshes.try_iter().collect();
    assert_eq!(built.len(), 1);
    assert!(matches!(
        &built[0],
        MeshEvent::Built(coord, mesh) if *coord == Point3::new(0, 0, 0) && !mesh.is_empty()
    ));

    streamer.update_cache_position(40.0, 1.0, 1.0);
    let report = streamer.sweep();
    assert_eq!(report.evicted, 1);
    assert_eq!(report.created, 1);
    assert!(streamer
        .get_chunk_by_relative_position(Point3::new(0, 0, 0))
        .is_none());
    assert_eq!(
        state_of(&streamer, Point3::new(1, 0, 0)),
        ChunkState::AwaitingGenerate
    );

    let released: Vec<_> = meshes.try_iter().collect();
    assert_eq!(released.len(), 1);
    assert!(matches!(released[0], MeshEvent::Released(coord) if coord == Point3::new(0, 0, 0)));

    // the reused arena region must not leak the old chunk's blocks
    settle(&mut streamer);
    assert_eq!(streamer.block_at(Point3::new(40, 3, 1)).unwrap().block_type(), BlockType::STONE.id());
    assert!(streamer.block_at(Point3::new(40, 4, 1)).unwrap().is_empty());
}

#[test]
fn edits_on_a_chunk_edge_dirty_the_neighbour() {
    let mut streamer = flat_streamer(1, 1, 3);
    streamer.update_cache_position(16.0, 16.0, 16.0);
    settle(&mut streamer);
    assert_eq!(streamer.state_counts().ready, 27);
    let before = streamer.rebuild_transitions();

    let pos = Point3::new(31, 10, 5);
    assert!(streamer.add_block(pos, Block::new(BlockType::STONE)));
    assert_eq!(state_of(&streamer, Point3::new(0, 0, 0)), ChunkState::AwaitingBuild);
    assert_eq!(state_of(&streamer, Point3::new(1, 0, 0)), ChunkState::AwaitingBuild);
    assert_eq!(state_of(&streamer, Point3::new(-1, 0, 0)), ChunkState::Ready);
    assert!(streamer.rebuild_transitions() >= before + 2);

    // the column under the new block is shaded
    assert!(streamer.arena().get(Point3::new(31, 9, 5)).sun < 15);

    settle(&mut streamer);
    assert_eq!(streamer.state_counts().ready, 27);
    assert_eq!(
        streamer.block_at(pos).map(|block| block.block_type()),
        Some(BlockType::STONE.id())
    );

    assert!(streamer.remove_block(pos));
    settle(&mut streamer);
    assert_eq!(streamer.arena().get(Point3::new(31, 9, 5)).sun, 15);
}

#[test]
fn edits_outside_generated_chunks_are_ignored() {
    let mut streamer = flat_streamer(0, 0, 3);
    streamer.update_cache_position(1.0, 1.0, 1.0);
    streamer.sweep();
    // resident but not generated yet
    assert!(!streamer.add_block(Point3::new(2, 10, 2), Block::new(BlockType::WOOD)));
    assert!(!streamer.add_block(Point3::new(500, 10, 2), Block::new(BlockType::WOOD)));

    settle(&mut streamer);
    assert!(!streamer.remove_block(Point3::new(500, 10, 2)));
    assert!(!streamer.remove_light_source(Point3::new(2, 10, 2)));
    assert!(streamer.block_at(Point3::new(2, 10, 2)).unwrap().is_empty());
    assert_eq!(streamer.rebuild_transitions(), 0);
}

#[test]
fn light_sources_spread_and_retract() {
    let mut streamer = flat_streamer(0, 0, 3);
    streamer.update_cache_position(1.0, 1.0, 1.0);
    settle(&mut streamer);

    let lamp = Point3::new(16, 16, 16);
    assert!(streamer.add_light_source(lamp, [15, 0, 0]));
    assert_eq!(streamer.arena().get(lamp).red, 15);
    let next = streamer.arena().get(Point3::new(17, 16, 16));
    assert!(next.red > 0 && next.red < 15);
    assert_eq!(next.green, 0);
    assert_eq!(
        state_of(&streamer, Point3::new(0, 0, 0)),
        ChunkState::AwaitingBuild
    );

    assert!(streamer.remove_light_source(lamp));
    assert_eq!(streamer.arena().get(lamp).red, 0);
    assert_eq!(streamer.arena().get(Point3::new(17, 16, 16)).red, 0);
    assert!(!streamer.remove_light_source(lamp));
}

/// Terrain that moves the cache center far away the first time it runs.
#[derive(Default)]
struct CenterJumper {
    slot: Mutex<Option<CenterSlot>>,
    calls: AtomicUsize,
}

impl TerrainGenerator for CenterJumper {
    fn generate_data_for_chunk(&self, _writer: &mut ChunkWriter) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(slot) = self.slot.lock().unwrap().take() {
            *slot.get_mut() = Some(Point3::new(100_000.0, 0.0, 0.0));
        }
    }
}

#[test]
fn moving_the_center_mid_sweep_cancels_pending_work() {
    let registry = Arc::new(BlockRegistry::new());
    let terrain = Arc::new(CenterJumper::default());
    let config = CacheConfig {
        view_range: 0,
        cache_range: 1,
        max_chunks_per_sweep: 1024,
        ..CacheConfig::default()
    };
    let mut streamer = ChunkStreamer::new(
        config,
        registry.clone(),
        terrain.clone(),
        Arc::new(CulledMeshBuilder::new(registry)),
    )
    .unwrap();
    *terrain.slot.lock().unwrap() = Some(streamer.center_slot());

    streamer.update_cache_position(1.0, 1.0, 1.0);
    assert_eq!(streamer.sweep().created, 27);

    // the first generation moves the center, so the other 26 are skipped
    let report = streamer.sweep();
    assert_eq!(report.generated, 1);
    assert_eq!(terrain.calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.evicted, 27);
    assert_eq!(report.created, 27);
    assert!(streamer
        .get_chunk_by_relative_position(Point3::new(0, 0, 0))
        .is_none());
    assert_eq!(streamer.state_counts().awaiting_generate, 27);
}

#[test]
fn sweep_budget_bounds_stage_advances() {
    let registry = Arc::new(BlockRegistry::new());
    let config = CacheConfig {
        view_range: 1,
        cache_range: 1,
        max_chunks_per_sweep: 1,
        ..CacheConfig::default()
    };
    let mut streamer = ChunkStreamer::new(
        config,
        registry.clone(),
        Arc::new(FlatTerrain::new(3, BlockType::STONE, &registry)),
        Arc::new(CulledMeshBuilder::new(registry)),
    )
    .unwrap();
    streamer.update_cache_position(16.0, 16.0, 16.0);
    let first = streamer.sweep();
    assert_eq!(first.created, 27);
    assert_eq!(first.stage_advances(), 0);

    let mut advances = 0;
    for _ in 0..1000 {
        let report = streamer.sweep();
        if report.is_idle() {
            break;
        }
        assert_eq!(report.stage_advances(), 1, "{report:?}");
        advances += 1;
    }
    // generate, light and build for each chunk, plus any rebuilds
    assert!(advances >= 81);
    assert_eq!(streamer.state_counts().ready, 27);
}
