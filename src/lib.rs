#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streaming
//!
//! A chunk cache that keeps a cube of voxel terrain resident around a moving
//! viewpoint, lights it with incremental sun and coloured flood fill, and
//! hands finished chunk meshes to a consumer.
//!
//! ## Key Modules
//!
//! * `config` - Cache ranges and worker tuning, loadable from JSON
//! * `core` - Shared-ownership resources used across threads
//! * `engine_state` - Blocks, chunks, lighting, terrain, meshing and the worker
//! * `error` - Errors reported when a cache is set up
//!
//! ## Architecture
//!
//! * One flat wrap-addressed arena holds every cell of the cached volume
//! * A sparse chunk store drives each chunk through generate, light and build
//! * A single background worker owns all mutation; the consumer only reads
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_streaming::{BlockType, CacheConfig, ChunkCache};
//! use cgmath::Point3;
//!
//! let cache = ChunkCache::from_config(CacheConfig::default()).unwrap();
//! let lamp = cache.streamer().registry().block(BlockType::LAMP);
//! cache.update_cache_position(0.0, 20.0, 0.0);
//! cache.add_block(Point3::new(3, 40, 3), lamp);
//! for event in cache.drain_mesh_events() {
//!     println!("{:?}", event.coordinate());
//! }
//! ```

use std::thread;
use std::time::Duration;

use cgmath::Point3;
use log::{error, info};
use web_time::Instant;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::CacheConfig;
pub use engine_state::generation::{FlatTerrain, PerlinTerrain, TerrainGenerator};
pub use engine_state::lighting::{LightChanges, LightingEngine, LightingView};
pub use engine_state::meshing::{ChunkMesh, CulledMeshBuilder, MeshBuilder, MeshEvent};
pub use engine_state::task_management::ChunkCache;
pub use engine_state::voxels::{
    block::{block_side::BlockSide, block_type::BlockType, registry::BlockRegistry, Block, Rgb},
    chunk::{Chunk, ChunkState},
    diagnostics::{StateCounts, SweepReport},
    streamer::{CacheRanges, ChunkStreamer, Edit},
};
pub use error::ConfigError;

/// How long the demo walks the center before shutting down.
const DEMO_STEPS: i32 = 8;
const DEMO_STEP_BLOCKS: f32 = 24.0;

/// Runs the streaming demo.
///
/// Streams Perlin terrain around a center that walks along +X, drops a lamp
/// next to the start and later digs it out again, logging the cache state at
/// every step. `config_path` names an optional JSON [`CacheConfig`].
pub fn run(config_path: Option<String>) {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = match config_path {
        Some(path) => CacheConfig::from_path(&path),
        None => Ok(CacheConfig::default()),
    };
    let cache = match config.and_then(ChunkCache::from_config) {
        Ok(cache) => cache,
        Err(err) => {
            error!("could not start the chunk cache: {err}");
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let lamp = Point3::new(4, 40, 4);
    let lamp_block = cache.streamer().registry().block(BlockType::LAMP);
    for step in 0..DEMO_STEPS {
        cache.update_cache_position(step as f32 * DEMO_STEP_BLOCKS, 24.0, 0.0);
        match step {
            1 => cache.add_block(lamp, lamp_block),
            5 => cache.remove_block(lamp),
            _ => {}
        }
        thread::sleep(Duration::from_millis(500));

        let meshes = cache.drain_mesh_events();
        let counts = cache.state_counts();
        match serde_json::to_string(&counts) {
            Ok(json) => info!("step {step}: {} mesh events, states {json}", meshes.len()),
            Err(err) => error!("could not encode state counts: {err}"),
        }
    }
    info!("demo finished after {:?}", start.elapsed());
}
