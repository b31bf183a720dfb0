//! # Engine State Module
//!
//! Everything that keeps the streamed world alive around the viewpoint.
//!
//! ## Key Components
//!
//! * `voxels` - Blocks, the wrap-addressed arena, chunks and the chunk streamer
//! * `lighting` - Incremental sun and RGB flood fill over the arena
//! * `generation` - Terrain generators that fill new chunks
//! * `meshing` - CPU-side chunk meshes handed to the consumer
//! * `task_management` - The background worker and the thread-safe cache handle
//!
//! ## Data Flow
//!
//! 1. The cache center moves; the streamer creates chunks entering the cache range
//! 2. Terrain generators fill them, the lighting engine lights those in view
//! 3. The mesh builder turns lit chunks into meshes and publishes them
//! 4. Edits write the arena, rebalance light and send touched chunks back to the build stage

pub mod generation;
pub mod lighting;
pub mod meshing;
pub mod task_management;
pub mod voxels;
