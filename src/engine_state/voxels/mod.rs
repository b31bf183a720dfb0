//! # Voxel Storage and Streaming
//!
//! ## Architecture
//!
//! * **Block**: a single cell: type id, tint and four light channels
//! * **Arena**: one flat wrap-addressed array holding every cell of the cached volume
//! * **Chunk**: a 32³ view over the arena with a pipeline state and a bounding box
//! * **Streamer**: the chunk store, driving chunks from generation to a built mesh
//!
//! ## Invariants
//!
//! * The arena is the only copy of block and light data
//! * A chunk only falls back from `Ready` when an edit or a light change touches it
//! * At most one resident chunk maps onto any arena cell

pub mod arena;
pub mod block;
pub mod chunk;
pub mod diagnostics;
pub mod streamer;
