//! # Voxel Streaming Demo Entry Point
//!
//! Calls into the library's `run()`, which streams Perlin terrain around a
//! moving center and logs what the cache is doing.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

fn main() {
    voxel_streaming::run(std::env::args().nth(1));
}
