//! Errors raised while configuring the chunk cache.
//!
//! Everything after construction is infallible: addressing a chunk that is not
//! resident yields `None` or is ignored, and lighting always settles.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The fully built zone cannot be larger than the resident zone.
    #[error("view range {view} exceeds cache range {cache}")]
    ViewExceedsCache { view: i32, cache: i32 },

    #[error("view and cache ranges must not be negative")]
    NegativeRange,

    /// The arena for this range would not fit in memory, or its span would overflow.
    #[error("cache range {cache} exceeds the maximum of {max}")]
    CacheRangeTooLarge { cache: i32, max: i32 },

    #[error("max_chunks_per_sweep must be at least 1")]
    EmptySweepBudget,

    #[error("invalid cache configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not read cache configuration: {0}")]
    Io(#[from] std::io::Error),
}
