//! # Cache Configuration
//!
//! Ranges are radii in chunks around the chunk containing the cache center:
//! a range of `r` covers `(2r + 1)³` chunk coordinates.
//!
//! ```
//! use voxel_streaming::config::CacheConfig;
//!
//! let config = CacheConfig::from_json_str(r#"{ "view_range": 2, "cache_range": 3 }"#).unwrap();
//! assert_eq!(config.cache_range, 3);
//! assert_eq!(config.seed, CacheConfig::default().seed);
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted `cache_range`. The arena holds `((2r + 1) * 32)³` cells,
/// which is about 350 MB at this range.
pub const MAX_CACHE_RANGE: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Radius of the zone that is lit and meshed.
    pub view_range: i32,
    /// Radius of the zone that stays resident. Must be at least `view_range`.
    pub cache_range: i32,
    /// World seed handed to the terrain generator.
    pub seed: u32,
    /// Stage advances one sweep may perform before yielding to queued edits.
    pub max_chunks_per_sweep: usize,
    /// How long the idle worker waits for a command before re-checking for work.
    pub idle_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            view_range: 2,
            cache_range: 3,
            seed: 0,
            max_chunks_per_sweep: 64,
            idle_timeout_ms: 250,
        }
    }
}

impl CacheConfig {
    /// Checks the ranges and the sweep budget.
    ///
    /// # Returns
    /// `Ok(())` when `0 <= view_range <= cache_range <= MAX_CACHE_RANGE` and
    /// the budget is non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view_range < 0 || self.cache_range < 0 {
            return Err(ConfigError::NegativeRange);
        }
        if self.cache_range > MAX_CACHE_RANGE {
            return Err(ConfigError::CacheRangeTooLarge {
                cache: self.cache_range,
                max: MAX_CACHE_RANGE,
            });
        }
        if self.view_range > self.cache_range {
            return Err(ConfigError::ViewExceedsCache {
                view: self.view_range,
                cache: self.cache_range,
            });
        }
        if self.max_chunks_per_sweep == 0 {
            return Err(ConfigError::EmptySweepBudget);
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: CacheConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_may_equal_cache_but_not_exceed_it() {
        let equal = CacheConfig {
            view_range: 3,
            cache_range: 3,
            ..CacheConfig::default()
        };
        assert!(equal.validate().is_ok());

        let over = CacheConfig {
            view_range: 4,
            cache_range: 3,
            ..CacheConfig::default()
        };
        assert!(matches!(
            over.validate(),
            Err(ConfigError::ViewExceedsCache { view: 4, cache: 3 })
        ));
    }

    #[test]
    fn cache_range_is_capped() {
        let largest = CacheConfig {
            cache_range: MAX_CACHE_RANGE,
            ..CacheConfig::default()
        };
        assert!(largest.validate().is_ok());

        let huge = CacheConfig {
            cache_range: i32::MAX,
            ..CacheConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::CacheRangeTooLarge { cache: i32::MAX, max: MAX_CACHE_RANGE })
        ));

        let parsed = CacheConfig::from_json_str(r#"{ "cache_range": 6 }"#);
        assert!(matches!(parsed, Err(ConfigError::CacheRangeTooLarge { cache: 6, .. })));
    }

    #[test]
    fn rejects_negative_ranges_and_empty_budget() {
        let negative = CacheConfig {
            view_range: -1,
            ..CacheConfig::default()
        };
        assert!(matches!(negative.validate(), Err(ConfigError::NegativeRange)));

        let no_budget = CacheConfig {
            max_chunks_per_sweep: 0,
            ..CacheConfig::default()
        };
        assert!(matches!(no_budget.validate(), Err(ConfigError::EmptySweepBudget)));
    }

    #[test]
    fn json_errors_are_reported() {
        assert!(matches!(
            CacheConfig::from_json_str("{ \"view_range\": \"far\" }"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CacheConfig::from_json_str(r#"{ "view_range": 5, "cache_range": 1 }"#),
            Err(ConfigError::ViewExceedsCache { .. })
        ));
        assert!(matches!(
            CacheConfig::from_path("/nonexistent/voxel-streaming.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn serializes_round_trip_through_defaults() {
        let config = CacheConfig {
            seed: 42,
            ..CacheConfig::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(CacheConfig::from_json_str(&text).unwrap(), config);
    }
}
