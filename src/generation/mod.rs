//! # Generation Module
//!
//! Chunk-stitching level generation.
//!
//! This module provides the configuration, the chunk pools, the frequency
//! sampler and the placement engine, tied together by
//! [`ChunkLevelGenerator`].

pub mod caps;
pub mod chunk;
pub mod chunk_level;
pub mod component;
pub mod placement;
pub mod sampler;

pub use chunk::*;
pub use chunk_level::*;
pub use component::{Component, ComponentKind};
pub use placement::*;
pub use sampler::*;

use crate::config::{CAP_FLOOR_ROWS, DEFAULT_LEVEL_HEIGHT, DEFAULT_LEVEL_WIDTH, START_CAP_WIDTH};
use crate::{StitchError, StitchResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Level themes. Each theme can register its own chunk pools.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum LevelType {
    #[default]
    Overground,
    Underground,
    Castle,
}

impl std::str::FromStr for LevelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overground" | "0" => Ok(LevelType::Overground),
            "underground" | "1" => Ok(LevelType::Underground),
            "castle" | "2" => Ok(LevelType::Castle),
            other => Err(format!("unknown level type '{other}'")),
        }
    }
}

/// Clearance kept around placed entities, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMargin {
    pub left: i32,
    pub right: i32,
    pub above: i32,
    pub below: i32,
}

impl Default for EntityMargin {
    fn default() -> Self {
        Self {
            left: 2,
            right: 2,
            above: 3,
            below: 1,
        }
    }
}

/// Configuration for one generated level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Level width in tiles, before the end cap is appended
    pub width: i32,
    /// Level height in tiles
    pub height: i32,
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Difficulty rating. Threaded through for chunk pools that care about it.
    pub difficulty: u32,
    /// Theme selecting the chunk pools
    pub level_type: LevelType,
    /// Build the start platform on the left edge
    pub build_start: bool,
    /// Append the closing staircase and exit on the right edge
    pub build_end: bool,
    /// Clearance around entities during compatibility filtering
    pub entity_margin: EntityMargin,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilestitch::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(15);
    /// assert_eq!(config.width, 128);
    /// assert!(config.build_start && config.build_end);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            width: DEFAULT_LEVEL_WIDTH,
            height: DEFAULT_LEVEL_HEIGHT,
            seed,
            difficulty: 0,
            level_type: LevelType::default(),
            build_start: true,
            build_end: true,
            entity_margin: EntityMargin::default(),
        }
    }

    /// Creates a configuration for testing with small levels.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 40,
            height: 10,
            ..Self::new(seed)
        }
    }

    /// Sets the level dimensions.
    pub fn with_dimensions(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Parses a configuration from JSON. Missing fields take default values.
    pub fn from_json_str(json: &str) -> StitchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> StitchResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rejects dimensions the caps cannot be built into.
    pub fn validate(&self) -> StitchResult<()> {
        let invalid = StitchError::InvalidDimensions {
            width: self.width,
            height: self.height,
        };

        if self.width <= 0 || self.height <= 0 {
            return Err(invalid);
        }
        if (self.build_start || self.build_end) && self.height < CAP_FLOOR_ROWS + 2 {
            return Err(invalid);
        }
        if self.build_start && self.width <= START_CAP_WIDTH {
            return Err(invalid);
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> StitchResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> StitchResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::level::{tiles, Grid};
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Validates that a finished level meets the output invariants.
    pub fn validate_level(grid: &Grid) -> StitchResult<()> {
        if grid.count_tiles(tiles::ANCHOR) > 0 {
            return Err(StitchError::GenerationFailed(
                "Level still contains anchor markers".to_string(),
            ));
        }

        if let Some(exit) = grid.exit() {
            if !grid.in_bounds(exit.x, exit.y) {
                return Err(StitchError::GenerationFailed(format!(
                    "Exit {exit:?} lies outside the level"
                )));
            }
        }

        if let Some(hazard) = grid.hazards().iter().find(|h| !grid.in_bounds(h.x, h.y)) {
            return Err(StitchError::GenerationFailed(format!(
                "Hazard at ({}, {}) lies outside the level",
                hazard.x, hazard.y
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.height, 15);
        assert_eq!(config.entity_margin, EntityMargin::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(GenerationConfig::new(1).with_dimensions(0, 15).validate().is_err());
        assert!(GenerationConfig::new(1).with_dimensions(7, 15).validate().is_err());
        assert!(GenerationConfig::new(1).with_dimensions(8, 15).validate().is_ok());
        assert!(GenerationConfig::new(1).with_dimensions(40, 3).validate().is_err());

        let mut bare = GenerationConfig::new(1).with_dimensions(3, 3);
        bare.build_start = false;
        bare.build_end = false;
        assert!(bare.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config = GenerationConfig::from_json_str(
            r#"{ "width": 64, "seed": 9, "level_type": "Castle", "build_end": false }"#,
        )
        .unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 15);
        assert_eq!(config.seed, 9);
        assert_eq!(config.level_type, LevelType::Castle);
        assert!(config.build_start);
        assert!(!config.build_end);

        assert!(matches!(
            GenerationConfig::from_json_str("{ \"width\": \"wide\" }"),
            Err(StitchError::Serde(_))
        ));
    }

    #[test]
    fn test_level_type_parsing() {
        assert_eq!("castle".parse::<LevelType>(), Ok(LevelType::Castle));
        assert_eq!("1".parse::<LevelType>(), Ok(LevelType::Underground));
        assert!("moon".parse::<LevelType>().is_err());
    }

    #[test]
    fn test_utils_rng_creation() {
        use rand::Rng;

        let config = GenerationConfig::new(12345);
        let a: u64 = utils::create_rng(&config).gen();
        let b: u64 = utils::create_rng(&config).gen();
        assert_eq!(a, b);
    }
}
