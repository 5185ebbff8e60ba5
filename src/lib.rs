//! # Tilestitch
//!
//! Procedural assembly of 2D platformer levels from pre-authored chunks.
//!
//! ## Architecture Overview
//!
//! A level is built by stitching small hand-made fragments ("chunks")
//! together at anchor points. The core pieces are:
//!
//! - **Grid**: tile, metadata and entity storage with bounds-safe access,
//!   area extraction, area merge and resizing
//! - **Behavior Table**: per-tile flags driving blocking queries and overlap tests
//! - **Frequency Sampler**: inverse-square frequency-biased index selection
//! - **Chunk Repository**: connector and terminal chunk pools, loaded in bulk
//! - **Placement Engine**: the anchor frontier loop that filters, selects and
//!   merges chunks into the level
//!
//! ## Determinism
//!
//! Generation is a pure function of its configuration, the repository
//! snapshot and the behavior table. The same seed always yields the same
//! level.

pub mod generation;
pub mod level;

pub use generation::*;
pub use level::*;

/// Core error type for the Tilestitch generator.
#[derive(thiserror::Error, Debug)]
pub enum StitchError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Level stream does not start with the level magic number
    #[error("Bad level header: {0:#018x}")]
    BadMagic(u64),

    /// Level stream was written by an unknown format version
    #[error("Unsupported level format version: {0}")]
    UnsupportedVersion(u8),

    /// Stream ended before the expected data
    #[error("Truncated stream: needed {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Grid dimensions are zero, negative or too large
    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    /// Behavior table blob has the wrong size
    #[error("Behavior table must be 256 bytes, got {0}")]
    InvalidBehaviorTable(usize),

    /// Entity stream byte does not name a known entity kind
    #[error("Unknown entity code: {0:#04x}")]
    UnknownEntityCode(u8),

    /// Hazard record names an unknown hazard kind
    #[error("Unknown hazard kind: {0}")]
    UnknownHazardKind(u8),

    /// Hazard origin does not fit in a hazard record
    #[error("Hazard at ({0}, {1}) cannot be encoded")]
    HazardOutOfRange(i32, i32),

    /// Generated level breaks an output invariant
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Tilestitch codebase.
pub type StitchResult<T> = Result<T, StitchError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation constants.
pub mod config {
    /// Default level width in tiles
    pub const DEFAULT_LEVEL_WIDTH: i32 = 128;

    /// Default level height in tiles
    pub const DEFAULT_LEVEL_HEIGHT: i32 = 15;

    /// Width of the hand-built start platform
    pub const START_CAP_WIDTH: i32 = 7;

    /// Columns appended to the right edge for the end staircase
    pub const END_CAP_WIDTH: i32 = 15;

    /// Distance from the right edge of the finished level to the exit column
    pub const EXIT_OFFSET_FROM_RIGHT: i32 = 3;

    /// Rows of solid ground under both caps
    pub const CAP_FLOOR_ROWS: i32 = 2;
}
