//! # Tile Behavior Table
//!
//! Per-tile-id flag bits describing blocking and interactivity semantics.
//!
//! The table is a plain value. Levels and the placement engine share it
//! through an `Arc`, so a process has one reader-visible table that only
//! changes through an explicit [`BehaviorTable::replace`] or a fresh load.

use crate::{StitchError, StitchResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of entries in a behavior table, one per tile byte.
pub const BEHAVIOR_TABLE_SIZE: usize = 256;

/// Flag set attached to a tile id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileFlags(u8);

impl TileFlags {
    /// Solid when approached from above (landing surface).
    pub const BLOCK_UPPER: TileFlags = TileFlags(1 << 0);
    /// Solid from every direction.
    pub const BLOCK_ALL: TileFlags = TileFlags(1 << 1);
    /// Solid when approached from below.
    pub const BLOCK_LOWER: TileFlags = TileFlags(1 << 2);
    pub const SPECIAL: TileFlags = TileFlags(1 << 3);
    pub const BUMPABLE: TileFlags = TileFlags(1 << 4);
    pub const BREAKABLE: TileFlags = TileFlags(1 << 5);
    pub const PICKUPABLE: TileFlags = TileFlags(1 << 6);
    pub const ANIMATED: TileFlags = TileFlags(1 << 7);

    /// No flags set.
    pub const fn empty() -> Self {
        TileFlags(0)
    }

    /// Builds a flag set from its raw byte.
    pub const fn from_bits(bits: u8) -> Self {
        TileFlags(bits)
    }

    /// Raw byte representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every flag in `other` is set.
    pub const fn contains(self, other: TileFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any flag in `other` is set.
    pub const fn intersects(self, other: TileFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if the tile blocks movement from any direction at all.
    pub const fn is_solid_anywhere(self) -> bool {
        self.intersects(TileFlags(
            Self::BLOCK_UPPER.0 | Self::BLOCK_ALL.0 | Self::BLOCK_LOWER.0,
        ))
    }
}

impl std::ops::BitOr for TileFlags {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        TileFlags(self.0 | other.0)
    }
}

impl std::ops::BitOrAssign for TileFlags {
    fn bitor_assign(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// Mapping from every tile id to its flag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorTable {
    flags: [TileFlags; BEHAVIOR_TABLE_SIZE],
}

impl BehaviorTable {
    /// Creates a table where no tile has any behavior.
    pub fn empty() -> Self {
        Self {
            flags: [TileFlags::empty(); BEHAVIOR_TABLE_SIZE],
        }
    }

    /// The built-in table covering the tiles this crate knows by name.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilestitch::{tiles, BehaviorTable, TileFlags};
    ///
    /// let table = BehaviorTable::standard();
    /// assert!(table.flags(tiles::ROCK).contains(TileFlags::BLOCK_ALL));
    /// assert!(table.flags(tiles::AIR).is_empty());
    /// ```
    pub fn standard() -> Self {
        use crate::level::tiles;

        let mut table = Self::empty();
        let solid = TileFlags::BLOCK_ALL | TileFlags::BLOCK_UPPER | TileFlags::BLOCK_LOWER;

        table.set_flags(tiles::ROCK, solid);
        table.set_flags(tiles::GROUND, solid);
        table.set_flags(tiles::BRICK, solid | TileFlags::BUMPABLE | TileFlags::BREAKABLE);
        table.set_flags(
            tiles::QUESTION_BLOCK,
            solid | TileFlags::BUMPABLE | TileFlags::SPECIAL | TileFlags::ANIMATED,
        );
        table.set_flags(tiles::COIN, TileFlags::PICKUPABLE | TileFlags::ANIMATED);
        table.set_flags(tiles::PLATFORM_TOP, TileFlags::BLOCK_UPPER);
        for pipe in [
            tiles::PIPE_TOP_LEFT,
            tiles::PIPE_TOP_RIGHT,
            tiles::PIPE_LEFT,
            tiles::PIPE_RIGHT,
        ] {
            table.set_flags(pipe, solid);
        }

        table
    }

    /// Flags for a tile id.
    pub fn flags(&self, tile: i8) -> TileFlags {
        self.flags[tile as u8 as usize]
    }

    /// Edits a single entry.
    pub fn set_flags(&mut self, tile: i8, flags: TileFlags) {
        self.flags[tile as u8 as usize] = flags;
    }

    /// Replaces the entire table with another one.
    pub fn replace(&mut self, other: &BehaviorTable) {
        self.flags = other.flags;
    }

    /// True if the tile takes part in overlap tests as a solid component.
    pub fn is_solid(&self, tile: i8) -> bool {
        self.flags(tile).is_solid_anywhere()
    }

    /// Parses a table from exactly 256 bytes.
    pub fn from_bytes(bytes: &[u8]) -> StitchResult<Self> {
        if bytes.len() != BEHAVIOR_TABLE_SIZE {
            return Err(StitchError::InvalidBehaviorTable(bytes.len()));
        }

        let mut table = Self::empty();
        for (slot, &bits) in table.flags.iter_mut().zip(bytes) {
            *slot = TileFlags::from_bits(bits);
        }
        Ok(table)
    }

    /// Writes the table verbatim, one byte per tile id.
    pub fn to_bytes(&self) -> [u8; BEHAVIOR_TABLE_SIZE] {
        let mut bytes = [0u8; BEHAVIOR_TABLE_SIZE];
        for (byte, flags) in bytes.iter_mut().zip(self.flags.iter()) {
            *byte = flags.bits();
        }
        bytes
    }

    /// Loads a table from a 256-byte file.
    pub fn load(path: impl AsRef<Path>) -> StitchResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Saves the table as a 256-byte file.
    pub fn save(&self, path: impl AsRef<Path>) -> StitchResult<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

impl Default for BehaviorTable {
    fn default() -> Self {
        Self::standard()
    }
}
