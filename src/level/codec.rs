//! # Level Stream Codec
//!
//! Binary encoding of a [`Grid`] as three independent streams:
//!
//! - the level stream: magic, version, dimensions, then per column one tile
//!   byte and one metadata byte per row;
//! - the entity stream: per column, one entity code byte per row;
//! - the hazard stream: 5-byte hazard records until end of stream.
//!
//! Multi-byte integers are big-endian.

use crate::level::{tiles, BehaviorTable, EntityTemplate, Grid, HazardTemplate, HAZARD_RECORD_LEN};
use crate::{StitchError, StitchResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Magic number opening every level stream.
pub const LEVEL_MAGIC: u64 = 0x271c_4178;
/// Level stream format version.
pub const LEVEL_VERSION: u8 = 0;

const HEADER_LEN: usize = 8 + 1 + 2 + 2;

/// Cursor over a byte slice that reports truncation as an error.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> StitchResult<&'a [u8]> {
        let end = self.pos + len;
        if end > self.bytes.len() {
            return Err(StitchError::Truncated {
                expected: end,
                actual: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn u8(&mut self) -> StitchResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> StitchResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u64(&mut self) -> StitchResult<u64> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_be_bytes(buf))
    }
}

/// Encodes tiles and metadata into the level stream.
///
/// The exit is written as [`tiles::EXIT`] in the cell above it, whatever
/// tile the grid holds there; the grid itself is not modified.
pub fn encode_level(grid: &Grid) -> Vec<u8> {
    let (width, height) = (grid.width(), grid.height());
    let mut buf = Vec::with_capacity(HEADER_LEN + width as usize * height as usize * 2);

    buf.extend_from_slice(&LEVEL_MAGIC.to_be_bytes());
    buf.push(LEVEL_VERSION);
    buf.extend_from_slice(&(width as u16).to_be_bytes());
    buf.extend_from_slice(&(height as u16).to_be_bytes());

    let exit_marker = grid.exit().map(|exit| (exit.x, exit.y - 1));
    for x in 0..width {
        for y in 0..height {
            let tile = if exit_marker == Some((x, y)) {
                tiles::EXIT
            } else {
                grid.get(x, y)
            };
            buf.push(tile as u8);
        }
        for y in 0..height {
            buf.push(grid.get_meta(x, y));
        }
    }

    buf
}

/// Decodes a level stream into a fresh grid with no entities or hazards.
pub fn decode_level(bytes: &[u8], behaviors: Arc<BehaviorTable>) -> StitchResult<Grid> {
    let mut reader = Reader::new(bytes);

    let magic = reader.u64()?;
    if magic != LEVEL_MAGIC {
        return Err(StitchError::BadMagic(magic));
    }
    let version = reader.u8()?;
    if version != LEVEL_VERSION {
        return Err(StitchError::UnsupportedVersion(version));
    }

    let width = i32::from(reader.u16()?);
    let height = i32::from(reader.u16()?);

    // Tile and metadata bytes must all be present before anything is allocated
    let body = width as usize * height as usize * 2;
    if reader.remaining() < body {
        return Err(StitchError::Truncated {
            expected: HEADER_LEN + body,
            actual: bytes.len(),
        });
    }
    let mut grid = Grid::new(width, height, behaviors)?;

    for x in 0..width {
        let column = reader.take(height as usize)?;
        for (y, &tile) in column.iter().enumerate() {
            grid.set(x, y as i32, tile as i8);
        }
        let meta = reader.take(height as usize)?;
        for (y, &value) in meta.iter().enumerate() {
            grid.set_meta(x, y as i32, value);
        }
    }

    Ok(grid)
}

/// Encodes the entity layer, column by column.
pub fn encode_entities(grid: &Grid) -> Vec<u8> {
    let mut buf = Vec::with_capacity(grid.width() as usize * grid.height() as usize);
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            buf.push(grid.get_entity(x, y).map_or(0, EntityTemplate::to_code));
        }
    }
    buf
}

/// Fills the entity layer of `grid` from an entity stream.
pub fn decode_entities(grid: &mut Grid, bytes: &[u8]) -> StitchResult<()> {
    let mut reader = Reader::new(bytes);
    for x in 0..grid.width() {
        let column = reader.take(grid.height() as usize)?;
        for (y, &code) in column.iter().enumerate() {
            grid.set_entity(x, y as i32, EntityTemplate::from_code(code)?);
        }
    }
    Ok(())
}

/// Encodes the hazard list as consecutive records.
pub fn encode_hazards(grid: &Grid) -> StitchResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(grid.hazards().len() * HAZARD_RECORD_LEN);
    for hazard in grid.hazards() {
        buf.extend_from_slice(&hazard.to_record()?);
    }
    Ok(buf)
}

/// Appends the hazards of a hazard stream to `grid`.
pub fn decode_hazards(grid: &mut Grid, bytes: &[u8]) -> StitchResult<()> {
    let records = bytes.chunks(HAZARD_RECORD_LEN);
    for record in records {
        let record: [u8; HAZARD_RECORD_LEN] =
            record.try_into().map_err(|_| StitchError::Truncated {
                expected: bytes.len().div_ceil(HAZARD_RECORD_LEN) * HAZARD_RECORD_LEN,
                actual: bytes.len(),
            })?;
        grid.add_hazard(HazardTemplate::from_record(record)?);
    }
    Ok(())
}

/// The three streams of one level, kept together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelArchive {
    pub level: Vec<u8>,
    pub entities: Vec<u8>,
    pub hazards: Vec<u8>,
}

/// File extensions used by [`LevelArchive::write_to`] and
/// [`LevelArchive::read_from`].
pub const LEVEL_EXTENSION: &str = "lvl";
pub const ENTITY_EXTENSION: &str = "ent";
pub const HAZARD_EXTENSION: &str = "hzd";

impl LevelArchive {
    /// Encodes every stream of a grid.
    pub fn from_grid(grid: &Grid) -> StitchResult<Self> {
        Ok(Self {
            level: encode_level(grid),
            entities: encode_entities(grid),
            hazards: encode_hazards(grid)?,
        })
    }

    /// Rebuilds a grid. An empty entity or hazard stream means "none".
    pub fn to_grid(&self, behaviors: Arc<BehaviorTable>) -> StitchResult<Grid> {
        let mut grid = decode_level(&self.level, behaviors)?;
        if !self.entities.is_empty() {
            decode_entities(&mut grid, &self.entities)?;
        }
        decode_hazards(&mut grid, &self.hazards)?;
        Ok(grid)
    }

    fn sibling(path: &Path, extension: &str) -> PathBuf {
        path.with_extension(extension)
    }

    /// Writes `<path>.lvl`, `<path>.ent` and `<path>.hzd`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> StitchResult<()> {
        let path = path.as_ref();
        std::fs::write(Self::sibling(path, LEVEL_EXTENSION), &self.level)?;
        std::fs::write(Self::sibling(path, ENTITY_EXTENSION), &self.entities)?;
        std::fs::write(Self::sibling(path, HAZARD_EXTENSION), &self.hazards)?;
        Ok(())
    }

    /// Reads the streams next to `path`. The level stream is required; missing
    /// entity or hazard files read as empty.
    pub fn read_from(path: impl AsRef<Path>) -> StitchResult<Self> {
        let path = path.as_ref();
        let optional = |extension: &str| -> StitchResult<Vec<u8>> {
            match std::fs::read(Self::sibling(path, extension)) {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
                Err(e) => Err(e.into()),
            }
        };

        Ok(Self {
            level: std::fs::read(Self::sibling(path, LEVEL_EXTENSION))?,
            entities: optional(ENTITY_EXTENSION)?,
            hazards: optional(HAZARD_EXTENSION)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{EntityKind, HazardKind, Orientation, Position};

    fn behaviors() -> Arc<BehaviorTable> {
        Arc::new(BehaviorTable::standard())
    }

    fn sample_grid() -> Grid {
        let mut grid = Grid::new(6, 5, behaviors()).unwrap();
        for x in 0..6 {
            grid.set(x, 4, tiles::GROUND);
        }
        grid.set(2, 1, tiles::QUESTION_BLOCK);
        grid.set_meta(2, 1, 3);
        grid.set(4, 2, tiles::EXIT);
        grid.set_entity(1, 3, Some(EntityTemplate::winged(EntityKind::RedKoopa)));
        grid.add_hazard(HazardTemplate {
            kind: HazardKind::MovingPlatform,
            orientation: Orientation::Horizontal,
            start: 2,
            x: 0,
            y: 1,
            span: 2,
            path_length: 3,
        });
        grid
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_level(&sample_grid());
        assert_eq!(&bytes[..8], &[0, 0, 0, 0, 0x27, 0x1c, 0x41, 0x78]);
        assert_eq!(bytes[8], LEVEL_VERSION);
        assert_eq!(&bytes[9..13], &[0, 6, 0, 5]);
        assert_eq!(bytes.len(), HEADER_LEN + 6 * 5 * 2);

        // Column 2: five tile bytes, then five metadata bytes
        let column = HEADER_LEN + 2 * 10;
        assert_eq!(bytes[column + 1], tiles::QUESTION_BLOCK as u8);
        assert_eq!(bytes[column + 5 + 1], 3);
    }

    #[test]
    fn test_archive_round_trip() {
        let grid = sample_grid();
        let archive = LevelArchive::from_grid(&grid).unwrap();
        let restored = archive.to_grid(behaviors()).unwrap();

        assert_eq!(restored, grid);
        assert_eq!(restored.exit(), Some(Position::new(4, 3)));
        assert_eq!(restored.get_meta(2, 1), 3);
        assert_eq!(restored.get_entity(1, 3), grid.get_entity(1, 3));
        assert_eq!(restored.hazards(), grid.hazards());
    }

    #[test]
    fn test_exit_written_above_exit_cell() {
        let mut grid = Grid::new(3, 4, behaviors()).unwrap();
        grid.set(1, 1, tiles::EXIT);
        let bytes = encode_level(&grid);
        // Column 1, row 1
        assert_eq!(bytes[HEADER_LEN + 8 + 1], tiles::EXIT as u8);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode_level(&sample_grid());
        bytes[0] = 0xff;
        assert!(matches!(
            decode_level(&bytes, behaviors()),
            Err(StitchError::BadMagic(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode_level(&sample_grid());
        bytes[8] = 9;
        assert!(matches!(
            decode_level(&bytes, behaviors()),
            Err(StitchError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated_streams() {
        let bytes = encode_level(&sample_grid());
        assert!(matches!(
            decode_level(&bytes[..bytes.len() - 1], behaviors()),
            Err(StitchError::Truncated { .. })
        ));
        assert!(matches!(
            decode_level(&bytes[..5], behaviors()),
            Err(StitchError::Truncated { expected: 8, actual: 5 })
        ));

        let mut grid = sample_grid();
        assert!(decode_entities(&mut grid, &[0u8; 7]).is_err());
        assert!(matches!(
            decode_hazards(&mut grid, &[0u8; 7]),
            Err(StitchError::Truncated { expected: 10, actual: 7 })
        ));
    }

    #[test]
    fn test_oversized_header_is_truncated_not_allocated() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&LEVEL_MAGIC.to_be_bytes());
        bytes.push(LEVEL_VERSION);
        bytes.extend_from_slice(&u16::MAX.to_be_bytes());
        bytes.extend_from_slice(&u16::MAX.to_be_bytes());
        assert_eq!(bytes.len(), HEADER_LEN);

        let body = 65535usize * 65535 * 2;
        match decode_level(&bytes, behaviors()) {
            Err(StitchError::Truncated { expected, actual }) => {
                assert_eq!(expected, HEADER_LEN + body);
                assert_eq!(actual, HEADER_LEN);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn test_moved_exit_survives_round_trip() {
        let mut grid = Grid::new(8, 5, behaviors()).unwrap();
        grid.set(5, 2, tiles::EXIT);
        grid.set(1, 2, tiles::EXIT);
        assert_eq!(grid.exit(), Some(Position::new(1, 3)));

        let restored = LevelArchive::from_grid(&grid)
            .unwrap()
            .to_grid(behaviors())
            .unwrap();
        assert_eq!(restored.exit(), Some(Position::new(1, 3)));
        assert_eq!(restored.count_tiles(tiles::EXIT), 1);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut bytes = encode_level(&sample_grid());
        bytes[9] = 0;
        bytes[10] = 0;
        assert!(matches!(
            decode_level(&bytes, behaviors()),
            Err(StitchError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_archive_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level-1");
        let grid = sample_grid();

        LevelArchive::from_grid(&grid).unwrap().write_to(&path).unwrap();
        assert!(dir.path().join("level-1.lvl").exists());

        std::fs::remove_file(dir.path().join("level-1.hzd")).unwrap();
        let archive = LevelArchive::read_from(&path).unwrap();
        assert!(archive.hazards.is_empty());
        assert_eq!(archive.to_grid(behaviors()).unwrap(), grid);
    }
}
