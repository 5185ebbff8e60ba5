//! # Chunks and the Chunk Repository
//!
//! Authored level fragments with their anchor points, and the pools the
//! placement engine draws them from.
//!
//! Chunks are stored as ordinary level archives with the anchor marker tile
//! painted wherever two fragments may join. Loading a directory fans out one
//! task per chunk file and joins them before the repository is used.

use crate::level::{BehaviorTable, Grid, LevelArchive, Position, LEVEL_EXTENSION};
use crate::{LevelType, StitchResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// A point where two chunks may be joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub position: Position,
    pub visited: bool,
}

impl AnchorPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            position: Position::new(x, y),
            visited: false,
        }
    }

    pub fn at(position: Position) -> Self {
        Self {
            position,
            visited: false,
        }
    }
}

/// Role a chunk can play during generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkRole {
    /// Two or more anchors: extends the frontier
    Connector,
    /// Exactly one anchor: closes a branch
    Terminal,
}

/// An immutable level fragment plus its anchors in local coordinates.
#[derive(Debug, Clone)]
pub struct Chunk {
    name: String,
    grid: Grid,
    anchors: Vec<AnchorPoint>,
}

impl Chunk {
    /// Builds a chunk from an authored grid.
    ///
    /// Anchor markers become anchors, ordered left-most column first and top
    /// to bottom within a column, and are cleared to air in the stored grid.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tilestitch::{tiles, BehaviorTable, Chunk, ChunkRole, Grid};
    ///
    /// let mut grid = Grid::new(6, 4, Arc::new(BehaviorTable::standard())).unwrap();
    /// grid.set(0, 2, tiles::ANCHOR);
    /// grid.set(5, 2, tiles::ANCHOR);
    ///
    /// let chunk = Chunk::from_grid("bridge", grid);
    /// assert_eq!(chunk.role(), Some(ChunkRole::Connector));
    /// assert_eq!(chunk.grid().count_tiles(tiles::ANCHOR), 0);
    /// ```
    pub fn from_grid(name: impl Into<String>, mut grid: Grid) -> Self {
        let anchors = grid
            .anchor_markers()
            .into_iter()
            .map(AnchorPoint::at)
            .collect();
        grid.clear_anchor_markers();

        Self {
            name: name.into(),
            grid,
            anchors,
        }
    }

    /// Cuts a chunk out of a larger authored level.
    pub fn from_window(
        name: impl Into<String>,
        level: &Grid,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> StitchResult<Self> {
        Ok(Self::from_grid(name, level.extract_area(x, y, width, height)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn anchors(&self) -> &[AnchorPoint] {
        &self.anchors
    }

    /// The anchor aligned with the placement context.
    pub fn first_anchor(&self) -> Option<AnchorPoint> {
        self.anchors.first().copied()
    }

    /// Connector, terminal, or `None` for chunks without anchors.
    pub fn role(&self) -> Option<ChunkRole> {
        match self.anchors.len() {
            0 => None,
            1 => Some(ChunkRole::Terminal),
            _ => Some(ChunkRole::Connector),
        }
    }
}

/// Connector and terminal chunks for one level type.
#[derive(Debug, Clone, Default)]
pub struct ChunkPools {
    pub connectors: Vec<Chunk>,
    pub terminals: Vec<Chunk>,
}

impl ChunkPools {
    /// Files a chunk into the pool matching its role. Anchorless chunks are
    /// dropped and `false` is returned.
    pub fn insert(&mut self, chunk: Chunk) -> bool {
        match chunk.role() {
            Some(ChunkRole::Connector) => self.connectors.push(chunk),
            Some(ChunkRole::Terminal) => self.terminals.push(chunk),
            None => return false,
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty() && self.terminals.is_empty()
    }
}

/// Ordered collection of candidate chunks, grouped by level type.
#[derive(Debug, Clone, Default)]
pub struct ChunkRepository {
    pools: BTreeMap<LevelType, ChunkPools>,
}

impl ChunkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository for a single level type from authored grids.
    pub fn from_grids(
        level_type: LevelType,
        grids: impl IntoIterator<Item = (String, Grid)>,
    ) -> Self {
        let mut repository = Self::new();
        for (name, grid) in grids {
            repository.add(level_type, Chunk::from_grid(name, grid));
        }
        repository
    }

    /// Adds a chunk to the pools of a level type.
    pub fn add(&mut self, level_type: LevelType, chunk: Chunk) {
        let name = chunk.name().to_string();
        if !self.pools.entry(level_type).or_default().insert(chunk) {
            debug!("Chunk '{}' has no anchor points, skipping", name);
        }
    }

    /// Pools for a level type, falling back to the default type's pools.
    pub fn pools(&self, level_type: LevelType) -> Option<&ChunkPools> {
        self.pools
            .get(&level_type)
            .or_else(|| self.pools.get(&LevelType::default()))
    }

    /// Total number of chunks across all level types.
    pub fn len(&self) -> usize {
        self.pools
            .values()
            .map(|p| p.connectors.len() + p.terminals.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads every `*.lvl` chunk in `dir` for one level type.
    ///
    /// Each file is read and decoded on its own blocking task. Files that
    /// fail to load are logged and skipped. Chunks are kept in file name
    /// order so the repository is identical from run to run.
    pub async fn load_dir(
        &mut self,
        dir: impl AsRef<Path>,
        level_type: LevelType,
        behaviors: Arc<BehaviorTable>,
    ) -> StitchResult<usize> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == LEVEL_EXTENSION))
            .collect();
        paths.sort();

        let mut tasks = JoinSet::new();
        for (index, path) in paths.into_iter().enumerate() {
            let behaviors = Arc::clone(&behaviors);
            tasks.spawn_blocking(move || {
                let result = load_chunk(&path, behaviors);
                (index, path, result)
            });
        }

        let mut loaded = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(chunk))) => loaded.push((index, chunk)),
                Ok((_, path, Err(e))) => {
                    warn!("Skipping chunk {}: {}", path.display(), e);
                }
                Err(e) => warn!("Chunk loader task failed: {}", e),
            }
        }
        loaded.sort_by_key(|(index, _)| *index);

        let count = loaded.len();
        for (_, chunk) in loaded {
            self.add(level_type, chunk);
        }
        debug!(
            "Loaded {} chunks from {} for {:?}",
            count,
            dir.as_ref().display(),
            level_type
        );

        Ok(count)
    }
}

/// Reads one chunk archive from disk.
fn load_chunk(path: &Path, behaviors: Arc<BehaviorTable>) -> StitchResult<Chunk> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let grid = LevelArchive::read_from(path)?.to_grid(behaviors)?;
    Ok(Chunk::from_grid(name, grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::tiles;

    fn marked_grid(anchors: &[(i32, i32)]) -> Grid {
        let mut grid = Grid::new(8, 5, Arc::new(BehaviorTable::standard())).unwrap();
        for x in 0..8 {
            grid.set(x, 4, tiles::GROUND);
        }
        for &(x, y) in anchors {
            grid.set(x, y, tiles::ANCHOR);
        }
        grid
    }

    #[test]
    fn test_anchor_order_is_column_major() {
        let chunk = Chunk::from_grid("c", marked_grid(&[(7, 3), (0, 3), (0, 1)]));
        let positions: Vec<_> = chunk.anchors().iter().map(|a| a.position).collect();
        assert_eq!(
            positions,
            vec![Position::new(0, 1), Position::new(0, 3), Position::new(7, 3)]
        );
        assert_eq!(chunk.first_anchor().unwrap().position, Position::new(0, 1));
    }

    #[test]
    fn test_roles() {
        assert_eq!(Chunk::from_grid("a", marked_grid(&[])).role(), None);
        assert_eq!(
            Chunk::from_grid("b", marked_grid(&[(0, 3)])).role(),
            Some(ChunkRole::Terminal)
        );
        assert_eq!(
            Chunk::from_grid("c", marked_grid(&[(0, 3), (7, 3)])).role(),
            Some(ChunkRole::Connector)
        );
    }

    #[test]
    fn test_repository_partitions_pools() {
        let repository = ChunkRepository::from_grids(
            LevelType::Overground,
            vec![
                ("none".to_string(), marked_grid(&[])),
                ("end".to_string(), marked_grid(&[(0, 3)])),
                ("mid".to_string(), marked_grid(&[(0, 3), (7, 3)])),
            ],
        );

        let pools = repository.pools(LevelType::Overground).unwrap();
        assert_eq!(pools.connectors.len(), 1);
        assert_eq!(pools.terminals.len(), 1);
        assert_eq!(pools.connectors[0].name(), "mid");
        assert_eq!(repository.len(), 2);
    }

    #[test]
    fn test_pools_fall_back_to_default_type() {
        let repository = ChunkRepository::from_grids(
            LevelType::default(),
            vec![("end".to_string(), marked_grid(&[(0, 3)]))],
        );
        assert!(repository.pools(LevelType::Castle).is_some());
        assert!(ChunkRepository::new().pools(LevelType::Castle).is_none());
    }

    #[test]
    fn test_from_window() {
        let level = marked_grid(&[(2, 3), (6, 3)]);
        let chunk = Chunk::from_window("w", &level, 2, 0, 5, 5).unwrap();
        let positions: Vec<_> = chunk.anchors().iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![Position::new(0, 3), Position::new(4, 3)]);
    }
}
