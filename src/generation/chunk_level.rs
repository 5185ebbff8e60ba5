//! # Chunk Level Generator
//!
//! Builds a complete level: start cap, connector phase, terminal phase,
//! end cap.

use crate::generation::{
    caps, utils, ChunkPools, ChunkRepository, GenerationConfig, Generator, PhaseReport,
    PlacementEngine,
};
use crate::level::{BehaviorTable, Grid};
use crate::StitchResult;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

/// Generator that stitches repository chunks into a level.
#[derive(Debug, Clone)]
pub struct ChunkLevelGenerator {
    repository: Arc<ChunkRepository>,
    behaviors: Arc<BehaviorTable>,
}

/// What happened during one generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub connector_phase: PhaseReport,
    pub terminal_phase: PhaseReport,
    /// Anchors nothing could be attached to
    pub open_anchors: usize,
}

impl ChunkLevelGenerator {
    /// Creates a generator over a repository snapshot and behavior table.
    pub fn new(repository: Arc<ChunkRepository>, behaviors: Arc<BehaviorTable>) -> Self {
        Self {
            repository,
            behaviors,
        }
    }

    pub fn repository(&self) -> &ChunkRepository {
        &self.repository
    }

    /// Generates a level seeded from `config.seed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tilestitch::{BehaviorTable, ChunkLevelGenerator, ChunkRepository, GenerationConfig};
    ///
    /// let generator = ChunkLevelGenerator::new(
    ///     Arc::new(ChunkRepository::new()),
    ///     Arc::new(BehaviorTable::standard()),
    /// );
    /// // With no chunks, only the caps are built
    /// let level = generator.generate_level(&GenerationConfig::new(15)).unwrap();
    /// assert_eq!(level.width(), 143);
    /// assert!(level.exit().is_some());
    /// ```
    pub fn generate_level(&self, config: &GenerationConfig) -> StitchResult<Grid> {
        let mut rng = utils::create_rng(config);
        self.generate(config, &mut rng)
    }

    /// Like [`ChunkLevelGenerator::generate_level`], also returning what each
    /// phase did.
    pub fn generate_with_report(
        &self,
        config: &GenerationConfig,
    ) -> StitchResult<(Grid, GenerationReport)> {
        let mut rng = utils::create_rng(config);
        self.build(config, &mut rng)
    }

    fn build(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> StitchResult<(Grid, GenerationReport)> {
        config.validate()?;

        let mut grid = Grid::new(config.width, config.height, Arc::clone(&self.behaviors))?;
        let entry = if config.build_start {
            caps::build_start_cap(&mut grid)
        } else {
            caps::entry_anchor(&grid)
        };

        let empty = ChunkPools::default();
        let pools = self.repository.pools(config.level_type).unwrap_or(&empty);
        debug!(
            "Generating {:?} level {}x{} (difficulty {}) from {} connectors and {} terminals",
            config.level_type,
            config.width,
            config.height,
            config.difficulty,
            pools.connectors.len(),
            pools.terminals.len()
        );

        let mut connectors = PlacementEngine::new(
            &pools.connectors,
            vec![entry],
            config.entity_margin,
            rng.gen::<u64>(),
        );
        let connector_phase = connectors.run(&mut grid);

        let mut terminals = PlacementEngine::new(
            &pools.terminals,
            connectors.into_frontier(),
            config.entity_margin,
            rng.gen::<u64>(),
        );
        let terminal_phase = terminals.run(&mut grid);
        let open_anchors = terminals.frontier().len();

        grid.clear_anchor_markers();
        if config.build_end {
            caps::build_end_cap(&mut grid)?;
        }

        self.validate(&grid, config)?;
        info!(
            "Generated level {}x{} with seed {}: {} connectors, {} terminals, {} open anchors",
            grid.width(),
            grid.height(),
            config.seed,
            connector_phase.placed,
            terminal_phase.placed,
            open_anchors
        );

        Ok((
            grid,
            GenerationReport {
                connector_phase,
                terminal_phase,
                open_anchors,
            },
        ))
    }
}

impl Generator<Grid> for ChunkLevelGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> StitchResult<Grid> {
        self.build(config, rng).map(|(grid, _)| grid)
    }

    fn validate(&self, grid: &Grid, config: &GenerationConfig) -> StitchResult<()> {
        utils::validate_level(grid)?;

        let expected_width = if config.build_end {
            config.width + crate::config::END_CAP_WIDTH
        } else {
            config.width
        };
        if grid.width() != expected_width || grid.height() != config.height {
            return Err(crate::StitchError::GenerationFailed(format!(
                "Level is {}x{}, expected {}x{}",
                grid.width(),
                grid.height(),
                expected_width,
                config.height
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "ChunkLevelGenerator"
    }
}
