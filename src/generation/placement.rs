//! # Chunk Placement Engine
//!
//! The anchor frontier loop that grows a level out of chunks.
//!
//! One engine runs one phase over one pool:
//!
//! 1. Select a context anchor from the frontier, round-robin, reshuffling
//!    the frontier each time the cursor wraps around
//! 2. Filter the pool down to chunks that fit at that anchor
//! 3. Sample one of them with the frequency sampler
//! 4. Merge it into the level and push its other anchors onto the frontier
//!
//! A context with no compatible chunk is marked failed. The phase ends once
//! every anchor on the frontier has failed since the last placement.

use crate::generation::component::{components, Component, ComponentKind};
use crate::generation::{AnchorPoint, Chunk, EntityMargin, FrequencySampler};
use crate::level::{EntityKind, Grid, Position, Rect};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Largest entity footprint, used to widen neighborhood scans so that
/// footprints reaching into the neighborhood are found.
const MAX_FOOTPRINT: (i32, i32) = (2, 3);

/// Outcome of one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseReport {
    /// Chunks merged into the level
    pub placed: usize,
    /// Context selections that found no compatible chunk
    pub failed_contexts: usize,
    /// Chunks placed, in placement order
    pub placements: Vec<Placement>,
}

/// One chunk merged into the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Name of the placed chunk
    pub chunk: String,
    /// Level cell the chunk's origin was merged at
    pub offset: Position,
}

/// Runs one placement phase over a chunk pool.
pub struct PlacementEngine<'a> {
    pool: &'a [Chunk],
    pool_components: Vec<Vec<Component>>,
    sampler: FrequencySampler,
    rng: StdRng,
    frontier: Vec<AnchorPoint>,
    cursor: usize,
    failed: HashSet<Position>,
    retired: HashSet<Position>,
    margin: EntityMargin,
}

impl<'a> PlacementEngine<'a> {
    /// Creates an engine over `pool` starting from `frontier`.
    pub fn new(
        pool: &'a [Chunk],
        frontier: Vec<AnchorPoint>,
        margin: EntityMargin,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sampler = FrequencySampler::new(pool.len(), rng.gen::<u64>());

        let mut unique = Vec::with_capacity(frontier.len());
        for anchor in frontier {
            if !unique.iter().any(|a: &AnchorPoint| a.position == anchor.position) {
                unique.push(anchor);
            }
        }

        Self {
            pool,
            pool_components: pool.iter().map(|c| components(c.grid())).collect(),
            sampler,
            rng,
            frontier: unique,
            cursor: 0,
            failed: HashSet::new(),
            retired: HashSet::new(),
            margin,
        }
    }

    /// Anchors still waiting for a chunk.
    pub fn frontier(&self) -> &[AnchorPoint] {
        &self.frontier
    }

    /// Hands the remaining frontier on to the next phase.
    pub fn into_frontier(self) -> Vec<AnchorPoint> {
        self.frontier
    }

    /// Places chunks into `grid` until no anchor can take one.
    pub fn run(&mut self, grid: &mut Grid) -> PhaseReport {
        let mut report = PhaseReport::default();

        while !self.pool.is_empty() && self.failed.len() < self.frontier.len() {
            let context = self.select_context();
            if self.failed.contains(&context.position) {
                continue;
            }

            let candidates = self.filter(grid, context.position);
            if candidates.is_empty() {
                trace!("No chunk fits at {:?}", context.position);
                self.failed.insert(context.position);
                report.failed_contexts += 1;
                continue;
            }

            let Some(pick) = self.sampler.draw_below(candidates.len()) else {
                break;
            };
            let chunk_index = candidates[pick];
            let Some(offset) = self.integrate(grid, context, chunk_index) else {
                continue;
            };

            report.placed += 1;
            report.placements.push(Placement {
                chunk: self.pool[chunk_index].name().to_string(),
                offset,
            });
            self.failed.clear();
        }

        debug!(
            "Phase finished: {} placed, {} failed contexts, {} anchors left",
            report.placed,
            report.failed_contexts,
            self.frontier.len()
        );
        report
    }

    /// Next anchor in round-robin order, shuffling the frontier on wrap-around.
    fn select_context(&mut self) -> AnchorPoint {
        if self.cursor >= self.frontier.len() {
            self.frontier.shuffle(&mut self.rng);
            self.cursor = 0;
        }

        let anchor = &mut self.frontier[self.cursor];
        anchor.visited = true;
        self.cursor += 1;
        *anchor
    }

    /// Indices into the pool of every chunk that fits at `context`, in pool order.
    pub fn filter(&self, grid: &Grid, context: Position) -> Vec<usize> {
        (0..self.pool.len())
            .filter(|&index| self.is_compatible(grid, index, context))
            .collect()
    }

    /// Offset that lines the chunk's first anchor up with `context`.
    fn placement_offset(chunk: &Chunk, context: Position) -> Option<Position> {
        chunk.first_anchor().map(|first| context - first.position)
    }

    fn is_compatible(&self, grid: &Grid, index: usize, context: Position) -> bool {
        let chunk = &self.pool[index];
        let Some(offset) = Self::placement_offset(chunk, context) else {
            return false;
        };

        let placed = chunk.grid().bounds().translated(offset);
        if !grid.bounds().encloses(&placed) {
            return false;
        }

        for component in &self.pool_components[index] {
            let bounds = component.bounds.translated(offset);
            let fits = match component.kind {
                ComponentKind::Entity(kind) => {
                    !self.entity_nearby(grid, component.cell + offset, kind, bounds)
                        && tiles_agree(grid, chunk, bounds, offset)
                        && entities_agree(grid, chunk, bounds, offset)
                }
                ComponentKind::Tile => {
                    tiles_agree(grid, chunk, bounds, offset)
                        && entities_agree(grid, chunk, bounds, offset)
                }
                ComponentKind::Hazard => !grid
                    .hazards()
                    .iter()
                    .any(|hazard| hazard.footprint().overlaps(&bounds)),
                ComponentKind::None => true,
            };

            if !fits {
                trace!(
                    "Rejecting '{}' at {:?}: {:?} component at {:?}",
                    chunk.name(),
                    context,
                    component.kind,
                    bounds
                );
                return false;
            }
        }

        true
    }

    /// Looks for level entities crowding an entity about to be placed at `cell`.
    ///
    /// An entity of the same kind sitting on the very same cell is the same
    /// entity authored into both overlapping chunks and does not count.
    fn entity_nearby(&self, grid: &Grid, cell: Position, kind: EntityKind, bounds: Rect) -> bool {
        let m = &self.margin;
        let neighborhood = bounds.expanded(m.left, m.right, m.above, m.below);
        let scan = neighborhood.expanded(MAX_FOOTPRINT.0 - 1, 0, 0, MAX_FOOTPRINT.1);

        scan.cells().any(|pos| match grid.get_entity(pos.x, pos.y) {
            Some(existing) if pos == cell && existing.kind == kind => false,
            Some(existing) => {
                neighborhood.contains(pos) || existing.kind.footprint(pos).overlaps(&neighborhood)
            }
            None => false,
        })
    }

    /// Merges the chunk at `context`, updates the frontier and returns the
    /// offset the chunk landed at.
    fn integrate(&mut self, grid: &mut Grid, context: AnchorPoint, index: usize) -> Option<Position> {
        let chunk = &self.pool[index];
        let offset = Self::placement_offset(chunk, context.position)?;

        grid.merge_area(chunk.grid(), offset.x, offset.y);
        for hazard in chunk.grid().hazards() {
            let moved = hazard.translated(offset);
            if grid.in_bounds(moved.x, moved.y) {
                grid.add_hazard(moved);
            }
        }

        if let Some(at) = self.frontier.iter().position(|a| a.position == context.position) {
            self.frontier.remove(at);
            if at < self.cursor {
                self.cursor -= 1;
            }
        }
        self.retired.insert(context.position);

        for anchor in chunk.anchors() {
            let position = anchor.position + offset;
            if !grid.in_bounds(position.x, position.y)
                || position == context.position
                || self.retired.contains(&position)
                || self.frontier.iter().any(|a| a.position == position)
            {
                continue;
            }
            self.frontier.push(AnchorPoint::at(position));
        }

        debug!("Placed '{}' at {:?}", chunk.name(), offset);
        Some(offset)
    }
}

/// Destination tiles under `bounds` are either air or the same tile the
/// chunk brings.
fn tiles_agree(grid: &Grid, chunk: &Chunk, bounds: Rect, offset: Position) -> bool {
    bounds.cells().all(|pos| {
        let Some(existing) = grid.tile_at(pos.x, pos.y) else {
            return true;
        };
        let local = pos - offset;
        let incoming = chunk
            .grid()
            .tile_at(local.x, local.y)
            .unwrap_or(crate::level::tiles::AIR);
        existing == crate::level::tiles::AIR || existing == incoming
    })
}

/// Destination entities under `bounds` match the chunk's entity kind at the
/// same cell.
fn entities_agree(grid: &Grid, chunk: &Chunk, bounds: Rect, offset: Position) -> bool {
    bounds.cells().all(|pos| match grid.get_entity(pos.x, pos.y) {
        Some(existing) => {
            let local = pos - offset;
            chunk
                .grid()
                .get_entity(local.x, local.y)
                .is_some_and(|incoming| incoming.kind == existing.kind)
        }
        None => true,
    })
}
