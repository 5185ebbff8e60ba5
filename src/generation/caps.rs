//! # Level Caps
//!
//! Hand-built start and end sections that bracket the generated middle.

use crate::config::{CAP_FLOOR_ROWS, END_CAP_WIDTH, EXIT_OFFSET_FROM_RIGHT, START_CAP_WIDTH};
use crate::generation::AnchorPoint;
use crate::level::{tiles, Grid, Position};
use crate::StitchResult;

/// Height of the start staircase at the left wall.
const START_STAIR_STEPS: i32 = 3;
/// Steps of the end staircase before it levels out.
const END_STAIR_STEPS: i32 = 4;
/// Flat columns between the generated content and the end staircase.
const END_RUN_UP: i32 = 2;

/// Top row of the cap floor.
fn floor_top(grid: &Grid) -> i32 {
    grid.height() - CAP_FLOOR_ROWS
}

fn fill_column(grid: &mut Grid, x: i32, from: i32, to: i32, tile: i8) {
    for y in from..to {
        grid.set(x, y, tile);
    }
}

/// Builds the start platform in the left-most columns.
///
/// The platform is a stretch of floor with a staircase falling away from the
/// left wall. Returns the anchor sitting on the floor just right of it.
pub fn build_start_cap(grid: &mut Grid) -> AnchorPoint {
    let floor = floor_top(grid);
    let steps = START_STAIR_STEPS.min(floor - 1).max(0);

    for x in 0..START_CAP_WIDTH {
        fill_column(grid, x, floor, grid.height(), tiles::GROUND);
        let stair = steps - x;
        if stair > 0 {
            fill_column(grid, x, floor - stair, floor, tiles::ROCK);
        }
    }

    AnchorPoint::new(START_CAP_WIDTH, floor - 1)
}

/// Entry anchor used when the start cap is skipped: the floor row at the
/// left edge.
pub fn entry_anchor(grid: &Grid) -> AnchorPoint {
    AnchorPoint::new(0, floor_top(grid) - 1)
}

/// Widens the level and builds the closing staircase in the new columns.
///
/// The staircase climbs to a plateau; the exit marker stands on the plateau
/// a fixed distance from the right edge. Returns the exit cell.
pub fn build_end_cap(grid: &mut Grid) -> StitchResult<Position> {
    let start = grid.width();
    let height = grid.height();
    grid.resize(0, 0, start + END_CAP_WIDTH, height)?;

    let floor = floor_top(grid);
    let steps = END_STAIR_STEPS.min(floor - 2).max(0);

    for i in 0..END_CAP_WIDTH {
        let x = start + i;
        fill_column(grid, x, floor, height, tiles::GROUND);
        let stair = (i - END_RUN_UP + 1).clamp(0, steps);
        if stair > 0 {
            fill_column(grid, x, floor - stair, floor, tiles::ROCK);
        }
    }

    let plateau = floor - steps;
    let exit_x = grid.width() - EXIT_OFFSET_FROM_RIGHT;
    grid.set(exit_x, plateau - 2, tiles::EXIT);

    Ok(Position::new(exit_x, plateau - 1))
}
