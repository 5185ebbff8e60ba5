//! Property tests for grid access, area copies and the level streams.

use proptest::prelude::*;
use std::sync::Arc;
use tilestitch::{tiles, BehaviorTable, EntityKind, EntityTemplate, Grid, LevelArchive};

const PALETTE: [i8; 7] = [
    tiles::AIR,
    tiles::ROCK,
    tiles::BRICK,
    tiles::QUESTION_BLOCK,
    tiles::COIN,
    tiles::PLATFORM_TOP,
    tiles::GROUND,
];

/// Cell contents: palette index, metadata byte, optional entity index.
type Cell = (usize, u8, Option<usize>);

fn grid_strategy() -> impl Strategy<Value = Grid> {
    (1i32..12, 1i32..10).prop_flat_map(|(width, height)| {
        let cells = (width * height) as usize;
        let cell = (
            0..PALETTE.len(),
            any::<u8>(),
            proptest::option::weighted(0.1, 0..EntityKind::ALL.len()),
        );
        proptest::collection::vec(cell, cells).prop_map(move |cells: Vec<Cell>| {
            let mut grid = Grid::new(width, height, Arc::new(BehaviorTable::standard()))
                .expect("valid dimensions");
            for (i, (tile, meta, entity)) in cells.into_iter().enumerate() {
                let (x, y) = (i as i32 / height, i as i32 % height);
                grid.set(x, y, PALETTE[tile]);
                grid.set_meta(x, y, meta);
                grid.set_entity(x, y, entity.map(|k| EntityTemplate::new(EntityKind::ALL[k])));
            }
            grid
        })
    })
}

proptest! {
    #[test]
    fn prop_get_never_leaves_the_grid(grid in grid_strategy(), x in -50i32..50, y in -50i32..50) {
        let tile = grid.get(x, y);
        if y < 0 {
            prop_assert_eq!(tile, tiles::AIR);
        } else {
            let cx = x.clamp(0, grid.width() - 1);
            let cy = y.min(grid.height() - 1);
            prop_assert_eq!(Some(tile), grid.tile_at(cx, cy));
        }
    }

    #[test]
    fn prop_set_ignores_out_of_bounds(
        grid in grid_strategy(),
        x in -50i32..50,
        y in -50i32..50,
        tile in 0..PALETTE.len(),
    ) {
        let mut written = grid.clone();
        written.set(x, y, PALETTE[tile]);
        if grid.in_bounds(x, y) {
            prop_assert_eq!(written.get(x, y), PALETTE[tile]);
        } else {
            prop_assert_eq!(written, grid);
        }
    }

    #[test]
    fn prop_extract_then_merge_restores_window(
        grid in grid_strategy(),
        x in -3i32..12,
        y in -3i32..10,
        width in 1i32..8,
        height in 1i32..8,
    ) {
        let area = grid.extract_area(x, y, width, height).expect("valid window");
        prop_assert_eq!(area.width(), width);
        prop_assert_eq!(area.height(), height);

        let mut blank = Grid::new(grid.width(), grid.height(), Arc::clone(grid.behaviors()))
            .expect("valid dimensions");
        blank.merge_area(&area, x, y);

        for cx in 0..grid.width() {
            for cy in 0..grid.height() {
                let inside = cx >= x && cx < x + width && cy >= y && cy < y + height;
                if inside {
                    prop_assert_eq!(blank.tile_at(cx, cy), grid.tile_at(cx, cy));
                    prop_assert_eq!(blank.get_meta(cx, cy), grid.get_meta(cx, cy));
                    prop_assert_eq!(blank.get_entity(cx, cy), grid.get_entity(cx, cy));
                } else {
                    prop_assert_eq!(blank.tile_at(cx, cy), Some(tiles::AIR));
                    prop_assert_eq!(blank.get_entity(cx, cy), None);
                }
            }
        }
    }

    #[test]
    fn prop_archive_round_trip(grid in grid_strategy()) {
        let archive = LevelArchive::from_grid(&grid).expect("encodable");
        let restored = archive
            .to_grid(Arc::new(BehaviorTable::standard()))
            .expect("decodable");

        prop_assert_eq!(&restored, &grid);
        for x in 0..grid.width() {
            for y in 0..grid.height() {
                prop_assert_eq!(restored.get_meta(x, y), grid.get_meta(x, y));
            }
        }
    }
}
