//! # Components
//!
//! Bounding-box classification of chunk content used by overlap tests.
//!
//! Components are derived on demand from a grid and never stored with it.
//! Solid tiles are grouped into horizontal runs, every placed entity becomes
//! one component sized by its kind's footprint, and every hazard becomes one
//! component covering its whole path.

use crate::level::{EntityKind, Grid, Position, Rect};

/// What a component stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A run of solid tiles
    Tile,
    /// A placed entity of the given kind
    Entity(EntityKind),
    /// A moving hazard
    Hazard,
    /// Nothing that takes part in overlap tests
    None,
}

/// A classified region of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Component {
    pub kind: ComponentKind,
    /// Cells the component occupies.
    pub bounds: Rect,
    /// Cell the component was classified from: the run start for tiles,
    /// the placement cell for entities, the origin for hazards.
    pub cell: Position,
}

impl Component {
    pub fn is_empty(&self) -> bool {
        self.kind == ComponentKind::None
    }
}

/// Classifies a single cell. Entities take precedence over tiles.
pub fn classify_cell(grid: &Grid, x: i32, y: i32) -> Component {
    let cell = Position::new(x, y);

    if let Some(entity) = grid.get_entity(x, y) {
        return Component {
            kind: ComponentKind::Entity(entity.kind),
            bounds: entity.kind.footprint(cell),
            cell,
        };
    }

    let kind = match grid.tile_at(x, y) {
        Some(tile) if grid.behaviors().is_solid(tile) => ComponentKind::Tile,
        _ => ComponentKind::None,
    };
    Component {
        kind,
        bounds: Rect::new(x, y, 1, 1),
        cell,
    }
}

/// Every non-empty component of a grid.
///
/// Tile runs come first (row by row), then entities, then hazards. A cell
/// holding both a solid tile and an entity contributes to both.
pub fn components(grid: &Grid) -> Vec<Component> {
    let behaviors = grid.behaviors();
    let mut found = Vec::new();

    for y in 0..grid.height() {
        let mut run_start: Option<i32> = None;
        for x in 0..=grid.width() {
            let solid = grid.tile_at(x, y).is_some_and(|t| behaviors.is_solid(t));
            match (solid, run_start) {
                (true, None) => run_start = Some(x),
                (false, Some(start)) => {
                    found.push(Component {
                        kind: ComponentKind::Tile,
                        bounds: Rect::new(start, y, x - start, 1),
                        cell: Position::new(start, y),
                    });
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    for (cell, _) in grid.entities() {
        found.push(classify_cell(grid, cell.x, cell.y));
    }

    for hazard in grid.hazards() {
        found.push(Component {
            kind: ComponentKind::Hazard,
            bounds: hazard.footprint(),
            cell: Position::new(hazard.x, hazard.y),
        });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{tiles, BehaviorTable, EntityTemplate, HazardKind, HazardTemplate, Orientation};
    use std::sync::Arc;

    fn grid() -> Grid {
        Grid::new(6, 4, Arc::new(BehaviorTable::standard())).unwrap()
    }

    #[test]
    fn test_classify_cell() {
        let mut g = grid();
        g.set(0, 3, tiles::GROUND);
        g.set(1, 3, tiles::COIN);
        g.set_entity(2, 3, Some(EntityTemplate::new(EntityKind::Thwomp)));

        assert_eq!(classify_cell(&g, 0, 3).kind, ComponentKind::Tile);
        assert!(classify_cell(&g, 1, 3).is_empty()); // coins are not solid
        assert!(classify_cell(&g, 9, 9).is_empty());

        let thwomp = classify_cell(&g, 2, 3);
        assert_eq!(thwomp.kind, ComponentKind::Entity(EntityKind::Thwomp));
        assert_eq!(thwomp.bounds, Rect::new(2, 0, 2, 3));
    }

    #[test]
    fn test_tile_runs() {
        let mut g = grid();
        for x in [0, 1, 2, 4, 5] {
            g.set(x, 3, tiles::GROUND);
        }
        g.set(3, 1, tiles::BRICK);

        let found = components(&g);
        let runs: Vec<_> = found
            .iter()
            .filter(|c| c.kind == ComponentKind::Tile)
            .map(|c| c.bounds)
            .collect();
        assert_eq!(
            runs,
            vec![Rect::new(3, 1, 1, 1), Rect::new(0, 3, 3, 1), Rect::new(4, 3, 2, 1)]
        );
    }

    #[test]
    fn test_entities_and_hazards() {
        let mut g = grid();
        g.set_entity(1, 2, Some(EntityTemplate::new(EntityKind::Goomba)));
        g.add_hazard(HazardTemplate {
            kind: HazardKind::FallingPlatform,
            orientation: Orientation::Horizontal,
            start: 0,
            x: 2,
            y: 0,
            span: 2,
            path_length: 1,
        });

        let found = components(&g);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].bounds, Rect::new(1, 1, 1, 1));
        assert_eq!(found[1].kind, ComponentKind::Hazard);
        assert_eq!(found[1].bounds, Rect::new(2, 0, 3, 1));
    }

    #[test]
    fn test_entity_on_solid_tile_counts_twice() {
        let mut g = grid();
        g.set(2, 3, tiles::BRICK);
        g.set_entity(2, 3, Some(EntityTemplate::new(EntityKind::Thwomp)));

        let found = components(&g);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, ComponentKind::Tile);
        assert_eq!(found[1], classify_cell(&g, 2, 3));
        assert_eq!(found[1].bounds, Rect::new(2, 0, 2, 3));
    }
}
