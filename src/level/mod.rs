//! # Level Module
//!
//! The grid data model that generated levels and authored chunks share.
//!
//! This module contains:
//! - Integer geometry (`Position`, `Rect`) used for placement and overlap tests
//! - The tile behavior table consulted by blocking queries
//! - Entity and hazard templates placed into levels
//! - The `Grid` itself and its binary stream codec

pub mod behavior;
pub mod codec;
pub mod entity;
pub mod grid;

pub use behavior::*;
pub use codec::*;
pub use entity::*;
pub use grid::*;

use serde::{Deserialize, Serialize};

/// Reserved and well-known tile ids.
///
/// Tile ids are signed bytes. Negative ids index the behavior table through
/// their unsigned bit pattern (`-1` is entry 255).
pub mod tiles {
    /// Empty space.
    pub const AIR: i8 = 0;
    /// Level exit marker. The exit coordinate is the cell directly below it.
    pub const EXIT: i8 = -1;
    /// Anchor point marker used inside authored chunks.
    pub const ANCHOR: i8 = -2;
    /// Solid rock, used by the start and end cap staircases.
    pub const ROCK: i8 = 9;
    /// Breakable brick.
    pub const BRICK: i8 = 16;
    /// Question block holding a coin.
    pub const QUESTION_BLOCK: i8 = 21;
    /// Collectible coin.
    pub const COIN: i8 = 34;
    /// Top-left pipe piece.
    pub const PIPE_TOP_LEFT: i8 = 10;
    /// Top-right pipe piece.
    pub const PIPE_TOP_RIGHT: i8 = 11;
    /// Left pipe shaft.
    pub const PIPE_LEFT: i8 = 26;
    /// Right pipe shaft.
    pub const PIPE_RIGHT: i8 = 27;
    /// Jump-through platform top, only blocks from above.
    pub const PLATFORM_TOP: i8 = 4;
    /// Ground surface (tile 145 as an unsigned byte).
    pub const GROUND: i8 = -111;
}

/// A 2D integer coordinate in grid space.
///
/// x grows to the right, y grows downwards.
///
/// # Examples
///
/// ```
/// use tilestitch::Position;
///
/// let a = Position::new(10, 5);
/// let b = Position::new(3, 2);
/// assert_eq!(a - b, Position::new(7, 3));
/// assert_eq!(a + b, Position::new(13, 7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Axis-aligned rectangle in grid cells. `x`/`y` is the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the right-most column.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// One past the bottom-most row.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns true if the rectangle covers no cells.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Checks if a cell is inside this rectangle.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x && pos.y >= self.y && pos.x < self.right() && pos.y < self.bottom()
    }

    /// Checks if this rectangle overlaps with another one.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || self.x >= other.right()
            || other.x >= self.right()
            || self.y >= other.bottom()
            || other.y >= self.bottom())
    }

    /// Returns true if `other` lies entirely inside this rectangle.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Moves the rectangle by the given offset.
    pub fn translated(&self, offset: Position) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Grows the rectangle by independent margins on each side.
    pub fn expanded(&self, left: i32, right: i32, above: i32, below: i32) -> Rect {
        Rect::new(
            self.x - left,
            self.y - above,
            self.width + left + right,
            self.height + above + below,
        )
    }

    /// Iterates over every cell in the rectangle, column by column.
    pub fn cells(&self) -> impl Iterator<Item = Position> {
        let (x0, y0, x1, y1) = (self.x, self.y, self.right(), self.bottom());
        (x0..x1).flat_map(move |x| (y0..y1).map(move |y| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_arithmetic() {
        let a = Position::new(4, 7);
        let b = Position::new(1, 9);
        assert_eq!(a + b, Position::new(5, 16));
        assert_eq!(a - b, Position::new(3, -2));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(3, 3, 2, 2);
        let c = Rect::new(4, 0, 2, 2);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // Touching edges do not overlap
        assert!(!a.overlaps(&Rect::new(1, 1, 0, 3)));
    }

    #[test]
    fn test_rect_expand_and_enclose() {
        let r = Rect::new(5, 5, 1, 1).expanded(2, 2, 3, 1);
        assert_eq!(r, Rect::new(3, 2, 5, 5));

        let bounds = Rect::new(0, 0, 10, 10);
        assert!(bounds.encloses(&r));
        assert!(!bounds.encloses(&r.translated(Position::new(6, 0))));
    }

    #[test]
    fn test_rect_cells() {
        let cells: Vec<_> = Rect::new(1, 2, 2, 2).cells().collect();
        assert_eq!(
            cells,
            vec![
                Position::new(1, 2),
                Position::new(1, 3),
                Position::new(2, 2),
                Position::new(2, 3),
            ]
        );
    }
}
