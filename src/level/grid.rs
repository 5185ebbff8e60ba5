//! # Grid
//!
//! Tile, metadata and entity storage for a level or a chunk.
//!
//! All three cell layers share the same dimensions and are stored column by
//! column, matching the order of the binary level stream. The grid also keeps
//! an ordered list of hazards, the exit coordinate and a shared handle to the
//! tile behavior table used by blocking queries.

use crate::level::{tiles, BehaviorTable, EntityKind, EntityTemplate, HazardTemplate, Position, Rect};
use crate::{StitchError, StitchResult};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A 2D tile-and-entity level.
///
/// Equality and hashing are structural over the tile layer and the entity
/// kinds only, so two windows with the same layout compare equal no matter
/// where they were cut from.
#[derive(Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<i8>,
    meta: Vec<u8>,
    entities: Vec<Option<EntityTemplate>>,
    hazards: Vec<HazardTemplate>,
    exit: Option<Position>,
    behaviors: Arc<BehaviorTable>,
}

fn check_dimensions(width: i32, height: i32) -> StitchResult<()> {
    let max = i32::from(u16::MAX);
    if width <= 0 || height <= 0 || width > max || height > max {
        return Err(StitchError::InvalidDimensions { width, height });
    }
    Ok(())
}

impl Grid {
    /// Creates an empty grid filled with air.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tilestitch::{BehaviorTable, Grid};
    ///
    /// let grid = Grid::new(20, 15, Arc::new(BehaviorTable::standard())).unwrap();
    /// assert_eq!(grid.width(), 20);
    /// assert_eq!(grid.height(), 15);
    /// assert!(Grid::new(0, 15, Arc::new(BehaviorTable::standard())).is_err());
    /// ```
    pub fn new(width: i32, height: i32, behaviors: Arc<BehaviorTable>) -> StitchResult<Self> {
        check_dimensions(width, height)?;
        let cells = (width as usize)
            .checked_mul(height as usize)
            .ok_or(StitchError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            tiles: vec![tiles::AIR; cells],
            meta: vec![0; cells],
            entities: vec![None; cells],
            hazards: Vec::new(),
            exit: None,
            behaviors,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The whole grid as a rectangle anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Shared behavior table this grid consults.
    pub fn behaviors(&self) -> &Arc<BehaviorTable> {
        &self.behaviors
    }

    /// Cell the player has to reach to finish the level, if any.
    pub fn exit(&self) -> Option<Position> {
        self.exit
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        x as usize * self.height as usize + y as usize
    }

    /// Tile at a cell with the lenient lookup rules used by movement queries.
    ///
    /// x is clamped into the grid and rows below the grid read as the last
    /// row, but anything above the top edge reads as air.
    pub fn get(&self, x: i32, y: i32) -> i8 {
        if y < 0 {
            return tiles::AIR;
        }
        let x = x.clamp(0, self.width - 1);
        let y = y.min(self.height - 1);
        self.tiles[self.index(x, y)]
    }

    /// Tile at a cell, or `None` outside the grid.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<i8> {
        self.in_bounds(x, y).then(|| self.tiles[self.index(x, y)])
    }

    /// Writes a tile. Out-of-bounds writes are ignored.
    ///
    /// Writing [`tiles::EXIT`] moves the exit to the cell below and turns the
    /// previous exit marker back into air; overwriting the tile directly above
    /// the current exit clears it.
    pub fn set(&mut self, x: i32, y: i32, tile: i8) {
        if !self.in_bounds(x, y) {
            return;
        }

        let below = Position::new(x, y + 1);
        if tile == tiles::EXIT {
            if self.in_bounds(below.x, below.y) {
                if let Some(old) = self.exit.filter(|&old| old != below) {
                    if self.tile_at(old.x, old.y - 1) == Some(tiles::EXIT) {
                        let marker = self.index(old.x, old.y - 1);
                        self.tiles[marker] = tiles::AIR;
                    }
                }
                self.exit = Some(below);
            }
        } else if self.exit == Some(below) {
            self.exit = None;
        }

        let index = self.index(x, y);
        self.tiles[index] = tile;
    }

    /// Metadata counter at a cell, 0 outside the grid.
    pub fn get_meta(&self, x: i32, y: i32) -> u8 {
        if self.in_bounds(x, y) {
            self.meta[self.index(x, y)]
        } else {
            0
        }
    }

    pub fn set_meta(&mut self, x: i32, y: i32, value: u8) {
        if self.in_bounds(x, y) {
            let index = self.index(x, y);
            self.meta[index] = value;
        }
    }

    /// Checks whether the tile at a cell stops movement in direction (dx, dy).
    pub fn is_blocking(&self, x: i32, y: i32, dx: i32, dy: i32) -> bool {
        use crate::level::TileFlags;

        let flags = self.behaviors.flags(self.get(x, y));
        flags.contains(TileFlags::BLOCK_ALL)
            || (dy > 0 && flags.contains(TileFlags::BLOCK_UPPER))
            || (dy < 0 && flags.contains(TileFlags::BLOCK_LOWER))
    }

    pub fn get_entity(&self, x: i32, y: i32) -> Option<EntityTemplate> {
        if self.in_bounds(x, y) {
            self.entities[self.index(x, y)]
        } else {
            None
        }
    }

    pub fn set_entity(&mut self, x: i32, y: i32, template: Option<EntityTemplate>) {
        if self.in_bounds(x, y) {
            let index = self.index(x, y);
            self.entities[index] = template;
        }
    }

    /// Iterates over every placed entity with its cell.
    pub fn entities(&self) -> impl Iterator<Item = (Position, EntityTemplate)> + '_ {
        let height = self.height as usize;
        self.entities
            .iter()
            .enumerate()
            .filter_map(move |(i, entity)| {
                entity.map(|e| (Position::new((i / height) as i32, (i % height) as i32), e))
            })
    }

    pub fn hazards(&self) -> &[HazardTemplate] {
        &self.hazards
    }

    pub fn add_hazard(&mut self, hazard: HazardTemplate) {
        self.hazards.push(hazard);
    }

    /// Copies a window into a new grid.
    ///
    /// Cells outside this grid come back as air with no entity. Hazards whose
    /// origin lies inside the window, and the exit if it does, are carried
    /// over in window coordinates.
    pub fn extract_area(&self, x: i32, y: i32, width: i32, height: i32) -> StitchResult<Grid> {
        let mut area = Grid::new(width, height, Arc::clone(&self.behaviors))?;

        for ax in 0..width {
            for ay in 0..height {
                let (sx, sy) = (x + ax, y + ay);
                if !self.in_bounds(sx, sy) {
                    continue;
                }
                let src = self.index(sx, sy);
                let dst = area.index(ax, ay);
                area.tiles[dst] = self.tiles[src];
                area.meta[dst] = self.meta[src];
                area.entities[dst] = self.entities[src];
            }
        }

        let window = Rect::new(x, y, width, height);
        let offset = Position::new(-x, -y);
        area.hazards = self
            .hazards
            .iter()
            .filter(|h| window.contains(Position::new(h.x, h.y)))
            .map(|h| h.translated(offset))
            .collect();
        area.exit = self
            .exit
            .filter(|&exit| window.contains(exit))
            .map(|exit| exit + offset);

        Ok(area)
    }

    /// Writes `other` into this grid with its origin at `(ox, oy)`.
    ///
    /// Tiles, metadata and entities overwrite the destination outright.
    /// Cells of `other` that land outside this grid are dropped without
    /// error; cap construction relies on that clipping. Hazards and the
    /// exit of `other` are left alone.
    pub fn merge_area(&mut self, other: &Grid, ox: i32, oy: i32) {
        for x in 0..other.width {
            for y in 0..other.height {
                let (dx, dy) = (ox + x, oy + y);
                if !self.in_bounds(dx, dy) {
                    continue;
                }
                let src = other.index(x, y);
                self.set(dx, dy, other.tiles[src]);
                let dst = self.index(dx, dy);
                self.meta[dst] = other.meta[src];
                self.entities[dst] = other.entities[src];
            }
        }
    }

    /// Reallocates the grid as `width` x `height`, moving existing content
    /// by `(left, top)`. Content that no longer fits is dropped.
    pub fn resize(&mut self, left: i32, top: i32, width: i32, height: i32) -> StitchResult<()> {
        let mut resized = Grid::new(width, height, Arc::clone(&self.behaviors))?;
        resized.merge_area(self, left, top);

        let offset = Position::new(left, top);
        resized.hazards = self.hazards.iter().map(|h| h.translated(offset)).collect();
        resized.exit = self
            .exit
            .map(|exit| exit + offset)
            .filter(|exit| resized.in_bounds(exit.x, exit.y));

        *self = resized;
        Ok(())
    }

    /// Advances transient tile state by one tick.
    pub fn tick(&mut self) {
        for counter in self.meta.iter_mut().filter(|c| **c > 0) {
            *counter -= 1;
        }
    }

    /// Number of cells holding the given tile id.
    pub fn count_tiles(&self, tile: i8) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// Cells holding the anchor marker, left-most column first.
    pub fn anchor_markers(&self) -> Vec<Position> {
        let mut markers = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                if self.tiles[self.index(x, y)] == tiles::ANCHOR {
                    markers.push(Position::new(x, y));
                }
            }
        }
        markers
    }

    /// Replaces every anchor marker with air.
    pub fn clear_anchor_markers(&mut self) {
        for tile in self.tiles.iter_mut().filter(|t| **t == tiles::ANCHOR) {
            *tile = tiles::AIR;
        }
    }

    fn preview_char(&self, x: i32, y: i32) -> char {
        use crate::level::TileFlags;

        if let Some(entity) = self.get_entity(x, y) {
            return match entity.kind {
                EntityKind::Goomba => 'g',
                EntityKind::RedKoopa => 'r',
                EntityKind::GreenKoopa => 'k',
                EntityKind::Spiky => 's',
                EntityKind::Flower => 'f',
                EntityKind::BulletBill => 'b',
                EntityKind::Thwomp => 't',
                EntityKind::HammerBrother => 'h',
            };
        }

        let tile = self.tiles[self.index(x, y)];
        match tile {
            tiles::AIR => '.',
            tiles::EXIT => 'E',
            tiles::ANCHOR => '+',
            _ => {
                let flags = self.behaviors.flags(tile);
                if flags.contains(TileFlags::BLOCK_ALL) {
                    if flags.contains(TileFlags::SPECIAL) {
                        '?'
                    } else {
                        '#'
                    }
                } else if flags.contains(TileFlags::BLOCK_UPPER) {
                    '-'
                } else if flags.contains(TileFlags::PICKUPABLE) {
                    'o'
                } else {
                    '~'
                }
            }
        }
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.tiles == other.tiles
            && self
                .entities
                .iter()
                .zip(other.entities.iter())
                .all(|(a, b)| a.map(|e| e.kind) == b.map(|e| e.kind))
    }
}

impl Eq for Grid {}

impl Hash for Grid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
        self.tiles.hash(state);
        for entity in &self.entities {
            entity.map(|e| e.kind).hash(state);
        }
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("entities", &self.entities().count())
            .field("hazards", &self.hazards.len())
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}

/// ASCII preview, one text line per row.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let row: String = (0..self.width).map(|x| self.preview_char(x, y)).collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
