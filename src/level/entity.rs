//! # Entity and Hazard Templates
//!
//! Placement templates for mobile entities and moving hazards. Templates are
//! what a level stores; live entities and their behavior belong to the game
//! runtime, not to this crate.

use crate::level::{Position, Rect};
use crate::{StitchError, StitchResult};
use serde::{Deserialize, Serialize};

/// Kinds of entities a level can place.
///
/// Each kind has a stable 4-bit code used by the entity stream and a
/// footprint used by overlap tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Goomba,
    RedKoopa,
    GreenKoopa,
    Spiky,
    /// Plant that rises out of a pipe
    Flower,
    BulletBill,
    /// Heavy crushing block enemy
    Thwomp,
    HammerBrother,
}

impl EntityKind {
    /// All kinds in code order.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Goomba,
        EntityKind::RedKoopa,
        EntityKind::GreenKoopa,
        EntityKind::Spiky,
        EntityKind::Flower,
        EntityKind::BulletBill,
        EntityKind::Thwomp,
        EntityKind::HammerBrother,
    ];

    /// Stream code in `1..=15`; 0 is reserved for "no entity".
    pub fn code(self) -> u8 {
        match self {
            EntityKind::Goomba => 1,
            EntityKind::RedKoopa => 2,
            EntityKind::GreenKoopa => 3,
            EntityKind::Spiky => 4,
            EntityKind::Flower => 5,
            EntityKind::BulletBill => 6,
            EntityKind::Thwomp => 7,
            EntityKind::HammerBrother => 8,
        }
    }

    /// Inverse of [`EntityKind::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Footprint size in cells as `(width, height)`.
    pub fn footprint_size(self) -> (i32, i32) {
        match self {
            EntityKind::Thwomp => (2, 3),
            EntityKind::Flower => (2, 2),
            _ => (1, 1),
        }
    }

    /// Cells occupied by an entity anchored at `cell`.
    ///
    /// Entities stand on their anchor cell, so the footprint sits directly
    /// above it and extends to the right.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilestitch::{EntityKind, Position, Rect};
    ///
    /// let cell = Position::new(4, 10);
    /// assert_eq!(EntityKind::Goomba.footprint(cell), Rect::new(4, 9, 1, 1));
    /// assert_eq!(EntityKind::Thwomp.footprint(cell), Rect::new(4, 7, 2, 3));
    /// ```
    pub fn footprint(self, cell: Position) -> Rect {
        let (width, height) = self.footprint_size();
        Rect::new(cell.x, cell.y - height, width, height)
    }
}

/// An entity placed on a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityTemplate {
    pub kind: EntityKind,
    /// Alternate variant (winged / jumping)
    pub winged: bool,
}

const WINGED_BIT: u8 = 0x80;
const KIND_MASK: u8 = 0x0f;

impl EntityTemplate {
    /// Creates a plain template of the given kind.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            winged: false,
        }
    }

    /// Creates the alternate (winged) variant of a kind.
    pub fn winged(kind: EntityKind) -> Self {
        Self { kind, winged: true }
    }

    /// Encodes into the entity stream byte.
    pub fn to_code(self) -> u8 {
        let mut code = self.kind.code() & KIND_MASK;
        if self.winged {
            code |= WINGED_BIT;
        }
        code
    }

    /// Decodes an entity stream byte. Code 0 means the cell is empty.
    pub fn from_code(code: u8) -> StitchResult<Option<Self>> {
        if code == 0 {
            return Ok(None);
        }

        let kind = EntityKind::from_code(code & KIND_MASK)
            .ok_or(StitchError::UnknownEntityCode(code))?;
        Ok(Some(Self {
            kind,
            winged: code & WINGED_BIT != 0,
        }))
    }
}

/// Kinds of moving hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    MovingPlatform,
    FallingPlatform,
    Firebar,
}

impl HazardKind {
    fn code(self) -> u8 {
        match self {
            HazardKind::MovingPlatform => 0,
            HazardKind::FallingPlatform => 1,
            HazardKind::Firebar => 2,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(HazardKind::MovingPlatform),
            1 => Some(HazardKind::FallingPlatform),
            2 => Some(HazardKind::Firebar),
            _ => None,
        }
    }
}

/// Axis a hazard travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A hazard that is not tied to a single cell.
///
/// The generator never interprets hazards beyond their footprint; it only
/// carries them along when chunks are copied into a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HazardTemplate {
    pub kind: HazardKind,
    pub orientation: Orientation,
    /// Starting slot along the path, `0..=7`.
    pub start: u8,
    pub x: i32,
    pub y: i32,
    /// Width of the hazard body in cells.
    pub span: u8,
    /// Number of cells travelled along the path.
    pub path_length: u8,
}

/// Size of one encoded hazard record.
pub const HAZARD_RECORD_LEN: usize = 5;

impl HazardTemplate {
    /// Cells swept by the hazard over its whole path.
    pub fn footprint(&self) -> Rect {
        let span = i32::from(self.span.max(1));
        let path = i32::from(self.path_length);
        match self.orientation {
            Orientation::Horizontal => Rect::new(self.x, self.y, span + path, 1),
            Orientation::Vertical => Rect::new(self.x, self.y, span, path + 1),
        }
    }

    /// Returns a copy moved by `offset`.
    pub fn translated(&self, offset: Position) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }

    /// Packs the record: kind in bits 0-3, orientation in bit 4, start slot
    /// in bits 5-7, then x, y, span and path length bytes.
    pub fn to_record(&self) -> StitchResult<[u8; HAZARD_RECORD_LEN]> {
        let x = u8::try_from(self.x).map_err(|_| StitchError::HazardOutOfRange(self.x, self.y))?;
        let y = u8::try_from(self.y).map_err(|_| StitchError::HazardOutOfRange(self.x, self.y))?;
        let orientation = match self.orientation {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 1,
        };
        let packed = self.kind.code() | (orientation << 4) | ((self.start & 0x07) << 5);
        Ok([packed, x, y, self.span, self.path_length])
    }

    /// Unpacks a 5-byte record.
    pub fn from_record(record: [u8; HAZARD_RECORD_LEN]) -> StitchResult<Self> {
        let packed = record[0];
        let kind = HazardKind::from_code(packed & 0x0f)
            .ok_or(StitchError::UnknownHazardKind(packed & 0x0f))?;
        let orientation = if packed & 0x10 == 0 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        Ok(Self {
            kind,
            orientation,
            start: packed >> 5,
            x: i32::from(record[1]),
            y: i32::from(record[2]),
            span: record[3],
            path_length: record[4],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_codes_are_four_bits() {
        for kind in EntityKind::ALL {
            let code = kind.code();
            assert!(code > 0 && code <= 0x0f);
            assert_eq!(EntityKind::from_code(code), Some(kind));
        }
    }

    #[test]
    fn test_entity_code_winged_bit() {
        let template = EntityTemplate::winged(EntityKind::GreenKoopa);
        assert_eq!(template.to_code(), 0x83);
        assert_eq!(EntityTemplate::from_code(0x83).unwrap(), Some(template));
        assert_eq!(EntityTemplate::from_code(0).unwrap(), None);
    }

    #[test]
    fn test_unknown_entity_code() {
        assert!(matches!(
            EntityTemplate::from_code(0x0e),
            Err(StitchError::UnknownEntityCode(0x0e))
        ));
    }

    #[test]
    fn test_large_footprints() {
        let cell = Position::new(3, 8);
        assert_eq!(EntityKind::Flower.footprint(cell), Rect::new(3, 6, 2, 2));
        assert_eq!(EntityKind::Spiky.footprint(cell), Rect::new(3, 7, 1, 1));
    }

    #[test]
    fn test_hazard_record_packing() {
        let hazard = HazardTemplate {
            kind: HazardKind::Firebar,
            orientation: Orientation::Vertical,
            start: 5,
            x: 40,
            y: 6,
            span: 3,
            path_length: 4,
        };
        let record = hazard.to_record().unwrap();
        assert_eq!(record, [0b1011_0010, 40, 6, 3, 4]);
        assert_eq!(HazardTemplate::from_record(record).unwrap(), hazard);
        assert_eq!(hazard.footprint(), Rect::new(40, 6, 3, 5));
    }

    #[test]
    fn test_hazard_out_of_byte_range() {
        let hazard = HazardTemplate {
            kind: HazardKind::MovingPlatform,
            orientation: Orientation::Horizontal,
            start: 0,
            x: 300,
            y: 2,
            span: 2,
            path_length: 6,
        };
        assert!(matches!(
            hazard.to_record(),
            Err(StitchError::HazardOutOfRange(300, 2))
        ));
    }
}
