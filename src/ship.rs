//! Ship classes, identities and placement records.

use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoard;
use crate::config::BOARD_SIZE;
use crate::error::PlacementError;

type Mask = BitBoard<u128, BOARD_SIZE>;

/// Stable ship identity within one fleet, 0..NUM_SHIPS in the order of
/// [`crate::config::FLEET`].
pub type ShipId = u8;

/// Ship class, determined entirely by size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipClass {
    Boat,
    Destroyer,
    Cruiser,
    Battleship,
}

impl ShipClass {
    pub const fn size(self) -> usize {
        match self {
            ShipClass::Boat => 1,
            ShipClass::Destroyer => 2,
            ShipClass::Cruiser => 3,
            ShipClass::Battleship => 4,
        }
    }

    pub fn from_size(size: usize) -> Option<Self> {
        match size {
            1 => Some(ShipClass::Boat),
            2 => Some(ShipClass::Destroyer),
            3 => Some(ShipClass::Cruiser),
            4 => Some(ShipClass::Battleship),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ShipClass::Boat => "boat",
            ShipClass::Destroyer => "destroyer",
            ShipClass::Cruiser => "cruiser",
            ShipClass::Battleship => "battleship",
        }
    }
}

/// Orientation of a placed ship. The wire format carries this as a bare
/// `vertical` flag; that flag is authoritative, the engine never infers
/// orientation from cell comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn from_vertical(vertical: bool) -> Self {
        if vertical {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Orientation::Vertical)
    }
}

/// A resolved placement: origin cell, orientation and the cells covered.
/// The origin is the lowest-index cell of the span, regardless of which
/// anchor the placement request used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub orientation: Orientation,
    mask: Mask,
}

impl Placement {
    /// Build a placement from its origin. Fails only if the span leaves
    /// the board.
    pub fn new(
        class: ShipClass,
        orientation: Orientation,
        row: usize,
        col: usize,
    ) -> Result<Self, PlacementError> {
        let size = class.size();
        let fits = match orientation {
            Orientation::Horizontal => col + size <= BOARD_SIZE,
            Orientation::Vertical => row + size <= BOARD_SIZE,
        };
        if row >= BOARD_SIZE || col >= BOARD_SIZE || !fits {
            return Err(PlacementError::OutOfBounds { row, col });
        }
        let mut mask = Mask::new();
        for i in 0..size {
            let (r, c) = match orientation {
                Orientation::Horizontal => (row, col + i),
                Orientation::Vertical => (row + i, col),
            };
            mask.set(r, c)?;
        }
        Ok(Placement {
            row,
            col,
            orientation,
            mask,
        })
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Covered cells in span order.
    pub fn cells(&self, size: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (row, col, vertical) = (self.row, self.col, self.orientation.is_vertical());
        (0..size).map(move |i| {
            if vertical {
                (row + i, col)
            } else {
                (row, col + i)
            }
        })
    }
}

/// One ship slot in a fleet: identity, class, and placement once placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    pub id: ShipId,
    pub class: ShipClass,
    pub placement: Option<Placement>,
}

impl Ship {
    pub fn new(id: ShipId, class: ShipClass) -> Self {
        Ship {
            id,
            class,
            placement: None,
        }
    }

    pub fn size(&self) -> usize {
        self.class.size()
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }
}
