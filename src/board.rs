//! One side's board: occupancy, hit and miss masks plus the fleet slots.
//!
//! The board is a passive data structure. Placement mutations go through
//! [`crate::placement`], combat mutations through [`crate::combat`]; the
//! board itself only offers pure queries and the raw cell view.

use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoard;
use crate::config::{BOARD_SIZE, FLEET, NUM_SHIPS};
use crate::ship::{Placement, Ship, ShipId};

pub type Mask = BitBoard<u128, BOARD_SIZE>;

/// Observable state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Ship,
    Hit,
    Miss,
}

/// True iff (row, col) lies on the 10×10 grid.
pub fn in_bounds(row: usize, col: usize) -> bool {
    row < BOARD_SIZE && col < BOARD_SIZE
}

pub struct Board {
    ships: [Ship; NUM_SHIPS],
    ship_map: Mask,
    hits: Mask,
    misses: Mask,
    sunk: [bool; NUM_SHIPS],
}

impl Board {
    /// Empty board with the full fleet unplaced.
    pub fn new() -> Self {
        let ships = core::array::from_fn(|i| Ship::new(i as ShipId, FLEET[i]));
        Board {
            ships,
            ship_map: Mask::new(),
            hits: Mask::new(),
            misses: Mask::new(),
            sunk: [false; NUM_SHIPS],
        }
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship_map(&self) -> Mask {
        self.ship_map
    }

    pub fn hits(&self) -> Mask {
        self.hits
    }

    pub fn misses(&self) -> Mask {
        self.misses
    }

    /// True iff a placed ship covers (row, col).
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.ship_map.get(row, col).unwrap_or(false)
    }

    /// True iff any of the eight neighbours of (row, col) is occupied.
    /// Placement-time query only; combat never consults adjacency.
    pub fn has_adjacent_occupied(&self, row: usize, col: usize) -> bool {
        for dr in -1i32..=1 {
            for dc in -1i32..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let nr = row as i32 + dr;
                let nc = col as i32 + dc;
                if nr < 0 || nc < 0 {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if in_bounds(nr, nc) && self.is_occupied(nr, nc) {
                    return true;
                }
            }
        }
        false
    }

    /// Observable state of one cell.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        if self.hits.get(row, col).unwrap_or(false) {
            Cell::Hit
        } else if self.misses.get(row, col).unwrap_or(false) {
            Cell::Miss
        } else if self.is_occupied(row, col) {
            Cell::Ship
        } else {
            Cell::Empty
        }
    }

    /// True once every ship in the fleet has been placed.
    pub fn is_fleet_complete(&self) -> bool {
        self.ships.iter().all(|s| s.is_placed())
    }

    /// Placed ships that have not been sunk.
    pub fn ships_remaining(&self) -> usize {
        self.ships
            .iter()
            .zip(self.sunk.iter())
            .filter(|(s, &sunk)| s.is_placed() && !sunk)
            .count()
    }

    /// The ship covering (row, col), if any.
    pub fn ship_at(&self, row: usize, col: usize) -> Option<&Ship> {
        self.ships.iter().find(|s| {
            s.placement
                .map(|p| p.mask().get(row, col).unwrap_or(false))
                .unwrap_or(false)
        })
    }

    /// Record a committed placement. Callers have already validated the
    /// span; this only wires it into the slot and the occupancy mask.
    pub(crate) fn commit_placement(&mut self, index: usize, placement: Placement) {
        self.ship_map |= placement.mask();
        self.ships[index].placement = Some(placement);
    }

    /// Drop all placements and shot history.
    pub(crate) fn reset(&mut self) {
        for ship in self.ships.iter_mut() {
            ship.placement = None;
        }
        self.ship_map.clear_all();
        self.hits.clear_all();
        self.misses.clear_all();
        self.sunk = [false; NUM_SHIPS];
    }

    pub(crate) fn mark_hit(&mut self, row: usize, col: usize) {
        let _ = self.hits.set(row, col);
    }

    pub(crate) fn mark_miss(&mut self, row: usize, col: usize) {
        let _ = self.misses.set(row, col);
    }

    pub(crate) fn mark_sunk(&mut self, id: ShipId) {
        self.sunk[id as usize] = true;
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
