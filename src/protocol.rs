//! Wire contract between clients and the relay.
//!
//! Coordinates on the wire are always 0-based row/column with an explicit
//! `vertical` flag and an explicit ship size. The letter/1-based display
//! form never leaves [`crate::display`].

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell};
use crate::config::{BOARD_SIZE, FLEET, NUM_SHIPS, TOTAL_SHIP_CELLS};
use crate::error::ErrorKind;
use crate::ship::{Orientation, Placement, ShipClass, ShipId};

pub const PROTOCOL_VERSION: u8 = 1;

pub type PlayerId = u64;
pub type SessionId = u64;

/// One placed ship as carried by `SubmitFleet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub ship_id: ShipId,
    pub size: u8,
    /// 0-based origin row (lowest-index cell of the span).
    pub row: u8,
    /// 0-based origin column.
    pub col: u8,
    /// Authoritative orientation; never inferred from cell comparison.
    pub vertical: bool,
}

/// A complete frozen fleet: the ship list plus the redundant occupancy
/// matrix ('S'/' ', ten rows of ten). Both are produced by
/// [`FleetLayout::from_board`] so they cannot disagree; [`to_board`]
/// rejects layouts where they do.
///
/// [`to_board`]: FleetLayout::to_board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetLayout {
    pub ships: Vec<ShipPlacement>,
    pub matrix: Vec<String>,
}

impl FleetLayout {
    /// Serialize a fully placed board.
    pub fn from_board(board: &Board) -> Self {
        let ships = board
            .ships()
            .iter()
            .filter_map(|s| {
                s.placement.map(|p| ShipPlacement {
                    ship_id: s.id,
                    size: s.size() as u8,
                    row: p.row as u8,
                    col: p.col as u8,
                    vertical: p.orientation.is_vertical(),
                })
            })
            .collect();
        FleetLayout {
            ships,
            matrix: matrix_of(board),
        }
    }

    /// Rebuild and fully validate a board from the wire form: fixed
    /// composition, bounds, overlap, the no-touching rule, and agreement
    /// between the ship list and the matrix.
    pub fn to_board(&self) -> Result<Board, String> {
        if self.ships.len() != NUM_SHIPS {
            return Err(format!(
                "fleet has {} ships, expected {}",
                self.ships.len(),
                NUM_SHIPS
            ));
        }
        let mut board = Board::new();
        let mut seen = [false; NUM_SHIPS];
        for ship in &self.ships {
            let idx = ship.ship_id as usize;
            if idx >= NUM_SHIPS {
                return Err(format!("unknown ship id {}", ship.ship_id));
            }
            if seen[idx] {
                return Err(format!("duplicate ship id {}", ship.ship_id));
            }
            seen[idx] = true;
            if FLEET[idx].size() != ship.size as usize {
                return Err(format!(
                    "ship {} has size {}, expected {}",
                    ship.ship_id,
                    ship.size,
                    FLEET[idx].size()
                ));
            }
            let class = ShipClass::from_size(ship.size as usize)
                .ok_or_else(|| format!("invalid ship size {}", ship.size))?;
            let placement = Placement::new(
                class,
                Orientation::from_vertical(ship.vertical),
                ship.row as usize,
                ship.col as usize,
            )
            .map_err(|e| e.to_string())?;
            for (r, c) in placement.cells(ship.size as usize) {
                if board.is_occupied(r, c) {
                    return Err(format!("ships overlap at ({}, {})", r, c));
                }
                if board.has_adjacent_occupied(r, c) {
                    return Err(format!("ships touch at ({}, {})", r, c));
                }
            }
            board.commit_placement(idx, placement);
        }
        if board.ship_map().count_ones() != TOTAL_SHIP_CELLS {
            return Err("fleet does not cover exactly 20 cells".into());
        }
        if matrix_of(&board) != self.matrix {
            return Err("occupancy matrix disagrees with ship list".into());
        }
        Ok(board)
    }
}

fn matrix_of(board: &Board) -> Vec<String> {
    (0..BOARD_SIZE)
        .map(|r| {
            (0..BOARD_SIZE)
                .map(|c| if board.is_occupied(r, c) { 'S' } else { ' ' })
                .collect()
        })
        .collect()
}

/// How a finished game ended; `GameEnd` keeps the distilled draw/winner
/// fields and this disambiguates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    AllSunk,
    Draw,
    Surrender,
    Timeout,
    Rejected,
    Abandoned,
}

/// Result of one resolved move, broadcast to both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub session_id: SessionId,
    pub by: PlayerId,
    pub row: u8,
    pub col: u8,
    pub hit: bool,
    pub sunk_ship: Option<ShipId>,
    pub defeated: bool,
    /// Owner of the next turn; `None` once the game ended on this move.
    pub next_turn: Option<PlayerId>,
}

/// Full state as seen by the requesting player: their own board in the
/// clear, the opponent's board masked down to resolved shots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub session_id: SessionId,
    pub you: PlayerId,
    pub opponent: PlayerId,
    pub turn: Option<PlayerId>,
    pub own_board: Vec<Vec<Cell>>,
    pub opponent_board: Vec<Vec<Cell>>,
    pub your_ships_remaining: usize,
    pub opponent_ships_remaining: usize,
}

/// Requester-side view of their own board.
pub fn own_view(board: &Board) -> Vec<Vec<Cell>> {
    (0..BOARD_SIZE)
        .map(|r| (0..BOARD_SIZE).map(|c| board.cell(r, c)).collect())
        .collect()
}

/// View of an opponent board: unhit ship cells read as empty.
pub fn masked_view(board: &Board) -> Vec<Vec<Cell>> {
    (0..BOARD_SIZE)
        .map(|r| {
            (0..BOARD_SIZE)
                .map(|c| match board.cell(r, c) {
                    Cell::Ship => Cell::Empty,
                    other => other,
                })
                .collect()
        })
        .collect()
}

/// Everything that crosses the channel, in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Client registration; version-checked before anything else.
    Hello {
        version: u8,
        player_id: PlayerId,
        nickname: String,
    },
    /// Registration acknowledged.
    Welcome { version: u8 },
    /// A invites B; forwarded to B verbatim.
    Invite {
        inviter: PlayerId,
        opponent: PlayerId,
        nickname: String,
        avatar_url: Option<String>,
    },
    /// B accepts A's invitation; forwarded to A, arms the ready window.
    Accept { inviter: PlayerId, opponent: PlayerId },
    /// B declines; the pending session ends as rejected.
    Reject { inviter: PlayerId, opponent: PlayerId },
    /// One side's complete frozen fleet.
    SubmitFleet {
        player_id: PlayerId,
        opponent_id: PlayerId,
        layout: FleetLayout,
    },
    /// Both fleets recorded; play begins, inviter moves first.
    GameStart {
        session_id: SessionId,
        inviter: PlayerId,
        opponent: PlayerId,
        turn: PlayerId,
    },
    /// Ask the relay for a full snapshot.
    RequestState {
        session_id: SessionId,
        player_id: PlayerId,
    },
    State(StateSnapshot),
    /// One shot from the turn owner.
    Move {
        session_id: SessionId,
        player_id: PlayerId,
        row: u8,
        col: u8,
    },
    MoveResult(MoveReport),
    OfferDraw {
        session_id: SessionId,
        player_id: PlayerId,
    },
    AcceptDraw {
        session_id: SessionId,
        player_id: PlayerId,
    },
    DeclineDraw {
        session_id: SessionId,
        player_id: PlayerId,
    },
    Surrender {
        session_id: SessionId,
        player_id: PlayerId,
    },
    /// Terminal outcome, sent to both sides.
    GameEnd {
        session_id: SessionId,
        draw: bool,
        winner_id: Option<PlayerId>,
        reason: EndReason,
    },
    /// The single structured rejection channel: every refused request
    /// comes back through here.
    Error { kind: ErrorKind, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::auto_place;
    use crate::placement::Strategy;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn layout_survives_the_wire_and_rebuilds_the_same_board() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut board = Board::new();
        auto_place(&mut board, Strategy::Uniform, &mut rng).unwrap();

        let layout = FleetLayout::from_board(&board);
        let bytes = bincode::serialize(&layout).unwrap();
        let back: FleetLayout = bincode::deserialize(&bytes).unwrap();
        assert_eq!(layout, back);

        let rebuilt = back.to_board().unwrap();
        assert_eq!(rebuilt.ship_map(), board.ship_map());
    }

    #[test]
    fn masked_view_never_exposes_ship_cells() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut board = Board::new();
        auto_place(&mut board, Strategy::HalfField, &mut rng).unwrap();
        let view = masked_view(&board);
        for row in &view {
            for cell in row {
                assert_ne!(*cell, Cell::Ship);
            }
        }
    }
}
