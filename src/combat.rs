//! Shot resolution against a defender's board.
//!
//! Sunk detection deliberately re-walks the contiguous ship cells on
//! every hit instead of keeping per-ship hit counters: the flood-fill is
//! the authoritative definition of "sunk" and cannot drift out of sync
//! with the masks.

use crate::board::{in_bounds, Board};
use crate::config::BOARD_SIZE;
use crate::error::ShotError;
use crate::ship::ShipId;

/// Outcome of one resolved shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotOutcome {
    pub hit: bool,
    /// Set when the shot sank a ship.
    pub sunk_ship: Option<ShipId>,
    /// Set on the shot that sank the defender's last ship, never before.
    pub defeated: bool,
}

/// Resolve a single shot. Rejects out-of-bounds targets and cells that
/// were already resolved; a rejected shot mutates nothing.
pub fn resolve_shot(board: &mut Board, row: usize, col: usize) -> Result<ShotOutcome, ShotError> {
    if !in_bounds(row, col) {
        return Err(ShotError::OutOfBounds { row, col });
    }
    if board.hits().get(row, col)? || board.misses().get(row, col)? {
        return Err(ShotError::AlreadyResolved { row, col });
    }

    if !board.is_occupied(row, col) {
        board.mark_miss(row, col);
        return Ok(ShotOutcome {
            hit: false,
            sunk_ship: None,
            defeated: false,
        });
    }

    board.mark_hit(row, col);
    if !ship_fully_hit(board, row, col) {
        return Ok(ShotOutcome {
            hit: true,
            sunk_ship: None,
            defeated: false,
        });
    }

    let sunk_ship = board.ship_at(row, col).map(|s| s.id);
    if let Some(id) = sunk_ship {
        board.mark_sunk(id);
    }
    Ok(ShotOutcome {
        hit: true,
        sunk_ship,
        defeated: board.ships_remaining() == 0,
    })
}

/// Flood-fill from (row, col) over orthogonally contiguous ship cells;
/// the ship is sunk iff every reached cell carries a hit.
fn ship_fully_hit(board: &Board, row: usize, col: usize) -> bool {
    let mut visited = [[false; BOARD_SIZE]; BOARD_SIZE];
    let mut stack = vec![(row, col)];
    visited[row][col] = true;
    while let Some((r, c)) = stack.pop() {
        if !board.hits().get(r, c).unwrap_or(false) {
            return false;
        }
        for (nr, nc) in orthogonal(r, c) {
            if !visited[nr][nc] && board.is_occupied(nr, nc) {
                visited[nr][nc] = true;
                stack.push((nr, nc));
            }
        }
    }
    true
}

fn orthogonal(row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
    [(0i32, 1i32), (0, -1), (1, 0), (-1, 0)]
        .into_iter()
        .filter_map(move |(dr, dc)| {
            let nr = row as i32 + dr;
            let nc = col as i32 + dc;
            (nr >= 0 && nc >= 0 && in_bounds(nr as usize, nc as usize))
                .then(|| (nr as usize, nc as usize))
        })
}
