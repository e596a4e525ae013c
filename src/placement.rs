//! Fleet placement: manual placement validation and the biased
//! auto-placement strategies.
//!
//! All placement goes through [`can_place`], which resolves the anchor
//! into a span and enforces bounds, overlap and the no-touching rule for
//! every candidate cell. The auto strategies only differ in how they
//! sample anchors; each degrades to uniform random placement when its
//! bias cannot find a slot within budget, and logs the degrade.

use log::warn;
use rand::Rng;

use crate::board::{in_bounds, Board};
use crate::config::{
    BOARD_SIZE, FLEET, RANDOM_PLACE_ATTEMPTS, SPREAD_INNER_ATTEMPTS, STRATEGY_ATTEMPTS,
};
use crate::error::PlacementError;
use crate::ship::{Orientation, Placement, ShipClass, ShipId};

/// Resolve an anchor cell into the span origin. Spans grow toward higher
/// indices; only when that would cross the high edge does the span grow
/// toward lower indices instead.
fn resolve_origin(
    size: usize,
    anchor_row: usize,
    anchor_col: usize,
    orientation: Orientation,
) -> Result<(usize, usize), PlacementError> {
    if !in_bounds(anchor_row, anchor_col) {
        return Err(PlacementError::OutOfBounds {
            row: anchor_row,
            col: anchor_col,
        });
    }
    let along = match orientation {
        Orientation::Horizontal => anchor_col,
        Orientation::Vertical => anchor_row,
    };
    let origin_along = if along + size <= BOARD_SIZE {
        along
    } else {
        // Anchor sits within `size` of the high edge, grow backwards.
        along + 1 - size
    };
    Ok(match orientation {
        Orientation::Horizontal => (anchor_row, origin_along),
        Orientation::Vertical => (origin_along, anchor_col),
    })
}

/// Validate a placement request without mutating the board. Returns the
/// resolved placement so a subsequent commit does not re-derive it.
pub fn can_place(
    board: &Board,
    size: usize,
    anchor_row: usize,
    anchor_col: usize,
    orientation: Orientation,
) -> Result<Placement, PlacementError> {
    let class = ShipClass::from_size(size).ok_or(PlacementError::InvalidSize { size })?;
    let (row, col) = resolve_origin(size, anchor_row, anchor_col, orientation)?;
    let placement = Placement::new(class, orientation, row, col)?;
    for (r, c) in placement.cells(size) {
        if board.is_occupied(r, c) {
            return Err(PlacementError::Overlap { row: r, col: c });
        }
        if board.has_adjacent_occupied(r, c) {
            return Err(PlacementError::Touching { row: r, col: c });
        }
    }
    Ok(placement)
}

/// Place the first not-yet-placed ship of the requested size at the
/// anchor. Quota exhaustion is an explicit error, not a silent no-op.
pub fn place(
    board: &mut Board,
    size: usize,
    anchor_row: usize,
    anchor_col: usize,
    orientation: Orientation,
) -> Result<ShipId, PlacementError> {
    let placement = can_place(board, size, anchor_row, anchor_col, orientation)?;
    let index = board
        .ships()
        .iter()
        .position(|s| !s.is_placed() && s.size() == size)
        .ok_or(PlacementError::QuotaExhausted { size })?;
    board.commit_placement(index, placement);
    Ok(index as ShipId)
}

/// Uniform random placement of one ship. Gives up after
/// [`RANDOM_PLACE_ATTEMPTS`] samples, leaving the ship unplaced; callers
/// detect the gap through [`Board::is_fleet_complete`].
pub fn place_randomly<R: Rng + ?Sized>(
    board: &mut Board,
    rng: &mut R,
    size: usize,
) -> Result<ShipId, PlacementError> {
    for _ in 0..RANDOM_PLACE_ATTEMPTS {
        let row = rng.random_range(0..BOARD_SIZE);
        let col = rng.random_range(0..BOARD_SIZE);
        let orientation = Orientation::from_vertical(rng.random());
        match place(board, size, row, col, orientation) {
            Ok(id) => return Ok(id),
            Err(PlacementError::QuotaExhausted { size }) => {
                return Err(PlacementError::QuotaExhausted { size })
            }
            Err(_) => continue,
        }
    }
    Err(PlacementError::NoRoom {
        size,
        attempts: RANDOM_PLACE_ATTEMPTS,
    })
}

/// Anchor-sampling bias used by [`auto_place`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Uniform anchors everywhere.
    Uniform,
    /// Hug the border: ~90% of anchors within two cells of a side.
    Coastal,
    /// Cluster around one of the two main diagonals.
    Diagonal,
    /// Confine the whole fleet to one half of the board.
    HalfField,
    /// Avoid the border, the centre block and both diagonals.
    Spread,
}

/// Per-run sampler state. The diagonal identity and the half-field
/// axis/half are drawn once so the whole fleet shares them; the coastal
/// bias cycles through the four sides.
struct AnchorSampler {
    strategy: Strategy,
    main_diagonal: bool,
    split_rows: bool,
    first_half: bool,
    coastal_side: usize,
}

impl AnchorSampler {
    fn new<R: Rng + ?Sized>(strategy: Strategy, rng: &mut R) -> Self {
        AnchorSampler {
            strategy,
            main_diagonal: rng.random(),
            split_rows: rng.random(),
            first_half: rng.random(),
            coastal_side: 0,
        }
    }

    fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (usize, usize) {
        match self.strategy {
            Strategy::Uniform => uniform(rng),
            Strategy::Coastal => self.sample_coastal(rng),
            Strategy::Diagonal => self.sample_diagonal(rng),
            Strategy::HalfField => self.sample_half(rng),
            Strategy::Spread => sample_spread(rng),
        }
    }

    fn sample_coastal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (usize, usize) {
        if !rng.random_bool(0.9) {
            return uniform(rng);
        }
        let side = self.coastal_side;
        self.coastal_side = (self.coastal_side + 1) % 4;
        let depth = rng.random_range(0..=2usize);
        let across = rng.random_range(0..BOARD_SIZE);
        match side {
            0 => (depth, across),
            1 => (BOARD_SIZE - 1 - depth, across),
            2 => (across, depth),
            _ => (across, BOARD_SIZE - 1 - depth),
        }
    }

    fn sample_diagonal<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        let k = rng.random_range(0..BOARD_SIZE) as i32;
        let dr = rng.random_range(-1i32..=1);
        let dc = rng.random_range(-1i32..=1);
        let row = clamp(k + dr);
        let col = if self.main_diagonal {
            clamp(k + dc)
        } else {
            clamp(BOARD_SIZE as i32 - 1 - k + dc)
        };
        (row, col)
    }

    fn sample_half<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        let half = BOARD_SIZE / 2;
        let bounded = if self.first_half {
            rng.random_range(0..half)
        } else {
            rng.random_range(half..BOARD_SIZE)
        };
        let free = rng.random_range(0..BOARD_SIZE);
        if self.split_rows {
            (bounded, free)
        } else {
            (free, bounded)
        }
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R) -> (usize, usize) {
    (
        rng.random_range(0..BOARD_SIZE),
        rng.random_range(0..BOARD_SIZE),
    )
}

fn clamp(v: i32) -> usize {
    v.clamp(0, BOARD_SIZE as i32 - 1) as usize
}

/// Rejection-sample anchors off the border, off the central 4×4 block and
/// off both main diagonals. One in five attempts accepts any position so
/// crowded boards cannot stall the sampler; if the inner budget runs out
/// the last sample is used as-is.
fn sample_spread<R: Rng + ?Sized>(rng: &mut R) -> (usize, usize) {
    let mut last = uniform(rng);
    for _ in 0..SPREAD_INNER_ATTEMPTS {
        let (r, c) = uniform(rng);
        last = (r, c);
        if rng.random_bool(0.2) {
            return (r, c);
        }
        let on_border = r == 0 || c == 0 || r == BOARD_SIZE - 1 || c == BOARD_SIZE - 1;
        let in_centre = (3..=6).contains(&r) && (3..=6).contains(&c);
        let on_diagonal = r == c || r + c == BOARD_SIZE - 1;
        if !on_border && !in_centre && !on_diagonal {
            return (r, c);
        }
    }
    last
}

/// Clear the board and place the whole fleet, largest first, with the
/// given anchor bias. Biased attempts that exhaust their budget fall back
/// to uniform random placement; only when that also fails does the fleet
/// stay incomplete, reported as an explicit error.
pub fn auto_place<R: Rng + ?Sized>(
    board: &mut Board,
    strategy: Strategy,
    rng: &mut R,
) -> Result<(), PlacementError> {
    board.reset();
    let mut sampler = AnchorSampler::new(strategy, rng);
    for class in FLEET {
        let size = class.size();
        let mut placed = false;
        for _ in 0..STRATEGY_ATTEMPTS {
            let (row, col) = sampler.sample(rng);
            let orientation = Orientation::from_vertical(rng.random());
            if place(board, size, row, col, orientation).is_ok() {
                placed = true;
                break;
            }
        }
        if !placed {
            warn!(
                "{:?} strategy found no slot for a size-{} ship, degrading to uniform random",
                strategy, size
            );
            place_randomly(board, rng, size)?;
        }
    }
    debug_assert!(board.is_fleet_complete());
    Ok(())
}
