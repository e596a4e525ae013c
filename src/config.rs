//! Fixed game parameters: board geometry, fleet composition, retry budgets
//! and the pre-game readiness window.

use crate::ship::ShipClass;
use std::time::Duration;

pub const BOARD_SIZE: usize = 10;
pub const NUM_SHIPS: usize = 10;
pub const TOTAL_SHIP_CELLS: usize = 20;

/// Fleet composition, largest first: the placement strategies rely on this
/// ordering so the battleship goes down before the boats crowd the grid.
pub const FLEET: [ShipClass; NUM_SHIPS] = [
    ShipClass::Battleship,
    ShipClass::Cruiser,
    ShipClass::Cruiser,
    ShipClass::Destroyer,
    ShipClass::Destroyer,
    ShipClass::Destroyer,
    ShipClass::Boat,
    ShipClass::Boat,
    ShipClass::Boat,
    ShipClass::Boat,
];

/// Uniform random placement gives up after this many anchor samples.
pub const RANDOM_PLACE_ATTEMPTS: usize = 100;

/// Biased strategies try this many anchors per ship before degrading to
/// uniform random placement.
pub const STRATEGY_ATTEMPTS: usize = 1000;

/// Rejection-sampling budget inside the spread strategy.
pub const SPREAD_INNER_ATTEMPTS: usize = 100;

/// How long both sides have to submit their fleets after an invitation is
/// accepted. There is no per-turn timeout once the game is active.
pub const READY_WINDOW: Duration = Duration::from_secs(60);
