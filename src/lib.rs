//! Battleship engine, match protocol and relay.
//!
//! The engine half (board, placement, combat) is synchronous and
//! deterministic; the protocol half (session, relay, transports) drives
//! it over an async message channel.

mod bitboard;
mod board;
mod client;
mod combat;
mod config;
pub mod display;
mod error;
mod logging;
mod placement;
pub mod protocol;
mod relay;
mod session;
mod ship;
pub mod transport;

pub use bitboard::{BitBoard, BitBoardError};
pub use board::{in_bounds, Board, Cell};
pub use client::{AutoPlayer, GameReport};
pub use combat::{resolve_shot, ShotOutcome};
pub use config::*;
pub use error::{ErrorKind, PlacementError, SessionError, ShotError};
pub use logging::init_logging;
pub use placement::{auto_place, can_place, place, place_randomly, Strategy};
pub use protocol::{
    EndReason, FleetLayout, Message, MoveReport, PlayerId, SessionId, ShipPlacement,
    StateSnapshot, PROTOCOL_VERSION,
};
pub use relay::Relay;
pub use session::{MatchSession, Outcome};
pub use ship::{Orientation, Placement, Ship, ShipClass, ShipId};
