//! Typed errors for every engine boundary.
//!
//! Invalid manual placement and invalid shots are expected, recoverable
//! conditions: callers branch on the cause and re-prompt. Session errors
//! are reported back to the offending sender as a structured notification,
//! never answered with a crash or a silent drop.

use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoardError;
use crate::protocol::PlayerId;

/// Why a placement request was refused. No board state changes on error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("ship would leave the board at ({row}, {col})")]
    OutOfBounds { row: usize, col: usize },
    #[error("ship would overlap another ship at ({row}, {col})")]
    Overlap { row: usize, col: usize },
    #[error("ship would touch another ship at ({row}, {col})")]
    Touching { row: usize, col: usize },
    #[error("no unplaced ship of size {size} left in the fleet")]
    QuotaExhausted { size: usize },
    #[error("no legal anchor found for a size-{size} ship after {attempts} attempts")]
    NoRoom { size: usize, attempts: usize },
    #[error("invalid ship size {size}, expected 1..=4")]
    InvalidSize { size: usize },
    #[error(transparent)]
    BitBoard(#[from] BitBoardError),
}

/// Why a shot was refused. The defender's board is untouched on error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShotError {
    #[error("target ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("cell ({row}, {col}) was already resolved")]
    AlreadyResolved { row: usize, col: usize },
    #[error(transparent)]
    BitBoard(#[from] BitBoardError),
}

/// Why the session state machine refused a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("player {player} is not a participant of this session")]
    NotAParticipant { player: PlayerId },
    #[error("message not valid in phase {phase}")]
    WrongPhase { phase: &'static str },
    #[error("it is not player {player}'s turn")]
    NotYourTurn { player: PlayerId },
    #[error("player {player} already submitted a fleet")]
    FleetAlreadySubmitted { player: PlayerId },
    #[error("submitted fleet is not legal: {reason}")]
    InvalidFleet { reason: String },
    #[error("no draw offer is pending")]
    NoDrawPending,
    #[error("shot rejected: {0}")]
    Shot(#[from] ShotError),
}

/// Coarse cause carried by the wire-level `Error` notification so clients
/// can render every rejection through one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownSession,
    NotRegistered,
    VersionMismatch,
    BadRequest,
    WrongPhase,
    WrongTurn,
    InvalidFleet,
    InvalidShot,
}

impl SessionError {
    /// Map a rejection onto the wire-level kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NotAParticipant { .. } => ErrorKind::BadRequest,
            SessionError::WrongPhase { .. } => ErrorKind::WrongPhase,
            SessionError::NotYourTurn { .. } => ErrorKind::WrongTurn,
            SessionError::FleetAlreadySubmitted { .. } => ErrorKind::WrongPhase,
            SessionError::InvalidFleet { .. } => ErrorKind::InvalidFleet,
            SessionError::NoDrawPending => ErrorKind::BadRequest,
            SessionError::Shot(_) => ErrorKind::InvalidShot,
        }
    }
}
