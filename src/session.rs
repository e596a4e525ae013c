//! Match session lifecycle: invitation, readiness exchange, turn-based
//! play, termination.
//!
//! The machine is synchronous and deterministic. Anything time-dependent
//! takes the current instant as an argument and anything transport-shaped
//! lives in [`crate::relay`]; this module can therefore be driven
//! directly from tests with fabricated clocks and message orders.

use std::time::Instant;

use crate::board::Board;
use crate::combat::resolve_shot;
use crate::config::READY_WINDOW;
use crate::error::SessionError;
use crate::protocol::{
    masked_view, own_view, EndReason, FleetLayout, MoveReport, PlayerId, SessionId, StateSnapshot,
};

/// Terminal outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Invitation declined before any game existed.
    Rejected,
    /// All of the loser's ships were sunk.
    Won { winner: PlayerId },
    /// Both sides agreed to a draw.
    Draw,
    Surrendered { loser: PlayerId },
    /// The ready window lapsed; the side that did submit (if any) wins.
    TimedOut { winner: Option<PlayerId> },
    /// A side's transport vanished mid-session.
    Abandoned { leaver: PlayerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Invited,
    AwaitingReady { deadline: Instant },
    Active { turn: PlayerId },
    Terminal(Outcome),
}

pub struct MatchSession {
    id: SessionId,
    inviter: PlayerId,
    opponent: PlayerId,
    phase: Phase,
    // Boards indexed by side: 0 = inviter, 1 = opponent. None until that
    // side's fleet has been submitted and validated.
    boards: [Option<Board>; 2],
    draw_offer: Option<PlayerId>,
}

impl MatchSession {
    /// A fresh session in the invited phase.
    pub fn new(id: SessionId, inviter: PlayerId, opponent: PlayerId) -> Self {
        MatchSession {
            id,
            inviter,
            opponent,
            phase: Phase::Invited,
            boards: [None, None],
            draw_offer: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn inviter(&self) -> PlayerId {
        self.inviter
    }

    pub fn opponent(&self) -> PlayerId {
        self.opponent
    }

    pub fn participants(&self) -> [PlayerId; 2] {
        [self.inviter, self.opponent]
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Terminal(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Current turn owner, if the game is active.
    pub fn turn(&self) -> Option<PlayerId> {
        match self.phase {
            Phase::Active { turn } => Some(turn),
            _ => None,
        }
    }

    fn side_of(&self, player: PlayerId) -> Result<usize, SessionError> {
        if player == self.inviter {
            Ok(0)
        } else if player == self.opponent {
            Ok(1)
        } else {
            Err(SessionError::NotAParticipant { player })
        }
    }

    fn phase_name(&self) -> &'static str {
        match self.phase {
            Phase::Invited => "invited",
            Phase::AwaitingReady { .. } => "awaiting-ready",
            Phase::Active { .. } => "active",
            Phase::Terminal(_) => "terminal",
        }
    }

    /// The invited side accepts; the ready window starts counting.
    pub fn accept(&mut self, player: PlayerId, now: Instant) -> Result<(), SessionError> {
        self.side_of(player)?;
        if player != self.opponent || !matches!(self.phase, Phase::Invited) {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        self.phase = Phase::AwaitingReady {
            deadline: now + READY_WINDOW,
        };
        Ok(())
    }

    /// The invited side declines.
    pub fn reject(&mut self, player: PlayerId) -> Result<(), SessionError> {
        self.side_of(player)?;
        if player != self.opponent || !matches!(self.phase, Phase::Invited) {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        self.phase = Phase::Terminal(Outcome::Rejected);
        Ok(())
    }

    /// Record one side's frozen fleet. Returns `true` on the submission
    /// that completed the pair and flipped the session to active; the two
    /// submissions may arrive in either order and active fires exactly
    /// once.
    pub fn submit_fleet(
        &mut self,
        player: PlayerId,
        layout: &FleetLayout,
    ) -> Result<bool, SessionError> {
        let side = self.side_of(player)?;
        if !matches!(self.phase, Phase::AwaitingReady { .. }) {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        if self.boards[side].is_some() {
            return Err(SessionError::FleetAlreadySubmitted { player });
        }
        let board = layout
            .to_board()
            .map_err(|reason| SessionError::InvalidFleet { reason })?;
        if !board.is_fleet_complete() {
            return Err(SessionError::InvalidFleet {
                reason: "fleet is incomplete".into(),
            });
        }
        self.boards[side] = Some(board);
        if self.boards.iter().all(|b| b.is_some()) {
            // Server-assigned first move: the inviter.
            self.phase = Phase::Active { turn: self.inviter };
            return Ok(true);
        }
        Ok(false)
    }

    /// Resolve one shot from the turn owner against the other board. The
    /// turn passes after every resolved shot, hit or miss; a shot from
    /// the non-owner is rejected without touching any board.
    pub fn fire(
        &mut self,
        player: PlayerId,
        row: usize,
        col: usize,
    ) -> Result<MoveReport, SessionError> {
        let side = self.side_of(player)?;
        let turn = match self.phase {
            Phase::Active { turn } => turn,
            _ => {
                return Err(SessionError::WrongPhase {
                    phase: self.phase_name(),
                })
            }
        };
        if turn != player {
            return Err(SessionError::NotYourTurn { player });
        }
        let defender = 1 - side;
        let board = self.boards[defender]
            .as_mut()
            .expect("active session has both boards");
        let outcome = resolve_shot(board, row, col)?;

        let other = self.participants()[defender];
        let next_turn = if outcome.defeated {
            self.phase = Phase::Terminal(Outcome::Won { winner: player });
            self.draw_offer = None;
            None
        } else {
            self.phase = Phase::Active { turn: other };
            Some(other)
        };
        Ok(MoveReport {
            session_id: self.id,
            by: player,
            row: row as u8,
            col: col as u8,
            hit: outcome.hit,
            sunk_ship: outcome.sunk_ship,
            defeated: outcome.defeated,
            next_turn,
        })
    }

    /// Offer a draw. Turn-taking is not paused by a pending offer.
    pub fn offer_draw(&mut self, player: PlayerId) -> Result<(), SessionError> {
        self.side_of(player)?;
        if !matches!(self.phase, Phase::Active { .. }) {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        self.draw_offer = Some(player);
        Ok(())
    }

    /// Accept the other side's pending draw offer.
    pub fn accept_draw(&mut self, player: PlayerId) -> Result<(), SessionError> {
        self.side_of(player)?;
        if !matches!(self.phase, Phase::Active { .. }) {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        match self.draw_offer {
            Some(by) if by != player => {
                self.phase = Phase::Terminal(Outcome::Draw);
                self.draw_offer = None;
                Ok(())
            }
            _ => Err(SessionError::NoDrawPending),
        }
    }

    /// Decline the other side's pending draw offer.
    pub fn decline_draw(&mut self, player: PlayerId) -> Result<(), SessionError> {
        self.side_of(player)?;
        if !matches!(self.phase, Phase::Active { .. }) {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        match self.draw_offer {
            Some(by) if by != player => {
                self.draw_offer = None;
                Ok(())
            }
            _ => Err(SessionError::NoDrawPending),
        }
    }

    /// Immediate unilateral surrender; no confirmation from the opponent.
    pub fn surrender(&mut self, player: PlayerId) -> Result<(), SessionError> {
        self.side_of(player)?;
        if !matches!(self.phase, Phase::Active { .. }) {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        self.phase = Phase::Terminal(Outcome::Surrendered { loser: player });
        self.draw_offer = None;
        Ok(())
    }

    /// Forfeit by the given side without a message, used when its
    /// transport vanishes.
    pub fn abandon(&mut self, leaver: PlayerId) -> Result<(), SessionError> {
        self.side_of(leaver)?;
        if self.is_terminal() {
            return Err(SessionError::WrongPhase {
                phase: self.phase_name(),
            });
        }
        self.phase = Phase::Terminal(Outcome::Abandoned { leaver });
        self.draw_offer = None;
        Ok(())
    }

    /// The deadline armed while awaiting fleets, if any.
    pub fn ready_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::AwaitingReady { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Fire the readiness timeout if its deadline has lapsed. Returns
    /// `true` when the session just became terminal. The only timeout in
    /// the design; turns inside the active phase are unbounded.
    pub fn check_ready_timeout(&mut self, now: Instant) -> bool {
        if let Phase::AwaitingReady { deadline } = self.phase {
            if now >= deadline {
                let winner = if self.boards[0].is_some() {
                    Some(self.inviter)
                } else if self.boards[1].is_some() {
                    Some(self.opponent)
                } else {
                    None
                };
                self.phase = Phase::Terminal(Outcome::TimedOut { winner });
                return true;
            }
        }
        false
    }

    /// Snapshot of the session from one participant's point of view.
    pub fn snapshot(&self, player: PlayerId) -> Result<StateSnapshot, SessionError> {
        let side = self.side_of(player)?;
        let other = 1 - side;
        let empty = Board::new();
        let own = self.boards[side].as_ref().unwrap_or(&empty);
        let theirs = self.boards[other].as_ref().unwrap_or(&empty);
        Ok(StateSnapshot {
            session_id: self.id,
            you: player,
            opponent: self.participants()[other],
            turn: self.turn(),
            own_board: own_view(own),
            opponent_board: masked_view(theirs),
            your_ships_remaining: own.ships_remaining(),
            opponent_ships_remaining: theirs.ships_remaining(),
        })
    }

    /// The wire-level end notification for a terminal session.
    pub fn end_notice(&self) -> Option<(bool, Option<PlayerId>, EndReason)> {
        let outcome = self.outcome()?;
        Some(match outcome {
            Outcome::Rejected => (false, None, EndReason::Rejected),
            Outcome::Won { winner } => (false, Some(winner), EndReason::AllSunk),
            Outcome::Draw => (true, None, EndReason::Draw),
            Outcome::Surrendered { loser } => {
                let winner = if loser == self.inviter {
                    self.opponent
                } else {
                    self.inviter
                };
                (false, Some(winner), EndReason::Surrender)
            }
            Outcome::TimedOut { winner } => (false, winner, EndReason::Timeout),
            Outcome::Abandoned { leaver } => {
                let winner = if leaver == self.inviter {
                    self.opponent
                } else {
                    self.inviter
                };
                (false, Some(winner), EndReason::Abandoned)
            }
        })
    }
}
