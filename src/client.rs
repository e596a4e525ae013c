//! A scripted client that plays a complete match against the relay.
//!
//! Used by the sim binary, local mode and the end-to-end tests. It keeps
//! no targeting heuristics on purpose: placement uses the shared
//! strategies, shots are uniform over unresolved cells.

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bitboard::BitBoard;
use crate::board::Board;
use crate::config::BOARD_SIZE;
use crate::placement::{auto_place, Strategy};
use crate::protocol::{
    EndReason, FleetLayout, Message, PlayerId, SessionId, PROTOCOL_VERSION,
};
use crate::transport::Transport;

type Mask = BitBoard<u128, BOARD_SIZE>;

/// How a finished match looked from this client's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub session_id: SessionId,
    pub draw: bool,
    pub winner_id: Option<PlayerId>,
    pub reason: EndReason,
    pub shots: usize,
}

impl GameReport {
    pub fn won_by(&self, player: PlayerId) -> bool {
        self.winner_id == Some(player)
    }
}

pub struct AutoPlayer {
    id: PlayerId,
    nickname: String,
    strategy: Strategy,
    rng: SmallRng,
}

impl AutoPlayer {
    pub fn new(id: PlayerId, nickname: impl Into<String>, strategy: Strategy, seed: u64) -> Self {
        AutoPlayer {
            id,
            nickname: nickname.into(),
            strategy,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Register, start or await a match, play it out, return the result.
    /// With `invite` set this side invites and therefore moves first.
    pub async fn run(
        mut self,
        mut transport: Box<dyn Transport>,
        invite: Option<PlayerId>,
    ) -> anyhow::Result<GameReport> {
        transport
            .send(Message::Hello {
                version: PROTOCOL_VERSION,
                player_id: self.id,
                nickname: self.nickname.clone(),
            })
            .await?;
        match transport.recv().await? {
            Message::Welcome { .. } => {}
            other => return Err(anyhow::anyhow!("expected Welcome, got {:?}", other)),
        }

        let opponent = match invite {
            Some(opponent) => {
                // The opponent may still be registering; retry briefly
                // before giving up on the invitation.
                let mut attempts = 0;
                loop {
                    transport
                        .send(Message::Invite {
                            inviter: self.id,
                            opponent,
                            nickname: self.nickname.clone(),
                            avatar_url: None,
                        })
                        .await?;
                    match transport.recv().await? {
                        Message::Accept { .. } => break opponent,
                        Message::Reject { .. } => {
                            return Err(anyhow::anyhow!("invitation declined"))
                        }
                        Message::Error {
                            kind: crate::error::ErrorKind::BadRequest,
                            ..
                        } if attempts < 100 => {
                            attempts += 1;
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                        other => {
                            return Err(anyhow::anyhow!("expected Accept, got {:?}", other))
                        }
                    }
                }
            }
            None => match transport.recv().await? {
                Message::Invite { inviter, .. } => {
                    transport
                        .send(Message::Accept {
                            inviter,
                            opponent: self.id,
                        })
                        .await?;
                    inviter
                }
                other => return Err(anyhow::anyhow!("expected Invite, got {:?}", other)),
            },
        };

        let mut board = Board::new();
        auto_place(&mut board, self.strategy, &mut self.rng)
            .map_err(|e| anyhow::anyhow!("auto placement failed: {}", e))?;
        transport
            .send(Message::SubmitFleet {
                player_id: self.id,
                opponent_id: opponent,
                layout: FleetLayout::from_board(&board),
            })
            .await?;

        let (session_id, mut turn) = loop {
            match transport.recv().await? {
                Message::GameStart {
                    session_id, turn, ..
                } => break (session_id, Some(turn)),
                Message::Error { kind, detail } => {
                    return Err(anyhow::anyhow!("rejected: {:?}: {}", kind, detail))
                }
                other => debug!("player {}: ignoring {:?} before start", self.id, other),
            }
        };
        info!("player {}: session {} started", self.id, session_id);

        // Exercise the snapshot path once; the reply is drained below.
        transport
            .send(Message::RequestState {
                session_id,
                player_id: self.id,
            })
            .await?;

        let mut tried = Mask::new();
        let mut shots = 0usize;
        let mut pending_move = false;
        loop {
            if turn == Some(self.id) && !pending_move {
                let (row, col) = self.pick_target(&tried);
                tried.set(row, col)?;
                pending_move = true;
                transport
                    .send(Message::Move {
                        session_id,
                        player_id: self.id,
                        row: row as u8,
                        col: col as u8,
                    })
                    .await?;
            }
            match transport.recv().await? {
                Message::MoveResult(report) => {
                    if report.by == self.id {
                        pending_move = false;
                        shots += 1;
                    }
                    turn = report.next_turn;
                }
                Message::OfferDraw { session_id, .. } => {
                    transport
                        .send(Message::DeclineDraw {
                            session_id,
                            player_id: self.id,
                        })
                        .await?;
                }
                Message::GameEnd {
                    session_id,
                    draw,
                    winner_id,
                    reason,
                } => {
                    return Ok(GameReport {
                        session_id,
                        draw,
                        winner_id,
                        reason,
                        shots,
                    })
                }
                Message::State(_) => {}
                Message::Error { kind, detail } => {
                    return Err(anyhow::anyhow!("rejected: {:?}: {}", kind, detail))
                }
                other => debug!("player {}: ignoring {:?}", self.id, other),
            }
        }
    }

    /// Uniform choice among cells this side has not targeted yet.
    fn pick_target(&mut self, tried: &Mask) -> (usize, usize) {
        let untried: Vec<(usize, usize)> = (0..BOARD_SIZE)
            .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| !tried.get(r, c).unwrap_or(false))
            .collect();
        untried[self.rng.random_range(0..untried.len())]
    }
}
