//! The neutral relay between two clients.
//!
//! One dispatcher task owns every session and applies messages strictly
//! one at a time, so the core stays single-writer exactly as the session
//! machine assumes. Connection tasks only shuttle frames: a reader
//! forwards inbound messages into the dispatcher's queue, a writer drains
//! per-client outbound queues.
//!
//! The dispatcher drains its inbound queue in batches and applies events
//! in arrival order, so each sender's own messages keep their order. The
//! one exception is the surrender race: a draw acceptance drained in the
//! same batch as the other side's surrender for that session is refused,
//! so the surrender deterministically wins. Readiness deadlines are
//! served from the same loop; there is no other timer.

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::sleep_until;

use crate::error::ErrorKind;
use crate::protocol::{Message, PlayerId, SessionId, PROTOCOL_VERSION};
use crate::session::MatchSession;
use crate::transport::{TcpTransport, Transport};

enum Event {
    Join {
        player: PlayerId,
        nickname: String,
        outbound: mpsc::UnboundedSender<Message>,
    },
    Inbound {
        player: PlayerId,
        msg: Message,
    },
    Disconnected {
        player: PlayerId,
        // The outbound channel of the connection that died, so a
        // disconnect of a replaced connection can be told apart from a
        // disconnect of the current one.
        outbound: mpsc::UnboundedSender<Message>,
    },
}

/// Handle for attaching connections to a running dispatcher.
#[derive(Clone)]
pub struct Relay {
    events_tx: mpsc::UnboundedSender<Event>,
}

impl Relay {
    /// Spawn the dispatcher task. The task exits once every handle and
    /// connection is gone.
    pub fn spawn() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(Dispatcher::new().run(events_rx));
        Relay { events_tx }
    }

    /// Adopt one client connection: handshake, then shuttle frames until
    /// either side goes away.
    pub fn attach(&self, transport: Box<dyn Transport>) {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(transport, events_tx).await {
                debug!("connection closed: {}", e);
            }
        });
    }

    /// Accept TCP clients forever, attaching each.
    pub async fn serve(&self, bind: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(bind).await?;
        info!("relay listening on {}", bind);
        loop {
            let (stream, addr) = listener.accept().await?;
            debug!("client connected from {}", addr);
            self.attach(Box::new(TcpTransport::new(stream)));
        }
    }
}

async fn serve_connection(
    transport: Box<dyn Transport>,
    events_tx: mpsc::UnboundedSender<Event>,
) -> anyhow::Result<()> {
    let (mut tx_half, mut rx_half) = transport.into_split();

    // Registration comes first; nothing else is accepted on a fresh link.
    let (player, nickname) = match rx_half.recv().await? {
        Message::Hello {
            version,
            player_id,
            nickname,
        } => {
            if version != PROTOCOL_VERSION {
                tx_half
                    .send(Message::Error {
                        kind: ErrorKind::VersionMismatch,
                        detail: format!(
                            "protocol version {} not supported, expected {}",
                            version, PROTOCOL_VERSION
                        ),
                    })
                    .await?;
                return Err(anyhow::anyhow!("version mismatch"));
            }
            (player_id, nickname)
        }
        other => {
            tx_half
                .send(Message::Error {
                    kind: ErrorKind::NotRegistered,
                    detail: format!("expected Hello, got {:?}", other),
                })
                .await?;
            return Err(anyhow::anyhow!("client skipped registration"));
        }
    };

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    events_tx
        .send(Event::Join {
            player,
            nickname,
            outbound: out_tx.clone(),
        })
        .map_err(|_| anyhow::anyhow!("relay dispatcher is gone"))?;

    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if tx_half.send(msg).await.is_err() {
                break;
            }
        }
    });

    let result = loop {
        match rx_half.recv().await {
            Ok(msg) => {
                if events_tx.send(Event::Inbound { player, msg }).is_err() {
                    break Err(anyhow::anyhow!("relay dispatcher is gone"));
                }
            }
            Err(e) => break Err(e),
        }
    };
    let _ = events_tx.send(Event::Disconnected {
        player,
        outbound: out_tx,
    });
    writer.abort();
    result
}

struct Dispatcher {
    clients: HashMap<PlayerId, mpsc::UnboundedSender<Message>>,
    sessions: HashMap<SessionId, MatchSession>,
    // Pending sessions are addressed by player pair until GameStart
    // publishes the id; keys are (low, high).
    pair_index: HashMap<(PlayerId, PlayerId), SessionId>,
    next_session_id: SessionId,
}

fn pair_key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    (a.min(b), a.max(b))
}

impl Dispatcher {
    fn new() -> Self {
        Dispatcher {
            clients: HashMap::new(),
            sessions: HashMap::new(),
            pair_index: HashMap::new(),
            next_session_id: 1,
        }
    }

    async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<Event>) {
        loop {
            let next_deadline = self
                .sessions
                .values()
                .filter_map(|s| s.ready_deadline())
                .min();
            tokio::select! {
                event = events_rx.recv() => {
                    let Some(first) = event else { break };
                    let mut batch = vec![first];
                    while let Ok(event) = events_rx.try_recv() {
                        batch.push(event);
                    }
                    self.process_batch(batch);
                }
                _ = sleep_until(tokio::time::Instant::from_std(
                        next_deadline.unwrap_or_else(Instant::now),
                    )), if next_deadline.is_some() => {
                    self.fire_timeouts(Instant::now());
                }
            }
        }
    }

    /// Apply one drained batch of events in arrival order. A surrender in
    /// the batch refuses any draw acceptance for the same session sent by
    /// the other side, no matter which arrived first; nothing else is
    /// reordered or suppressed, so per-sender order holds.
    fn process_batch(&mut self, batch: Vec<Event>) {
        let mut surrendering: Vec<(SessionId, PlayerId)> = Vec::new();
        for event in &batch {
            if let Event::Inbound {
                player,
                msg:
                    Message::Surrender {
                        session_id,
                        player_id,
                    },
            } = event
            {
                if player == player_id {
                    surrendering.push((*session_id, *player));
                }
            }
        }
        for event in batch {
            if let Event::Inbound {
                player,
                msg:
                    Message::AcceptDraw {
                        session_id,
                        player_id,
                    },
            } = &event
            {
                if player == player_id
                    && surrendering
                        .iter()
                        .any(|&(sid, by)| sid == *session_id && by != *player)
                {
                    self.reject(
                        *player,
                        ErrorKind::BadRequest,
                        "draw acceptance lost to a concurrent surrender".into(),
                    );
                    continue;
                }
            }
            self.handle(event);
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Join {
                player,
                nickname,
                outbound,
            } => {
                if self.clients.contains_key(&player) {
                    warn!("player {} reconnected, replacing registration", player);
                }
                info!("player {} ({}) registered", player, nickname);
                let _ = outbound.send(Message::Welcome {
                    version: PROTOCOL_VERSION,
                });
                self.clients.insert(player, outbound);
            }
            Event::Disconnected { player, outbound } => {
                let current = self
                    .clients
                    .get(&player)
                    .map_or(false, |tx| tx.same_channel(&outbound));
                if !current {
                    debug!("player {}: disconnect of a replaced connection, ignoring", player);
                    return;
                }
                info!("player {} disconnected", player);
                self.clients.remove(&player);
                self.forfeit_sessions_of(player);
            }
            Event::Inbound { player, msg } => self.dispatch(player, msg),
        }
    }

    fn send_to(&self, player: PlayerId, msg: Message) {
        if let Some(tx) = self.clients.get(&player) {
            let _ = tx.send(msg);
        }
    }

    fn reject(&self, player: PlayerId, kind: ErrorKind, detail: String) {
        self.send_to(player, Message::Error { kind, detail });
    }

    /// Retire a terminal session, telling both sides how it ended.
    fn finish(&mut self, id: SessionId) {
        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        let [a, b] = session.participants();
        self.pair_index.remove(&pair_key(a, b));
        if let Some((draw, winner_id, reason)) = session.end_notice() {
            let notice = Message::GameEnd {
                session_id: id,
                draw,
                winner_id,
                reason,
            };
            self.send_to(a, notice.clone());
            self.send_to(b, notice);
        }
    }

    /// Immediate forfeiture on disconnect: the leaver loses every
    /// non-terminal session they were part of.
    fn forfeit_sessions_of(&mut self, player: PlayerId) {
        let affected: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| s.participants().contains(&player) && !s.is_terminal())
            .map(|s| s.id())
            .collect();
        for id in affected {
            if let Some(session) = self.sessions.get_mut(&id) {
                let _ = session.abandon(player);
            }
            self.finish(id);
        }
    }

    fn fire_timeouts(&mut self, now: Instant) {
        let lapsed: Vec<SessionId> = self
            .sessions
            .values_mut()
            .filter_map(|s| s.check_ready_timeout(now).then(|| s.id()))
            .collect();
        for id in lapsed {
            warn!("session {} timed out awaiting fleets", id);
            self.finish(id);
        }
    }

    fn session_by_pair(&mut self, a: PlayerId, b: PlayerId) -> Option<&mut MatchSession> {
        let id = *self.pair_index.get(&pair_key(a, b))?;
        self.sessions.get_mut(&id)
    }

    fn dispatch(&mut self, sender: PlayerId, msg: Message) {
        match msg {
            Message::Invite {
                inviter,
                opponent,
                nickname,
                avatar_url,
            } => {
                if inviter != sender {
                    return self.reject(
                        sender,
                        ErrorKind::BadRequest,
                        "inviter id does not match the sending client".into(),
                    );
                }
                if !self.clients.contains_key(&opponent) {
                    return self.reject(
                        sender,
                        ErrorKind::BadRequest,
                        format!("player {} is not connected", opponent),
                    );
                }
                if self.pair_index.contains_key(&pair_key(inviter, opponent)) {
                    return self.reject(
                        sender,
                        ErrorKind::BadRequest,
                        "a session between these players already exists".into(),
                    );
                }
                let id = self.next_session_id;
                self.next_session_id += 1;
                self.sessions
                    .insert(id, MatchSession::new(id, inviter, opponent));
                self.pair_index.insert(pair_key(inviter, opponent), id);
                info!("session {}: {} invites {}", id, inviter, opponent);
                self.send_to(
                    opponent,
                    Message::Invite {
                        inviter,
                        opponent,
                        nickname,
                        avatar_url,
                    },
                );
            }
            Message::Accept { inviter, opponent } => {
                let now = Instant::now();
                let Some(session) = self.session_by_pair(inviter, opponent) else {
                    return self.unknown_pair(sender);
                };
                match session.accept(sender, now) {
                    Ok(()) => self.send_to(inviter, Message::Accept { inviter, opponent }),
                    Err(e) => self.reject(sender, e.kind(), e.to_string()),
                }
            }
            Message::Reject { inviter, opponent } => {
                let Some(session) = self.session_by_pair(inviter, opponent) else {
                    return self.unknown_pair(sender);
                };
                let id = session.id();
                match session.reject(sender) {
                    Ok(()) => {
                        self.send_to(inviter, Message::Reject { inviter, opponent });
                        self.finish(id);
                    }
                    Err(e) => self.reject(sender, e.kind(), e.to_string()),
                }
            }
            Message::SubmitFleet {
                player_id,
                opponent_id,
                layout,
            } => {
                if player_id != sender {
                    return self.reject(
                        sender,
                        ErrorKind::BadRequest,
                        "player id does not match the sending client".into(),
                    );
                }
                let Some(session) = self.session_by_pair(player_id, opponent_id) else {
                    return self.unknown_pair(sender);
                };
                match session.submit_fleet(sender, &layout) {
                    Ok(true) => {
                        let (id, inviter, opponent) =
                            (session.id(), session.inviter(), session.opponent());
                        let turn = session.turn().expect("session just became active");
                        info!("session {} active, {} to move", id, turn);
                        let start = Message::GameStart {
                            session_id: id,
                            inviter,
                            opponent,
                            turn,
                        };
                        self.send_to(inviter, start.clone());
                        self.send_to(opponent, start);
                    }
                    Ok(false) => {}
                    Err(e) => self.reject(sender, e.kind(), e.to_string()),
                }
            }
            Message::RequestState {
                session_id,
                player_id,
            } => {
                if player_id != sender {
                    return self.reject(
                        sender,
                        ErrorKind::BadRequest,
                        "player id does not match the sending client".into(),
                    );
                }
                let Some(session) = self.sessions.get(&session_id) else {
                    return self.unknown_session(sender, session_id);
                };
                match session.snapshot(sender) {
                    Ok(snapshot) => self.send_to(sender, Message::State(snapshot)),
                    Err(e) => self.reject(sender, e.kind(), e.to_string()),
                }
            }
            Message::Move {
                session_id,
                player_id,
                row,
                col,
            } => {
                if player_id != sender {
                    return self.reject(
                        sender,
                        ErrorKind::BadRequest,
                        "player id does not match the sending client".into(),
                    );
                }
                let Some(session) = self.sessions.get_mut(&session_id) else {
                    return self.unknown_session(sender, session_id);
                };
                match session.fire(sender, row as usize, col as usize) {
                    Ok(report) => {
                        let done = session.is_terminal();
                        let [a, b] = session.participants();
                        self.send_to(a, Message::MoveResult(report.clone()));
                        self.send_to(b, Message::MoveResult(report));
                        if done {
                            self.finish(session_id);
                        }
                    }
                    Err(e) => self.reject(sender, e.kind(), e.to_string()),
                }
            }
            Message::OfferDraw {
                session_id,
                player_id,
            } => self.draw_message(sender, session_id, player_id, DrawAction::Offer),
            Message::AcceptDraw {
                session_id,
                player_id,
            } => self.draw_message(sender, session_id, player_id, DrawAction::Accept),
            Message::DeclineDraw {
                session_id,
                player_id,
            } => self.draw_message(sender, session_id, player_id, DrawAction::Decline),
            Message::Surrender {
                session_id,
                player_id,
            } => {
                if player_id != sender {
                    return self.reject(
                        sender,
                        ErrorKind::BadRequest,
                        "player id does not match the sending client".into(),
                    );
                }
                let Some(session) = self.sessions.get_mut(&session_id) else {
                    return self.unknown_session(sender, session_id);
                };
                match session.surrender(sender) {
                    Ok(()) => self.finish(session_id),
                    Err(e) => self.reject(sender, e.kind(), e.to_string()),
                }
            }
            other => {
                self.reject(
                    sender,
                    ErrorKind::BadRequest,
                    format!("unexpected message from client: {:?}", other),
                );
            }
        }
    }

    fn draw_message(
        &mut self,
        sender: PlayerId,
        session_id: SessionId,
        player_id: PlayerId,
        action: DrawAction,
    ) {
        if player_id != sender {
            return self.reject(
                sender,
                ErrorKind::BadRequest,
                "player id does not match the sending client".into(),
            );
        }
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return self.unknown_session(sender, session_id);
        };
        let [a, b] = session.participants();
        let other = if sender == a { b } else { a };
        let result = match action {
            DrawAction::Offer => session.offer_draw(sender),
            DrawAction::Accept => session.accept_draw(sender),
            DrawAction::Decline => session.decline_draw(sender),
        };
        match (result, action) {
            (Ok(()), DrawAction::Offer) => self.send_to(
                other,
                Message::OfferDraw {
                    session_id,
                    player_id: sender,
                },
            ),
            (Ok(()), DrawAction::Accept) => self.finish(session_id),
            (Ok(()), DrawAction::Decline) => self.send_to(
                other,
                Message::DeclineDraw {
                    session_id,
                    player_id: sender,
                },
            ),
            (Err(e), _) => self.reject(sender, e.kind(), e.to_string()),
        }
    }

    fn unknown_session(&self, sender: PlayerId, session_id: SessionId) {
        self.reject(
            sender,
            ErrorKind::UnknownSession,
            format!("no session with id {}", session_id),
        );
    }

    fn unknown_pair(&self, sender: PlayerId) {
        self.reject(
            sender,
            ErrorKind::UnknownSession,
            "no pending session between these players".into(),
        );
    }
}

#[derive(Clone, Copy)]
enum DrawAction {
    Offer,
    Accept,
    Decline,
}
