use std::time::{Duration, Instant};

use seabattle::protocol::{EndReason, FleetLayout, ShipPlacement};
use seabattle::{
    place, Board, Cell, MatchSession, Orientation, Outcome, SessionError, ShotError,
};

const INVITER: u64 = 1;
const OPPONENT: u64 = 2;
const STRANGER: u64 = 99;

/// A fixed legal fleet: every ship horizontal, rows 5..9 left empty.
fn fixed_layout() -> FleetLayout {
    let mut board = Board::new();
    for (size, row, col) in [
        (4, 0, 0),
        (3, 0, 5),
        (3, 2, 0),
        (2, 2, 4),
        (2, 2, 7),
        (2, 4, 0),
        (1, 4, 3),
        (1, 4, 5),
        (1, 4, 7),
        (1, 4, 9),
    ] {
        place(&mut board, size, row, col, Orientation::Horizontal).unwrap();
    }
    FleetLayout::from_board(&board)
}

/// Every occupied cell of [`fixed_layout`].
fn fixed_ship_cells() -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    cells.extend((0..4).map(|c| (0, c)));
    cells.extend((5..8).map(|c| (0, c)));
    cells.extend((0..3).map(|c| (2, c)));
    cells.extend([(2, 4), (2, 5), (2, 7), (2, 8)]);
    cells.extend([(4, 0), (4, 1), (4, 3), (4, 5), (4, 7), (4, 9)]);
    cells
}

fn active_session() -> MatchSession {
    let mut session = MatchSession::new(7, INVITER, OPPONENT);
    session.accept(OPPONENT, Instant::now()).unwrap();
    assert!(!session.submit_fleet(INVITER, &fixed_layout()).unwrap());
    assert!(session.submit_fleet(OPPONENT, &fixed_layout()).unwrap());
    session
}

#[test]
fn invitation_must_be_accepted_by_the_invited_side() {
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    assert!(matches!(
        session.accept(INVITER, Instant::now()),
        Err(SessionError::WrongPhase { .. })
    ));
    assert!(matches!(
        session.accept(STRANGER, Instant::now()),
        Err(SessionError::NotAParticipant { .. })
    ));
    session.accept(OPPONENT, Instant::now()).unwrap();
    assert!(session.ready_deadline().is_some());
}

#[test]
fn rejection_is_terminal() {
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    session.reject(OPPONENT).unwrap();
    assert_eq!(session.outcome(), Some(Outcome::Rejected));
    assert_eq!(session.end_notice(), Some((false, None, EndReason::Rejected)));
    assert!(matches!(
        session.accept(OPPONENT, Instant::now()),
        Err(SessionError::WrongPhase { .. })
    ));
}

#[test]
fn fleets_in_either_order_activate_exactly_once() {
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    session.accept(OPPONENT, Instant::now()).unwrap();
    assert!(!session.submit_fleet(OPPONENT, &fixed_layout()).unwrap());
    assert!(session.submit_fleet(INVITER, &fixed_layout()).unwrap());
    // Inviter moves first regardless of who completed the pair.
    assert_eq!(session.turn(), Some(INVITER));
    assert!(matches!(
        session.submit_fleet(INVITER, &fixed_layout()),
        Err(SessionError::WrongPhase { .. })
    ));
}

#[test]
fn resubmission_while_waiting_is_rejected() {
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    session.accept(OPPONENT, Instant::now()).unwrap();
    session.submit_fleet(INVITER, &fixed_layout()).unwrap();
    assert!(matches!(
        session.submit_fleet(INVITER, &fixed_layout()),
        Err(SessionError::FleetAlreadySubmitted { .. })
    ));
}

#[test]
fn fleet_before_acceptance_is_rejected() {
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    assert!(matches!(
        session.submit_fleet(INVITER, &fixed_layout()),
        Err(SessionError::WrongPhase { .. })
    ));
}

#[test]
fn tampered_fleet_is_rejected() {
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    session.accept(OPPONENT, Instant::now()).unwrap();

    let mut short = fixed_layout();
    short.ships.pop();
    assert!(matches!(
        session.submit_fleet(INVITER, &short),
        Err(SessionError::InvalidFleet { .. })
    ));

    let mut duplicated = fixed_layout();
    duplicated.ships[1] = duplicated.ships[0].clone();
    assert!(matches!(
        session.submit_fleet(INVITER, &duplicated),
        Err(SessionError::InvalidFleet { .. })
    ));

    // Ship list and matrix disagreeing is itself a rejection.
    let mut skewed = fixed_layout();
    skewed.matrix[9] = "S         ".into();
    assert!(matches!(
        session.submit_fleet(INVITER, &skewed),
        Err(SessionError::InvalidFleet { .. })
    ));

    let mut touching = fixed_layout();
    touching.ships[6] = ShipPlacement {
        row: 1,
        col: 9,
        ..touching.ships[6].clone()
    };
    assert!(matches!(
        session.submit_fleet(INVITER, &touching),
        Err(SessionError::InvalidFleet { .. })
    ));

    // A failed submission leaves the slot open for a corrected one.
    assert!(!session.submit_fleet(INVITER, &fixed_layout()).unwrap());
}

#[test]
fn only_the_turn_owner_may_fire() {
    let mut session = active_session();
    assert!(matches!(
        session.fire(OPPONENT, 0, 0),
        Err(SessionError::NotYourTurn { .. })
    ));
    assert_eq!(session.turn(), Some(INVITER));
    // The rejected shot resolved nothing: the same cell still works.
    let report = session.fire(INVITER, 0, 0).unwrap();
    assert!(report.hit);
}

#[test]
fn turn_passes_after_every_shot_hit_or_miss() {
    let mut session = active_session();
    let report = session.fire(INVITER, 0, 0).unwrap();
    assert!(report.hit);
    assert_eq!(report.next_turn, Some(OPPONENT));
    let report = session.fire(OPPONENT, 9, 9).unwrap();
    assert!(!report.hit);
    assert_eq!(report.next_turn, Some(INVITER));
}

#[test]
fn duplicate_target_is_a_shot_error_and_keeps_the_turn_state() {
    let mut session = active_session();
    session.fire(INVITER, 9, 9).unwrap();
    session.fire(OPPONENT, 9, 9).unwrap();
    assert!(matches!(
        session.fire(INVITER, 9, 9),
        Err(SessionError::Shot(ShotError::AlreadyResolved { .. }))
    ));
    assert_eq!(session.turn(), Some(INVITER));
}

#[test]
fn sinking_the_last_ship_wins_the_game() {
    let mut session = active_session();
    let targets = fixed_ship_cells();
    let mut last = None;
    for (i, (row, col)) in targets.iter().copied().enumerate() {
        last = Some(session.fire(INVITER, row, col).unwrap());
        if i < targets.len() - 1 {
            // The opponent wastes their turns on the empty south rows.
            let (r, c) = (5 + i / 10, i % 10);
            let report = session.fire(OPPONENT, r, c).unwrap();
            assert!(!report.hit);
        }
    }
    let last = last.unwrap();
    assert!(last.hit);
    assert!(last.defeated);
    assert_eq!(last.next_turn, None);
    assert_eq!(session.outcome(), Some(Outcome::Won { winner: INVITER }));
    assert_eq!(
        session.end_notice(),
        Some((false, Some(INVITER), EndReason::AllSunk))
    );
    assert!(matches!(
        session.fire(OPPONENT, 9, 9),
        Err(SessionError::WrongPhase { .. })
    ));
}

#[test]
fn draw_offer_accept() {
    let mut session = active_session();
    session.offer_draw(INVITER).unwrap();
    // Accepting your own offer does not count.
    assert!(matches!(
        session.accept_draw(INVITER),
        Err(SessionError::NoDrawPending)
    ));
    session.accept_draw(OPPONENT).unwrap();
    assert_eq!(session.outcome(), Some(Outcome::Draw));
    assert_eq!(session.end_notice(), Some((true, None, EndReason::Draw)));
}

#[test]
fn declined_offer_leaves_the_game_running() {
    let mut session = active_session();
    session.offer_draw(INVITER).unwrap();
    session.decline_draw(OPPONENT).unwrap();
    assert!(session.outcome().is_none());
    // The offer is spent.
    assert!(matches!(
        session.accept_draw(OPPONENT),
        Err(SessionError::NoDrawPending)
    ));
    // Play went on undisturbed.
    session.fire(INVITER, 9, 9).unwrap();
}

#[test]
fn stale_draw_offer_dies_with_the_session() {
    let mut session = active_session();
    session.offer_draw(OPPONENT).unwrap();
    session.abandon(OPPONENT).unwrap();
    assert!(matches!(
        session.decline_draw(INVITER),
        Err(SessionError::WrongPhase { .. })
    ));
    assert!(matches!(
        session.accept_draw(INVITER),
        Err(SessionError::WrongPhase { .. })
    ));
}

#[test]
fn accept_without_any_offer_is_rejected() {
    let mut session = active_session();
    assert!(matches!(
        session.accept_draw(OPPONENT),
        Err(SessionError::NoDrawPending)
    ));
}

#[test]
fn surrender_ends_the_game_for_the_surrendering_side() {
    let mut session = active_session();
    session.surrender(OPPONENT).unwrap();
    assert_eq!(
        session.outcome(),
        Some(Outcome::Surrendered { loser: OPPONENT })
    );
    assert_eq!(
        session.end_notice(),
        Some((false, Some(INVITER), EndReason::Surrender))
    );
}

#[test]
fn ready_timeout_favours_the_side_that_submitted() {
    let start = Instant::now();
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    session.accept(OPPONENT, start).unwrap();
    session.submit_fleet(OPPONENT, &fixed_layout()).unwrap();

    // Not lapsed yet.
    assert!(!session.check_ready_timeout(start + Duration::from_secs(59)));
    assert!(session.outcome().is_none());

    assert!(session.check_ready_timeout(start + Duration::from_secs(61)));
    assert_eq!(
        session.outcome(),
        Some(Outcome::TimedOut {
            winner: Some(OPPONENT)
        })
    );
    // Repeated checks do not refire.
    assert!(!session.check_ready_timeout(start + Duration::from_secs(120)));
}

#[test]
fn ready_timeout_with_no_fleets_has_no_winner() {
    let start = Instant::now();
    let mut session = MatchSession::new(1, INVITER, OPPONENT);
    session.accept(OPPONENT, start).unwrap();
    assert!(session.check_ready_timeout(start + Duration::from_secs(61)));
    assert_eq!(session.outcome(), Some(Outcome::TimedOut { winner: None }));
    assert_eq!(
        session.end_notice(),
        Some((false, None, EndReason::Timeout))
    );
}

#[test]
fn abandonment_forfeits_to_the_remaining_side() {
    let mut session = active_session();
    session.abandon(INVITER).unwrap();
    assert_eq!(
        session.outcome(),
        Some(Outcome::Abandoned { leaver: INVITER })
    );
    assert_eq!(
        session.end_notice(),
        Some((false, Some(OPPONENT), EndReason::Abandoned))
    );
    assert!(session.abandon(OPPONENT).is_err());
}

#[test]
fn snapshot_masks_the_opponents_unhit_ships() {
    let mut session = active_session();
    session.fire(INVITER, 0, 0).unwrap();
    session.fire(OPPONENT, 9, 9).unwrap();

    let snapshot = session.snapshot(INVITER).unwrap();
    assert_eq!(snapshot.you, INVITER);
    assert_eq!(snapshot.opponent, OPPONENT);
    assert_eq!(snapshot.turn, Some(INVITER));
    // Own board shows ships and the opponent's miss.
    assert_eq!(snapshot.own_board[0][1], Cell::Ship);
    assert_eq!(snapshot.own_board[9][9], Cell::Miss);
    // Opponent board shows only resolved shots.
    assert_eq!(snapshot.opponent_board[0][0], Cell::Hit);
    assert_eq!(snapshot.opponent_board[0][1], Cell::Empty);
    assert_eq!(snapshot.your_ships_remaining, 10);
    assert_eq!(snapshot.opponent_ships_remaining, 10);

    assert!(matches!(
        session.snapshot(STRANGER),
        Err(SessionError::NotAParticipant { .. })
    ));
}
