use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

use seabattle::{
    auto_place, can_place, place, place_randomly, Board, Orientation, PlacementError, Strategy,
    BOARD_SIZE, FLEET, NUM_SHIPS, TOTAL_SHIP_CELLS,
};

#[test]
fn anchor_grows_toward_higher_indices() {
    let mut board = Board::new();
    let id = place(&mut board, 4, 0, 0, Orientation::Horizontal).unwrap();
    for col in 0..4 {
        assert!(board.is_occupied(0, col));
    }
    assert!(!board.is_occupied(0, 4));
    assert_eq!(board.ship_at(0, 0).map(|s| s.id), Some(id));
}

#[test]
fn anchor_near_high_edge_grows_backwards() {
    let mut board = Board::new();
    place(&mut board, 4, 0, 8, Orientation::Horizontal).unwrap();
    for col in 5..=8 {
        assert!(board.is_occupied(0, col));
    }
    assert!(!board.is_occupied(0, 9));
    assert!(!board.is_occupied(0, 4));

    let mut board = Board::new();
    place(&mut board, 3, 9, 2, Orientation::Vertical).unwrap();
    for row in 7..=9 {
        assert!(board.is_occupied(row, 2));
    }
    assert!(!board.is_occupied(6, 2));
}

#[test]
fn diagonal_neighbour_is_rejected_as_touching() {
    let mut board = Board::new();
    place(&mut board, 4, 0, 0, Orientation::Horizontal).unwrap();
    let err = can_place(&board, 1, 1, 4, Orientation::Horizontal).unwrap_err();
    assert_eq!(err, PlacementError::Touching { row: 1, col: 4 });
    // Same for the cell straight after the span.
    let err = can_place(&board, 1, 0, 4, Orientation::Horizontal).unwrap_err();
    assert_eq!(err, PlacementError::Touching { row: 0, col: 4 });
    // One cell of clearance is enough.
    assert!(can_place(&board, 1, 0, 5, Orientation::Horizontal).is_ok());
}

#[test]
fn overlap_is_reported_before_touching() {
    let mut board = Board::new();
    place(&mut board, 4, 0, 0, Orientation::Horizontal).unwrap();
    let err = can_place(&board, 3, 0, 0, Orientation::Vertical).unwrap_err();
    assert_eq!(err, PlacementError::Overlap { row: 0, col: 0 });
}

#[test]
fn rejected_placement_leaves_the_board_untouched() {
    let mut board = Board::new();
    place(&mut board, 4, 0, 0, Orientation::Horizontal).unwrap();
    let before = board.ship_map();
    assert!(place(&mut board, 1, 1, 0, Orientation::Horizontal).is_err());
    assert_eq!(board.ship_map().count_ones(), before.count_ones());
    assert!(board.ship_at(1, 0).is_none());
}

#[test]
fn anchor_out_of_bounds() {
    let board = Board::new();
    let err = can_place(&board, 2, BOARD_SIZE, 0, Orientation::Horizontal).unwrap_err();
    assert_eq!(
        err,
        PlacementError::OutOfBounds {
            row: BOARD_SIZE,
            col: 0
        }
    );
}

#[test]
fn sizes_outside_the_fleet_are_invalid() {
    let board = Board::new();
    assert_eq!(
        can_place(&board, 5, 0, 0, Orientation::Horizontal).unwrap_err(),
        PlacementError::InvalidSize { size: 5 }
    );
    assert_eq!(
        can_place(&board, 0, 0, 0, Orientation::Horizontal).unwrap_err(),
        PlacementError::InvalidSize { size: 0 }
    );
}

#[test]
fn fifth_boat_exhausts_the_quota() {
    let mut board = Board::new();
    for col in [0, 2, 4, 6] {
        place(&mut board, 1, 0, col, Orientation::Horizontal).unwrap();
    }
    let err = place(&mut board, 1, 0, 8, Orientation::Horizontal).unwrap_err();
    assert_eq!(err, PlacementError::QuotaExhausted { size: 1 });
}

#[test]
fn quota_error_survives_random_placement() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut board = Board::new();
    for col in [0, 2, 4, 6] {
        place(&mut board, 1, 0, col, Orientation::Horizontal).unwrap();
    }
    let err = place_randomly(&mut board, &mut rng, 1).unwrap_err();
    assert_eq!(err, PlacementError::QuotaExhausted { size: 1 });
}

fn assert_fleet_legal(board: &Board) {
    assert!(board.is_fleet_complete());
    assert_eq!(board.ship_map().count_ones(), TOTAL_SHIP_CELLS);
    let masks: Vec<_> = board
        .ships()
        .iter()
        .map(|s| s.placement.expect("fleet complete").mask())
        .collect();
    assert_eq!(masks.len(), NUM_SHIPS);
    for (i, ship) in board.ships().iter().enumerate() {
        assert_eq!(ship.size(), FLEET[i].size());
        assert_eq!(masks[i].count_ones(), ship.size());
        for (j, other) in masks.iter().enumerate() {
            if i != j {
                assert!(
                    (masks[i].dilated() & *other).is_empty(),
                    "ships {} and {} overlap or touch",
                    i,
                    j
                );
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_strategy_produces_a_legal_fleet(seed in any::<u64>()) {
        for strategy in [
            Strategy::Uniform,
            Strategy::Coastal,
            Strategy::Diagonal,
            Strategy::HalfField,
            Strategy::Spread,
        ] {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut board = Board::new();
            auto_place(&mut board, strategy, &mut rng).unwrap();
            assert_fleet_legal(&board);
        }
    }

    #[test]
    fn auto_place_clears_previous_state(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = Board::new();
        auto_place(&mut board, Strategy::Uniform, &mut rng).unwrap();
        auto_place(&mut board, Strategy::Coastal, &mut rng).unwrap();
        assert_fleet_legal(&board);
        assert!(board.hits().is_empty());
        assert!(board.misses().is_empty());
    }

    #[test]
    fn same_seed_same_fleet(seed in any::<u64>()) {
        let mut a = Board::new();
        let mut b = Board::new();
        auto_place(&mut a, Strategy::Diagonal, &mut SmallRng::seed_from_u64(seed)).unwrap();
        auto_place(&mut b, Strategy::Diagonal, &mut SmallRng::seed_from_u64(seed)).unwrap();
        assert_eq!(a.ship_map().into_raw(), b.ship_map().into_raw());
    }
}
