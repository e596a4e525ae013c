use seabattle::{BitBoard, BitBoardError};

type Mask = BitBoard<u128, 10>;

#[test]
fn set_get_unset() {
    let mut board = Mask::new();
    assert!(board.is_empty());
    board.set(3, 4).unwrap();
    assert!(board.get(3, 4).unwrap());
    assert_eq!(board.count_ones(), 1);
    board.unset(3, 4).unwrap();
    assert!(board.is_empty());
}

#[test]
fn out_of_bounds_indices_are_errors() {
    let mut board = Mask::new();
    assert_eq!(
        board.set(10, 0).unwrap_err(),
        BitBoardError::IndexOutOfBounds { row: 10, col: 0 }
    );
    assert_eq!(
        board.get(0, 10).unwrap_err(),
        BitBoardError::IndexOutOfBounds { row: 0, col: 10 }
    );
}

#[test]
fn backing_type_must_fit_the_board() {
    assert!(BitBoard::<u128, 10>::try_new().is_ok());
    assert_eq!(
        BitBoard::<u8, 4>::try_new().unwrap_err(),
        BitBoardError::SizeTooLarge { n: 4, capacity: 8 }
    );
}

#[test]
fn iter_set_walks_row_major() {
    let board = Mask::from_positions([(0, 3), (2, 1), (0, 1)]).unwrap();
    let cells: Vec<_> = board.iter_set().collect();
    assert_eq!(cells, vec![(0, 1), (0, 3), (2, 1)]);
}

#[test]
fn dilation_adds_exactly_the_neighbour_ring() {
    let board = Mask::from_positions([(5, 5)]).unwrap();
    let ring = board.dilated() & !board;
    assert_eq!(ring.count_ones(), 8);
    for (r, c) in [(4, 4), (4, 5), (4, 6), (5, 4), (5, 6), (6, 4), (6, 5), (6, 6)] {
        assert!(ring.get(r, c).unwrap());
    }

    // Corners clip against the edge.
    let corner = Mask::from_positions([(0, 0)]).unwrap();
    assert_eq!(corner.dilated().count_ones(), 4);
}

#[test]
fn bitwise_ops_compose() {
    let a = Mask::from_positions([(0, 0), (1, 1)]).unwrap();
    let b = Mask::from_positions([(1, 1), (2, 2)]).unwrap();
    assert_eq!((a & b).count_ones(), 1);
    assert_eq!((a | b).count_ones(), 3);
    assert!((a & !a).is_empty());
    let mut c = a;
    c |= b;
    assert_eq!(c.count_ones(), 3);
    c &= b;
    assert_eq!(c.count_ones(), 2);
}
