//! Presentation adapter: the only place where the letter-row/1-based
//! column form exists. Everything else in the crate speaks 0-based
//! (row, col).

use std::fmt::Write as _;

use crate::board::{Board, Cell};
use crate::config::BOARD_SIZE;

/// Format a 0-based coordinate for display: row A-J, column 1-10.
pub fn format_coord(row: usize, col: usize) -> String {
    format!("{}{}", (b'A' + row as u8) as char, col + 1)
}

/// Parse a display coordinate ("B7", "j10") into 0-based (row, col).
pub fn parse_coord(input: &str) -> Result<(usize, usize), String> {
    let input = input.trim();
    let mut chars = input.chars();
    let row_ch = chars
        .next()
        .ok_or_else(|| "empty coordinate".to_string())?
        .to_ascii_uppercase();
    if !row_ch.is_ascii_alphabetic() {
        return Err(format!("invalid row '{}', expected a letter A-J", row_ch));
    }
    let row = (row_ch as u8).wrapping_sub(b'A') as usize;
    if row >= BOARD_SIZE {
        return Err(format!("row '{}' out of bounds, expected A-J", row_ch));
    }
    let col_str: String = chars.collect();
    let col: usize = col_str
        .parse()
        .map_err(|_| format!("invalid column '{}', expected 1-10", col_str))?;
    if col == 0 || col > BOARD_SIZE {
        return Err(format!("column {} out of bounds, expected 1-10", col));
    }
    Ok((row, col - 1))
}

fn cell_char(cell: Cell, reveal: bool) -> char {
    match cell {
        Cell::Hit => 'X',
        Cell::Miss => 'o',
        Cell::Ship if reveal => 'S',
        _ => '.',
    }
}

/// Render a board as text, `reveal` controls whether unhit ship cells
/// show.
pub fn render_board(board: &Board, reveal: bool) -> String {
    let mut out = String::new();
    let _ = write!(out, "   ");
    for c in 0..BOARD_SIZE {
        let _ = write!(out, "{:>3}", c + 1);
    }
    let _ = writeln!(out);
    for r in 0..BOARD_SIZE {
        let _ = write!(out, "  {}", (b'A' + r as u8) as char);
        for c in 0..BOARD_SIZE {
            let _ = write!(out, "  {}", cell_char(board.cell(r, c), reveal));
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::place;
    use crate::ship::Orientation;

    #[test]
    fn coord_round_trip() {
        assert_eq!(format_coord(0, 0), "A1");
        assert_eq!(format_coord(1, 6), "B7");
        assert_eq!(format_coord(9, 9), "J10");
        assert_eq!(parse_coord("B7"), Ok((1, 6)));
        assert_eq!(parse_coord("j10"), Ok((9, 9)));
        assert_eq!(parse_coord("  a1 "), Ok((0, 0)));
    }

    #[test]
    fn bad_coords_are_rejected() {
        assert!(parse_coord("").is_err());
        assert!(parse_coord("K1").is_err());
        assert!(parse_coord("A0").is_err());
        assert!(parse_coord("A11").is_err());
        assert!(parse_coord("17").is_err());
        assert!(parse_coord("Ax").is_err());
    }

    #[test]
    fn render_hides_unhit_ships_unless_revealed() {
        let mut board = Board::new();
        place(&mut board, 2, 0, 0, Orientation::Horizontal).unwrap();
        board.mark_hit(0, 0);
        board.mark_miss(5, 5);

        let hidden = render_board(&board, false);
        let revealed = render_board(&board, true);
        assert!(hidden.contains('X'));
        assert!(hidden.contains('o'));
        assert!(!hidden.contains('S'));
        assert!(revealed.contains('S'));
    }
}
