//! Draw detection.

use super::win::check_winner;
use crate::types::{Board, Cell};
use tracing::instrument;

/// Checks if every cell is marked.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|c| *c != Cell::Empty)
}

/// A draw is a full board with no completed line.
#[instrument(skip(board))]
pub fn is_draw(board: &Board) -> bool {
    is_full(board) && check_winner(board).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coord, Symbol};

    fn fill(pattern: &str) -> Board {
        let mut board = Board::new();
        for (coord, ch) in Coord::all().zip(pattern.chars()) {
            match ch {
                'A' => board.place(coord, Symbol::A).unwrap(),
                'B' => board.place(coord, Symbol::B).unwrap(),
                _ => {}
            }
        }
        board
    }

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_partial_board_not_full() {
        assert!(!is_full(&fill("AB.......")));
    }

    #[test]
    fn test_draw_detection() {
        // A B A / B B A / B A B
        assert!(is_draw(&fill("ABABBABAB")));
    }

    #[test]
    fn test_not_draw_if_winner() {
        // Full board, A holds the top row.
        let board = fill("AAABBABAB");
        assert!(is_full(&board));
        assert!(!is_draw(&board));
    }
}
