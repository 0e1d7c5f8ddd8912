//! Win detection.

use crate::types::{Board, Cell, Coord, Symbol};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Three coordinates forming a completed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{} {} {}", _0[0], _0[1], _0[2])]
pub struct WinLine(pub [Coord; 3]);

impl WinLine {
    /// The three cells of the line.
    pub fn cells(&self) -> &[Coord; 3] {
        &self.0
    }
}

/// The eight lines, in detection order: rows top to bottom, columns left to
/// right, then the main diagonal and the anti-diagonal.
pub const LINES: [WinLine; 8] = [
    // Rows
    WinLine([Coord::at(0, 0), Coord::at(0, 1), Coord::at(0, 2)]),
    WinLine([Coord::at(1, 0), Coord::at(1, 1), Coord::at(1, 2)]),
    WinLine([Coord::at(2, 0), Coord::at(2, 1), Coord::at(2, 2)]),
    // Columns
    WinLine([Coord::at(0, 0), Coord::at(1, 0), Coord::at(2, 0)]),
    WinLine([Coord::at(0, 1), Coord::at(1, 1), Coord::at(2, 1)]),
    WinLine([Coord::at(0, 2), Coord::at(1, 2), Coord::at(2, 2)]),
    // Diagonals
    WinLine([Coord::at(0, 0), Coord::at(1, 1), Coord::at(2, 2)]),
    WinLine([Coord::at(0, 2), Coord::at(1, 1), Coord::at(2, 0)]),
];

/// Returns the first line fully held by `symbol`, if any.
#[instrument(skip(board))]
pub fn winning_line(board: &Board, symbol: Symbol) -> Option<WinLine> {
    LINES
        .into_iter()
        .find(|line| {
            line.0.iter().all(|c| board.get(*c) == Cell::Marked(symbol))
        })
}

/// Returns the winner and its line, checking `A` before `B`.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<(Symbol, WinLine)> {
    [Symbol::A, Symbol::B]
        .into_iter()
        .find_map(|s| winning_line(board, s).map(|line| (s, line)))
}
