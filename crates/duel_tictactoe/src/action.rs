//! Moves as first-class domain events.

use crate::types::{Coord, Symbol};
use serde::{Deserialize, Serialize};

/// A symbol placed at a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{coord} {symbol}")]
pub struct Move {
    /// The symbol being placed.
    pub symbol: Symbol,
    /// Where it is placed.
    pub coord: Coord,
}

impl Move {
    /// Creates a new move.
    pub fn new(symbol: Symbol, coord: Coord) -> Self {
        Self { symbol, coord }
    }
}

/// Why a move was rejected. State is never mutated on rejection.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// Row or column outside `0..=2`.
    #[display("Coordinate ({row}, {col}) is off the board")]
    OutOfRange {
        /// Requested row.
        row: i64,
        /// Requested column.
        col: i64,
    },

    /// The cell already holds a mark.
    #[display("Cell {_0} is already occupied")]
    CellOccupied(#[error(not(source))] Coord),

    /// The symbol is not the one whose turn it is.
    #[display("It is not {_0}'s turn")]
    WrongTurn(#[error(not(source))] Symbol),

    /// The seat tried to place the other seat's symbol.
    #[display("Seat plays {expected}, not {claimed}")]
    NotYourSymbol {
        /// Symbol bound to the submitting seat.
        expected: Symbol,
        /// Symbol named in the move.
        claimed: Symbol,
    },

    /// No round is being played (waiting for players, or already decided).
    #[display("No round in progress")]
    NotInProgress,
}
