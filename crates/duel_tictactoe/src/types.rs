//! Core domain types for a two-seat tic-tac-toe duel.

use crate::action::MoveError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Mark placed on the board.
///
/// `A` always belongs to the first seat and moves first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Symbol {
    /// First seat's mark.
    #[default]
    A,
    /// Second seat's mark.
    B,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::A => Symbol::B,
            Symbol::B => Symbol::A,
        }
    }
}

/// Seat identity, assigned in connection order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub enum SeatId {
    /// Seat 1, plays `A`.
    #[display("1")]
    First,
    /// Seat 2, plays `B`.
    #[display("2")]
    Second,
}

impl SeatId {
    /// Both seats in assignment order.
    pub const ALL: [SeatId; 2] = [SeatId::First, SeatId::Second];

    /// Seat for the given assignment number (1 or 2).
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(SeatId::First),
            2 => Some(SeatId::Second),
            _ => None,
        }
    }

    /// Assignment number of this seat (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            SeatId::First => 1,
            SeatId::Second => 2,
        }
    }

    /// The symbol this seat plays.
    pub fn symbol(self) -> Symbol {
        match self {
            SeatId::First => Symbol::A,
            SeatId::Second => Symbol::B,
        }
    }

    /// The seat that plays the given symbol.
    pub fn for_symbol(symbol: Symbol) -> Self {
        match symbol {
            Symbol::A => SeatId::First,
            Symbol::B => SeatId::Second,
        }
    }

    /// Name used when a participant never supplies one.
    pub fn default_name(self) -> String {
        format!("Player{}", self.number())
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing placed yet.
    #[default]
    Empty,
    /// Occupied by a symbol. Never changes until the board is reset.
    Marked(Symbol),
}

/// Row/column coordinate on the 3x3 board, always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{row} {col}")]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Board side length.
    pub const SIZE: u8 = 3;

    /// Creates a coordinate, rejecting anything outside `0..=2`.
    ///
    /// Accepts signed input so that a well-formed but negative coordinate on
    /// the wire is reported as an illegal move rather than a parse failure.
    #[instrument]
    pub fn try_new(row: i64, col: i64) -> Result<Self, MoveError> {
        let in_range = |v: i64| (0..i64::from(Self::SIZE)).contains(&v);
        if in_range(row) && in_range(col) {
            Ok(Self::at(row as u8, col as u8))
        } else {
            Err(MoveError::OutOfRange { row, col })
        }
    }

    pub(crate) const fn at(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Row index (0 = top).
    pub fn row(self) -> u8 {
        self.row
    }

    /// Column index (0 = left).
    pub fn col(self) -> u8 {
        self.col
    }

    /// Row-major index (0-8).
    pub fn index(self) -> usize {
        usize::from(self.row) * usize::from(Self::SIZE) + usize::from(self.col)
    }

    /// All nine coordinates in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..Self::SIZE).flat_map(|row| (0..Self::SIZE).map(move |col| Self::at(row, col)))
    }
}

/// 3x3 board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    /// Cells in row-major order (0-8).
    cells: [Cell; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cell at a coordinate.
    pub fn get(&self, coord: Coord) -> Cell {
        self.cells[coord.index()]
    }

    /// Checks if a cell is empty.
    pub fn is_empty(&self, coord: Coord) -> bool {
        self.get(coord) == Cell::Empty
    }

    /// Marks an empty cell.
    ///
    /// A marked cell is never overwritten.
    #[instrument(skip(self))]
    pub fn place(&mut self, coord: Coord, symbol: Symbol) -> Result<(), MoveError> {
        let cell = &mut self.cells[coord.index()];
        match cell {
            Cell::Empty => {
                *cell = Cell::Marked(symbol);
                Ok(())
            }
            Cell::Marked(_) => Err(MoveError::CellOccupied(coord)),
        }
    }

    /// Clears every cell.
    pub fn clear(&mut self) {
        self.cells = [Cell::Empty; 9];
    }

    /// Returns all cells in row-major order.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Number of marked cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| **c != Cell::Empty).count()
    }

    /// Formats the board as a human-readable grid.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..Coord::SIZE {
            for col in 0..Coord::SIZE {
                let symbol = match self.get(Coord::at(row, col)) {
                    Cell::Empty => ".".to_string(),
                    Cell::Marked(s) => s.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}
