//! Pure game logic for a two-seat tic-tac-toe duel.
//!
//! No I/O lives here. The server crate wraps a [`Game`], a [`ScoreBoard`] and
//! a [`RestartCoordinator`] behind one lock and turns their results into
//! protocol notifications.
//!
//! # Example
//!
//! ```
//! use duel_tictactoe::{Coord, Game, Move, Outcome, Symbol};
//!
//! let mut game = Game::new();
//! game.start();
//! let report = game.apply_move(Move::new(Symbol::A, Coord::try_new(1, 1)?))?;
//! assert_eq!(report.next_turn, Symbol::B);
//! assert_eq!(report.outcome, Outcome::InProgress);
//! # Ok::<(), duel_tictactoe::MoveError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod game;
pub mod invariants;
mod outcome;
mod restart;
pub mod rules;
mod score;
mod types;

pub use action::{Move, MoveError};
pub use game::{Game, MoveReport};
pub use outcome::{Outcome, Phase};
pub use restart::{RestartCoordinator, RestartError, RestartResolution};
pub use rules::WinLine;
pub use score::ScoreBoard;
pub use types::{Board, Cell, Coord, SeatId, Symbol};
