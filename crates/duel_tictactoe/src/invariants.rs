//! Properties that must hold after every accepted move.
//!
//! Checked with `debug_assert!` inside [`Game::apply_move`](crate::Game::apply_move)
//! and testable on their own.

use crate::game::Game;
use crate::types::{Board, Symbol};

/// A logical property over a state.
pub trait Invariant<S> {
    /// Checks if the invariant holds.
    fn holds(state: &S) -> bool;

    /// Human-readable description.
    fn description() -> &'static str;
}

/// A violated invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

/// A group of invariants checked together.
pub trait InvariantSet<S> {
    /// Checks every member, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, d)| InvariantViolation {
            description: d.to_string(),
        })
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Turns alternate A, B, A, ... and the marker points at the next symbol.
pub struct AlternatingTurnInvariant;

impl Invariant<Game> for AlternatingTurnInvariant {
    fn holds(game: &Game) -> bool {
        let history = game.history();
        let alternates = history.iter().enumerate().all(|(i, m)| {
            let expected = if i % 2 == 0 { Symbol::A } else { Symbol::B };
            m.symbol == expected
        });
        let expected_turn = if history.len() % 2 == 0 { Symbol::A } else { Symbol::B };
        alternates && game.turn() == expected_turn
    }

    fn description() -> &'static str {
        "Symbols alternate A, B, A, ... starting with A"
    }
}

/// Every marked cell comes from exactly one accepted move.
pub struct HistoryMatchesBoardInvariant;

impl Invariant<Game> for HistoryMatchesBoardInvariant {
    fn holds(game: &Game) -> bool {
        let mut replayed = Board::new();
        for m in game.history() {
            if replayed.place(m.coord, m.symbol).is_err() {
                return false;
            }
        }
        replayed.cells() == game.board().cells()
            && game.board().occupied() == game.history().len()
    }

    fn description() -> &'static str {
        "Board equals a replay of the move history"
    }
}

/// The invariants enforced on [`Game`].
pub type DuelInvariants = (AlternatingTurnInvariant, HistoryMatchesBoardInvariant);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Move;
    use crate::types::Coord;

    #[test]
    fn test_fresh_game_holds() {
        assert!(DuelInvariants::check_all(&Game::new()).is_ok());
    }

    #[test]
    fn test_holds_through_a_round() {
        let mut game = Game::new();
        game.start();
        for (i, coord) in Coord::all().take(6).enumerate() {
            let symbol = if i % 2 == 0 { Symbol::A } else { Symbol::B };
            game.apply_move(Move::new(symbol, coord)).unwrap();
            assert!(AlternatingTurnInvariant::holds(&game));
            assert!(HistoryMatchesBoardInvariant::holds(&game));
        }
    }
}
