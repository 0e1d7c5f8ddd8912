//! Round outcome and session phase.

use crate::rules::WinLine;
use crate::types::Symbol;
use serde::{Deserialize, Serialize};

/// Result of the current round, recomputed after every accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// No line completed and cells remain.
    #[default]
    InProgress,
    /// A symbol completed a line.
    Won {
        /// Symbol that completed the line.
        winner: Symbol,
        /// The completed line.
        line: WinLine,
    },
    /// Board full with no winner.
    Draw,
}

impl Outcome {
    /// Returns true once the round is decided.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Symbol> {
        match self {
            Outcome::Won { winner, .. } => Some(*winner),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "In progress"),
            Outcome::Won { winner, line } => write!(f, "{winner} wins via {line}"),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Lifecycle of the session's game.
///
/// `Won` and `Drawn` are terminal until a confirmed restart returns the game
/// to `InProgress` with a cleared board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Fewer than two seats connected.
    #[default]
    WaitingForPlayers,
    /// Moves are accepted.
    InProgress,
    /// A line was completed.
    Won,
    /// The board filled with no winner.
    Drawn,
}

impl Phase {
    /// Phase matching a round outcome.
    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::InProgress => Phase::InProgress,
            Outcome::Won { .. } => Phase::Won,
            Outcome::Draw => Phase::Drawn,
        }
    }
}
