//! Cumulative score across rounds.

use crate::outcome::Outcome;
use crate::types::Symbol;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Wins per symbol and draws, for the life of the process.
///
/// Counters only grow. A restart never touches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Getters, Serialize, Deserialize)]
pub struct ScoreBoard {
    wins_a: u32,
    wins_b: u32,
    draws: u32,
}

impl ScoreBoard {
    /// Creates an all-zero score board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a terminal outcome. Exactly one counter moves; `InProgress` is
    /// ignored.
    #[instrument(skip(self))]
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Won { winner, .. } => match winner {
                Symbol::A => self.wins_a += 1,
                Symbol::B => self.wins_b += 1,
            },
            Outcome::Draw => self.draws += 1,
            Outcome::InProgress => return,
        }
        debug!(wins_a = self.wins_a, wins_b = self.wins_b, draws = self.draws, "Score updated");
    }

    /// Wins for the given symbol.
    pub fn wins(&self, symbol: Symbol) -> u32 {
        match symbol {
            Symbol::A => self.wins_a,
            Symbol::B => self.wins_b,
        }
    }

    /// Rounds decided so far.
    pub fn rounds(&self) -> u32 {
        self.wins_a + self.wins_b + self.draws
    }
}
