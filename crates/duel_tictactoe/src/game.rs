//! The authoritative game state machine.

use crate::action::{Move, MoveError};
use crate::invariants::{DuelInvariants, InvariantSet};
use crate::outcome::{Outcome, Phase};
use crate::rules;
use crate::types::{Board, Symbol};
use tracing::{info, instrument, warn};

/// What an accepted move produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// The move that was applied.
    pub applied: Move,
    /// Symbol to move next.
    pub next_turn: Symbol,
    /// Round outcome after the move.
    pub outcome: Outcome,
}

/// Board, turn marker, outcome and phase for one session.
///
/// States: `WaitingForPlayers -> InProgress -> {Won, Drawn}`; a reset returns
/// a terminal game to `InProgress`.
#[derive(Debug, Clone, Default)]
pub struct Game {
    board: Board,
    turn: Symbol,
    outcome: Outcome,
    phase: Phase,
    history: Vec<Move>,
}

impl Game {
    /// Creates a game waiting for its players.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the first round. Has no effect once started.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        if self.phase != Phase::WaitingForPlayers {
            warn!(phase = %self.phase, "Game already started");
            return;
        }
        self.phase = Phase::InProgress;
        info!("Game started, A to move");
    }

    /// Validates and applies a move.
    ///
    /// On success the turn flips, the mover is checked for a completed line,
    /// and a full board with no line becomes a draw. On error nothing changes.
    #[instrument(skip(self), fields(phase = %self.phase, turn = %self.turn))]
    pub fn apply_move(&mut self, action: Move) -> Result<MoveReport, MoveError> {
        if self.phase != Phase::InProgress {
            return Err(MoveError::NotInProgress);
        }
        if action.symbol != self.turn {
            return Err(MoveError::WrongTurn(action.symbol));
        }
        self.board.place(action.coord, action.symbol)?;
        self.history.push(action);
        self.turn = self.turn.opponent();

        // Only the mover can have just completed a line.
        self.outcome = match rules::winning_line(&self.board, action.symbol) {
            Some(line) => Outcome::Won {
                winner: action.symbol,
                line,
            },
            None if rules::is_full(&self.board) => Outcome::Draw,
            None => Outcome::InProgress,
        };
        self.phase = Phase::from_outcome(&self.outcome);

        debug_assert!(
            <DuelInvariants as InvariantSet<Game>>::check_all(self).is_ok(),
            "invariants violated after {action}"
        );

        if self.outcome.is_terminal() {
            info!(outcome = %self.outcome, "Round decided");
        }

        Ok(MoveReport {
            applied: action,
            next_turn: self.turn,
            outcome: self.outcome,
        })
    }

    /// Clears the board and returns to `InProgress` with `A` to move.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.board.clear();
        self.history.clear();
        self.turn = Symbol::A;
        self.outcome = Outcome::InProgress;
        self.phase = Phase::InProgress;
        info!("Board reset");
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Symbol whose move is currently legal.
    pub fn turn(&self) -> Symbol {
        self.turn
    }

    /// Outcome of the current round.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Accepted moves of the current round.
    pub fn history(&self) -> &[Move] {
        &self.history
    }
}
