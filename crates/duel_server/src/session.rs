//! The one active session.
//!
//! [`Session`] owns the game, score, restart handshake and both seats.
//! [`SessionHandle`] puts it behind a single mutex: every mutation, and the
//! notifications it produces, happen under that lock, so notification order
//! always matches mutation order.

use crate::broadcast::{Delivery, Outbox, Recipient, broadcast};
use crate::protocol::{ServerMessage, display_name};
use derive_getters::Getters;
use duel_tictactoe::{
    Board, Coord, Game, Move, MoveError, MoveReport, Outcome, Phase, RestartCoordinator,
    RestartError, RestartResolution, ScoreBoard, SeatId, Symbol,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// One of the two participant slots.
#[derive(Debug, Getters)]
pub struct Seat {
    /// Assigned identity.
    id: SeatId,
    /// Display name; `Player<id>` until the participant sends one.
    name: String,
    #[getter(skip)]
    outbox: Outbox,
}

impl Seat {
    fn new(id: SeatId, outbox: Outbox) -> Self {
        Self {
            id,
            name: id.default_name(),
            outbox,
        }
    }

    /// Symbol this seat plays.
    pub fn symbol(&self) -> Symbol {
        self.id.symbol()
    }
}

impl Recipient for Seat {
    fn seat(&self) -> SeatId {
        self.id
    }

    fn outbox(&mut self) -> &mut Outbox {
        &mut self.outbox
    }
}

/// Why a seat left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DepartReason {
    /// Sent `QUIT`.
    #[display("quit")]
    Quit,
    /// Read failure or end of stream.
    #[display("disconnected")]
    Disconnected,
    /// Sent a line that did not decode.
    #[display("protocol violation")]
    ProtocolViolation,
}

/// How the session ended.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, Getters)]
pub struct SessionEnd {
    /// Seat whose departure ended the session.
    seat: SeatId,
    /// Its display name.
    name: String,
    /// Why it left.
    reason: DepartReason,
}

/// Why a connection was not given a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum AdmissionError {
    /// Both seats are taken.
    #[display("Session already has two seats")]
    SessionFull,
    /// A seat already left.
    #[display("Session has ended")]
    SessionEnded,
}

/// Aggregate state for the single game. Use through [`SessionHandle`].
#[derive(Debug)]
pub struct Session {
    game: Game,
    score: ScoreBoard,
    restart: RestartCoordinator,
    seats: Vec<Seat>,
    end_tx: watch::Sender<Option<SessionEnd>>,
}

impl Session {
    fn new() -> Self {
        let (end_tx, _) = watch::channel(None);
        Self {
            game: Game::new(),
            score: ScoreBoard::new(),
            restart: RestartCoordinator::new(),
            seats: Vec::with_capacity(2),
            end_tx,
        }
    }

    fn is_ended(&self) -> bool {
        self.end_tx.borrow().is_some()
    }

    fn seat_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id == id)
    }

    fn name_of(&self, id: SeatId) -> String {
        self.seats
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.default_name())
    }

    /// Delivers to both seats. A seat whose queue overflows has lost its
    /// connection and departs.
    fn broadcast(&mut self, message: ServerMessage) {
        for seat in broadcast(&mut self.seats, &message) {
            self.depart(seat, DepartReason::Disconnected);
        }
    }

    fn send_to(&mut self, id: SeatId, message: ServerMessage) {
        let Some(seat) = self.seat_mut(id) else {
            return;
        };
        if seat.outbox.deliver(id, message) == Delivery::Overflowed {
            self.depart(id, DepartReason::Disconnected);
        }
    }

    #[instrument(skip(self, outbox))]
    fn admit(&mut self, outbox: Outbox) -> Result<SeatId, AdmissionError> {
        if self.is_ended() {
            return Err(AdmissionError::SessionEnded);
        }
        let number = u8::try_from(self.seats.len() + 1)
            .map_err(|_| AdmissionError::SessionFull)?;
        let id = SeatId::from_number(number).ok_or(AdmissionError::SessionFull)?;
        self.seats.push(Seat::new(id, outbox));
        info!(seat = %id, symbol = %id.symbol(), "Seat assigned");
        self.send_to(id, ServerMessage::Assign(id));

        if self.seats.len() == SeatId::ALL.len() {
            self.game.start();
            info!("Both seats connected, game starting");
            self.broadcast(ServerMessage::Start);
        }
        Ok(id)
    }

    #[instrument(skip(self))]
    fn set_name(&mut self, id: SeatId, raw: &str) {
        if self.is_ended() {
            return;
        }
        let name = display_name(raw, id);
        if let Some(seat) = self.seat_mut(id) {
            info!(seat = %id, name = %name, "Display name set");
            seat.name = name;
        }
    }

    #[instrument(skip(self))]
    fn submit_move(
        &mut self,
        id: SeatId,
        row: i64,
        col: i64,
        symbol: Symbol,
    ) -> Result<MoveReport, MoveError> {
        if self.is_ended() {
            debug!(seat = %id, "Move after session end ignored");
            return Err(MoveError::NotInProgress);
        }
        let result = Self::check_symbol(id, symbol)
            .and_then(|()| Coord::try_new(row, col))
            .and_then(|coord| self.game.apply_move(Move::new(symbol, coord)));

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!(seat = %id, error = %e, "Move rejected");
                self.send_to(id, ServerMessage::WrongMove);
                return Err(e);
            }
        };

        info!(seat = %id, mv = %report.applied, "Move accepted");
        self.broadcast(ServerMessage::Move(report.applied));
        self.broadcast(ServerMessage::Turn(report.next_turn));

        match report.outcome {
            Outcome::InProgress => {}
            Outcome::Won { winner, line } => {
                self.score.record(&report.outcome);
                let name = self.name_of(SeatId::for_symbol(winner));
                self.broadcast(ServerMessage::Win {
                    symbol: winner,
                    name,
                    line,
                });
                self.broadcast(ServerMessage::stats(&self.score));
            }
            Outcome::Draw => {
                self.score.record(&report.outcome);
                self.broadcast(ServerMessage::Draw);
                self.broadcast(ServerMessage::stats(&self.score));
            }
        }
        Ok(report)
    }

    fn check_symbol(id: SeatId, claimed: Symbol) -> Result<(), MoveError> {
        let expected = id.symbol();
        if claimed == expected {
            Ok(())
        } else {
            Err(MoveError::NotYourSymbol { expected, claimed })
        }
    }

    #[instrument(skip(self))]
    fn request_restart(&mut self, id: SeatId) -> Result<(), RestartError> {
        if self.is_ended() {
            return Err(RestartError::SessionEnded);
        }
        if self.game.phase() == Phase::WaitingForPlayers {
            debug!(seat = %id, "Restart requested before start, ignoring");
            return Err(RestartError::NotStarted);
        }
        self.restart.request(id)?;
        let name = self.name_of(id);
        self.broadcast(ServerMessage::RestartRequest { name });
        Ok(())
    }

    #[instrument(skip(self))]
    fn confirm_restart(&mut self, id: SeatId, accept: bool) -> RestartResolution {
        if self.is_ended() {
            debug!(seat = %id, "Restart answer after session end ignored");
            return RestartResolution::Ignored;
        }
        let resolution = self.restart.respond(id, accept);
        match resolution {
            RestartResolution::Ignored => {
                debug!(seat = %id, accept, "Out-of-protocol restart answer ignored");
            }
            RestartResolution::Confirmed { .. } => {
                self.game.reset();
                self.broadcast(ServerMessage::RestartConfirmed);
                self.broadcast(ServerMessage::Reset);
            }
            RestartResolution::Declined { decliner, .. } => {
                let name = self.name_of(decliner);
                self.broadcast(ServerMessage::RestartDeclined { name });
            }
        }
        resolution
    }

    #[instrument(skip(self))]
    fn depart(&mut self, id: SeatId, reason: DepartReason) -> bool {
        if self.is_ended() {
            debug!(seat = %id, "Session already ended");
            return false;
        }
        let name = self.name_of(id);
        info!(seat = %id, name = %name, %reason, "Seat departed, ending session");
        // Every outbox closes next, so an overflow here needs no handling.
        broadcast(&mut self.seats, &ServerMessage::Quit { name: name.clone() });
        for seat in &mut self.seats {
            seat.outbox.close();
        }
        self.end_tx.send_replace(Some(SessionEnd::new(id, name, reason)));
        true
    }
}

/// Shared, lock-guarded access to the [`Session`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    /// Creates a session waiting for two seats.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session");
        Self {
            inner: Arc::new(Mutex::new(Session::new())),
        }
    }

    /// Every mutation validates before writing, so a poisoned lock still
    /// guards consistent state.
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Assigns the next seat and queues `ASSIGN` to it. Admitting the second
    /// seat starts the game and broadcasts `START`.
    pub fn admit(&self, outbox: Outbox) -> Result<SeatId, AdmissionError> {
        self.lock().admit(outbox)
    }

    /// Records the seat's display name from its first line.
    pub fn set_name(&self, seat: SeatId, raw: &str) {
        self.lock().set_name(seat, raw)
    }

    /// Validates and applies a move from `seat`.
    ///
    /// Accepted: broadcasts `MOVE`, `TURN`, then `WIN`/`DRAW` and `STATS` when
    /// the round is decided. Rejected: `WRONG_MOVE` to `seat` only.
    pub fn submit_move(
        &self,
        seat: SeatId,
        row: i64,
        col: i64,
        symbol: Symbol,
    ) -> Result<MoveReport, MoveError> {
        self.lock().submit_move(seat, row, col, symbol)
    }

    /// Opens a restart handshake and broadcasts `RESTART_REQUEST`.
    pub fn request_restart(&self, seat: SeatId) -> Result<(), RestartError> {
        self.lock().request_restart(seat)
    }

    /// Answers a pending restart.
    pub fn confirm_restart(&self, seat: SeatId, accept: bool) -> RestartResolution {
        self.lock().confirm_restart(seat, accept)
    }

    /// Ends the session on behalf of `seat`: broadcasts `QUIT` and closes
    /// every outbox. Returns false if the session had already ended.
    pub fn depart(&self, seat: SeatId, reason: DepartReason) -> bool {
        self.lock().depart(seat, reason)
    }

    /// Watches for the end of the session.
    pub fn subscribe_end(&self) -> watch::Receiver<Option<SessionEnd>> {
        self.lock().end_tx.subscribe()
    }

    /// How the session ended, if it has.
    pub fn ended(&self) -> Option<SessionEnd> {
        self.lock().end_tx.borrow().clone()
    }

    /// Snapshot of the board.
    pub fn board(&self) -> Board {
        self.lock().game.board().clone()
    }

    /// Symbol to move.
    pub fn turn(&self) -> Symbol {
        self.lock().game.turn()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.lock().game.phase()
    }

    /// Cumulative score.
    pub fn score(&self) -> ScoreBoard {
        self.lock().score
    }

    /// Seat with an outstanding restart request.
    pub fn pending_restart(&self) -> Option<SeatId> {
        self.lock().restart.pending()
    }

    /// Display name of a seat.
    pub fn name_of(&self, seat: SeatId) -> String {
        self.lock().name_of(seat)
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::Receiver;

    fn drain(rx: &mut Receiver<ServerMessage>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(m) = rx.try_recv() {
            lines.push(m.to_string());
        }
        lines
    }

    fn seated() -> (SessionHandle, Receiver<ServerMessage>, Receiver<ServerMessage>) {
        let session = SessionHandle::new();
        let (a, mut rx_a) = Outbox::channel(64);
        let (b, mut rx_b) = Outbox::channel(64);
        assert_eq!(session.admit(a), Ok(SeatId::First));
        session.set_name(SeatId::First, "alice");
        assert_eq!(session.admit(b), Ok(SeatId::Second));
        session.set_name(SeatId::Second, "bob");
        assert_eq!(drain(&mut rx_a), ["ASSIGN 1", "START"]);
        assert_eq!(drain(&mut rx_b), ["ASSIGN 2", "START"]);
        (session, rx_a, rx_b)
    }

    #[test]
    fn test_third_seat_rejected() {
        let (session, _a, _b) = seated();
        let (c, _rx) = Outbox::channel(4);
        assert_eq!(session.admit(c), Err(AdmissionError::SessionFull));
    }

    #[test]
    fn test_move_before_second_seat_is_wrong_move() {
        let session = SessionHandle::new();
        let (a, mut rx_a) = Outbox::channel(8);
        session.admit(a).unwrap();
        assert_eq!(
            session.submit_move(SeatId::First, 0, 0, Symbol::A),
            Err(MoveError::NotInProgress)
        );
        assert_eq!(drain(&mut rx_a), ["ASSIGN 1", "WRONG_MOVE"]);
    }

    #[test]
    fn test_win_broadcasts_move_turn_win_stats() {
        let (session, mut rx_a, mut rx_b) = seated();
        for (seat, r, c, s) in [
            (SeatId::First, 0, 0, Symbol::A),
            (SeatId::Second, 1, 0, Symbol::B),
            (SeatId::First, 0, 1, Symbol::A),
            (SeatId::Second, 1, 1, Symbol::B),
        ] {
            session.submit_move(seat, r, c, s).unwrap();
        }
        drain(&mut rx_a);
        drain(&mut rx_b);
        session.submit_move(SeatId::First, 0, 2, Symbol::A).unwrap();
        let expected = [
            "MOVE 0 2 A",
            "TURN B",
            "WIN A alice 0 0 0 1 0 2",
            "STATS 1 0 0",
        ];
        assert_eq!(drain(&mut rx_a), expected);
        assert_eq!(drain(&mut rx_b), expected);
        assert_eq!(session.phase(), Phase::Won);
    }

    #[test]
    fn test_foreign_symbol_rejected_for_sender_only() {
        let (session, mut rx_a, mut rx_b) = seated();
        assert!(matches!(
            session.submit_move(SeatId::Second, 0, 0, Symbol::A),
            Err(MoveError::NotYourSymbol { .. })
        ));
        assert_eq!(drain(&mut rx_b), ["WRONG_MOVE"]);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(session.board(), Board::new());
    }

    #[test]
    fn test_restart_confirm_keeps_score() {
        let (session, mut rx_a, _rx_b) = seated();
        session.submit_move(SeatId::First, 1, 1, Symbol::A).unwrap();
        let before = session.score();
        session.request_restart(SeatId::First).unwrap();
        assert_eq!(
            session.confirm_restart(SeatId::First, true),
            RestartResolution::Ignored
        );
        assert_eq!(
            session.confirm_restart(SeatId::Second, true),
            RestartResolution::Confirmed {
                requester: SeatId::First,
            }
        );
        let lines = drain(&mut rx_a);
        assert_eq!(
            lines[lines.len() - 3..],
            ["RESTART_REQUEST alice", "RESTART_CONFIRMED", "RESET"]
        );
        assert_eq!(session.board(), Board::new());
        assert_eq!(session.turn(), Symbol::A);
        assert_eq!(session.score(), before);
        assert_eq!(session.pending_restart(), None);
    }

    #[test]
    fn test_depart_broadcasts_quit_once() {
        let (session, mut rx_a, mut rx_b) = seated();
        assert!(session.depart(SeatId::Second, DepartReason::Quit));
        assert!(!session.depart(SeatId::First, DepartReason::Disconnected));
        assert_eq!(drain(&mut rx_a), ["QUIT bob"]);
        assert_eq!(drain(&mut rx_b), ["QUIT bob"]);
        assert_eq!(
            session.ended(),
            Some(SessionEnd::new(
                SeatId::Second,
                "bob".into(),
                DepartReason::Quit
            ))
        );
        let (late, _rx) = Outbox::channel(4);
        assert_eq!(session.admit(late), Err(AdmissionError::SessionEnded));
    }

    #[test]
    fn test_restart_before_start_is_refused() {
        let session = SessionHandle::new();
        let (a, mut rx_a) = Outbox::channel(8);
        session.admit(a).unwrap();

        assert_eq!(
            session.request_restart(SeatId::First),
            Err(RestartError::NotStarted)
        );
        assert_eq!(session.pending_restart(), None);
        assert_eq!(drain(&mut rx_a), ["ASSIGN 1"]);
    }

    #[test]
    fn test_nothing_changes_after_session_end() {
        let (session, mut rx_a, _rx_b) = seated();
        session.depart(SeatId::Second, DepartReason::Quit);
        assert_eq!(drain(&mut rx_a), ["QUIT bob"]);

        assert_eq!(
            session.submit_move(SeatId::First, 0, 0, Symbol::A),
            Err(MoveError::NotInProgress)
        );
        assert_eq!(
            session.request_restart(SeatId::First),
            Err(RestartError::SessionEnded)
        );
        assert_eq!(
            session.confirm_restart(SeatId::First, true),
            RestartResolution::Ignored
        );
        session.set_name(SeatId::First, "mallory");

        assert_eq!(session.board(), Board::new());
        assert_eq!(session.score(), ScoreBoard::new());
        assert_eq!(session.pending_restart(), None);
        assert_eq!(session.name_of(SeatId::First), "alice");
    }

    #[test]
    fn test_overflowing_seat_departs() {
        let session = SessionHandle::new();
        // Room for ASSIGN and START only; this seat never reads.
        let (a, _rx_a) = Outbox::channel(2);
        let (b, mut rx_b) = Outbox::channel(64);
        session.admit(a).unwrap();
        session.set_name(SeatId::First, "alice");
        session.admit(b).unwrap();

        session.submit_move(SeatId::First, 0, 0, Symbol::A).unwrap();
        assert_eq!(
            drain(&mut rx_b),
            ["ASSIGN 2", "START", "MOVE 0 0 A", "QUIT alice"]
        );
        let end = session.ended().unwrap();
        assert_eq!(*end.seat(), SeatId::First);
        assert_eq!(*end.reason(), DepartReason::Disconnected);

        assert_eq!(
            session.submit_move(SeatId::Second, 1, 1, Symbol::B),
            Err(MoveError::NotInProgress)
        );
        assert_eq!(session.board().occupied(), 1);
    }
}
