//! Per-seat receive loop.

use crate::config::MalformedInput;
use crate::protocol::{ClientMessage, ProtocolError};
use crate::session::{DepartReason, SessionHandle};
use derive_new::new;
use duel_tictactoe::SeatId;
use std::ops::ControlFlow;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, instrument, warn};

/// Reads one seat's lines and forwards decoded intents to the session.
#[derive(Debug, Clone, new)]
pub struct ConnectionHandler {
    seat: SeatId,
    session: SessionHandle,
    policy: MalformedInput,
}

impl ConnectionHandler {
    /// Runs until the seat quits, disconnects, violates the protocol (under
    /// [`MalformedInput::Disconnect`]) or the session ends.
    ///
    /// The first line is the display name.
    #[instrument(skip(self, reader), fields(seat = %self.seat))]
    pub async fn run<R>(self, reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();

        match lines.next_line().await {
            Ok(Some(name)) => self.session.set_name(self.seat, &name),
            Ok(None) => return self.depart(DepartReason::Disconnected),
            Err(e) => {
                warn!(error = %e, "Read failed before name");
                return self.depart(DepartReason::Disconnected);
            }
        }

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Peer closed connection");
                    return self.depart(DepartReason::Disconnected);
                }
                Err(e) => {
                    warn!(error = %e, "Read failed");
                    return self.depart(DepartReason::Disconnected);
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let flow = match line.parse::<ClientMessage>() {
                Ok(message) => self.dispatch(message),
                Err(e) => self.malformed(&line, e),
            };
            if flow.is_break() {
                return;
            }
        }
    }

    fn dispatch(&self, message: ClientMessage) -> ControlFlow<()> {
        debug!(%message, "Received");
        match message {
            ClientMessage::Move { row, col, symbol } => {
                // Rejections are reported to the seat by the session.
                let _ = self.session.submit_move(self.seat, row, col, symbol);
            }
            ClientMessage::RestartRequest => {
                if let Err(e) = self.session.request_restart(self.seat) {
                    debug!(error = %e, "Restart request ignored");
                }
            }
            ClientMessage::RestartConfirm(accept) => {
                self.session.confirm_restart(self.seat, accept);
            }
            ClientMessage::Quit => {
                self.depart(DepartReason::Quit);
                return ControlFlow::Break(());
            }
        }
        if self.session.ended().is_some() {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn malformed(&self, line: &str, error: ProtocolError) -> ControlFlow<()> {
        match self.policy {
            MalformedInput::Disconnect => {
                warn!(line, error = %error, "Malformed line, disconnecting seat");
                self.depart(DepartReason::ProtocolViolation);
                ControlFlow::Break(())
            }
            MalformedInput::Ignore => {
                warn!(line, error = %error, "Malformed line ignored");
                ControlFlow::Continue(())
            }
        }
    }

    fn depart(&self, reason: DepartReason) {
        self.session.depart(self.seat, reason);
    }
}
