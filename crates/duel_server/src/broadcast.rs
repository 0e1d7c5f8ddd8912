//! Outbound delivery.
//!
//! Every seat owns a bounded queue drained by its own writer task. Session
//! code pushes into the queues while it still holds the session lock, so both
//! seats observe notifications in mutation order, and a slow reader can only
//! fill its own queue.

use crate::protocol::ServerMessage;
use duel_tictactoe::SeatId;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, instrument, warn};

/// What became of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the writer.
    Queued,
    /// The outbox was already closed, or its writer is gone.
    Dropped,
    /// The queue was full; the outbox is now closed.
    Overflowed,
}

/// Sending side of one seat's outbound queue.
///
/// Once closed, deliveries are silent no-ops.
#[derive(Debug)]
pub struct Outbox {
    tx: Option<mpsc::Sender<ServerMessage>>,
}

impl Outbox {
    /// Creates a queue of `capacity` messages and its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// An outbox that discards everything.
    pub fn closed() -> Self {
        Self { tx: None }
    }

    /// Whether deliveries still reach a writer.
    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    /// Queues a message without waiting.
    ///
    /// A full queue means the peer stopped reading; the outbox is closed and
    /// [`Delivery::Overflowed`] tells the caller to treat the seat as gone. A
    /// dropped receiver closes it quietly.
    #[instrument(skip(self, message), fields(%message))]
    pub fn deliver(&mut self, seat: SeatId, message: ServerMessage) -> Delivery {
        let Some(tx) = &self.tx else {
            debug!(%seat, "Outbox closed, dropping message");
            return Delivery::Dropped;
        };
        match tx.try_send(message) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                warn!(%seat, "Outbound queue full, closing seat's outbox");
                self.tx = None;
                Delivery::Overflowed
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%seat, "Writer gone, closing seat's outbox");
                self.tx = None;
                Delivery::Dropped
            }
        }
    }

    /// Closes the queue. The writer drains what is already queued, then ends.
    pub fn close(&mut self) {
        self.tx = None;
    }
}

/// Something that can be addressed by the broadcast channel.
pub trait Recipient {
    /// Seat this recipient belongs to.
    fn seat(&self) -> SeatId;

    /// The recipient's outbox.
    fn outbox(&mut self) -> &mut Outbox;
}

/// Delivers `message` to every recipient, in order, and returns the seats
/// whose queues overflowed.
///
/// A failed recipient never prevents delivery to the others.
#[instrument(skip(recipients, message), fields(%message))]
pub fn broadcast<R: Recipient>(recipients: &mut [R], message: &ServerMessage) -> Vec<SeatId> {
    let mut overflowed = Vec::new();
    for recipient in recipients.iter_mut() {
        let seat = recipient.seat();
        if recipient.outbox().deliver(seat, message.clone()) == Delivery::Overflowed {
            overflowed.push(seat);
        }
    }
    overflowed
}

/// Writes queued messages to the transport, one line each, flushing after
/// every line. Ends when the queue is closed and drained, or on write error.
#[instrument(skip(rx, writer))]
pub async fn write_outbound<W>(
    seat: SeatId,
    mut rx: mpsc::Receiver<ServerMessage>,
    mut writer: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let line = format!("{message}\n");
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!(%seat, error = %e, "Write failed, stopping writer");
            return Err(e);
        }
        writer.flush().await?;
        debug!(%seat, %message, "Sent");
    }
    debug!(%seat, "Outbound queue closed");
    writer.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestSeat {
        seat: SeatId,
        outbox: Outbox,
    }

    impl Recipient for TestSeat {
        fn seat(&self) -> SeatId {
            self.seat
        }

        fn outbox(&mut self) -> &mut Outbox {
            &mut self.outbox
        }
    }

    #[test]
    fn test_full_queue_closes_only_that_outbox() {
        let (slow, _slow_rx) = Outbox::channel(1);
        let (fast, mut fast_rx) = Outbox::channel(8);
        let mut seats = [
            TestSeat {
                seat: SeatId::First,
                outbox: slow,
            },
            TestSeat {
                seat: SeatId::Second,
                outbox: fast,
            },
        ];
        assert!(broadcast(&mut seats, &ServerMessage::Start).is_empty());
        assert_eq!(broadcast(&mut seats, &ServerMessage::Draw), [SeatId::First]);
        assert!(broadcast(&mut seats, &ServerMessage::Reset).is_empty());

        assert!(!seats[0].outbox.is_open());
        assert!(seats[1].outbox.is_open());
        assert_eq!(fast_rx.try_recv().unwrap(), ServerMessage::Start);
        assert_eq!(fast_rx.try_recv().unwrap(), ServerMessage::Draw);
    }

    #[test]
    fn test_closed_outbox_is_noop() {
        let mut outbox = Outbox::closed();
        assert_eq!(
            outbox.deliver(SeatId::First, ServerMessage::Reset),
            Delivery::Dropped
        );
        assert!(!outbox.is_open());
    }

    #[tokio::test]
    async fn test_writer_emits_lines_and_drains_on_close() {
        let (mut outbox, rx) = Outbox::channel(4);
        outbox.deliver(SeatId::First, ServerMessage::Assign(SeatId::First));
        outbox.deliver(SeatId::First, ServerMessage::Start);
        outbox.close();

        let mut sink = Vec::new();
        write_outbound(SeatId::First, rx, &mut sink).await.unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "ASSIGN 1\nSTART\n");
    }
}
