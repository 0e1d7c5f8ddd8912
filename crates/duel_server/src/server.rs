//! Listener and session manager.
//!
//! Accepts connections until the session ends. The first two become seats;
//! later ones are closed immediately.

use crate::broadcast::{Outbox, write_outbound};
use crate::config::ServerConfig;
use crate::connection::ConnectionHandler;
use crate::error::ServerError;
use crate::session::{SessionEnd, SessionHandle};
use duel_tictactoe::Phase;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// How long queued notifications may take to reach peers after the session ends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP front end for one [`SessionHandle`].
#[derive(Debug)]
pub struct GameServer {
    listener: TcpListener,
    config: ServerConfig,
    session: SessionHandle,
}

impl GameServer {
    /// Binds the listener. Failure here is fatal: no session is started.
    #[instrument(skip(config), fields(addr = %config.bind_addr()))]
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::new(format!("Failed to bind {addr}: {e}")))?;
        info!(addr = %listener.local_addr()?, "Listening for players");
        Ok(Self {
            listener,
            config,
            session: SessionHandle::new(),
        })
    }

    /// Address actually bound (useful with port `0`).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the session this server mediates.
    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    /// Runs the session to completion.
    ///
    /// Returns once a seat quits or disconnects and every queued notification
    /// has been written (or [`DRAIN_TIMEOUT`] has passed).
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<SessionEnd, ServerError> {
        let mut end_rx = self.session.subscribe_end();
        let mut writers = JoinSet::new();
        let mut readers = JoinSet::new();

        let end = loop {
            tokio::select! {
                changed = end_rx.changed() => {
                    changed.map_err(|_| ServerError::new("Session end channel closed"))?;
                    if let Some(end) = self.session.ended() {
                        break end;
                    }
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.seat(stream, peer, &mut writers, &mut readers),
                    Err(e) if self.session.phase() == Phase::WaitingForPlayers => {
                        error!(error = %e, "Accept failed before the game started");
                        return Err(ServerError::new(format!("Accept failed: {}", e)));
                    }
                    Err(e) => warn!(error = %e, "Accept failed"),
                },
            }
        };

        info!(seat = %end.seat(), name = %end.name(), reason = %end.reason(), "Session ended");

        let drain = async { while writers.join_next().await.is_some() {} };
        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            warn!("Outbound queues not drained in time");
            writers.shutdown().await;
        }
        readers.shutdown().await;
        Ok(end)
    }

    #[instrument(skip(self, stream, writers, readers))]
    fn seat(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        writers: &mut JoinSet<()>,
        readers: &mut JoinSet<()>,
    ) {
        let (outbox, rx) = Outbox::channel(*self.config.outbound_capacity());
        let seat = match self.session.admit(outbox) {
            Ok(seat) => seat,
            Err(e) => {
                info!(%peer, reason = %e, "Connection refused");
                return;
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "Could not disable Nagle");
        }
        let (read_half, write_half) = stream.into_split();

        writers.spawn(async move {
            if let Err(e) = write_outbound(seat, rx, write_half).await {
                debug!(%seat, error = %e, "Writer ended with error");
            }
        });

        let handler = ConnectionHandler::new(
            seat,
            self.session.clone(),
            *self.config.malformed_input(),
        );
        readers.spawn(handler.run(read_half));
        info!(%peer, %seat, "Player connected");
    }
}
