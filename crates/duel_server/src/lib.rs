//! Line-protocol server for one two-seat tic-tac-toe session.
//!
//! # Architecture
//!
//! - **Protocol**: typed encode/decode of every line in both directions
//! - **Session**: game, score, restart handshake and seats behind one lock
//! - **Broadcast**: bounded per-seat outbound queues and their writers
//! - **Connection**: per-seat receive loop
//! - **Server**: listener that seats the first two connections
//! - **Client**: headless line client
//!
//! # Example
//!
//! ```no_run
//! use duel_server::{GameServer, ServerConfig};
//!
//! # async fn example() -> Result<(), duel_server::ServerError> {
//! let server = GameServer::bind(ServerConfig::default().with_port(0)).await?;
//! println!("listening on {}", server.local_addr()?);
//! let end = server.run().await?;
//! println!("{} left: {}", end.name(), end.reason());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod broadcast;
mod client;
mod config;
mod connection;
mod error;
mod protocol;
mod server;
mod session;

/// Command-line interface.
pub mod cli;

// Crate-level exports - Protocol
pub use protocol::{ClientMessage, ProtocolError, ServerMessage, display_name};

// Crate-level exports - Session
pub use session::{AdmissionError, DepartReason, Seat, SessionEnd, SessionHandle};

// Crate-level exports - Delivery
pub use broadcast::{Delivery, Outbox, Recipient, broadcast, write_outbound};

// Crate-level exports - Networking
pub use client::{BoardView, play, run_client};
pub use connection::ConnectionHandler;
pub use server::GameServer;

// Crate-level exports - Configuration and errors
pub use config::{ConfigError, DEFAULT_PORT, MalformedInput, ServerConfig};
pub use error::ServerError;
