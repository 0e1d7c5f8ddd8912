//! Headless line client.
//!
//! Sends the display name, forwards input lines to the server verbatim and
//! prints a readable rendering of every server line.

use crate::protocol::ServerMessage;
use derive_getters::Getters;
use duel_tictactoe::{Board, SeatId, Symbol};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Client-side picture of the session, rebuilt from server notifications.
#[derive(Debug, Clone, Default, Getters)]
pub struct BoardView {
    /// Board as last reported.
    board: Board,
    /// Our seat, once assigned.
    seat: Option<SeatId>,
    /// Symbol to move.
    turn: Symbol,
    /// Last `STATS`: wins by A, wins by B, draws.
    stats: [u32; 3],
}

impl BoardView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a notification into the view and returns its rendering.
    #[instrument(skip(self))]
    pub fn apply(&mut self, message: &ServerMessage) -> String {
        match message {
            ServerMessage::Assign(seat) => {
                self.seat = Some(*seat);
                format!("You are player {}, playing {}.", seat, seat.symbol())
            }
            ServerMessage::Start => {
                self.board.clear();
                self.turn = Symbol::A;
                format!(
                    "Both players connected. {} moves first.\n{}",
                    Symbol::A,
                    self.board.display()
                )
            }
            ServerMessage::Move(mv) => {
                if let Err(e) = self.board.place(mv.coord, mv.symbol) {
                    warn!(error = %e, "Server move disagrees with local board");
                }
                self.board.display()
            }
            ServerMessage::Turn(symbol) => {
                self.turn = *symbol;
                if self.seat.map(SeatId::symbol) == Some(*symbol) {
                    "Your turn.".to_string()
                } else {
                    format!("Waiting for {}.", symbol)
                }
            }
            ServerMessage::Win { symbol, name, line } => {
                format!("{} ({}) wins along {}.", name, symbol, line)
            }
            ServerMessage::Draw => "Draw.".to_string(),
            ServerMessage::Reset => {
                self.board.clear();
                self.turn = Symbol::A;
                format!("Board reset.\n{}", self.board.display())
            }
            ServerMessage::Stats {
                wins_a,
                wins_b,
                draws,
            } => {
                self.stats = [*wins_a, *wins_b, *draws];
                format!("Score: A {} - B {}, draws {}", wins_a, wins_b, draws)
            }
            ServerMessage::WrongMove => "Illegal move, try again.".to_string(),
            ServerMessage::RestartRequest { name } => {
                format!(
                    "{} wants to restart. Answer with RESTART_CONFIRM true|false.",
                    name
                )
            }
            ServerMessage::RestartConfirmed => "Restart confirmed.".to_string(),
            ServerMessage::RestartDeclined { name } => format!("{} declined the restart.", name),
            ServerMessage::Quit { name } => format!("{} left. Game over.", name),
        }
    }
}

/// Connects to `addr` and plays from stdin/stdout.
#[instrument]
pub async fn run_client(addr: &str, name: &str) -> std::io::Result<BoardView> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    info!(%addr, "Connected");
    let (reader, writer) = stream.into_split();
    play(
        reader,
        writer,
        tokio::io::stdin(),
        tokio::io::stdout(),
        name,
    )
    .await
}

/// Drives one client session over arbitrary transports.
///
/// Ends when the server announces `QUIT` or closes the connection. Input
/// running dry does not end the session.
#[instrument(skip(server_in, server_out, input, output))]
pub async fn play<SR, SW, I, O>(
    server_in: SR,
    mut server_out: SW,
    input: I,
    mut output: O,
    name: &str,
) -> std::io::Result<BoardView>
where
    SR: AsyncRead + Unpin,
    SW: AsyncWrite + Unpin,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    server_out.write_all(format!("{}\n", name).as_bytes()).await?;
    server_out.flush().await?;

    let mut view = BoardView::new();
    let mut server_lines = BufReader::new(server_in).lines();
    let mut input_lines = BufReader::new(input).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                let Some(line) = line? else {
                    info!("Server closed the connection");
                    break;
                };
                let message = match line.parse::<ServerMessage>() {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(%line, error = %e, "Undecodable server line");
                        continue;
                    }
                };
                let rendered = view.apply(&message);
                output.write_all(format!("{}\n", rendered).as_bytes()).await?;
                output.flush().await?;
                if matches!(message, ServerMessage::Quit { .. }) {
                    break;
                }
            }
            line = input_lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        debug!(%line, "Forwarding");
                        server_out.write_all(format!("{}\n", line.trim()).as_bytes()).await?;
                        server_out.flush().await?;
                    }
                    None => input_open = false,
                }
            }
        }
    }
    Ok(view)
}
