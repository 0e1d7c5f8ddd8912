//! Newline-delimited text protocol.
//!
//! One message per line, space-separated tokens, tag first. Both directions
//! encode through `Display` and decode through `FromStr`, so a malformed line
//! is a typed [`ProtocolError`] rather than a fault.

use duel_tictactoe::{Coord, Move, ScoreBoard, SeatId, Symbol, WinLine};
use std::fmt;
use std::str::{FromStr, SplitWhitespace};
use tracing::instrument;

/// Why a line could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ProtocolError {
    /// The line had no tokens.
    #[display("Empty line")]
    Empty,

    /// The first token is not a known tag.
    #[display("Unknown message tag {_0:?}")]
    UnknownTag(#[error(not(source))] String),

    /// A required field was absent.
    #[display("{tag}: missing {field}")]
    MissingField {
        /// Message tag.
        tag: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// A field did not parse.
    #[display("{tag}: invalid {field} {value:?}")]
    InvalidField {
        /// Message tag.
        tag: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending token.
        value: String,
    },

    /// Tokens remained after the last field.
    #[display("{tag}: unexpected token {token:?}")]
    UnexpectedToken {
        /// Message tag.
        tag: &'static str,
        /// First extra token.
        token: String,
    },
}

/// Walks the tokens after the tag.
struct Fields<'a> {
    tag: &'static str,
    tokens: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(tag: &'static str, tokens: SplitWhitespace<'a>) -> Self {
        Self { tag, tokens }
    }

    fn raw(&mut self, field: &'static str) -> Result<&'a str, ProtocolError> {
        self.tokens.next().ok_or(ProtocolError::MissingField {
            tag: self.tag,
            field,
        })
    }

    fn parse<T: FromStr>(&mut self, field: &'static str) -> Result<T, ProtocolError> {
        let raw = self.raw(field)?;
        raw.parse().map_err(|_| self.invalid(field, raw))
    }

    fn coord(&mut self, row: &'static str, col: &'static str) -> Result<Coord, ProtocolError> {
        let r: i64 = self.parse(row)?;
        let c: i64 = self.parse(col)?;
        Coord::try_new(r, c).map_err(|_| self.invalid(row, &format!("{r} {c}")))
    }

    fn flag(&mut self, field: &'static str) -> Result<bool, ProtocolError> {
        let raw = self.raw(field)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(self.invalid(field, raw)),
        }
    }

    fn invalid(&self, field: &'static str, value: &str) -> ProtocolError {
        ProtocolError::InvalidField {
            tag: self.tag,
            field,
            value: value.to_string(),
        }
    }

    fn finish(mut self) -> Result<(), ProtocolError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(token) => Err(ProtocolError::UnexpectedToken {
                tag: self.tag,
                token: token.to_string(),
            }),
        }
    }
}

/// Splits off the tag and resolves it.
fn split_tag<T>(line: &str) -> Result<(T, Fields<'_>), ProtocolError>
where
    T: FromStr + Copy + Into<&'static str>,
{
    let mut tokens = line.split_whitespace();
    let first = tokens.next().ok_or(ProtocolError::Empty)?;
    let tag: T = first
        .parse()
        .map_err(|_| ProtocolError::UnknownTag(first.to_string()))?;
    Ok((tag, Fields::new(tag.into(), tokens)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
enum ClientTag {
    Move,
    RestartRequest,
    RestartConfirm,
    Quit,
}

/// Participant to server, after the initial name line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// Attempt a move. Coordinates are carried as sent; range is checked by
    /// the game so that an off-board move is an illegal move, not a bad line.
    Move {
        /// Row as sent.
        row: i64,
        /// Column as sent.
        col: i64,
        /// Symbol claimed by the sender.
        symbol: Symbol,
    },
    /// Propose a restart.
    RestartRequest,
    /// Accept (`true`) or decline (`false`) a pending restart.
    RestartConfirm(bool),
    /// Leave the session.
    Quit,
}

impl FromStr for ClientMessage {
    type Err = ProtocolError;

    #[instrument]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (tag, mut fields) = split_tag::<ClientTag>(line)?;
        let message = match tag {
            ClientTag::Move => ClientMessage::Move {
                row: fields.parse("row")?,
                col: fields.parse("col")?,
                symbol: fields.parse("symbol")?,
            },
            ClientTag::RestartRequest => ClientMessage::RestartRequest,
            ClientTag::RestartConfirm => ClientMessage::RestartConfirm(fields.flag("accept")?),
            ClientTag::Quit => ClientMessage::Quit,
        };
        fields.finish()?;
        Ok(message)
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Move { row, col, symbol } => write!(f, "MOVE {row} {col} {symbol}"),
            ClientMessage::RestartRequest => write!(f, "RESTART_REQUEST"),
            ClientMessage::RestartConfirm(accept) => write!(f, "RESTART_CONFIRM {accept}"),
            ClientMessage::Quit => write!(f, "QUIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
enum ServerTag {
    Assign,
    Start,
    Move,
    Turn,
    Win,
    Draw,
    Reset,
    Stats,
    WrongMove,
    RestartRequest,
    RestartConfirmed,
    RestartDeclined,
    Quit,
}

/// Server to participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Seat identity just assigned.
    Assign(SeatId),
    /// Both seats connected.
    Start,
    /// A move was accepted and applied.
    Move(Move),
    /// It is now this symbol's turn.
    Turn(Symbol),
    /// A symbol completed a line.
    Win {
        /// Winning symbol.
        symbol: Symbol,
        /// Winner's display name.
        name: String,
        /// The completed line.
        line: WinLine,
    },
    /// Board full, no winner.
    Draw,
    /// Board cleared by a confirmed restart.
    Reset,
    /// Cumulative score after a terminal outcome.
    Stats {
        /// Wins by `A`.
        wins_a: u32,
        /// Wins by `B`.
        wins_b: u32,
        /// Draws.
        draws: u32,
    },
    /// Sent only to the submitter of an illegal move.
    WrongMove,
    /// A restart was requested by this display name.
    RestartRequest {
        /// Requester's display name.
        name: String,
    },
    /// Both seats agreed to restart.
    RestartConfirmed,
    /// This display name declined the restart.
    RestartDeclined {
        /// Decliner's display name.
        name: String,
    },
    /// This display name quit or disconnected; the session ends.
    Quit {
        /// Departed seat's display name.
        name: String,
    },
}

impl ServerMessage {
    /// `STATS` line for a score board.
    pub fn stats(score: &ScoreBoard) -> Self {
        ServerMessage::Stats {
            wins_a: *score.wins_a(),
            wins_b: *score.wins_b(),
            draws: *score.draws(),
        }
    }
}

impl FromStr for ServerMessage {
    type Err = ProtocolError;

    #[instrument]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (tag, mut fields) = split_tag::<ServerTag>(line)?;
        let message = match tag {
            ServerTag::Assign => {
                let number: u8 = fields.parse("id")?;
                let seat = SeatId::from_number(number)
                    .ok_or_else(|| fields.invalid("id", &number.to_string()))?;
                ServerMessage::Assign(seat)
            }
            ServerTag::Start => ServerMessage::Start,
            ServerTag::Move => {
                let coord = fields.coord("row", "col")?;
                ServerMessage::Move(Move::new(fields.parse("symbol")?, coord))
            }
            ServerTag::Turn => ServerMessage::Turn(fields.parse("symbol")?),
            ServerTag::Win => ServerMessage::Win {
                symbol: fields.parse("symbol")?,
                name: fields.raw("name")?.to_string(),
                line: WinLine([
                    fields.coord("r0", "c0")?,
                    fields.coord("r1", "c1")?,
                    fields.coord("r2", "c2")?,
                ]),
            },
            ServerTag::Draw => ServerMessage::Draw,
            ServerTag::Reset => ServerMessage::Reset,
            ServerTag::Stats => ServerMessage::Stats {
                wins_a: fields.parse("wins_a")?,
                wins_b: fields.parse("wins_b")?,
                draws: fields.parse("draws")?,
            },
            ServerTag::WrongMove => ServerMessage::WrongMove,
            ServerTag::RestartRequest => ServerMessage::RestartRequest {
                name: fields.raw("name")?.to_string(),
            },
            ServerTag::RestartConfirmed => ServerMessage::RestartConfirmed,
            ServerTag::RestartDeclined => ServerMessage::RestartDeclined {
                name: fields.raw("name")?.to_string(),
            },
            ServerTag::Quit => ServerMessage::Quit {
                name: fields.raw("name")?.to_string(),
            },
        };
        fields.finish()?;
        Ok(message)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Assign(seat) => write!(f, "ASSIGN {seat}"),
            ServerMessage::Start => write!(f, "START"),
            ServerMessage::Move(m) => write!(f, "MOVE {m}"),
            ServerMessage::Turn(symbol) => write!(f, "TURN {symbol}"),
            ServerMessage::Win { symbol, name, line } => write!(f, "WIN {symbol} {name} {line}"),
            ServerMessage::Draw => write!(f, "DRAW"),
            ServerMessage::Reset => write!(f, "RESET"),
            ServerMessage::Stats {
                wins_a,
                wins_b,
                draws,
            } => write!(f, "STATS {wins_a} {wins_b} {draws}"),
            ServerMessage::WrongMove => write!(f, "WRONG_MOVE"),
            ServerMessage::RestartRequest { name } => write!(f, "RESTART_REQUEST {name}"),
            ServerMessage::RestartConfirmed => write!(f, "RESTART_CONFIRMED"),
            ServerMessage::RestartDeclined { name } => write!(f, "RESTART_DECLINED {name}"),
            ServerMessage::Quit { name } => write!(f, "QUIT {name}"),
        }
    }
}

/// Normalizes a participant's first line into a single-token display name.
///
/// Surrounding whitespace is dropped and inner runs become `_`; an empty
/// result falls back to `Player<id>`.
#[instrument]
pub fn display_name(raw: &str, seat: SeatId) -> String {
    let name = raw.split_whitespace().collect::<Vec<_>>().join("_");
    if name.is_empty() {
        seat.default_name()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_tictactoe::rules::LINES;

    #[test]
    fn test_decode_client_move() {
        assert_eq!(
            "MOVE 1 2 B".parse(),
            Ok(ClientMessage::Move {
                row: 1,
                col: 2,
                symbol: Symbol::B,
            })
        );
    }

    #[test]
    fn test_off_board_move_still_decodes() {
        assert_eq!(
            "MOVE -1 7 A".parse(),
            Ok(ClientMessage::Move {
                row: -1,
                col: 7,
                symbol: Symbol::A,
            })
        );
    }

    #[test]
    fn test_decode_restart_confirm() {
        assert_eq!(
            "RESTART_CONFIRM true".parse(),
            Ok(ClientMessage::RestartConfirm(true))
        );
        assert_eq!(
            "RESTART_CONFIRM FALSE".parse(),
            Ok(ClientMessage::RestartConfirm(false))
        );
        assert!(matches!(
            "RESTART_CONFIRM maybe".parse::<ClientMessage>(),
            Err(ProtocolError::InvalidField {
                field: "accept",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_client_lines() {
        assert_eq!("".parse::<ClientMessage>(), Err(ProtocolError::Empty));
        assert_eq!(
            "JUMP 1 1".parse::<ClientMessage>(),
            Err(ProtocolError::UnknownTag("JUMP".into()))
        );
        assert_eq!(
            "MOVE 1".parse::<ClientMessage>(),
            Err(ProtocolError::MissingField {
                tag: "MOVE",
                field: "col",
            })
        );
        assert!(matches!(
            "MOVE a 1 A".parse::<ClientMessage>(),
            Err(ProtocolError::InvalidField { field: "row", .. })
        ));
        assert!(matches!(
            "MOVE 1 1 X".parse::<ClientMessage>(),
            Err(ProtocolError::InvalidField {
                field: "symbol",
                ..
            })
        ));
        assert!(matches!(
            "QUIT now".parse::<ClientMessage>(),
            Err(ProtocolError::UnexpectedToken { tag: "QUIT", .. })
        ));
    }

    #[test]
    fn test_encode_server_lines() {
        let win = ServerMessage::Win {
            symbol: Symbol::A,
            name: "alice".into(),
            line: LINES[0],
        };
        assert_eq!(win.to_string(), "WIN A alice 0 0 0 1 0 2");
        assert_eq!(
            ServerMessage::Assign(SeatId::Second).to_string(),
            "ASSIGN 2"
        );
        assert_eq!(ServerMessage::WrongMove.to_string(), "WRONG_MOVE");
        assert_eq!(
            ServerMessage::stats(&ScoreBoard::new()).to_string(),
            "STATS 0 0 0"
        );
    }

    #[test]
    fn test_decode_server_win() {
        let msg: ServerMessage = "WIN B bob 0 2 1 1 2 0".parse().unwrap();
        assert_eq!(
            msg,
            ServerMessage::Win {
                symbol: Symbol::B,
                name: "bob".into(),
                line: LINES[7],
            }
        );
        assert!("ASSIGN 3".parse::<ServerMessage>().is_err());
        assert!("WIN A alice 0 0 0 1".parse::<ServerMessage>().is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name("  Ada  Lovelace ", SeatId::First),
            "Ada_Lovelace"
        );
        assert_eq!(display_name("   ", SeatId::Second), "Player2");
    }
}
