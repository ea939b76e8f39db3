//! TBP message shapes.
//!
//! Outbound messages are modelled as the [`Outbound`] enum and serialised
//! with an internal `"type"` tag:
//!
//! | `type`      | Fields                                                   |
//! |-------------|----------------------------------------------------------|
//! | `rules`     | —                                                        |
//! | `start`     | `board`, `queue`, `hold` (null), `combo` (0), `back_to_back` (false) |
//! | `suggest`   | —                                                        |
//! | `play`      | `move` (opaque, copied from a suggestion)                |
//! | `new_piece` | `piece`                                                  |
//! | `stop`      | —                                                        |
//! | `quit`      | —                                                        |
//!
//! Inbound traffic is only inspected structurally: [`is_ready`] for the
//! handshake, [`first_move`] and [`is_empty_suggestion`] for suggestion
//! replies. Anything that does not parse is treated as "nothing there".

use serde::Serialize;
use serde_json::Value;

use crate::models::board::Board;
use crate::models::queue::Queue;
use crate::Result;

/// A message sent from the probe to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Ask the engine which rules it supports.
    Rules,
    /// Begin a game from the given position.
    Start {
        /// Initial playfield.
        board: Board,
        /// Upcoming pieces.
        queue: Queue,
        /// Held piece; always empty at start.
        hold: Option<String>,
        /// Current combo count.
        combo: u32,
        /// Whether back-to-back is active.
        back_to_back: bool,
    },
    /// Ask for move suggestions.
    Suggest,
    /// Tell the engine which move was played.
    Play {
        /// Move value echoed verbatim from a suggestion reply.
        #[serde(rename = "move")]
        mv: Value,
    },
    /// Announce a piece appended to the queue.
    NewPiece {
        /// Piece letter.
        piece: String,
    },
    /// Stop the current game.
    Stop,
    /// Ask the engine to exit.
    Quit,
}

impl Outbound {
    /// `start` message for an empty board, no hold, no combo, no back-to-back.
    #[must_use]
    pub fn start(board: Board, queue: Queue) -> Self {
        Self::Start {
            board,
            queue,
            hold: None,
            combo: 0,
            back_to_back: false,
        }
    }

    /// Wire name carried in the `type` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Start { .. } => "start",
            Self::Suggest => "suggest",
            Self::Play { .. } => "play",
            Self::NewPiece { .. } => "new_piece",
            Self::Stop => "stop",
            Self::Quit => "quit",
        }
    }

    /// Serialise to a single compact JSON line without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol` if serialisation fails.
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Whether `line` is the engine's `ready` reply.
///
/// The line must parse as a JSON object whose `type` is the string `"ready"`.
#[must_use]
pub fn is_ready(line: &str) -> bool {
    parse_object(line).is_some_and(|v| v.get("type").and_then(Value::as_str) == Some("ready"))
}

/// First move offered by a suggestion reply.
///
/// Returns `None` when the line is not JSON, is not an object, has no `moves`
/// list, has an empty list, or the first entry has no content: `null`,
/// `false`, `0`, `""`, `[]` or `{}`.
#[must_use]
pub fn first_move(line: &str) -> Option<Value> {
    let reply = parse_object(line)?;
    reply
        .get("moves")?
        .as_array()?
        .first()
        .filter(|mv| has_content(mv))
        .cloned()
}

/// Whether `line` is a suggestion reply carrying an explicitly empty
/// `moves` list.
///
/// Some engines answer the first `suggest` this way while they are still
/// thinking; this is the only condition that earns a second `suggest`.
#[must_use]
pub fn is_empty_suggestion(line: &str) -> bool {
    parse_object(line).is_some_and(|v| {
        v.get("moves")
            .and_then(Value::as_array)
            .is_some_and(Vec::is_empty)
    })
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn parse_object(line: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(line.trim()) {
        Ok(v) if v.is_object() => Some(v),
        _ => None,
    }
}
