//! Session wire messages
//!
//! In: `{action, start_ns?, end_ns?, granularity?, symbol?, amount_ns?}`
//!
//! Out, per action: zero or more point arrays, one empty array, then
//! `{granularity}`; or a single `{error, code}`.

use serde::{Deserialize, Serialize};

use super::errors::{SessionError, SessionResult};
use crate::engine::Point;

/// Raw message as sent by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ns: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ns: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_ns: Option<i64>,
}

/// A validated user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Load {
        start_ns: i64,
        end_ns: i64,
        granularity: Option<String>,
    },
    SetGranularity(String),
    MoveUpGran,
    MoveDownGran,
    PanLeft(i64),
    PanRight(i64),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Load { .. } => "load",
            Action::SetGranularity(_) => "set_granularity",
            Action::MoveUpGran => "move_up_gran",
            Action::MoveDownGran => "move_down_gran",
            Action::PanLeft(_) => "pan_left",
            Action::PanRight(_) => "pan_right",
        }
    }
}

fn require<T>(value: Option<T>, action: &'static str, field: &'static str) -> SessionResult<T> {
    value.ok_or(SessionError::MissingField { action, field })
}

impl ClientMessage {
    pub fn parse(text: &str) -> SessionResult<Self> {
        serde_json::from_str(text).map_err(|e| SessionError::InvalidMessage(e.to_string()))
    }

    /// Converts to an `Action`, checking that required fields are present
    pub fn into_action(self) -> SessionResult<Action> {
        match self.action.as_str() {
            "load" => Ok(Action::Load {
                start_ns: require(self.start_ns, "load", "start_ns")?,
                end_ns: require(self.end_ns, "load", "end_ns")?,
                granularity: self.granularity,
            }),
            // `granularity` is accepted as an alias for `symbol`
            "set_granularity" => Ok(Action::SetGranularity(require(
                self.symbol.or(self.granularity),
                "set_granularity",
                "symbol",
            )?)),
            "move_up_gran" => Ok(Action::MoveUpGran),
            "move_down_gran" => Ok(Action::MoveDownGran),
            "pan_left" => Ok(Action::PanLeft(require(self.amount_ns, "pan_left", "amount_ns")?)),
            "pan_right" => Ok(Action::PanRight(require(
                self.amount_ns,
                "pan_right",
                "amount_ns",
            )?)),
            _ => Err(SessionError::UnknownAction(self.action)),
        }
    }
}

/// Message sent to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Ordered points; an empty chunk terminates a response
    Chunk(Vec<Point>),
    /// Level actually used for the preceding chunks
    Status { granularity: String },
    Error { error: String, code: String },
}

impl ServerMessage {
    pub fn terminator() -> Self {
        ServerMessage::Chunk(Vec::new())
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, ServerMessage::Chunk(points) if points.is_empty())
    }
}

impl From<&SessionError> for ServerMessage {
    fn from(err: &SessionError) -> Self {
        ServerMessage::Error {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}
