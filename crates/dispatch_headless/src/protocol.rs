//! JSON protocol for headless dispatch sessions.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses and engine state
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","now_ms":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Player commands are answered with `ack`; time commands with `events`
//! 4. `query` returns the full player view
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","now_ms":0}
//! -> {"cmd":"answer_call"}
//! <- {"type":"ack","cmd":"answer_call","applied":true}
//! -> {"cmd":"start","difficulty":"easy"}
//! <- {"type":"ack","cmd":"start","applied":true}
//! -> {"cmd":"dispatch","label":"R14"}
//! <- {"type":"ack","cmd":"dispatch","applied":true}
//! -> {"cmd":"wait","ms":15000}
//! <- {"type":"events","now_ms":15000,"events":[{"event":"unit_arrived",...}]}
//! -> {"cmd":"dispatch","x":3,"y":3}
//! <- {"type":"ack","cmd":"dispatch","applied":true}
//! -> {"cmd":"dispatch","x":4,"y":4}
//! <- {"type":"ack","cmd":"dispatch","applied":false,"reason":"a unit is already en route"}
//! ```

use dispatch_core::events::GameEvent;
use dispatch_core::view::{DebugView, GameView};
use serde::{Deserialize, Serialize};

/// Protocol version announced in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Pick up the incoming call.
    AnswerCall,

    /// Start a session (`easy`, `medium` or `hard`, any case).
    Start { difficulty: String },

    /// Send a unit to `x`/`y` or to a map label such as `R14`.
    Dispatch {
        #[serde(default)]
        x: Option<i32>,
        #[serde(default)]
        y: Option<i32>,
        #[serde(default)]
        label: Option<String>,
    },

    /// Fire the game clock N times (default: 1).
    Clock {
        #[serde(default = "default_count")]
        count: u32,
    },

    /// Fire the travel clock N times (default: 1).
    Travel {
        #[serde(default = "default_count")]
        count: u32,
    },

    /// Advance the unit on the road by a fraction of the trip.
    Advance { fraction: f64 },

    /// Let simulated time pass through the built-in scheduler.
    Wait { ms: u64 },

    /// Query the player view without advancing time.
    Query,

    /// Toggle the debug overlay and report it.
    Debug,

    /// Return to the incoming call.
    Reset,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, now_ms: u64 },

    /// A player command was processed.
    Ack {
        cmd: String,
        applied: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Events produced by a command or by elapsed time.
    Events { now_ms: u64, events: Vec<GameEvent> },

    /// Full player view.
    State {
        now_ms: u64,
        hash: u64,
        view: GameView,
    },

    /// Debug overlay state.
    Debug {
        enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view: Option<DebugView>,
    },

    /// State hash for determinism verification.
    Hash { now_ms: u64, hash: u64 },

    /// Error processing a command.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(now_ms: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            now_ms,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, applied: bool, reason: Option<String>) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            applied,
            reason,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AnswerCall => "answer_call",
            Self::Start { .. } => "start",
            Self::Dispatch { .. } => "dispatch",
            Self::Clock { .. } => "clock",
            Self::Travel { .. } => "travel",
            Self::Advance { .. } => "advance",
            Self::Wait { .. } => "wait",
            Self::Query => "query",
            Self::Debug => "debug",
            Self::Reset => "reset",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
