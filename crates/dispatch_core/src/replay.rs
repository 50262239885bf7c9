//! Recording and replaying sessions.
//!
//! A replay is the list of player commands with the simulated millisecond
//! at which each was issued. Because the engine is deterministic, feeding
//! the same commands at the same times into a fresh engine reproduces the
//! session exactly; the recorded final hash proves it.
//!
//! Replays double as hand-written scripts: leave `final_hash` out and
//! [`Replay::play`] simply runs the commands.
//!
//! ```ron
//! (
//!     label: "easy first clue",
//!     commands: [
//!         (at_ms: 0, command: AnswerCall),
//!         (at_ms: 0, command: Start(difficulty: EASY)),
//!         (at_ms: 2000, command: Dispatch(destination: (x: 17, y: 13))),
//!     ],
//!     final_ms: 20000,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{DispatchError, Result};
use crate::game::{CommandOutcome, DispatchGame, PlayerCommand};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// A single command record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCommand {
    /// Simulated time the command was issued.
    pub at_ms: u64,
    /// The command.
    pub command: PlayerCommand,
}

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Free-form name.
    #[serde(default)]
    pub label: String,
    /// Commands in time order.
    pub commands: Vec<ReplayCommand>,
    /// Simulated time at which recording stopped.
    #[serde(default)]
    pub final_ms: u64,
    /// Engine hash at `final_ms`, if recorded.
    #[serde(default)]
    pub final_hash: Option<u64>,
}

const fn default_version() -> u32 {
    REPLAY_VERSION
}

impl Replay {
    /// Create an empty replay.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            version: REPLAY_VERSION,
            label: label.into(),
            commands: Vec::new(),
            final_ms: 0,
            final_hash: None,
        }
    }

    /// Record a command issued at `at_ms`.
    pub fn record(&mut self, at_ms: u64, command: PlayerCommand) {
        self.commands.push(ReplayCommand { at_ms, command });
    }

    /// Finalize the replay with end-of-recording state.
    pub fn finalize(&mut self, game: &DispatchGame) {
        self.final_ms = game.now_ms();
        self.final_hash = Some(game.state_hash());
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Parse a replay from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidReplay`] on malformed text, a version
    /// mismatch or commands out of time order.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let replay: Self = ron::from_str(text)
            .map_err(|e| DispatchError::InvalidReplay(format!("Failed to parse replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(DispatchError::InvalidReplay(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }
        if replay
            .commands
            .windows(2)
            .any(|pair| pair[1].at_ms < pair[0].at_ms)
        {
            return Err(DispatchError::InvalidReplay(
                "commands are not in time order".to_string(),
            ));
        }
        Ok(replay)
    }

    /// Render as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| DispatchError::InvalidReplay(format!("Failed to serialize replay: {e}")))
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = self.to_ron_string()?;
        std::fs::write(path.as_ref(), text)
            .map_err(|e| DispatchError::InvalidReplay(format!("Failed to write replay file: {e}")))
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file reading or parsing fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DispatchError::InvalidReplay(format!("Failed to read replay file: {e}")))?;
        Self::from_ron_str(&text)
    }

    /// Run the replay through a fresh engine.
    ///
    /// Time is advanced to each command's timestamp before it is applied,
    /// then to `final_ms` (or the last command, if later).
    #[must_use]
    pub fn play(&self, config: EngineConfig) -> DispatchGame {
        let mut game = DispatchGame::new(config);
        for entry in &self.commands {
            game.run_for(entry.at_ms.saturating_sub(game.now_ms()));
            if let CommandOutcome::Ignored { reason } = game.apply(entry.command) {
                tracing::trace!(at_ms = entry.at_ms, %reason, "Replayed command ignored");
            }
        }
        game.run_for(self.final_ms.saturating_sub(game.now_ms()));
        game
    }

    /// Replay and compare against the recorded hash.
    ///
    /// Returns the hash the replay produced.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidReplay`] if a hash was recorded and
    /// the replay does not reproduce it.
    pub fn verify(&self, config: EngineConfig) -> Result<u64> {
        let hash = self.play(config).state_hash();
        match self.final_hash {
            Some(expected) if expected != hash => Err(DispatchError::InvalidReplay(format!(
                "desync: expected hash {expected:#018x}, got {hash:#018x}"
            ))),
            _ => Ok(hash),
        }
    }
}
