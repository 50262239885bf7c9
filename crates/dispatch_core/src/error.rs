//! Error types for the dispatch engine.
//!
//! Rejected player commands are not errors; see
//! [`CommandOutcome`](crate::game::CommandOutcome).

use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Top-level error type for engine data and tooling errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or source name) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Clue catalog or difficulty table failed integrity checks.
    #[error("Invalid engine data: {0}")]
    InvalidCatalog(String),

    /// Difficulty key outside `EASY`/`MEDIUM`/`HARD`.
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    /// A grid label such as `R14` could not be parsed or is off the map.
    #[error("Invalid grid label: {0}")]
    InvalidGridLabel(String),

    /// Replay could not be loaded, saved, or did not reproduce.
    #[error("Invalid replay: {0}")]
    InvalidReplay(String),
}
