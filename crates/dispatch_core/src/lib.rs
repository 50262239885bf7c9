//! # Dispatch Core
//!
//! Dispatch resolution engine for the "Last Call" emergency dispatch game.
//!
//! The operator listens to a trail of audio clues, sends one unit at a time
//! to a block on a 20×20 city grid, and wins by confirming the caller's
//! location for every clue before running out of units or time.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond explicit replay save/load
//! - No wall clock (hosts report elapsed time)
//! - No floating-point resolution (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`session`] - Session state and its transition function
//! - [`transit`] - The unit on the road and arrival resolution
//! - [`catalog`] - Clue trail and acceptance test
//! - [`difficulty`] - Per-difficulty unit and time budgets
//! - [`game`] - The controller tying them together
//! - [`clock`] - Simulated time and periodic ticks
//! - [`view`] - Read-only projections for a presentation layer
//! - [`replay`] - Recording and deterministic playback

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod events;
pub mod game;
pub mod grid;
pub mod math;
pub mod replay;
pub mod session;
pub mod transit;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Clue, ClueCatalog};
    pub use crate::clock::{format_clock, GameClock, CLOCK_TICK_MS, TRAVEL_TICK_MS};
    pub use crate::config::EngineConfig;
    pub use crate::difficulty::{Difficulty, DifficultyProfile, ProfileTable};
    pub use crate::error::{DispatchError, Result};
    pub use crate::events::{GameEvent, IgnoreReason};
    pub use crate::game::{CommandOutcome, DispatchGame, PlayerCommand};
    pub use crate::grid::{GridPos, GRID_SIZE};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::replay::Replay;
    pub use crate::session::{
        reduce, ClueStatus, LossReason, Phase, Reduction, SessionEvent, SessionState,
    };
    pub use crate::transit::{ArrivalOutcome, DispatchId, DispatchTracker, InFlightDispatch};
    pub use crate::view::{DebugView, GameSummary, GameView, Outcome, TransitView};
}
