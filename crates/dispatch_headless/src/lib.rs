//! Headless dispatch runner for bot testing and CI verification.
//!
//! This crate drives the dispatch engine without any presentation layer,
//! controlled via JSON commands on stdin with engine state on stdout. This
//! enables:
//!
//! - **Bot testing**: A strategy or external agent can play full sessions
//! - **CI verification**: Automated checks of session rules and timing
//! - **Replay verification**: Check that replays produce identical hashes
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (answer_call, start, dispatch, wait, etc.)
//! - **stdout**: Responses and engine state (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"answer_call"}' | cargo run -p dispatch_headless
//!
//! # Let a bot play
//! cargo run -p dispatch_headless -- autoplay --difficulty hard --strategy oracle
//!
//! # Verify determinism
//! cargo run -p dispatch_headless -- verify --script scripts/easy_win.ron
//! ```

pub mod data_loader;
pub mod game_runner;
pub mod protocol;
pub mod runner;
pub mod strategies;

pub use data_loader::{load_config, load_config_or_default, load_script, LoadError};
pub use game_runner::{AutoplayResult, DeterminismReport, GameRunner, RunnerError};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use strategies::{Strategy, StrategyKind};
