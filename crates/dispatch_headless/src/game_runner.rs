//! Bot-driven sessions for headless testing.
//!
//! Runs a complete session with a [`Strategy`] at the controls, records
//! every command into a [`Replay`], and checks that replays reproduce.
//!
//! All loops are bounded; a session that fails to end inside its bound is
//! reported as an error rather than spinning.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use dispatch_core::config::EngineConfig;
use dispatch_core::difficulty::Difficulty;
use dispatch_core::game::{DispatchGame, PlayerCommand};
use dispatch_core::replay::Replay;
use dispatch_core::view::GameSummary;

use crate::strategies::{Strategy, StrategyKind};

/// How much simulated time passes between strategy decisions.
pub const DECISION_INTERVAL_MS: u64 = 1_000;

/// Slack past the time limit before a session counts as stuck.
const STUCK_SLACK_MS: u64 = 10_000;

/// Errors from bot-driven sessions.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The session did not reach a terminal phase inside its bound.
    #[error("session still {phase} after {now_ms}ms")]
    Unfinished {
        /// Phase when the bound was hit.
        phase: String,
        /// Simulated time when the bound was hit.
        now_ms: u64,
    },
}

/// Result of one bot-driven session.
#[derive(Debug, Clone)]
pub struct AutoplayResult {
    /// End-of-game summary.
    pub summary: GameSummary,
    /// Every command the bot issued, with its timestamp.
    pub replay: Replay,
    /// Final engine hash.
    pub hash: u64,
}

/// Plays full sessions with a strategy.
#[derive(Debug, Clone, Default)]
pub struct GameRunner {
    config: EngineConfig,
}

impl GameRunner {
    /// Create a runner over the given engine data.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Play one session with a built-in strategy.
    pub fn autoplay(
        &self,
        difficulty: Difficulty,
        kind: StrategyKind,
    ) -> Result<AutoplayResult, RunnerError> {
        let mut strategy = kind.build();
        self.autoplay_with(difficulty, strategy.as_mut())
    }

    /// Play one session with any strategy.
    pub fn autoplay_with(
        &self,
        difficulty: Difficulty,
        strategy: &mut dyn Strategy,
    ) -> Result<AutoplayResult, RunnerError> {
        let mut game = DispatchGame::new(self.config.clone());
        let mut replay = Replay::new(format!("{} on {}", strategy.name(), difficulty));

        info!(strategy = strategy.name(), %difficulty, "Starting autoplay");

        let mut issue = |game: &mut DispatchGame, command: PlayerCommand| {
            let at_ms = game.now_ms();
            let outcome = game.apply(command);
            if outcome.is_applied() {
                replay.record(at_ms, command);
            }
            outcome.is_applied()
        };

        issue(&mut game, PlayerCommand::AnswerCall);
        issue(&mut game, PlayerCommand::Start { difficulty });
        if strategy.wants_debug() {
            issue(&mut game, PlayerCommand::ToggleDebug);
        }

        let limit_ms = u64::from(game.session().time_limit_secs) * 1_000 + STUCK_SLACK_MS;
        let max_decisions = limit_ms / DECISION_INTERVAL_MS;
        let mut decisions = 0u64;

        while !game.phase().is_terminal() {
            if decisions >= max_decisions {
                warn!(now_ms = game.now_ms(), "Autoplay exceeded its bound");
                return Err(RunnerError::Unfinished {
                    phase: game.phase().to_string(),
                    now_ms: game.now_ms(),
                });
            }
            decisions += 1;

            if game.in_flight().is_none() {
                let view = game.view();
                let debug = game.debug_view();
                if let Some(destination) = strategy.choose_target(&view, debug.as_ref()) {
                    debug!(destination = %destination, now_ms = game.now_ms(), "Bot dispatching");
                    issue(&mut game, PlayerCommand::Dispatch { destination });
                }
            }
            game.run_for(DECISION_INTERVAL_MS);
        }

        replay.finalize(&game);
        let hash = game.state_hash();
        let summary = game.summary().ok_or_else(|| RunnerError::Unfinished {
            phase: game.phase().to_string(),
            now_ms: game.now_ms(),
        })?;

        info!(
            strategy = strategy.name(),
            outcome = ?summary.outcome,
            elapsed_secs = summary.elapsed_secs,
            units_used = summary.units_used,
            commands = replay.command_count(),
            "Autoplay finished"
        );

        Ok(AutoplayResult {
            summary,
            replay,
            hash,
        })
    }

    /// Replay `replay` `runs` times and compare hashes.
    pub fn verify_determinism(&self, replay: &Replay, runs: u32) -> DeterminismReport {
        let hashes: Vec<u64> = (0..runs.max(1))
            .map(|_| replay.play(self.config.clone()).state_hash())
            .collect();
        let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
        let matches_recording = match (replay.final_hash, hashes.first()) {
            (Some(expected), Some(&first)) => Some(expected == first),
            _ => None,
        };

        if is_deterministic {
            debug!(runs = hashes.len(), "Replay is deterministic");
        } else {
            warn!(hashes = ?hashes, "Replay diverged between runs");
        }

        DeterminismReport {
            runs: hashes.len(),
            hashes,
            is_deterministic,
            matches_recording,
        }
    }
}

/// Outcome of repeated replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Number of replays run.
    pub runs: usize,
    /// Final hash of each replay.
    pub hashes: Vec<u64>,
    /// All runs produced the same hash.
    pub is_deterministic: bool,
    /// Whether the runs matched the recorded hash, if one was recorded.
    pub matches_recording: Option<bool>,
}

impl DeterminismReport {
    /// Deterministic and consistent with the recording.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.is_deterministic && self.matches_recording != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::view::Outcome;

    #[test]
    fn test_oracle_wins_every_difficulty() {
        let runner = GameRunner::default();
        for difficulty in Difficulty::ALL {
            let result = runner.autoplay(difficulty, StrategyKind::Oracle).unwrap();
            assert_eq!(result.summary.outcome, Outcome::Won, "{difficulty}");
            assert_eq!(result.summary.units_used, 0);
            assert_eq!(result.summary.clues_solved, 5);
        }
    }

    #[test]
    fn test_base_loses_hard_on_first_miss() {
        let result = GameRunner::default()
            .autoplay(Difficulty::Hard, StrategyKind::Base)
            .unwrap();
        assert!(matches!(result.summary.outcome, Outcome::Lost { .. }));
        assert_eq!(result.summary.attempts, 1);
    }

    #[test]
    fn test_recorded_replay_verifies() {
        let runner = GameRunner::default();
        let result = runner
            .autoplay(Difficulty::Medium, StrategyKind::Sweep)
            .unwrap();
        assert_eq!(result.replay.final_hash, Some(result.hash));

        let report = runner.verify_determinism(&result.replay, 3);
        assert_eq!(report.runs, 3);
        assert!(report.passed());
        assert_eq!(report.hashes[0], result.hash);
    }

    #[test]
    fn test_tampered_replay_fails_report() {
        let runner = GameRunner::default();
        let mut replay = runner
            .autoplay(Difficulty::Easy, StrategyKind::Oracle)
            .unwrap()
            .replay;
        replay.final_hash = replay.final_hash.map(|h| h ^ 1);

        let report = runner.verify_determinism(&replay, 2);
        assert!(report.is_deterministic);
        assert_eq!(report.matches_recording, Some(false));
        assert!(!report.passed());
    }
}
