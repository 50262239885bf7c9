//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the engine produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A replay is only useful if feeding the same commands at the same times
//! reproduces the session bit for bit. Sources of non-determinism include:
//!
//! - **Floating-point math**: radii and transit progress use fixed-point
//!   via [`dispatch_core::math::Fixed`]; hit tests are integer-exact.
//!
//! - **Wall-clock time**: the engine only ever sees simulated milliseconds
//!   reported by its host.
//!
//! - **Hash iteration order**: session sets are `BTreeSet`s.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual operations (dispatch, arrival, tick)
//! 2. **Property tests**: random step sequences produce identical hashes
//! 3. **Integration tests**: full scripted sessions are reproducible

use dispatch_core::game::{DispatchGame, PlayerCommand};
use dispatch_core::math::Fixed;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Engine is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one step
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use dispatch_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// One input to a game: a player command or a way of moving time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStep {
    /// Apply a player command.
    Command(PlayerCommand),
    /// Let simulated time pass through the built-in clock.
    Wait(u64),
    /// Advance the unit on the road directly.
    Advance(Fixed),
    /// Fire the game clock once.
    ClockTick,
    /// Fire the travel clock once.
    TravelTick,
}

impl GameStep {
    /// Apply this step to a game.
    pub fn apply(self, game: &mut DispatchGame) {
        match self {
            Self::Command(command) => {
                game.apply(command);
            }
            Self::Wait(ms) => {
                game.run_for(ms);
            }
            Self::Advance(delta) => {
                game.advance(delta);
            }
            Self::ClockTick => {
                game.tick_clock();
            }
            Self::TravelTick => {
                game.travel_tick();
            }
        }
    }
}

/// Apply `steps` to fresh games `runs` times and compare the final hashes.
pub fn verify_game_determinism<F>(setup: F, steps: &[GameStep], runs: usize) -> DeterminismResult
where
    F: Fn() -> DispatchGame,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut game = setup();
        for step in steps {
            step.apply(&mut game);
        }
        hashes.push(game.state_hash());
    }

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps: steps.len() as u64,
    }
}

/// Compare two games step by step, finding the first divergence.
///
/// # Returns
///
/// `None` if the games stay identical, `Some(n)` if they differ after
/// applying `n` steps.
pub fn find_first_divergence<F>(setup: F, steps: &[GameStep]) -> Option<usize>
where
    F: Fn() -> DispatchGame,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for (index, step) in steps.iter().enumerate() {
        step.apply(&mut first);
        step.apply(&mut second);

        if first.state_hash() != second.state_hash() {
            return Some(index + 1);
        }
    }

    None
}

/// Proptest strategies for engine testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the engine.
pub mod strategies {
    use dispatch_core::difficulty::Difficulty;
    use dispatch_core::game::PlayerCommand;
    use dispatch_core::grid::{GridPos, GRID_SIZE};
    use dispatch_core::math::Fixed;
    use proptest::prelude::*;

    use super::GameStep;

    /// Generate a block on the map.
    pub fn arb_grid_pos() -> impl Strategy<Value = GridPos> {
        (0..GRID_SIZE, 0..GRID_SIZE).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// Generate a position that may lie off the map.
    pub fn arb_any_pos() -> impl Strategy<Value = GridPos> {
        (-5..GRID_SIZE + 5, -5..GRID_SIZE + 5).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// Generate a difficulty.
    pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
        prop_oneof![
            Just(Difficulty::Easy),
            Just(Difficulty::Medium),
            Just(Difficulty::Hard),
        ]
    }

    /// Generate an acceptance radius in quarter blocks (0 to 6).
    pub fn arb_radius() -> impl Strategy<Value = Fixed> {
        (0i32..=24).prop_map(|quarters| Fixed::from_num(quarters) / Fixed::from_num(4))
    }

    /// Generate any player command, including ones that may be ignored.
    pub fn arb_player_command() -> impl Strategy<Value = PlayerCommand> {
        prop_oneof![
            1 => Just(PlayerCommand::AnswerCall),
            1 => arb_difficulty().prop_map(|difficulty| PlayerCommand::Start { difficulty }),
            6 => arb_any_pos().prop_map(|destination| PlayerCommand::Dispatch { destination }),
            1 => Just(PlayerCommand::ToggleDebug),
            1 => Just(PlayerCommand::Reset),
        ]
    }

    /// Generate a fraction of a trip, including non-positive values.
    pub fn arb_advance() -> impl Strategy<Value = Fixed> {
        (-10i32..=200).prop_map(|hundredths| Fixed::from_num(hundredths) / Fixed::from_num(100))
    }

    /// Generate one game step.
    pub fn arb_step() -> impl Strategy<Value = GameStep> {
        prop_oneof![
            4 => arb_player_command().prop_map(GameStep::Command),
            3 => (0u64..20_000).prop_map(GameStep::Wait),
            1 => arb_advance().prop_map(GameStep::Advance),
            1 => Just(GameStep::ClockTick),
            1 => Just(GameStep::TravelTick),
        ]
    }

    /// Generate a sequence of steps.
    pub fn arb_step_sequence(max_len: usize) -> impl Strategy<Value = Vec<GameStep>> {
        proptest::collection::vec(arb_step(), 0..max_len)
    }
}
