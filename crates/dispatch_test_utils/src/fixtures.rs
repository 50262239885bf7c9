//! Test fixtures and helpers.
//!
//! Small catalogs, configurations and games in a known state for
//! consistent testing.

use dispatch_core::catalog::{Clue, ClueCatalog};
use dispatch_core::config::EngineConfig;
use dispatch_core::difficulty::Difficulty;
use dispatch_core::events::GameEvent;
use dispatch_core::game::DispatchGame;
use dispatch_core::grid::GridPos;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: engine code never uses floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// A bare clue with no display text.
#[must_use]
pub fn clue(id: u32, x: i32, y: i32, radius: f64) -> Clue {
    Clue {
        id,
        true_location: GridPos::new(x, y),
        acceptance_radius: fixed_f(radius),
        transcript: String::new(),
        description: String::new(),
        hint: String::new(),
    }
}

/// Catalog from `(x, y, radius)` triples, ids assigned in order.
///
/// # Panics
///
/// Panics if the triples do not form a valid catalog.
#[must_use]
pub fn trail(entries: &[(i32, i32, f64)]) -> ClueCatalog {
    let clues = (1u32..)
        .zip(entries)
        .map(|(id, &(x, y, radius))| clue(id, x, y, radius))
        .collect();
    ClueCatalog::new(clues).expect("fixture trail should be valid")
}

/// Default configuration with the clue trail replaced.
#[must_use]
pub fn config_with_trail(clues: ClueCatalog) -> EngineConfig {
    EngineConfig {
        clues,
        ..EngineConfig::default()
    }
}

/// Built-in game, call answered and started at `difficulty`.
#[must_use]
pub fn started_game(difficulty: Difficulty) -> DispatchGame {
    started_game_with(EngineConfig::default(), difficulty)
}

/// Game on `config`, call answered and started at `difficulty`.
///
/// # Panics
///
/// Panics if the game refuses to start.
#[must_use]
pub fn started_game_with(config: EngineConfig, difficulty: Difficulty) -> DispatchGame {
    let mut game = DispatchGame::new(config);
    assert!(game.answer_call().is_applied(), "call should be ringing");
    assert!(
        game.start_game(difficulty).is_applied(),
        "game should start from briefing"
    );
    game
}

/// Full transit time of `game` in milliseconds.
#[must_use]
pub fn transit_ms(game: &DispatchGame) -> u64 {
    u64::from(game.config().transit_secs) * 1000
}

/// Dispatch a unit and let simulated time run until it arrives.
///
/// Returns every event produced, starting with `DispatchStarted`.
///
/// # Panics
///
/// Panics if the dispatch is rejected.
pub fn dispatch_and_arrive(game: &mut DispatchGame, destination: GridPos) -> Vec<GameEvent> {
    let outcome = game.begin_dispatch(destination);
    assert!(
        outcome.is_applied(),
        "dispatch to {destination} rejected: {outcome:?}"
    );
    let mut events = outcome.events().to_vec();
    let duration = transit_ms(game);
    events.extend(game.run_for(duration));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::session::Phase;

    #[test]
    fn test_trail_assigns_ids() {
        let catalog = trail(&[(1, 1, 1.0), (2, 2, 0.5)]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.clue(2).true_location, GridPos::new(2, 2));
        assert_eq!(catalog.clue(2).acceptance_radius, fixed_f(0.5));
    }

    #[test]
    fn test_dispatch_and_arrive_resolves() {
        let mut game = started_game(Difficulty::Easy);
        let events = dispatch_and_arrive(&mut game, GridPos::new(17, 13));
        assert!(matches!(events[0], GameEvent::DispatchStarted { .. }));
        assert!(events.contains(&GameEvent::ClueUnlocked { clue_id: 2 }));
        assert_eq!(game.phase(), Phase::Active);
    }
}
