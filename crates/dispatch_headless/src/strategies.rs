//! Bot strategies for headless playtesting.
//!
//! A strategy sees what a player sees (the [`GameView`]) and picks where to
//! send the next unit. The oracle additionally reads the debug overlay, so
//! it is the upper bound any real player can reach.

use std::fmt;
use std::str::FromStr;

use dispatch_core::grid::{GridPos, GRID_SIZE};
use dispatch_core::view::{DebugView, GameView};

/// Decides where to dispatch.
pub trait Strategy {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Whether this strategy needs the debug overlay on.
    fn wants_debug(&self) -> bool {
        false
    }

    /// Pick a destination for the active clue, or `None` to hold.
    fn choose_target(&mut self, view: &GameView, debug: Option<&DebugView>) -> Option<GridPos>;
}

/// Reads the true location from the debug overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleStrategy;

impl Strategy for OracleStrategy {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn wants_debug(&self) -> bool {
        true
    }

    fn choose_target(&mut self, _view: &GameView, debug: Option<&DebugView>) -> Option<GridPos> {
        debug.map(|d| d.true_location)
    }
}

/// Searches outward from the last confirmed location, never repeating a
/// block for the same clue.
#[derive(Debug, Clone, Copy)]
pub struct SweepStrategy {
    /// Where to search first when nothing is confirmed yet.
    pub start: GridPos,
}

impl Default for SweepStrategy {
    fn default() -> Self {
        Self {
            start: GridPos::new(GRID_SIZE / 2, GRID_SIZE / 2),
        }
    }
}

impl Strategy for SweepStrategy {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn choose_target(&mut self, view: &GameView, _debug: Option<&DebugView>) -> Option<GridPos> {
        let clue_id = view.active_clue_id?;
        let anchor = view
            .resolved_locations
            .last()
            .map_or(self.start, |resolved| resolved.location);
        let tried: Vec<GridPos> = view
            .attempts
            .iter()
            .filter(|attempt| attempt.clue_id == clue_id)
            .map(|attempt| attempt.location)
            .collect();

        (0..GRID_SIZE)
            .flat_map(|y| (0..GRID_SIZE).map(move |x| GridPos::new(x, y)))
            .filter(|pos| !tried.contains(pos))
            .min_by_key(|pos| (pos.distance_squared(anchor), pos.y, pos.x))
    }
}

/// Always searches the station's own block.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseStrategy;

impl Strategy for BaseStrategy {
    fn name(&self) -> &'static str {
        "base"
    }

    fn choose_target(&mut self, view: &GameView, _debug: Option<&DebugView>) -> Option<GridPos> {
        view.active_clue_id.map(|_| view.base_location)
    }
}

/// Built-in strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyKind {
    /// [`OracleStrategy`]
    Oracle,
    /// [`SweepStrategy`]
    Sweep,
    /// [`BaseStrategy`]
    Base,
}

impl StrategyKind {
    /// Instantiate the strategy.
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            Self::Oracle => Box::new(OracleStrategy),
            Self::Sweep => Box::new(SweepStrategy::default()),
            Self::Base => Box::new(BaseStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Oracle => "oracle",
            Self::Sweep => "sweep",
            Self::Base => "base",
        })
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Self::Oracle),
            "sweep" => Ok(Self::Sweep),
            "base" => Ok(Self::Base),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}
