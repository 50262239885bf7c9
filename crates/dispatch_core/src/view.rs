//! Read-only projections of the engine for a presentation layer.
//!
//! Views are snapshots: building one never changes the engine, and nothing
//! in a view is fed back into resolution.

use serde::{Deserialize, Serialize};

use crate::clock::format_clock;
use crate::difficulty::Difficulty;
use crate::game::DispatchGame;
use crate::grid::GridPos;
use crate::math::{fixed_decimal, Fixed, Vec2Fixed};
use crate::session::{AttemptRecord, ClueStatus, LossReason, Phase, ResolvedLocation};
use crate::transit::{DispatchId, InFlightDispatch};

/// The unit on the road, as shown on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitView {
    /// Dispatch token.
    pub dispatch_id: DispatchId,
    /// Target block.
    pub destination: GridPos,
    /// Target block label, e.g. `R14`.
    pub destination_label: String,
    /// Clue the unit will be evaluated against.
    pub clue_id: u32,
    /// Fraction of the trip completed.
    #[serde(with = "fixed_decimal")]
    pub fraction: Fixed,
    /// Whole seconds until arrival, rounded up.
    pub remaining_secs: u32,
    /// Interpolated position between station and destination.
    pub position: Vec2Fixed,
}

impl From<&InFlightDispatch> for TransitView {
    fn from(dispatch: &InFlightDispatch) -> Self {
        Self {
            dispatch_id: dispatch.id,
            destination: dispatch.destination,
            destination_label: dispatch.destination.label(),
            clue_id: dispatch.target_clue_id,
            fraction: dispatch.fraction(),
            remaining_secs: dispatch.remaining_secs(),
            position: dispatch.current_position(),
        }
    }
}

/// One clue in the case file.
///
/// Locked clues carry no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueView {
    /// Clue id.
    pub id: u32,
    /// Status relative to the session.
    pub status: ClueStatus,
    /// Short title.
    pub description: Option<String>,
    /// What the caller says.
    pub transcript: Option<String>,
    /// Operator hint.
    pub hint: Option<String>,
}

/// Everything a player can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    /// Current phase.
    pub phase: Phase,
    /// Difficulty chosen at start.
    pub difficulty: Option<Difficulty>,
    /// Clue being worked, if the trail is in progress.
    pub active_clue_id: Option<u32>,
    /// Number of clues in the trail.
    pub total_clues: u32,
    /// Units not yet lost.
    pub units_remaining: u32,
    /// Units granted at start.
    pub unit_budget: u32,
    /// Exactly one unit left.
    pub final_unit: bool,
    /// Seconds of play so far.
    pub elapsed_secs: u32,
    /// Seconds granted at start.
    pub time_limit_secs: u32,
    /// Seconds left before the case goes cold.
    pub remaining_secs: u32,
    /// `remaining_secs` as `m:ss`.
    pub clock_display: String,
    /// Unit on the road.
    pub in_flight: Option<TransitView>,
    /// Station every unit leaves from.
    pub base_location: GridPos,
    /// Resolved dispatches in arrival order.
    pub attempts: Vec<AttemptRecord>,
    /// Confirmed caller locations.
    pub resolved_locations: Vec<ResolvedLocation>,
    /// Case file.
    pub clues: Vec<ClueView>,
    /// Whether the debug overlay is on.
    pub debug_enabled: bool,
    /// Present once the session has ended.
    pub summary: Option<GameSummary>,
}

/// Debug overlay for the active clue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugView {
    /// Active clue id.
    pub clue_id: u32,
    /// Where the caller actually is.
    pub true_location: GridPos,
    /// `true_location` as a map label.
    pub label: String,
    /// Acceptance radius in blocks.
    #[serde(with = "fixed_decimal")]
    pub acceptance_radius: Fixed,
}

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// Caller found.
    Won,
    /// Case went cold.
    Lost {
        /// Why.
        reason: LossReason,
    },
}

/// End-of-session report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Won or lost.
    pub outcome: Outcome,
    /// Difficulty played.
    pub difficulty: Option<Difficulty>,
    /// Seconds taken.
    pub elapsed_secs: u32,
    /// `elapsed_secs` as `m:ss`.
    pub elapsed_display: String,
    /// Units lost to failed searches.
    pub units_used: u32,
    /// Units granted at start.
    pub unit_budget: u32,
    /// Dispatches resolved.
    pub attempts: u32,
    /// Dispatches that found the caller.
    pub hits: u32,
    /// Clues solved out of the trail.
    pub clues_solved: u32,
    /// Clues in the trail.
    pub total_clues: u32,
}

impl DispatchGame {
    /// Snapshot of everything a player can see.
    #[must_use]
    pub fn view(&self) -> GameView {
        let session = self.session();
        let remaining_secs = session.time_limit_secs.saturating_sub(session.elapsed_secs);
        let clues = self
            .config()
            .clues
            .iter()
            .map(|clue| {
                let status = session.clue_status(clue.id);
                let visible = status != ClueStatus::Locked;
                ClueView {
                    id: clue.id,
                    status,
                    description: visible.then(|| clue.description.clone()),
                    transcript: visible.then(|| clue.transcript.clone()),
                    hint: visible.then(|| clue.hint.clone()),
                }
            })
            .collect();

        GameView {
            phase: session.phase,
            difficulty: session.difficulty,
            active_clue_id: session.active_clue_id(),
            total_clues: session.total_clues,
            units_remaining: session.units_remaining,
            unit_budget: session.unit_budget,
            final_unit: session.phase == Phase::Active && session.units_remaining == 1,
            elapsed_secs: session.elapsed_secs,
            time_limit_secs: session.time_limit_secs,
            remaining_secs,
            clock_display: format_clock(remaining_secs),
            in_flight: self.in_flight().map(TransitView::from),
            base_location: self.config().base_location,
            attempts: session.attempt_history.clone(),
            resolved_locations: session.resolved_locations.clone(),
            clues,
            debug_enabled: self.debug_enabled(),
            summary: self.summary(),
        }
    }

    /// True location of the active clue, while the overlay is on.
    ///
    /// `None` when the overlay is off or no session is active.
    #[must_use]
    pub fn debug_view(&self) -> Option<DebugView> {
        if !self.debug_enabled() || self.phase() != Phase::Active {
            return None;
        }
        let clue = self.config().clues.get(self.session().active_clue_id()?)?;
        Some(DebugView {
            clue_id: clue.id,
            true_location: clue.true_location,
            label: clue.true_location.label(),
            acceptance_radius: clue.acceptance_radius,
        })
    }

    /// End-of-session report, once the session has ended.
    #[must_use]
    pub fn summary(&self) -> Option<GameSummary> {
        let session = self.session();
        let outcome = match (session.phase, session.loss_reason) {
            (Phase::Won, _) => Outcome::Won,
            (Phase::Lost, Some(reason)) => Outcome::Lost { reason },
            _ => return None,
        };
        let attempts = u32::try_from(session.attempt_history.len()).unwrap_or(u32::MAX);
        let hits = u32::try_from(
            session
                .attempt_history
                .iter()
                .filter(|attempt| attempt.success)
                .count(),
        )
        .unwrap_or(u32::MAX);

        Some(GameSummary {
            outcome,
            difficulty: session.difficulty,
            elapsed_secs: session.elapsed_secs,
            elapsed_display: format_clock(session.elapsed_secs),
            units_used: session.units_used(),
            unit_budget: session.unit_budget,
            attempts,
            hits,
            clues_solved: u32::try_from(session.resolved_locations.len()).unwrap_or(u32::MAX),
            total_clues: session.total_clues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(difficulty: Difficulty) -> DispatchGame {
        let mut game = DispatchGame::default();
        game.answer_call();
        game.start_game(difficulty);
        game
    }

    #[test]
    fn test_view_before_start() {
        let view = DispatchGame::default().view();
        assert_eq!(view.phase, Phase::AwaitingCall);
        assert_eq!(view.active_clue_id, None);
        assert!(view.clues.iter().all(|c| c.status == ClueStatus::Locked));
        assert!(view.clues.iter().all(|c| c.transcript.is_none()));
        assert!(view.summary.is_none());
    }

    #[test]
    fn test_view_active_session() {
        let view = started(Difficulty::Medium).view();
        assert_eq!(view.active_clue_id, Some(1));
        assert_eq!(view.clock_display, "10:00");
        assert!(!view.final_unit);
        assert_eq!(view.clues[0].status, ClueStatus::Current);
        assert!(view.clues[0].transcript.is_some());
        assert_eq!(view.clues[1].status, ClueStatus::Locked);
    }

    #[test]
    fn test_final_unit_flag() {
        assert!(started(Difficulty::Hard).view().final_unit);
    }

    #[test]
    fn test_transit_view_midway() {
        let mut game = started(Difficulty::Easy);
        game.begin_dispatch(GridPos::new(17, 13));
        game.run_for(5_000);

        let transit = game.view().in_flight.unwrap();
        assert_eq!(transit.destination_label, "R14");
        assert_eq!(transit.remaining_secs, 10);
        assert_eq!(transit.fraction, Fixed::from_num(5_000) / Fixed::from_num(15_000));
    }

    #[test]
    fn test_debug_view_gated() {
        let mut game = started(Difficulty::Easy);
        assert!(game.debug_view().is_none());

        game.toggle_debug();
        let debug = game.debug_view().unwrap();
        assert_eq!(debug.clue_id, 1);
        assert_eq!(debug.label, "R14");
        assert_eq!(debug.acceptance_radius, Fixed::from_num(4));

        game.reset();
        assert!(game.debug_view().is_none());
    }

    #[test]
    fn test_summary_after_loss() {
        let mut game = started(Difficulty::Hard);
        game.run_for(61_000);
        game.begin_dispatch(GridPos::new(0, 0));
        game.run_for(15_000);

        let summary = game.summary().unwrap();
        assert_eq!(
            summary.outcome,
            Outcome::Lost {
                reason: LossReason::UnitsExhausted
            }
        );
        // arrival at 76s resolves before that second's clock tick
        assert_eq!(summary.elapsed_display, "1:15");
        assert_eq!(summary.units_used, 1);
        assert_eq!(summary.attempts, 1);
        assert_eq!(summary.hits, 0);
    }
}
