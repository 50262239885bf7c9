//! Session state and its transition function.
//!
//! [`SessionState`] is a plain value. Every change goes through
//! [`reduce`], which takes the current state and a [`SessionEvent`] and
//! either produces a whole new state or reports why the event was ignored.
//! Nothing mutates a session in place.
//!
//! # Phases
//!
//! ```text
//! AwaitingCall --answer--> Briefing --start--> Active --last clue found--> Won
//!       \______________start______________/      \--units exhausted----> Lost
//!                                                 \--time expired-------> Lost
//! ```
//!
//! `Won` and `Lost` are terminal. Reset returns any phase to `AwaitingCall`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::difficulty::{Difficulty, DifficultyProfile};
use crate::events::{GameEvent, IgnoreReason};
use crate::grid::GridPos;
use crate::transit::ArrivalOutcome;

/// Top-level phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Phone is ringing.
    #[default]
    AwaitingCall,
    /// Case brief and difficulty selection.
    Briefing,
    /// Clock running, units can be dispatched.
    Active,
    /// Caller found.
    Won,
    /// Out of units or out of time.
    Lost,
}

impl Phase {
    /// Whether the session has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Allowed-transition table. Reset to `AwaitingCall` is always allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::AwaitingCall)
                | (Self::AwaitingCall, Self::Briefing)
                | (Self::Briefing, Self::Active)
                | (Self::Active, Self::Won | Self::Lost)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingCall => "awaiting_call",
            Self::Briefing => "briefing",
            Self::Active => "active",
            Self::Won => "won",
            Self::Lost => "lost",
        })
    }
}

/// Why a session was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    /// Every unit searched the wrong place.
    UnitsExhausted,
    /// The time limit was reached.
    TimeExpired,
}

/// One resolved dispatch, hit or miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Block the unit searched.
    pub location: GridPos,
    /// Clue it was sent for.
    pub clue_id: u32,
    /// Whether the caller was found.
    pub success: bool,
}

/// A clue whose location has been confirmed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Confirmed location of the caller for this clue.
    pub location: GridPos,
    /// Clue that was solved.
    pub clue_id: u32,
}

/// Complete state of one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionState {
    /// Difficulty chosen at start, `None` before a game starts.
    pub difficulty: Option<Difficulty>,
    /// Units granted at start.
    pub unit_budget: u32,
    /// Seconds granted at start.
    pub time_limit_secs: u32,
    /// Number of clues in the trail.
    pub total_clues: u32,
    /// Active clue id; `total_clues + 1` once the trail is complete.
    pub active_clue_index: u32,
    /// Units not yet lost.
    pub units_remaining: u32,
    /// Current phase.
    pub phase: Phase,
    /// Set when `phase` is `Lost`.
    pub loss_reason: Option<LossReason>,
    /// Confirmed caller locations, in solve order.
    pub resolved_locations: Vec<ResolvedLocation>,
    /// Every resolved dispatch, in arrival order.
    pub attempt_history: Vec<AttemptRecord>,
    /// Clues the operator has access to.
    pub unlocked_clue_ids: BTreeSet<u32>,
    /// Seconds of active play so far.
    pub elapsed_secs: u32,
}

impl Default for SessionState {
    /// The incoming-call screen before any game has started.
    fn default() -> Self {
        Self {
            difficulty: None,
            unit_budget: 0,
            time_limit_secs: 0,
            total_clues: 0,
            active_clue_index: 1,
            units_remaining: 0,
            phase: Phase::AwaitingCall,
            loss_reason: None,
            resolved_locations: Vec::new(),
            attempt_history: Vec::new(),
            unlocked_clue_ids: BTreeSet::new(),
            elapsed_secs: 0,
        }
    }
}

impl SessionState {
    /// Fresh active session for a difficulty.
    #[must_use]
    pub fn started(profile: &DifficultyProfile, total_clues: u32) -> Self {
        Self {
            difficulty: Some(profile.key),
            unit_budget: profile.unit_budget,
            time_limit_secs: profile.time_limit_secs,
            total_clues,
            active_clue_index: 1,
            units_remaining: profile.unit_budget,
            phase: Phase::Active,
            loss_reason: None,
            resolved_locations: Vec::new(),
            attempt_history: Vec::new(),
            unlocked_clue_ids: BTreeSet::from([1]),
            elapsed_secs: 0,
        }
    }

    /// Active clue id while the trail is in progress.
    #[must_use]
    pub fn active_clue_id(&self) -> Option<u32> {
        (self.active_clue_index >= 1 && self.active_clue_index <= self.total_clues)
            .then_some(self.active_clue_index)
    }

    /// Units spent on failed searches.
    #[must_use]
    pub fn units_used(&self) -> u32 {
        self.unit_budget - self.units_remaining
    }

    /// Where a clue stands in this session.
    #[must_use]
    pub fn clue_status(&self, clue_id: u32) -> ClueStatus {
        if clue_id < self.active_clue_index {
            ClueStatus::Completed
        } else if clue_id == self.active_clue_index && self.phase == Phase::Active {
            ClueStatus::Current
        } else if self.unlocked_clue_ids.contains(&clue_id) {
            ClueStatus::Unlocked
        } else {
            ClueStatus::Locked
        }
    }
}

/// Status of a clue relative to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueStatus {
    /// Not yet heard.
    Locked,
    /// Heard but not the one being worked.
    Unlocked,
    /// The clue being worked now.
    Current,
    /// Location confirmed.
    Completed,
}

/// Input to [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Pick up the incoming call.
    AnswerCall,
    /// Start a session with a difficulty profile over a trail of clues.
    Start {
        /// Budgets for the chosen difficulty.
        profile: DifficultyProfile,
        /// Number of clues in the catalog.
        total_clues: u32,
    },
    /// One second of the game clock.
    ClockTick,
    /// A unit reached its destination and was evaluated.
    Arrival(ArrivalOutcome),
    /// Back to the incoming-call screen.
    Reset,
}

/// Result of [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    /// The event produced a new state.
    Applied {
        /// State after the event.
        state: SessionState,
        /// What happened, in order.
        events: Vec<GameEvent>,
    },
    /// The event did not apply; the previous state stands.
    Ignored(IgnoreReason),
}

/// Session transition function.
///
/// Pure: `state` is never modified. Invalid events are reported as
/// [`Reduction::Ignored`] rather than corrupting the session.
#[must_use]
pub fn reduce(state: &SessionState, event: &SessionEvent) -> Reduction {
    let phase = state.phase;

    let (next, events) = match event {
        SessionEvent::Reset => (SessionState::default(), vec![GameEvent::Reset]),

        SessionEvent::AnswerCall => {
            if phase != Phase::AwaitingCall {
                return Reduction::Ignored(IgnoreReason::NotRinging { phase });
            }
            let next = SessionState {
                phase: Phase::Briefing,
                ..state.clone()
            };
            (next, vec![GameEvent::CallAnswered])
        }

        SessionEvent::Start {
            profile,
            total_clues,
        } => {
            match phase {
                Phase::Briefing => {}
                Phase::AwaitingCall => {
                    return Reduction::Ignored(IgnoreReason::NotBriefing { phase })
                }
                Phase::Active | Phase::Won | Phase::Lost => {
                    return Reduction::Ignored(IgnoreReason::AlreadyStarted { phase })
                }
            }
            let next = SessionState::started(profile, *total_clues);
            let started = GameEvent::GameStarted {
                difficulty: profile.key,
                unit_budget: profile.unit_budget,
                time_limit_secs: profile.time_limit_secs,
            };
            (next, vec![started])
        }

        SessionEvent::ClockTick => {
            if phase != Phase::Active {
                return Reduction::Ignored(IgnoreReason::NotActive { phase });
            }
            let elapsed_secs = state.elapsed_secs.saturating_add(1);
            if elapsed_secs >= state.time_limit_secs {
                let next = SessionState {
                    elapsed_secs,
                    phase: Phase::Lost,
                    loss_reason: Some(LossReason::TimeExpired),
                    ..state.clone()
                };
                let lost = GameEvent::Lost {
                    reason: LossReason::TimeExpired,
                    elapsed_secs,
                };
                (next, vec![lost])
            } else {
                let next = SessionState {
                    elapsed_secs,
                    ..state.clone()
                };
                (next, Vec::new())
            }
        }

        SessionEvent::Arrival(outcome) => {
            if phase != Phase::Active {
                return Reduction::Ignored(IgnoreReason::NotActive { phase });
            }
            if outcome.clue_id != state.active_clue_index {
                return Reduction::Ignored(IgnoreReason::StaleArrival {
                    clue_id: outcome.clue_id,
                    active_clue_id: state.active_clue_index,
                });
            }
            resolve(state, outcome)
        }
    };

    debug_assert!(
        phase.can_transition_to(next.phase) || phase == next.phase,
        "illegal phase transition {phase} -> {}",
        next.phase
    );

    Reduction::Applied {
        state: next,
        events,
    }
}

/// Apply an arrival for the active clue.
fn resolve(state: &SessionState, outcome: &ArrivalOutcome) -> (SessionState, Vec<GameEvent>) {
    let mut attempt_history = state.attempt_history.clone();
    attempt_history.push(AttemptRecord {
        location: outcome.destination,
        clue_id: outcome.clue_id,
        success: outcome.success,
    });

    if outcome.success {
        let mut resolved_locations = state.resolved_locations.clone();
        resolved_locations.push(ResolvedLocation {
            location: outcome.true_location,
            clue_id: outcome.clue_id,
        });

        if outcome.clue_id >= state.total_clues {
            let next = SessionState {
                phase: Phase::Won,
                active_clue_index: state.total_clues + 1,
                attempt_history,
                resolved_locations,
                ..state.clone()
            };
            let won = GameEvent::Won {
                elapsed_secs: state.elapsed_secs,
            };
            return (next, vec![won]);
        }

        let next_clue = state.active_clue_index + 1;
        let mut unlocked_clue_ids = state.unlocked_clue_ids.clone();
        unlocked_clue_ids.insert(next_clue);
        let next = SessionState {
            active_clue_index: next_clue,
            attempt_history,
            resolved_locations,
            unlocked_clue_ids,
            ..state.clone()
        };
        return (next, vec![GameEvent::ClueUnlocked { clue_id: next_clue }]);
    }

    let units_remaining = state.units_remaining.saturating_sub(1);
    let mut events = vec![GameEvent::UnitLost { units_remaining }];
    let next = if units_remaining == 0 {
        events.push(GameEvent::Lost {
            reason: LossReason::UnitsExhausted,
            elapsed_secs: state.elapsed_secs,
        });
        SessionState {
            units_remaining,
            phase: Phase::Lost,
            loss_reason: Some(LossReason::UnitsExhausted),
            attempt_history,
            ..state.clone()
        }
    } else {
        SessionState {
            units_remaining,
            attempt_history,
            ..state.clone()
        }
    };
    (next, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::transit::DispatchId;

    fn applied(reduction: Reduction) -> (SessionState, Vec<GameEvent>) {
        match reduction {
            Reduction::Applied { state, events } => (state, events),
            Reduction::Ignored(reason) => panic!("expected applied, got ignored: {reason}"),
        }
    }

    fn active(key: Difficulty) -> SessionState {
        SessionState::started(&DifficultyProfile::builtin(key), 5)
    }

    fn arrival(clue_id: u32, success: bool) -> SessionEvent {
        SessionEvent::Arrival(ArrivalOutcome {
            dispatch_id: DispatchId(1),
            clue_id,
            destination: GridPos::new(0, 0),
            true_location: GridPos::new(17, 13),
            distance: Fixed::from_num(20),
            success,
        })
    }

    #[test]
    fn test_transition_table() {
        assert!(Phase::AwaitingCall.can_transition_to(Phase::Briefing));
        assert!(Phase::Briefing.can_transition_to(Phase::Active));
        assert!(Phase::Active.can_transition_to(Phase::Won));
        assert!(Phase::Active.can_transition_to(Phase::Lost));
        assert!(Phase::Won.can_transition_to(Phase::AwaitingCall));
        assert!(!Phase::Won.can_transition_to(Phase::Active));
        assert!(!Phase::Lost.can_transition_to(Phase::Won));
        assert!(!Phase::Briefing.can_transition_to(Phase::Won));
        assert!(!Phase::AwaitingCall.can_transition_to(Phase::Active));
    }

    #[test]
    fn test_answer_then_start() {
        let (briefing, events) = applied(reduce(&SessionState::default(), &SessionEvent::AnswerCall));
        assert_eq!(briefing.phase, Phase::Briefing);
        assert_eq!(events, vec![GameEvent::CallAnswered]);

        let start = SessionEvent::Start {
            profile: DifficultyProfile::builtin(Difficulty::Medium),
            total_clues: 5,
        };
        let (state, _) = applied(reduce(&briefing, &start));
        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.units_remaining, 3);
        assert_eq!(state.active_clue_index, 1);
        assert_eq!(state.elapsed_secs, 0);
        assert_eq!(state.unlocked_clue_ids, BTreeSet::from([1]));
    }

    #[test]
    fn test_answer_ignored_outside_awaiting_call() {
        let state = active(Difficulty::Easy);
        assert_eq!(
            reduce(&state, &SessionEvent::AnswerCall),
            Reduction::Ignored(IgnoreReason::NotRinging {
                phase: Phase::Active
            })
        );
    }

    #[test]
    fn test_start_needs_answered_call() {
        let start = SessionEvent::Start {
            profile: DifficultyProfile::builtin(Difficulty::Easy),
            total_clues: 5,
        };
        assert_eq!(
            reduce(&SessionState::default(), &start),
            Reduction::Ignored(IgnoreReason::NotBriefing {
                phase: Phase::AwaitingCall
            })
        );
    }

    #[test]
    fn test_start_ignored_once_active() {
        let state = active(Difficulty::Easy);
        let start = SessionEvent::Start {
            profile: DifficultyProfile::builtin(Difficulty::Hard),
            total_clues: 5,
        };
        assert!(matches!(
            reduce(&state, &start),
            Reduction::Ignored(IgnoreReason::AlreadyStarted { .. })
        ));
    }

    #[test]
    fn test_clock_tick_times_out_at_limit() {
        let mut state = active(Difficulty::Hard);
        state.elapsed_secs = 298;

        let (state, events) = applied(reduce(&state, &SessionEvent::ClockTick));
        assert_eq!(state.elapsed_secs, 299);
        assert_eq!(state.phase, Phase::Active);
        assert!(events.is_empty());

        let (state, events) = applied(reduce(&state, &SessionEvent::ClockTick));
        assert_eq!(state.elapsed_secs, 300);
        assert_eq!(state.phase, Phase::Lost);
        assert_eq!(state.loss_reason, Some(LossReason::TimeExpired));
        assert_eq!(state.units_remaining, 1);
        assert!(matches!(events[0], GameEvent::Lost { .. }));
    }

    #[test]
    fn test_clock_tick_ignored_when_not_active() {
        let state = SessionState::default();
        assert!(matches!(
            reduce(&state, &SessionEvent::ClockTick),
            Reduction::Ignored(IgnoreReason::NotActive { .. })
        ));
    }

    #[test]
    fn test_hit_advances_clue_without_spending_unit() {
        let state = active(Difficulty::Medium);
        let (state, events) = applied(reduce(&state, &arrival(1, true)));
        assert_eq!(state.active_clue_index, 2);
        assert_eq!(state.units_remaining, 3);
        assert!(state.unlocked_clue_ids.contains(&2));
        assert_eq!(state.resolved_locations.len(), 1);
        assert_eq!(state.resolved_locations[0].location, GridPos::new(17, 13));
        assert_eq!(events, vec![GameEvent::ClueUnlocked { clue_id: 2 }]);
    }

    #[test]
    fn test_miss_spends_one_unit() {
        let state = active(Difficulty::Medium);
        let (state, events) = applied(reduce(&state, &arrival(1, false)));
        assert_eq!(state.units_remaining, 2);
        assert_eq!(state.active_clue_index, 1);
        assert_eq!(state.phase, Phase::Active);
        assert!(state.resolved_locations.is_empty());
        assert_eq!(state.attempt_history.len(), 1);
        assert_eq!(events, vec![GameEvent::UnitLost { units_remaining: 2 }]);
    }

    #[test]
    fn test_last_unit_miss_loses() {
        let state = active(Difficulty::Hard);
        let (state, _) = applied(reduce(&state, &arrival(1, false)));
        assert_eq!(state.units_remaining, 0);
        assert_eq!(state.phase, Phase::Lost);
        assert_eq!(state.loss_reason, Some(LossReason::UnitsExhausted));
    }

    #[test]
    fn test_final_clue_hit_wins() {
        let mut state = active(Difficulty::Easy);
        state.active_clue_index = 5;
        let (state, events) = applied(reduce(&state, &arrival(5, true)));
        assert_eq!(state.phase, Phase::Won);
        assert_eq!(state.active_clue_index, 6);
        assert_eq!(state.active_clue_id(), None);
        assert!(matches!(events[0], GameEvent::Won { .. }));
    }

    #[test]
    fn test_stale_arrival_ignored() {
        let state = active(Difficulty::Easy);
        assert!(matches!(
            reduce(&state, &arrival(3, true)),
            Reduction::Ignored(IgnoreReason::StaleArrival { .. })
        ));
    }

    #[test]
    fn test_terminal_phases_ignore_ticks_and_arrivals() {
        let (lost, _) = applied(reduce(&active(Difficulty::Hard), &arrival(1, false)));
        assert!(matches!(
            reduce(&lost, &SessionEvent::ClockTick),
            Reduction::Ignored(_)
        ));
        assert!(matches!(
            reduce(&lost, &arrival(1, true)),
            Reduction::Ignored(_)
        ));
    }

    #[test]
    fn test_reset_from_any_phase() {
        let (lost, _) = applied(reduce(&active(Difficulty::Hard), &arrival(1, false)));
        let (state, events) = applied(reduce(&lost, &SessionEvent::Reset));
        assert_eq!(state, SessionState::default());
        assert_eq!(events, vec![GameEvent::Reset]);
    }

    #[test]
    fn test_clue_status() {
        let mut state = active(Difficulty::Easy);
        state.active_clue_index = 3;
        state.unlocked_clue_ids = BTreeSet::from([1, 2, 3]);
        assert_eq!(state.clue_status(1), ClueStatus::Completed);
        assert_eq!(state.clue_status(3), ClueStatus::Current);
        assert_eq!(state.clue_status(4), ClueStatus::Locked);
    }
}
