//! Events emitted by the engine, and reasons a command was ignored.
//!
//! Events can be used by the presentation layer to trigger sounds,
//! animations and summary screens.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::grid::GridPos;
use crate::session::{LossReason, Phase};
use crate::transit::{ArrivalOutcome, DispatchId};

/// Something that happened as the result of a command or tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The operator picked up the call.
    CallAnswered,
    /// A session started with the given budgets.
    GameStarted {
        /// Chosen difficulty.
        difficulty: Difficulty,
        /// Units available.
        unit_budget: u32,
        /// Seconds available.
        time_limit_secs: u32,
    },
    /// A unit left the station.
    DispatchStarted {
        /// Dispatch token.
        dispatch_id: DispatchId,
        /// Block the unit is heading to.
        destination: GridPos,
        /// Clue the unit will be evaluated against.
        clue_id: u32,
    },
    /// A unit reached its destination.
    UnitArrived(ArrivalOutcome),
    /// A failed search cost a unit.
    UnitLost {
        /// Units left afterwards.
        units_remaining: u32,
    },
    /// A new clue became available.
    ClueUnlocked {
        /// Newly active clue.
        clue_id: u32,
    },
    /// The unit on the road was recalled because the session ended.
    DispatchAbandoned {
        /// Dispatch token.
        dispatch_id: DispatchId,
    },
    /// The caller was found.
    Won {
        /// Seconds taken.
        elapsed_secs: u32,
    },
    /// The case went cold.
    Lost {
        /// Why the session was lost.
        reason: LossReason,
        /// Seconds elapsed.
        elapsed_secs: u32,
    },
    /// The session was returned to the incoming-call screen.
    Reset,
}

/// Why a player command had no effect.
///
/// Ignored commands are part of a forgiving input model, not errors: the
/// engine state is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Only an incoming call can be answered.
    NotRinging {
        /// Phase at the time.
        phase: Phase,
    },
    /// Difficulty is chosen from the briefing; answer the call first.
    NotBriefing {
        /// Phase at the time.
        phase: Phase,
    },
    /// A session is already running or finished; reset first.
    AlreadyStarted {
        /// Phase at the time.
        phase: Phase,
    },
    /// Dispatching and ticking only happen during active play.
    NotActive {
        /// Phase at the time.
        phase: Phase,
    },
    /// A unit is already on the road.
    DispatchInFlight,
    /// The destination is off the map.
    OutOfBounds {
        /// Rejected destination.
        destination: GridPos,
    },
    /// An arrival for a clue other than the active one.
    StaleArrival {
        /// Clue the arrival was for.
        clue_id: u32,
        /// Clue that is active now.
        active_clue_id: u32,
    },
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRinging { phase } => write!(f, "no incoming call (phase {phase})"),
            Self::NotBriefing { phase } => write!(f, "call not answered yet (phase {phase})"),
            Self::AlreadyStarted { phase } => write!(f, "session already started (phase {phase})"),
            Self::NotActive { phase } => write!(f, "session not active (phase {phase})"),
            Self::DispatchInFlight => f.write_str("a unit is already en route"),
            Self::OutOfBounds { destination } => {
                write!(f, "destination ({}, {}) is off the map", destination.x, destination.y)
            }
            Self::StaleArrival {
                clue_id,
                active_clue_id,
            } => write!(
                f,
                "arrival for clue {clue_id} while clue {active_clue_id} is active"
            ),
        }
    }
}
