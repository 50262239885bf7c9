//! The dispatch game controller.
//!
//! [`DispatchGame`] owns the session, the unit on the road and simulated
//! time, and is the only thing that changes them. Hosts either call
//! [`tick_clock`](DispatchGame::tick_clock) and
//! [`advance`](DispatchGame::advance) from their own timers, or report
//! elapsed time through [`run_for`](DispatchGame::run_for) and let the
//! built-in [`GameClock`] deliver both.
//!
//! # Example
//!
//! ```
//! use dispatch_core::prelude::*;
//!
//! let mut game = DispatchGame::default();
//! game.answer_call();
//! game.start_game(Difficulty::Easy);
//! game.begin_dispatch(GridPos::new(17, 13));
//!
//! // 15 seconds of transit
//! let events = game.run_for(15_000);
//! assert!(events.iter().any(|e| matches!(e, GameEvent::ClueUnlocked { clue_id: 2 })));
//! assert_eq!(game.session().elapsed_secs, 15);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::clock::{GameClock, ScheduledTick, TRAVEL_TICK_MS};
use crate::config::EngineConfig;
use crate::difficulty::Difficulty;
use crate::events::{GameEvent, IgnoreReason};
use crate::grid::GridPos;
use crate::math::Fixed;
use crate::session::{reduce, Phase, Reduction, SessionEvent, SessionState};
use crate::transit::{resolve_arrival, DispatchTracker, InFlightDispatch};

/// A command issued by the player (or a bot standing in for one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Pick up the incoming call.
    AnswerCall,
    /// Choose a difficulty and start the clock.
    Start {
        /// Chosen difficulty.
        difficulty: Difficulty,
    },
    /// Send a unit to a block.
    Dispatch {
        /// Target block.
        destination: GridPos,
    },
    /// Show or hide the debug overlay.
    ToggleDebug,
    /// Abandon the session and return to the incoming call.
    Reset,
}

/// What became of a player command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The command took effect.
    Applied {
        /// Events produced, in order.
        events: Vec<GameEvent>,
    },
    /// The command was not legal in the current state and changed nothing.
    Ignored {
        /// Why it was ignored.
        #[serde(flatten)]
        reason: IgnoreReason,
    },
}

impl CommandOutcome {
    /// Whether the command took effect.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Events produced; empty when ignored.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        match self {
            Self::Applied { events } => events,
            Self::Ignored { .. } => &[],
        }
    }

    fn ignored(reason: IgnoreReason) -> Self {
        tracing::debug!(%reason, "Command ignored");
        Self::Ignored { reason }
    }
}

/// The dispatch resolution engine.
#[derive(Debug, Clone)]
pub struct DispatchGame {
    config: EngineConfig,
    session: SessionState,
    tracker: DispatchTracker,
    clock: GameClock,
    debug_enabled: bool,
}

impl Default for DispatchGame {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DispatchGame {
    /// Create an engine on the incoming-call screen.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let tracker = DispatchTracker::new(config.base_location, config.transit_secs);
        Self {
            config,
            session: SessionState::default(),
            tracker,
            clock: GameClock::new(),
            debug_enabled: false,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current session state.
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    /// The unit on the road, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<&InFlightDispatch> {
        self.tracker.in_flight()
    }

    /// Simulated milliseconds since the engine was created.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Whether the debug overlay is on.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    /// Apply a player command.
    pub fn apply(&mut self, command: PlayerCommand) -> CommandOutcome {
        match command {
            PlayerCommand::AnswerCall => self.answer_call(),
            PlayerCommand::Start { difficulty } => self.start_game(difficulty),
            PlayerCommand::Dispatch { destination } => self.begin_dispatch(destination),
            PlayerCommand::ToggleDebug => {
                self.toggle_debug();
                CommandOutcome::Applied { events: Vec::new() }
            }
            PlayerCommand::Reset => CommandOutcome::Applied {
                events: self.reset(),
            },
        }
    }

    /// Pick up the incoming call.
    pub fn answer_call(&mut self) -> CommandOutcome {
        match self.reduce(&SessionEvent::AnswerCall) {
            Ok(events) => {
                tracing::info!("Call answered");
                CommandOutcome::Applied { events }
            }
            Err(reason) => CommandOutcome::ignored(reason),
        }
    }

    /// Start a session at the given difficulty.
    ///
    /// Accepted only from the briefing, once the call is answered. Clears
    /// any unit on the road and starts the game clock.
    pub fn start_game(&mut self, difficulty: Difficulty) -> CommandOutcome {
        let event = SessionEvent::Start {
            profile: self.config.profiles.get(difficulty).clone(),
            total_clues: self.config.clues.len(),
        };
        match self.reduce(&event) {
            Ok(events) => {
                self.tracker.clear();
                self.clock.disarm_travel();
                self.clock.arm_clock();
                tracing::info!(
                    %difficulty,
                    units = self.session.units_remaining,
                    time_limit_secs = self.session.time_limit_secs,
                    "Game started"
                );
                CommandOutcome::Applied { events }
            }
            Err(reason) => CommandOutcome::ignored(reason),
        }
    }

    /// Send a unit toward `destination` for the active clue.
    ///
    /// Ignored unless the session is active, no unit is on the road and the
    /// destination is on the map. No unit is spent until the search fails.
    pub fn begin_dispatch(&mut self, destination: GridPos) -> CommandOutcome {
        let phase = self.session.phase;
        if phase != Phase::Active {
            return CommandOutcome::ignored(IgnoreReason::NotActive { phase });
        }
        let clue_id = self.session.active_clue_index;

        match self.tracker.begin(destination, clue_id) {
            Ok(dispatch) => {
                let dispatch_id = dispatch.id;
                self.clock.arm_travel();
                tracing::debug!(
                    dispatch = dispatch_id.0,
                    clue_id,
                    destination = %destination,
                    "Unit dispatched"
                );
                CommandOutcome::Applied {
                    events: vec![GameEvent::DispatchStarted {
                        dispatch_id,
                        destination,
                        clue_id,
                    }],
                }
            }
            Err(reason) => CommandOutcome::ignored(reason),
        }
    }

    /// One second of the game clock.
    ///
    /// Inert outside active play; reaching the time limit loses the session.
    pub fn tick_clock(&mut self) -> Vec<GameEvent> {
        match self.reduce(&SessionEvent::ClockTick) {
            Ok(events) => {
                tracing::trace!(elapsed_secs = self.session.elapsed_secs, "Clock tick");
                events
            }
            Err(_) => Vec::new(),
        }
    }

    /// Advance the unit on the road by a fraction of the full trip.
    ///
    /// Resolves the arrival when the trip completes. Inert outside active
    /// play or with no unit on the road.
    pub fn advance(&mut self, delta: Fixed) -> Vec<GameEvent> {
        if self.session.phase != Phase::Active {
            return Vec::new();
        }
        match self.tracker.advance(delta) {
            Some(arrived) => self.handle_arrival(&arrived),
            None => Vec::new(),
        }
    }

    /// One 100ms step of the travel clock.
    pub fn travel_tick(&mut self) -> Vec<GameEvent> {
        if self.session.phase != Phase::Active {
            return Vec::new();
        }
        // TRAVEL_TICK_MS is a small constant
        #[allow(clippy::cast_possible_truncation)]
        let step = TRAVEL_TICK_MS as u32;
        match self.tracker.advance_ms(step) {
            Some(arrived) => self.handle_arrival(&arrived),
            None => Vec::new(),
        }
    }

    /// Let `ms` milliseconds of simulated time pass, delivering every clock
    /// and travel tick that falls due in timestamp order.
    pub fn run_for(&mut self, ms: u64) -> Vec<GameEvent> {
        let until = self.clock.now_ms().saturating_add(ms);
        let mut events = Vec::new();

        while let Some(tick) = self.clock.pop_due(until) {
            match tick {
                ScheduledTick::Travel => {
                    events.extend(self.travel_tick());
                    if self.tracker.in_flight().is_none() {
                        self.clock.disarm_travel();
                    }
                }
                ScheduledTick::Clock => {
                    events.extend(self.tick_clock());
                    if self.session.phase != Phase::Active {
                        self.clock.disarm_clock();
                    }
                }
            }
        }

        self.clock.settle(until);
        events
    }

    /// Abandon everything and return to the incoming call. Always legal.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        let abandoned = self.tracker.clear();
        self.clock.disarm_clock();
        self.clock.disarm_travel();
        tracing::info!(
            abandoned_dispatch = abandoned.map(|d| d.id.0),
            "Session reset"
        );
        // Reset is legal from every phase.
        self.reduce(&SessionEvent::Reset)
            .unwrap_or_else(|_| vec![GameEvent::Reset])
    }

    /// Flip the debug overlay. Has no effect on resolution.
    pub fn toggle_debug(&mut self) -> bool {
        self.debug_enabled = !self.debug_enabled;
        tracing::debug!(enabled = self.debug_enabled, "Debug overlay toggled");
        self.debug_enabled
    }

    /// Hash of the session, the unit on the road and simulated time.
    ///
    /// Two engines fed the same commands at the same times produce the same
    /// hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.session.hash(&mut hasher);
        self.tracker.hash(&mut hasher);
        self.clock.hash(&mut hasher);
        hasher.finish()
    }

    fn handle_arrival(&mut self, arrived: &InFlightDispatch) -> Vec<GameEvent> {
        let outcome = resolve_arrival(arrived, &self.config.clues);
        tracing::debug!(
            dispatch = outcome.dispatch_id.0,
            clue_id = outcome.clue_id,
            destination = %outcome.destination,
            success = outcome.success,
            "Unit arrived"
        );

        let mut events = vec![GameEvent::UnitArrived(outcome.clone())];
        match self.reduce(&SessionEvent::Arrival(outcome)) {
            Ok(produced) => events.extend(produced),
            Err(reason) => tracing::debug!(%reason, "Arrival discarded"),
        }
        events
    }

    /// Run the session transition function and commit its result.
    ///
    /// Entering a terminal phase stops both clocks and recalls any unit
    /// still on the road, so later ticks cannot touch the finished session.
    fn reduce(&mut self, event: &SessionEvent) -> Result<Vec<GameEvent>, IgnoreReason> {
        let (state, mut events) = match reduce(&self.session, event) {
            Reduction::Applied { state, events } => (state, events),
            Reduction::Ignored(reason) => return Err(reason),
        };
        let was_terminal = self.session.phase.is_terminal();
        self.session = state;

        if self.session.phase.is_terminal() && !was_terminal {
            self.clock.disarm_clock();
            self.clock.disarm_travel();
            if let Some(abandoned) = self.tracker.clear() {
                events.push(GameEvent::DispatchAbandoned {
                    dispatch_id: abandoned.id,
                });
            }
            match self.session.phase {
                Phase::Won => tracing::info!(
                    elapsed_secs = self.session.elapsed_secs,
                    units_used = self.session.units_used(),
                    "Caller located - case solved"
                ),
                _ => tracing::info!(
                    reason = ?self.session.loss_reason,
                    elapsed_secs = self.session.elapsed_secs,
                    "Case lost"
                ),
            }
        }
        Ok(events)
    }
}
