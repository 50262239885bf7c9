//! Simulated time and the two periodic callbacks that drive a session.
//!
//! The game clock ticks once per second while a session is active; the
//! travel clock ticks every 100ms while a unit is on the road. [`GameClock`]
//! turns an amount of elapsed time into those ticks in timestamp order so a
//! host only has to report how much time has passed.
//!
//! When both clocks fall due at the same instant, the travel tick is
//! delivered first: an arrival that ends the session is resolved before a
//! timeout could fire.

use serde::{Deserialize, Serialize};

/// Game clock period in milliseconds.
pub const CLOCK_TICK_MS: u64 = 1000;

/// Travel clock period in milliseconds.
pub const TRAVEL_TICK_MS: u64 = 100;

/// Which periodic callback fell due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledTick {
    /// Advance the unit on the road.
    Travel,
    /// Advance the session clock by one second.
    Clock,
}

/// Simulated time plus the next deadline of each periodic callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GameClock {
    now_ms: u64,
    next_clock_ms: Option<u64>,
    next_travel_ms: Option<u64>,
}

impl GameClock {
    /// Clock at time zero with nothing scheduled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            next_clock_ms: None,
            next_travel_ms: None,
        }
    }

    /// Current simulated time.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Start the game clock; first tick one period from now.
    pub fn arm_clock(&mut self) {
        self.next_clock_ms = Some(self.now_ms + CLOCK_TICK_MS);
    }

    /// Start the travel clock; first tick one period from now.
    pub fn arm_travel(&mut self) {
        self.next_travel_ms = Some(self.now_ms + TRAVEL_TICK_MS);
    }

    /// Stop the game clock.
    pub fn disarm_clock(&mut self) {
        self.next_clock_ms = None;
    }

    /// Stop the travel clock.
    pub fn disarm_travel(&mut self) {
        self.next_travel_ms = None;
    }

    /// Whether the game clock is running.
    #[must_use]
    pub const fn clock_armed(&self) -> bool {
        self.next_clock_ms.is_some()
    }

    /// Whether the travel clock is running.
    #[must_use]
    pub const fn travel_armed(&self) -> bool {
        self.next_travel_ms.is_some()
    }

    /// Pop the earliest tick due at or before `until_ms`.
    ///
    /// Moves simulated time to the tick's deadline and schedules the next
    /// one a period later. Returns `None` when nothing is due; call
    /// [`settle`](Self::settle) afterwards to move time to `until_ms`.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledTick> {
        let travel = self.next_travel_ms.filter(|&at| at <= until_ms);
        let clock = self.next_clock_ms.filter(|&at| at <= until_ms);

        match (travel, clock) {
            (Some(travel_at), Some(clock_at)) if travel_at <= clock_at => {
                self.fire_travel(travel_at)
            }
            (Some(travel_at), None) => self.fire_travel(travel_at),
            (_, Some(clock_at)) => {
                self.now_ms = clock_at;
                self.next_clock_ms = Some(clock_at + CLOCK_TICK_MS);
                Some(ScheduledTick::Clock)
            }
            (None, None) => None,
        }
    }

    /// Move simulated time forward to `until_ms` once no ticks remain due.
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    fn fire_travel(&mut self, at: u64) -> Option<ScheduledTick> {
        self.now_ms = at;
        self.next_travel_ms = Some(at + TRAVEL_TICK_MS);
        Some(ScheduledTick::Travel)
    }
}

/// Format seconds as `m:ss`.
#[must_use]
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut GameClock, until: u64) -> Vec<(u64, ScheduledTick)> {
        let mut ticks = Vec::new();
        while let Some(tick) = clock.pop_due(until) {
            ticks.push((clock.now_ms(), tick));
        }
        clock.settle(until);
        ticks
    }

    #[test]
    fn test_nothing_armed_only_moves_time() {
        let mut clock = GameClock::new();
        assert!(drain(&mut clock, 5000).is_empty());
        assert_eq!(clock.now_ms(), 5000);
    }

    #[test]
    fn test_clock_ticks_every_second() {
        let mut clock = GameClock::new();
        clock.arm_clock();
        let ticks = drain(&mut clock, 3500);
        assert_eq!(
            ticks,
            vec![
                (1000, ScheduledTick::Clock),
                (2000, ScheduledTick::Clock),
                (3000, ScheduledTick::Clock),
            ]
        );
        assert_eq!(clock.now_ms(), 3500);
        // next deadline keeps its phase
        assert_eq!(drain(&mut clock, 4000), vec![(4000, ScheduledTick::Clock)]);
    }

    #[test]
    fn test_travel_before_clock_on_tie() {
        let mut clock = GameClock::new();
        clock.arm_clock();
        clock.arm_travel();
        let ticks = drain(&mut clock, 1000);
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[9], (1000, ScheduledTick::Travel));
        assert_eq!(ticks[10], (1000, ScheduledTick::Clock));
    }

    #[test]
    fn test_disarm_stops_ticks() {
        let mut clock = GameClock::new();
        clock.arm_travel();
        assert_eq!(clock.pop_due(100), Some(ScheduledTick::Travel));
        clock.disarm_travel();
        assert_eq!(clock.pop_due(10_000), None);
        assert!(!clock.travel_armed());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(900), "15:00");
    }
}
