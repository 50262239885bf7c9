//! Unit dispatch tracking.
//!
//! A dispatched unit leaves the station, travels for a fixed duration
//! regardless of distance, and is resolved against the clue that was active
//! when it was sent. Only one unit may be on the road at a time.
//!
//! Progress is kept in whole milliseconds of transit time so that repeated
//! fractional advances (150 steps of 1/150) land exactly on arrival instead
//! of drifting just short of it. Fractional advances keep their sub-millisecond
//! remainder so that many tiny steps still add up to a full trip.

use serde::{Deserialize, Serialize};

use crate::catalog::ClueCatalog;
use crate::events::IgnoreReason;
use crate::grid::GridPos;
use crate::math::{fixed_decimal, Fixed, Vec2Fixed};

/// Default transit duration in seconds.
pub const DEFAULT_TRANSIT_SECS: u32 = 15;

/// Unique token for one dispatch within an engine instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DispatchId(pub u64);

/// A unit currently on the road.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InFlightDispatch {
    /// Dispatch token.
    pub id: DispatchId,
    /// Station the unit left from.
    pub origin: GridPos,
    /// Block the operator sent it to.
    pub destination: GridPos,
    /// Clue that was active when the unit was sent.
    pub target_clue_id: u32,
    /// Transit time already travelled.
    elapsed_ms: u32,
    /// Total transit time.
    duration_ms: u32,
    /// Fractional advance not yet applied, in milliseconds, within `[-0.5, 0.5]`.
    #[serde(with = "fixed_decimal", default)]
    carry_ms: Fixed,
}

impl InFlightDispatch {
    /// Fraction of the trip completed, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> Fixed {
        if self.duration_ms == 0 {
            return Fixed::ONE;
        }
        Fixed::from_num(self.elapsed_ms) / Fixed::from_num(self.duration_ms)
    }

    /// Whole seconds until arrival, rounded up.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        (self.duration_ms - self.elapsed_ms).div_ceil(1000)
    }

    /// Whether the unit has reached its destination.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Interpolated position between station and destination.
    #[must_use]
    pub fn current_position(&self) -> Vec2Fixed {
        self.origin
            .to_vec2()
            .lerp(self.destination.to_vec2(), self.fraction())
    }

    /// Advance by a fraction of the full trip, clamped at arrival.
    ///
    /// Non-positive deltas are ignored. The part of a step that does not
    /// make a whole millisecond is carried into the next call.
    pub fn advance(&mut self, delta: Fixed) {
        if delta <= Fixed::ZERO {
            return;
        }
        let total = delta
            .saturating_mul(Fixed::from_num(self.duration_ms))
            .saturating_add(self.carry_ms);
        let whole = total.round();
        self.carry_ms = total - whole;
        self.advance_ms(whole.saturating_to_num::<u32>());
    }

    /// Advance by milliseconds of transit time, clamped at arrival.
    pub fn advance_ms(&mut self, ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms).min(self.duration_ms);
    }
}

/// Result of a unit reaching its destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrivalOutcome {
    /// Dispatch that arrived.
    pub dispatch_id: DispatchId,
    /// Clue the dispatch was evaluated against.
    pub clue_id: u32,
    /// Where the unit searched.
    pub destination: GridPos,
    /// Where the caller actually was.
    pub true_location: GridPos,
    /// Distance between the two, in blocks.
    #[serde(with = "fixed_decimal")]
    pub distance: Fixed,
    /// Whether the caller was inside the acceptance radius.
    pub success: bool,
}

/// Evaluate an arrived dispatch against the clue it was sent for.
///
/// # Panics
///
/// Panics if the dispatch targets a clue id the catalog does not contain.
#[must_use]
pub fn resolve_arrival(dispatch: &InFlightDispatch, catalog: &ClueCatalog) -> ArrivalOutcome {
    let clue = catalog.clue(dispatch.target_clue_id);
    ArrivalOutcome {
        dispatch_id: dispatch.id,
        clue_id: clue.id,
        destination: dispatch.destination,
        true_location: clue.true_location,
        distance: clue.true_location.distance(dispatch.destination),
        success: clue.accepts(dispatch.destination),
    }
}

/// Single-slot tracker for the unit on the road.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchTracker {
    /// Station every unit leaves from.
    origin: GridPos,
    /// Transit time for every trip.
    duration_ms: u32,
    /// Unit currently travelling, if any.
    in_flight: Option<InFlightDispatch>,
    /// Next dispatch token.
    next_id: u64,
}

impl DispatchTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new(origin: GridPos, transit_secs: u32) -> Self {
        Self {
            origin,
            duration_ms: transit_secs.saturating_mul(1000),
            in_flight: None,
            next_id: 1,
        }
    }

    /// The unit currently travelling.
    #[must_use]
    pub fn in_flight(&self) -> Option<&InFlightDispatch> {
        self.in_flight.as_ref()
    }

    /// Send a unit toward `destination` for the given clue.
    ///
    /// Rejected if a unit is already on the road or the destination is off
    /// the map; the tracker is left untouched in that case.
    pub fn begin(
        &mut self,
        destination: GridPos,
        target_clue_id: u32,
    ) -> Result<&InFlightDispatch, IgnoreReason> {
        if self.in_flight.is_some() {
            return Err(IgnoreReason::DispatchInFlight);
        }
        if !destination.in_bounds() {
            return Err(IgnoreReason::OutOfBounds { destination });
        }

        let id = DispatchId(self.next_id);
        self.next_id += 1;
        Ok(self.in_flight.insert(InFlightDispatch {
            id,
            origin: self.origin,
            destination,
            target_clue_id,
            elapsed_ms: 0,
            carry_ms: Fixed::ZERO,
            duration_ms: self.duration_ms,
        }))
    }

    /// Advance the unit on the road by a fraction of the trip.
    ///
    /// Returns the dispatch, removed from the slot, once it arrives.
    pub fn advance(&mut self, delta: Fixed) -> Option<InFlightDispatch> {
        self.in_flight.as_mut()?.advance(delta);
        self.take_arrived()
    }

    /// Advance the unit on the road by milliseconds of transit time.
    pub fn advance_ms(&mut self, ms: u32) -> Option<InFlightDispatch> {
        self.in_flight.as_mut()?.advance_ms(ms);
        self.take_arrived()
    }

    /// Discard the unit on the road, if any.
    pub fn clear(&mut self) -> Option<InFlightDispatch> {
        self.in_flight.take()
    }

    fn take_arrived(&mut self) -> Option<InFlightDispatch> {
        if self.in_flight.as_ref().is_some_and(InFlightDispatch::has_arrived) {
            self.in_flight.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> DispatchTracker {
        DispatchTracker::new(GridPos::new(8, 10), DEFAULT_TRANSIT_SECS)
    }

    #[test]
    fn test_begin_fills_slot() {
        let mut tracker = tracker();
        let dispatch = tracker.begin(GridPos::new(17, 13), 1).unwrap();
        assert_eq!(dispatch.id, DispatchId(1));
        assert_eq!(dispatch.origin, GridPos::new(8, 10));
        assert_eq!(dispatch.fraction(), Fixed::ZERO);
        assert_eq!(dispatch.remaining_secs(), 15);
    }

    #[test]
    fn test_second_begin_rejected() {
        let mut tracker = tracker();
        tracker.begin(GridPos::new(1, 1), 1).unwrap();
        let before = tracker.clone();
        assert_eq!(
            tracker.begin(GridPos::new(2, 2), 1).unwrap_err(),
            IgnoreReason::DispatchInFlight
        );
        assert_eq!(tracker, before);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut tracker = tracker();
        assert!(matches!(
            tracker.begin(GridPos::new(20, 3), 1),
            Err(IgnoreReason::OutOfBounds { .. })
        ));
        assert!(tracker.in_flight().is_none());
    }

    #[test]
    fn test_150_fractional_steps_arrive_exactly() {
        let mut tracker = tracker();
        tracker.begin(GridPos::new(17, 13), 1).unwrap();
        let step = Fixed::ONE / Fixed::from_num(150);

        for _ in 0..149 {
            assert!(tracker.advance(step).is_none());
        }
        assert_eq!(tracker.in_flight().unwrap().remaining_secs(), 1);

        let arrived = tracker.advance(step).expect("should arrive on step 150");
        assert_eq!(arrived.fraction(), Fixed::ONE);
        assert!(tracker.in_flight().is_none());
    }

    #[test]
    fn test_tiny_fractional_steps_accumulate() {
        let mut tracker = tracker();
        tracker.begin(GridPos::new(17, 13), 1).unwrap();

        // Each step is well under a millisecond of a 15 s trip.
        let step = Fixed::ONE / Fixed::from_num(50_000);
        for _ in 0..25_000 {
            assert!(tracker.advance(step).is_none());
        }
        let halfway = tracker.in_flight().unwrap().fraction();
        assert!((halfway - Fixed::from_num(0.5)).abs() < Fixed::from_num(0.001));

        let mut arrived = None;
        for _ in 0..25_000 {
            if let Some(done) = tracker.advance(step) {
                arrived = Some(done);
                break;
            }
        }
        assert_eq!(arrived.expect("full trip arrives").fraction(), Fixed::ONE);
    }

    #[test]
    fn test_sub_millisecond_step_is_not_lost() {
        let mut tracker = tracker();
        tracker.begin(GridPos::new(17, 13), 1).unwrap();
        let step = Fixed::from_num(1) / Fixed::from_num(40_000);

        tracker.advance(step);
        assert_eq!(tracker.in_flight().unwrap().fraction(), Fixed::ZERO);
        tracker.advance(step);
        assert!(tracker.in_flight().unwrap().fraction() > Fixed::ZERO);
    }

    #[test]
    fn test_advance_clamps_at_one() {
        let mut tracker = tracker();
        tracker.begin(GridPos::new(17, 13), 1).unwrap();
        let arrived = tracker.advance(Fixed::from_num(3)).unwrap();
        assert_eq!(arrived.fraction(), Fixed::ONE);
        assert_eq!(arrived.remaining_secs(), 0);
    }

    #[test]
    fn test_negative_advance_ignored() {
        let mut tracker = tracker();
        tracker.begin(GridPos::new(17, 13), 1).unwrap();
        assert!(tracker.advance(Fixed::from_num(-1)).is_none());
        assert_eq!(tracker.in_flight().unwrap().fraction(), Fixed::ZERO);
    }

    #[test]
    fn test_advance_without_dispatch_is_noop() {
        let mut tracker = tracker();
        assert!(tracker.advance_ms(500).is_none());
    }

    #[test]
    fn test_current_position_halfway() {
        let mut tracker = tracker();
        tracker.begin(GridPos::new(18, 10), 1).unwrap();
        tracker.advance_ms(7500);
        let pos = tracker.in_flight().unwrap().current_position();
        assert_eq!(pos, Vec2Fixed::new(Fixed::from_num(13), Fixed::from_num(10)));
    }

    #[test]
    fn test_resolve_arrival_hit_and_miss() {
        let catalog = ClueCatalog::default();
        let mut tracker = tracker();

        tracker.begin(GridPos::new(17, 13), 5).unwrap();
        let hit = resolve_arrival(&tracker.advance_ms(15_000).unwrap(), &catalog);
        assert!(hit.success);
        assert_eq!(hit.distance, Fixed::ZERO);

        // clue 5 has radius 1; two blocks away misses
        tracker.begin(GridPos::new(17, 15), 5).unwrap();
        let miss = resolve_arrival(&tracker.advance_ms(15_000).unwrap(), &catalog);
        assert!(!miss.success);
        assert_eq!(miss.dispatch_id, DispatchId(2));
        assert_eq!(miss.true_location, GridPos::new(17, 13));
    }
}
