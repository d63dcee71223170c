//! Deviation Filter Implementation

use std::collections::HashMap;
use tracing::debug;

/// Maximum consecutive suppressed samples before a write is forced.
///
/// With the ceiling at 9 rejects, a downstream consumer sees at least one
/// row for every 10 samples and can use that as a liveness signal.
pub const REPEAT_CEILING: u32 = 9;

/// Last recorded value and suppression counter for one sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorLastState {
    /// Value of the last accepted write, absent until the first sample.
    pub last_value: Option<f64>,
    /// Consecutive samples suppressed since the last accepted write.
    pub repeat_count: u32,
}

/// Outcome of a filter decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the sample should be persisted.
    pub write: bool,
    /// Whether the write was forced by the repeat ceiling rather than by
    /// deviation.
    pub forced_by_repeat: bool,
}

/// Per-sensor filter state, keyed by sensor id.
///
/// Entries are created on the first sample for a sensor and live for the
/// process lifetime. Callers own the store and must serialize access to it;
/// `decide` mutates the entry for the given sensor only.
#[derive(Debug, Default)]
pub struct SensorStateStore {
    states: HashMap<String, SensorLastState>,
}

impl SensorStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Decide whether `value` for `sensor_id` should be persisted.
    ///
    /// Accepts the sample when no value has been recorded yet, when it
    /// deviates from the last recorded value by at least `min_deviation`
    /// (sign-agnostic), or when the repeat ceiling has been reached. An
    /// accepted sample becomes the new baseline and resets the counter; a
    /// rejected one increments it.
    pub fn decide(&mut self, sensor_id: &str, value: f64, min_deviation: f64) -> Decision {
        let state = self.states.entry(sensor_id.to_string()).or_default();

        let deviated = match state.last_value {
            None => true,
            Some(last) => (value - last).abs() >= min_deviation,
        };
        let at_ceiling = state.repeat_count >= REPEAT_CEILING;

        if deviated || at_ceiling {
            state.last_value = Some(value);
            state.repeat_count = 0;
            Decision {
                write: true,
                forced_by_repeat: at_ceiling,
            }
        } else {
            state.repeat_count += 1;
            debug!(
                "Suppressed sample {} for sensor {} (repeat {})",
                value, sensor_id, state.repeat_count
            );
            Decision {
                write: false,
                forced_by_repeat: false,
            }
        }
    }

    /// Last recorded state for a sensor, if it has produced any sample.
    pub fn last_state(&self, sensor_id: &str) -> Option<SensorLastState> {
        self.states.get(sensor_id).copied()
    }

    /// Number of sensors ever seen.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no sensor has produced a sample yet.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn accepts(store: &mut SensorStateStore, id: &str, values: &[f64], d: f64) -> Vec<bool> {
        values.iter().map(|v| store.decide(id, *v, d).write).collect()
    }

    #[test]
    fn test_first_sample_always_accepted() {
        let mut store = SensorStateStore::new();
        let decision = store.decide("kettle", 20.0, 100.0);
        assert!(decision.write);
        assert!(!decision.forced_by_repeat);
    }

    #[test]
    fn test_small_deviation_suppressed_until_baseline_moves() {
        // min_deviation 0.5: 20.2 is only 0.2 away, but 20.6 is 0.6 away
        // from the 20.0 baseline.
        let mut store = SensorStateStore::new();
        assert_eq!(
            accepts(&mut store, "s1", &[20.0, 20.2, 20.6], 0.5),
            vec![true, false, true]
        );
        assert_eq!(store.last_state("s1").unwrap().last_value, Some(20.6));
    }

    #[test]
    fn test_repeat_ceiling_forces_heartbeat_write() {
        // 15 identical samples: writes on #1 (first ever) and #11 (ceiling).
        let mut store = SensorStateStore::new();
        let written = accepts(&mut store, "s2", &[25.0; 15], 1.0);
        let write_positions: Vec<usize> = written
            .iter()
            .enumerate()
            .filter(|(_, w)| **w)
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(write_positions, vec![1, 11]);
    }

    #[test]
    fn test_forced_flag_set_only_at_ceiling() {
        let mut store = SensorStateStore::new();
        store.decide("s", 25.0, 1.0);
        for _ in 0..9 {
            assert!(!store.decide("s", 25.0, 1.0).write);
        }
        let forced = store.decide("s", 25.0, 1.0);
        assert!(forced.write);
        assert!(forced.forced_by_repeat);
        // Counter was reset, so the next identical sample is suppressed again.
        assert!(!store.decide("s", 25.0, 1.0).write);
    }

    #[test]
    fn test_exact_threshold_is_accepted() {
        let mut store = SensorStateStore::new();
        store.decide("s", 20.0, 0.5);
        assert!(store.decide("s", 20.5, 0.5).write);
        assert!(store.decide("s", 20.0, 0.5).write);
    }

    #[test]
    fn test_deviation_is_sign_agnostic() {
        let mut store = SensorStateStore::new();
        store.decide("s", 20.0, 0.5);
        assert!(store.decide("s", 19.4, 0.5).write);
    }

    #[test]
    fn test_sensors_are_independent() {
        let mut store = SensorStateStore::new();
        store.decide("a", 20.0, 0.5);
        store.decide("a", 20.1, 0.5);
        // A fresh sensor starts from an absent baseline regardless of "a".
        assert!(store.decide("b", 20.1, 0.5).write);
        assert_eq!(store.last_state("a").unwrap().repeat_count, 1);
        assert_eq!(store.last_state("b").unwrap().repeat_count, 0);
        assert_eq!(store.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_first_sample_accepted(value in -1e6f64..1e6, d in 0.0f64..1e3) {
            let mut store = SensorStateStore::new();
            prop_assert!(store.decide("s", value, d).write);
        }

        #[test]
        fn prop_at_most_nine_rejects_between_writes(
            values in proptest::collection::vec(-50.0f64..50.0, 1..200),
            d in 0.1f64..10.0,
        ) {
            let mut store = SensorStateStore::new();
            let mut rejects_in_a_row = 0u32;
            for value in values {
                if store.decide("s", value, d).write {
                    rejects_in_a_row = 0;
                } else {
                    rejects_in_a_row += 1;
                }
                prop_assert!(rejects_in_a_row <= REPEAT_CEILING);
            }
        }

        #[test]
        fn prop_accepted_iff_deviation_or_ceiling(
            values in proptest::collection::vec(-50.0f64..50.0, 1..100),
            d in 0.1f64..10.0,
        ) {
            let mut store = SensorStateStore::new();
            let mut baseline: Option<f64> = None;
            let mut repeats = 0u32;
            for value in values {
                let expected = match baseline {
                    None => true,
                    Some(last) => (value - last).abs() >= d || repeats >= REPEAT_CEILING,
                };
                let decision = store.decide("s", value, d);
                prop_assert_eq!(decision.write, expected);
                if expected {
                    baseline = Some(value);
                    repeats = 0;
                } else {
                    repeats += 1;
                }
            }
        }
    }
}
