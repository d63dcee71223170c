//! Deviation Filter
//!
//! Decides which readings from a continuous sensor stream are worth
//! persisting: a sample is accepted when it is the first one seen for its
//! sensor, when it moved at least the configured threshold away from the
//! last accepted value, or when enough consecutive samples were suppressed
//! that a heartbeat write is forced.

mod filter;

pub use filter::{Decision, SensorLastState, SensorStateStore, REPEAT_CEILING};
