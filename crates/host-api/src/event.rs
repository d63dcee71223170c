//! Sensor Event Stream Interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One reading as emitted by the host's sensor log pipeline.
///
/// The value arrives as the raw string the sensor driver produced; consumers
/// that need a number parse it with [`SensorEvent::to_sample`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Stable sensor identifier.
    pub sensor_id: String,
    /// Raw reading.
    pub value: String,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// Operator-facing sensor name.
    pub display_name: String,
}

/// A reading with the value coerced to a float.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSample {
    pub sensor_id: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub display_name: String,
}

impl SensorEvent {
    /// Parse the raw value; `None` when it is not a number.
    pub fn to_sample(&self) -> Option<SensorSample> {
        let value = self.value.trim().parse().ok()?;
        Some(SensorSample {
            sensor_id: self.sensor_id.clone(),
            value,
            timestamp: self.timestamp,
            display_name: self.display_name.clone(),
        })
    }
}

/// Handle identifying one event-stream subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked by the host for every sensor reading.
///
/// Invocations for a single listener are delivered one at a time in emission
/// order; the callback may suspend at its own await points but must not
/// block the host scheduler.
#[async_trait]
pub trait SensorDataListener: Send + Sync {
    async fn on_sensor_data(&self, event: SensorEvent);
}

/// Subscription access to the host's sensor event stream.
pub trait SensorEventBus: Send + Sync {
    /// Register a listener; the returned handle identifies the
    /// subscription for a later unsubscription.
    fn add_sensor_data_listener(&self, listener: Arc<dyn SensorDataListener>) -> ListenerId;
}
