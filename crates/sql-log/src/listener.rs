//! Ingestion Listener
//!
//! Receives every sensor event the host emits, runs the deviation filter,
//! and forwards accepted samples to the persistence gateway. Storage
//! failures are logged and absorbed here; the host's event delivery must
//! never see an error from this subsystem.

use crate::settings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deviation_filter::{SensorLastState, SensorStateStore};
use host_api::{ConfigStore, SensorDataListener, SensorEvent, SensorRegistry};
use std::sync::Arc;
use storage::{SampleWriter, StorageError};
use tokio::sync::Mutex;
use tracing::{error, warn};

/// Destination for accepted samples.
#[async_trait]
pub trait SampleSink: Send + Sync {
    async fn write_sample(
        &self,
        sensor_name: &str,
        sensor_id: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

#[async_trait]
impl SampleSink for SampleWriter {
    async fn write_sample(
        &self,
        sensor_name: &str,
        sensor_id: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        SampleWriter::write_sample(self, sensor_name, sensor_id, value, timestamp).await
    }
}

/// Listener bridging the host event stream to the sample sink.
pub struct SqlLogListener {
    config: Arc<dyn ConfigStore>,
    sensors: Arc<dyn SensorRegistry>,
    sink: Arc<dyn SampleSink>,
    /// Per-sensor filter state. The mutex serializes delivery so the
    /// repeat-count invariant holds even if the host ever invokes the
    /// callback concurrently.
    states: Mutex<SensorStateStore>,
}

impl SqlLogListener {
    /// Create a listener over the given collaborators.
    pub fn new(
        config: Arc<dyn ConfigStore>,
        sensors: Arc<dyn SensorRegistry>,
        sink: Arc<dyn SampleSink>,
    ) -> Self {
        Self {
            config,
            sensors,
            sink,
            states: Mutex::new(SensorStateStore::new()),
        }
    }

    /// Filter state for one sensor, if it has produced any sample.
    pub async fn sensor_state(&self, sensor_id: &str) -> Option<SensorLastState> {
        self.states.lock().await.last_state(sensor_id)
    }

    /// Number of sensors the filter has seen.
    pub async fn tracked_sensors(&self) -> usize {
        self.states.lock().await.len()
    }
}

#[async_trait]
impl SensorDataListener for SqlLogListener {
    async fn on_sensor_data(&self, event: SensorEvent) {
        if !settings::settings_complete(self.config.as_ref()) {
            warn!("Not all SQL log settings are set, skipping sample");
            return;
        }

        // Ids absent from the registry are stale; drop the sample.
        if self.sensors.find_by_id(&event.sensor_id).is_none() {
            return;
        }

        let Some(sample) = event.to_sample() else {
            warn!(
                "Discarding unparsable reading {:?} from sensor {}",
                event.value, event.sensor_id
            );
            return;
        };

        let min_deviation = settings::min_deviation(self.config.as_ref());
        let decision = {
            let mut states = self.states.lock().await;
            states.decide(&sample.sensor_id, sample.value, min_deviation)
        };

        if decision.write || decision.forced_by_repeat {
            if let Err(err) = self
                .sink
                .write_sample(
                    &sample.display_name,
                    &sample.sensor_id,
                    sample.value,
                    sample.timestamp,
                )
                .await
            {
                error!("Failed to log sample for sensor {}: {}", sample.sensor_id, err);
            }
        }
    }
}
