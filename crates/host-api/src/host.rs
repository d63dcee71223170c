//! Host Handle

use crate::{ConfigStore, SensorEventBus, SensorRegistry};
use std::sync::Arc;

/// Handle to the host application, as seen by a registered subsystem.
pub trait Host: Send + Sync {
    /// Process-wide settings store.
    fn config(&self) -> Arc<dyn ConfigStore>;

    /// Registered sensors.
    fn sensors(&self) -> Arc<dyn SensorRegistry>;

    /// Sensor event stream.
    fn events(&self) -> Arc<dyn SensorEventBus>;
}
