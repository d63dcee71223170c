//! Host Integration API
//!
//! The narrow interfaces the SQL sensor log consumes from the brewing-control
//! host: the settings store, the sensor registry, and the sensor event
//! stream. The host side of these interfaces is out of scope; `memory`
//! provides in-memory implementations for embedding and tests.

mod config;
mod event;
mod host;
pub mod memory;
mod registry;

pub use config::{ConfigError, ConfigStore, SelectOption, SettingKind, SettingSpec};
pub use event::{ListenerId, SensorDataListener, SensorEvent, SensorEventBus, SensorSample};
pub use host::Host;
pub use registry::{Sensor, SensorRegistry};
