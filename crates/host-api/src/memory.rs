//! In-Memory Host Implementations
//!
//! Reference implementations of the host interfaces, used by embedders
//! without a full host and by the test suites.

use crate::{
    ConfigError, ConfigStore, Host, ListenerId, Sensor, SensorDataListener, SensorEvent,
    SensorEventBus, SensorRegistry, SettingSpec,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory settings store.
#[derive(Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<String, Value>>,
    rejected: Mutex<HashSet<String>>,
    seeded: Mutex<Vec<SettingSpec>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, overwriting any existing one.
    pub fn set(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }

    /// Make `add` fail for `key`, mimicking store-side key validation.
    pub fn reject_key(&self, key: &str) {
        if let Ok(mut rejected) = self.rejected.lock() {
            rejected.insert(key.to_string());
        }
    }

    /// Specs registered through `add`, in call order.
    pub fn seeded_specs(&self) -> Vec<SettingSpec> {
        self.seeded.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().ok().and_then(|v| v.get(key).cloned())
    }

    async fn add(&self, spec: &SettingSpec) -> Result<(), ConfigError> {
        let rejected = self
            .rejected
            .lock()
            .map(|r| r.contains(&spec.key))
            .unwrap_or(false);
        if rejected {
            return Err(ConfigError::Rejected {
                key: spec.key.clone(),
                reason: "rejected by store".to_string(),
            });
        }
        if let Ok(mut values) = self.values.lock() {
            values
                .entry(spec.key.clone())
                .or_insert_with(|| spec.default.clone());
        }
        if let Ok(mut seeded) = self.seeded.lock() {
            seeded.push(spec.clone());
        }
        Ok(())
    }
}

/// In-memory sensor registry.
#[derive(Default)]
pub struct MemorySensorRegistry {
    sensors: Mutex<HashMap<String, Sensor>>,
}

impl MemorySensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor.
    pub fn insert(&self, id: &str, name: &str) {
        if let Ok(mut sensors) = self.sensors.lock() {
            sensors.insert(
                id.to_string(),
                Sensor {
                    id: id.to_string(),
                    name: name.to_string(),
                },
            );
        }
    }
}

impl SensorRegistry for MemorySensorRegistry {
    fn find_by_id(&self, sensor_id: &str) -> Option<Sensor> {
        self.sensors
            .lock()
            .ok()
            .and_then(|s| s.get(sensor_id).cloned())
    }
}

/// In-memory sensor event bus delivering events serially, in registration
/// order, one event at a time.
#[derive(Default)]
pub struct MemoryEventBus {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn SensorDataListener>)>>,
    next_id: AtomicU64,
}

impl MemoryEventBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one event to every registered listener.
    pub async fn emit(&self, event: SensorEvent) {
        let listeners: Vec<Arc<dyn SensorDataListener>> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener.on_sensor_data(event.clone()).await;
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl SensorEventBus for MemoryEventBus {
    fn add_sensor_data_listener(&self, listener: Arc<dyn SensorDataListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, listener));
        }
        debug!("Registered sensor data listener {}", id);
        id
    }
}

/// In-memory host aggregating the three interfaces.
pub struct MemoryHost {
    pub config: Arc<MemoryConfigStore>,
    pub sensors: Arc<MemorySensorRegistry>,
    pub events: Arc<MemoryEventBus>,
}

impl MemoryHost {
    /// Create a host with empty store, registry, and bus.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(MemoryConfigStore::new()),
            sensors: Arc::new(MemorySensorRegistry::new()),
            events: Arc::new(MemoryEventBus::new()),
        })
    }
}

impl Host for MemoryHost {
    fn config(&self) -> Arc<dyn ConfigStore> {
        self.config.clone()
    }

    fn sensors(&self) -> Arc<dyn SensorRegistry> {
        self.sensors.clone()
    }

    fn events(&self) -> Arc<dyn SensorEventBus> {
        self.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingKind;
    use chrono::Utc;

    fn spec(key: &str, default: Value) -> SettingSpec {
        SettingSpec {
            key: key.to_string(),
            default,
            kind: SettingKind::Text,
            description: String::new(),
            source: "test".to_string(),
            options: None,
        }
    }

    #[tokio::test]
    async fn add_never_overwrites_existing_values() {
        let store = MemoryConfigStore::new();
        store.set("server", Value::String("db.local".to_string()));
        store.add(&spec("server", Value::String(String::new()))).await.unwrap();
        assert_eq!(store.get_str("server").unwrap(), "db.local");
    }

    #[tokio::test]
    async fn rejected_keys_error() {
        let store = MemoryConfigStore::new();
        store.reject_key("bad");
        assert!(store.add(&spec("bad", Value::Null)).await.is_err());
        assert!(store.get("bad").is_none());
    }

    #[test]
    fn typed_getters_fall_back_to_defaults() {
        let store = MemoryConfigStore::new();
        store.set("active", Value::Bool(true));
        assert!(store.get_bool("active", false));
        assert!(!store.get_bool("missing", false));
        assert_eq!(store.get_f64("missing", 0.3), 0.3);
        assert!(store.get_str("active").is_none());
    }

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl SensorDataListener for Recorder {
        async fn on_sensor_data(&self, event: SensorEvent) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(event.sensor_id);
            }
        }
    }

    #[tokio::test]
    async fn bus_fans_events_out_to_all_listeners() {
        let bus = MemoryEventBus::new();
        let first = Arc::new(Recorder(Mutex::new(Vec::new())));
        let second = Arc::new(Recorder(Mutex::new(Vec::new())));
        let id1 = bus.add_sensor_data_listener(first.clone());
        let id2 = bus.add_sensor_data_listener(second.clone());
        assert_ne!(id1, id2);
        assert_eq!(bus.listener_count(), 2);

        bus.emit(SensorEvent {
            sensor_id: "kettle1".to_string(),
            value: "20.0".to_string(),
            timestamp: Utc::now(),
            display_name: "Kettle".to_string(),
        })
        .await;

        assert_eq!(*first.0.lock().unwrap(), vec!["kettle1"]);
        assert_eq!(*second.0.lock().unwrap(), vec!["kettle1"]);
    }
}
