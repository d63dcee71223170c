//! Settings Store Interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from the host settings store.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The key is not acceptable to the store.
    #[error("invalid setting key: {0}")]
    InvalidKey(String),

    /// The store refused to register the setting.
    #[error("setting store rejected {key}: {reason}")]
    Rejected { key: String, reason: String },
}

/// Presentation type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    /// Choice between fixed options.
    Select,
    /// Free-form string.
    Text,
    /// Numeric value.
    Number,
}

/// One choice offered by a select setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

/// Descriptor used to register a setting with the host store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingSpec {
    /// Store key.
    pub key: String,
    /// Value seeded when the key does not exist yet.
    pub default: Value,
    /// Presentation type.
    pub kind: SettingKind,
    /// Operator-facing description.
    pub description: String,
    /// Subsystem that registered the setting.
    pub source: String,
    /// Options for select settings.
    pub options: Option<Vec<SelectOption>>,
}

/// Read/register access to the host's process-wide settings.
///
/// Values are dynamically typed; the typed getters coerce and fall back to
/// the given default when the key is missing or has the wrong shape.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Raw value for `key`, if present.
    fn get(&self, key: &str) -> Option<Value>;

    /// Register a new setting with its default value.
    ///
    /// Fails when the store rejects the key; an existing value must never
    /// be overwritten.
    async fn add(&self, spec: &SettingSpec) -> Result<(), ConfigError>;

    /// Boolean value for `key`, or `default`.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    /// String value for `key`, if present and a string.
    fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(String::from))
    }

    /// Numeric value for `key`, or `default`.
    fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
    }
}
