//! Configuration Keys
//!
//! The six host settings this subsystem owns, their seeded defaults, and
//! the derived reads the listener and bootstrap rely on.

use host_api::{ConfigStore, SelectOption, SettingKind, SettingSpec};
use serde_json::Value;
use storage::ConnectSettings;
use tracing::{info, warn};

/// Master switch; everything stays dormant while false.
pub const ACTIVE: &str = "sql_log_active";
/// SQL server address.
pub const SERVER: &str = "sql_log_server";
/// SQL server user.
pub const USERNAME: &str = "sql_log_username";
/// SQL server password.
pub const PASSWORD: &str = "sql_log_password";
/// Database the per-sensor tables live in.
pub const DATABASE: &str = "sql_log_database";
/// Minimum change from the last logged value before a new row is written.
pub const MIN_DEVIATION: &str = "sql_log_min_deviation";

/// Default deviation threshold.
pub const DEFAULT_MIN_DEVIATION: f64 = 0.3;

fn text_spec(key: &str, description: &str) -> SettingSpec {
    SettingSpec {
        key: key.to_string(),
        default: Value::String(String::new()),
        kind: SettingKind::Text,
        description: description.to_string(),
        source: crate::SUBSYSTEM_NAME.to_string(),
        options: None,
    }
}

/// Descriptors for all settings this subsystem registers.
pub fn specs() -> Vec<SettingSpec> {
    vec![
        SettingSpec {
            key: ACTIVE.to_string(),
            default: Value::Bool(false),
            kind: SettingKind::Select,
            description: "Log sensor values to a SQL database? Requires a reboot.".to_string(),
            source: crate::SUBSYSTEM_NAME.to_string(),
            options: Some(vec![
                SelectOption {
                    label: "Yes".to_string(),
                    value: Value::Bool(true),
                },
                SelectOption {
                    label: "No".to_string(),
                    value: Value::Bool(false),
                },
            ]),
        },
        text_spec(SERVER, "SQL server address"),
        text_spec(USERNAME, "Username for the SQL server"),
        text_spec(PASSWORD, "Password for the SQL server"),
        text_spec(DATABASE, "Name of the SQL database"),
        SettingSpec {
            key: MIN_DEVIATION.to_string(),
            default: Value::from(DEFAULT_MIN_DEVIATION),
            kind: SettingKind::Number,
            description: "Minimum change from the last logged value before a new row is written"
                .to_string(),
            source: crate::SUBSYSTEM_NAME.to_string(),
            options: None,
        },
    ]
}

/// Seed any missing settings with their defaults.
///
/// Existing values are left alone; a key the store rejects is logged as a
/// warning and seeding continues with the rest.
pub async fn seed_missing(config: &dyn ConfigStore) {
    for spec in specs() {
        if config.get(&spec.key).is_some() {
            continue;
        }
        info!("Seeding setting {}", spec.key);
        if let Err(err) = config.add(&spec).await {
            warn!("Unable to seed setting {}: {}", spec.key, err);
        }
    }
}

/// Whether everything the listener needs before writing is configured:
/// the active flag plus the four connection settings, all non-empty.
pub fn settings_complete(config: &dyn ConfigStore) -> bool {
    config.get_bool(ACTIVE, false)
        && [SERVER, USERNAME, PASSWORD, DATABASE]
            .iter()
            .all(|key| config.get_str(key).is_some_and(|v| !v.is_empty()))
}

/// Current deviation threshold.
///
/// Read fresh from the store on every decision so operator changes apply
/// without a restart.
pub fn min_deviation(config: &dyn ConfigStore) -> f64 {
    config.get_f64(MIN_DEVIATION, DEFAULT_MIN_DEVIATION)
}

/// Pool connection settings, if all four connection keys are non-empty.
pub fn connect_settings(config: &dyn ConfigStore) -> Option<ConnectSettings> {
    let server = config.get_str(SERVER).filter(|v| !v.is_empty())?;
    let username = config.get_str(USERNAME).filter(|v| !v.is_empty())?;
    let password = config.get_str(PASSWORD).filter(|v| !v.is_empty())?;
    let database = config.get_str(DATABASE).filter(|v| !v.is_empty())?;
    Some(ConnectSettings::new(&server, &username, &password, &database))
}
