//! Sample Writer Implementation

use crate::{sensor_table_name, StorageError};
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Port the host's database installations listen on.
const MYSQL_PORT: u16 = 3306;

/// Default pool acquire timeout in seconds.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Default pool size; one writer per process, writes are short.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection settings for the log database.
#[derive(Debug, Clone)]
pub struct ConnectSettings {
    /// Server address.
    pub host: String,
    /// Server port (3306 unless overridden).
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database name.
    pub database: String,
    /// How long a write may wait for a pooled connection.
    pub acquire_timeout: Duration,
    /// Pool size cap.
    pub max_connections: u32,
}

impl ConnectSettings {
    /// Settings for `host` with the standard port and pool defaults.
    pub fn new(host: &str, username: &str, password: &str, database: &str) -> Self {
        Self {
            host: host.to_string(),
            port: MYSQL_PORT,
            username: username.to_string(),
            password: password.to_string(),
            database: database.to_string(),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Appends accepted samples into per-sensor tables over a shared pool.
pub struct SampleWriter {
    pool: MySqlPool,
}

impl SampleWriter {
    /// Connect a pool eagerly; fails when the server is unreachable or the
    /// credentials are wrong.
    pub async fn connect(settings: &ConnectSettings) -> Result<Self, StorageError> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;

        info!(
            "Sample writer pool connected to {}:{}/{}",
            settings.host, settings.port, settings.database
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Append one sample, creating the sensor's table if it does not exist.
    ///
    /// The create-if-absent runs before every insert; both statements share
    /// one connection scope and the insert is committed before the
    /// connection returns to the pool. On any error path the transaction is
    /// dropped and the connection released.
    pub async fn write_sample(
        &self,
        sensor_name: &str,
        sensor_id: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let table = sensor_table_name(sensor_id)?;

        let mut tx = self.pool.begin().await?;

        let create_table_query = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id INT AUTO_INCREMENT PRIMARY KEY, \
             value FLOAT, \
             timestamp DATETIME)",
            table
        );
        sqlx::query(&create_table_query).execute(&mut *tx).await?;

        let insert_query = format!("INSERT INTO {} (value, timestamp) VALUES (?, ?)", table);
        sqlx::query(&insert_query)
            .bind(value)
            .bind(timestamp)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Logged {} = {} into {}", sensor_name, value, table);
        Ok(())
    }

    /// Close the pool; in-flight writes finish, later ones fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Whether the pool has been closed.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
