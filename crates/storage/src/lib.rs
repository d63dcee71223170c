//! Storage Layer
//!
//! Persistence gateway for accepted sensor samples: a pooled MySQL
//! connection, lazy per-sensor table creation, and append-only inserts.
//! Rows are never updated or deleted here; schema changes beyond
//! create-if-absent are manual.

mod table;
mod writer;

pub use table::sensor_table_name;
pub use writer::{ConnectSettings, SampleWriter};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Sensor id unusable as a SQL identifier.
    #[error("sensor id {0:?} cannot be used as a table name")]
    InvalidSensorId(String),

    /// Timed out waiting for a pooled connection.
    #[error("timed out acquiring a database connection")]
    Timeout,

    /// Driver-level connection or query failure.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StorageError::Timeout,
            other => StorageError::Database(other),
        }
    }
}
