//! SQL Sensor Log
//!
//! Background subsystem that listens to the host's sensor event stream and
//! persists significant readings into a SQL database, one table per sensor.
//! Dormant unless enabled in the host settings; a failure anywhere in here
//! must never interrupt the host or its event delivery.

mod listener;
mod service;
pub mod settings;

pub use listener::{SampleSink, SqlLogListener};
pub use service::{setup, Lifecycle, SqlLogService};

/// Name this subsystem registers under with the host.
pub const SUBSYSTEM_NAME: &str = "sensor-log-sql";
