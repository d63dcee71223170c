//! Bootstrap Sequencer and Lifecycle
//!
//! One-shot startup: seed missing settings, build the connection pool,
//! register the ingestion listener. The sequence runs as a background task
//! on the host runtime; its failure leaves the subsystem inert without
//! touching the host.

use crate::listener::{SampleSink, SqlLogListener};
use crate::settings;
use host_api::{Host, ListenerId};
use std::sync::{Arc, Mutex};
use storage::SampleWriter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Subsystem lifecycle. One shot: there is no way back to `Dormant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Disabled in settings; nothing was started.
    Dormant,
    /// Bootstrap task running.
    Initializing,
    /// Pool ready and listener registered.
    Active,
    /// Bootstrap failed; subsystem stays inert for the process lifetime.
    Failed,
}

#[derive(Default)]
struct ServiceInner {
    bootstrap: Option<JoinHandle<()>>,
    listener_id: Option<ListenerId>,
    writer: Option<Arc<SampleWriter>>,
}

/// The SQL sensor log subsystem.
pub struct SqlLogService {
    host: Arc<dyn Host>,
    lifecycle: watch::Sender<Lifecycle>,
    inner: Mutex<ServiceInner>,
}

impl SqlLogService {
    /// Register the subsystem with the host.
    ///
    /// Stays dormant when `sql_log_active` is unset or false; otherwise
    /// spawns the bootstrap task on the current runtime and returns
    /// immediately.
    pub fn register(host: Arc<dyn Host>) -> Arc<Self> {
        let (lifecycle, _) = watch::channel(Lifecycle::Dormant);
        let service = Arc::new(Self {
            host,
            lifecycle,
            inner: Mutex::new(ServiceInner::default()),
        });

        if !service
            .host
            .config()
            .get_bool(settings::ACTIVE, false)
        {
            info!("{} disabled in settings, staying dormant", crate::SUBSYSTEM_NAME);
            return service;
        }

        service.lifecycle.send_replace(Lifecycle::Initializing);
        let task = tokio::spawn({
            let service = Arc::clone(&service);
            async move {
                service.run().await;
            }
        });
        if let Ok(mut inner) = service.inner.lock() {
            inner.bootstrap = Some(task);
        }
        service
    }

    async fn run(&self) {
        let config = self.host.config();
        settings::seed_missing(config.as_ref()).await;

        let Some(connect) = settings::connect_settings(config.as_ref()) else {
            warn!("SQL log connection settings are incomplete; subsystem unavailable");
            self.lifecycle.send_replace(Lifecycle::Failed);
            return;
        };

        let writer = match SampleWriter::connect(&connect).await {
            Ok(writer) => Arc::new(writer),
            Err(err) => {
                error!("Failed to create SQL log connection pool: {}", err);
                self.lifecycle.send_replace(Lifecycle::Failed);
                return;
            }
        };

        let listener = Arc::new(SqlLogListener::new(
            config,
            self.host.sensors(),
            writer.clone() as Arc<dyn SampleSink>,
        ));
        let listener_id = self.host.events().add_sensor_data_listener(listener);
        info!("SQL sensor log listener registered with id {}", listener_id);

        if let Ok(mut inner) = self.inner.lock() {
            inner.writer = Some(writer);
            inner.listener_id = Some(listener_id);
        }
        self.lifecycle.send_replace(Lifecycle::Active);
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle.subscribe()
    }

    /// Wait until bootstrap has left `Initializing`.
    pub async fn wait_settled(&self) -> Lifecycle {
        let mut rx = self.lifecycle.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if current != Lifecycle::Initializing {
                return current;
            }
            if rx.changed().await.is_err() {
                return current;
            }
        }
    }

    /// Subscription handle of the registered listener, once active.
    pub fn listener_id(&self) -> Option<ListenerId> {
        self.inner.lock().ok().and_then(|inner| inner.listener_id)
    }

    /// Stop the subsystem: cancel an in-flight bootstrap and close the
    /// connection pool. Safe to call from any state, including `Dormant`.
    pub async fn shutdown(&self) {
        let (task, writer) = match self.inner.lock() {
            Ok(mut inner) => (inner.bootstrap.take(), inner.writer.take()),
            Err(_) => return,
        };
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }
        if let Some(writer) = writer {
            writer.close().await;
            info!("SQL log connection pool closed");
        }
    }
}

/// Registration entry point called by the host at plugin load.
///
/// Must run on the host's async runtime; bootstrap continues in the
/// background and the returned service settles into `Active` or `Failed`,
/// or stays `Dormant` when the subsystem is disabled.
pub fn setup(host: Arc<dyn Host>) -> Arc<SqlLogService> {
    info!("Registering {} subsystem", crate::SUBSYSTEM_NAME);
    SqlLogService::register(host)
}
