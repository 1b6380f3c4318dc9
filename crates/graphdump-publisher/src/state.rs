//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::export::Exporter;
use crate::metrics::Metrics;
use crate::store::Store;

/// Shared application state.
pub struct AppState {
    /// Resolved configuration.
    pub config: Arc<Config>,

    /// Triple store access.
    pub store: Arc<dyn Store>,

    /// Graph export engine.
    pub exporter: Arc<dyn Exporter>,

    /// Run counters.
    pub metrics: Metrics,

    /// One lock per dataset subject, created on first use.
    subject_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    pub fn new(config: Config, store: Arc<dyn Store>, exporter: Arc<dyn Exporter>) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            store,
            exporter,
            metrics: Metrics::default(),
            subject_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Lock serializing dump runs for `subject`.
    ///
    /// Only guards runs within this process.
    pub async fn subject_lock(&self, subject: &str) -> Arc<Mutex<()>> {
        self.subject_locks
            .lock()
            .await
            .entry(subject.to_string())
            .or_default()
            .clone()
    }
}
