//! Dump run orchestration.
//!
//! A run marks the task busy, produces the artifacts, registers them as a new
//! dataset revision, links the files to the task and marks it successful.
//! Any error marks the task failed. Runs for the same dataset subject are
//! serialized through the subject lock in [`AppState`].

use std::sync::Arc;

use graphdump_core::{TaskStatus, TaskUri};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::linker::ResultLinker;
use crate::producer::DumpProducer;
use crate::state::AppState;
use crate::status;
use crate::versioning::{DatasetManager, Publication, Retirement};

/// Runs dump tasks against the shared state.
#[derive(Clone)]
pub struct Pipeline {
    state: Arc<AppState>,
    producer: Arc<DumpProducer>,
    datasets: Arc<DatasetManager>,
    linker: Arc<ResultLinker>,
}

impl Pipeline {
    pub fn new(state: Arc<AppState>) -> Self {
        let config = state.config.clone();
        Self {
            producer: Arc::new(DumpProducer::new(config.clone(), state.exporter.clone())),
            datasets: Arc::new(DatasetManager::new(state.store.clone(), config.clone())),
            linker: Arc::new(ResultLinker::new(state.store.clone(), config)),
            state,
        }
    }

    /// Start a run in the background.
    ///
    /// The outcome is only visible through the task status and the logs.
    pub fn spawn(&self, task: TaskUri) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            // Failures are already logged and written to the task.
            let _ = pipeline.run(&task).await;
        })
    }

    /// Run the task to completion, waiting for any earlier run on the same
    /// subject first.
    pub async fn run(&self, task: &TaskUri) -> Result<Publication, PipelineError> {
        let lock = self
            .state
            .subject_lock(&self.state.config.dataset_subject)
            .await;
        let _guard = lock.lock().await;

        self.state.metrics.run_started();
        info!(task = %task, subject = %self.state.config.dataset_subject, "Dump run started");

        match self.execute(task).await {
            Ok(publication) => {
                self.state.metrics.run_succeeded();
                info!(task = %task, dataset = %publication.dataset, "Dump run finished");
                Ok(publication)
            }
            Err(e) => {
                self.state.metrics.run_failed();
                error!(task = %task, error = %e, "Dump run failed");
                if let Err(status_err) =
                    status::update_status(&*self.state.store, task, TaskStatus::Failed).await
                {
                    error!(task = %task, error = %status_err, "Failed to mark task as failed");
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, task: &TaskUri) -> Result<Publication, PipelineError> {
        status::update_status(&*self.state.store, task, TaskStatus::Busy).await?;

        let artifacts = self.producer.produce().await?;
        let publication = self.datasets.publish(&artifacts).await?;

        if let Retirement::Purged(report) = &publication.retirement {
            if !report.is_clean() {
                self.state.metrics.cleanup_failed(report.failures.len());
                warn!(
                    failed = report.failures.len(),
                    attempted = report.attempted(),
                    "Some previous revisions could not be cleaned up"
                );
            }
        }

        self.linker.link_results(task, &artifacts.paths()).await?;
        status::update_status(&*self.state.store, task, TaskStatus::Success).await?;

        Ok(publication)
    }
}
