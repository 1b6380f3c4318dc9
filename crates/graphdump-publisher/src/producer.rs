//! Produces the dump artifacts of a run.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use graphdump_core::DumpArtifacts;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::PipelineError;
use crate::export::Exporter;
use crate::files;

/// Exports the configured graph, moves the result into the dump directory
/// and compresses it.
pub struct DumpProducer {
    config: Arc<Config>,
    exporter: Arc<dyn Exporter>,
}

impl DumpProducer {
    pub fn new(config: Arc<Config>, exporter: Arc<dyn Exporter>) -> Self {
        Self { config, exporter }
    }

    /// Create the dump directory if it does not exist yet.
    pub async fn ensure_dump_dir(&self) -> Result<PathBuf, PipelineError> {
        let dir = self.config.dump_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(PipelineError::io(&dir))?;
        Ok(dir)
    }

    /// Produce the plain and compressed dump.
    ///
    /// Nothing is registered in the store here; on error the run stops
    /// before any metadata exists.
    pub async fn produce(&self) -> Result<DumpArtifacts, PipelineError> {
        let ttl = self.export().await?;
        match files::compress(&ttl).await {
            Ok(compressed) => Ok(DumpArtifacts { ttl, compressed }),
            Err(e) => {
                files::discard(&ttl).await;
                Err(e)
            }
        }
    }

    async fn export(&self) -> Result<PathBuf, PipelineError> {
        let token = Uuid::new_v4();
        let prefix = format!(
            "{}/{}-",
            self.config.export_prefix.trim_end_matches('/'),
            token
        );

        info!(graph = %self.config.graph_to_dump, prefix = %prefix, "Started generating dump file");
        self.exporter
            .export_graph(
                &self.config.graph_to_dump,
                &prefix,
                self.config.export_row_ceiling,
            )
            .await?;
        info!(graph = %self.config.graph_to_dump, "Finished generating dump file");

        // Only the first part is picked up; the ceiling is set high enough
        // that the engine never splits.
        let source = self.config.export_dir.join(format!("{token}-000001.ttl"));
        let destination = self.ensure_dump_dir().await?.join(dump_file_name(Utc::now()));
        files::move_file(&source, &destination).await?;
        Ok(destination)
    }
}

/// `graph-dump-<timestamp>-<uuid>.ttl`, timestamp without `:` and `.`.
pub fn dump_file_name(at: DateTime<Utc>) -> String {
    format!(
        "graph-dump-{}-{}.ttl",
        at.format("%Y-%m-%dT%H%M%S%3fZ"),
        Uuid::new_v4()
    )
}
