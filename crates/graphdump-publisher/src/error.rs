//! Pipeline errors.

use std::path::{Path, PathBuf};

use graphdump_core::CoreError;
use thiserror::Error;

use crate::export::ExportError;
use crate::store::StoreError;

/// Errors that abort a dump run (or, during cleanup, a single cleanup item).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// More than one dataset without a newer revision: the chain is broken.
    #[error("expected at most one previous revision of {subject}, found {}", .found.join(", "))]
    Consistency { subject: String, found: Vec<String> },

    #[error(transparent)]
    Core(#[from] CoreError),

    /// A blocking job panicked or was cancelled.
    #[error("background job failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
