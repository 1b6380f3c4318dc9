//! Dataset, distribution and file descriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ids::{DatasetUri, DistributionUri};

/// Format of a produced artifact; one distribution is registered per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionFormat {
    /// The plain export.
    Turtle,
    /// The gzip compressed copy of the export.
    Gzip,
}

impl DistributionFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::Gzip => "application/gzip",
        }
    }

    /// Appended to the dataset title to form the distribution title.
    pub fn title_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Turtle => None,
            Self::Gzip => Some(" (gzip compressed)"),
        }
    }
}

/// The two files produced by a dump run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpArtifacts {
    pub ttl: PathBuf,
    pub compressed: PathBuf,
}

impl DumpArtifacts {
    /// Paths paired with the format they are registered under.
    pub fn distributions(&self) -> [(&PathBuf, DistributionFormat); 2] {
        [
            (&self.ttl, DistributionFormat::Turtle),
            (&self.compressed, DistributionFormat::Gzip),
        ]
    }

    pub fn paths(&self) -> [&Path; 2] {
        [self.ttl.as_path(), self.compressed.as_path()]
    }
}

/// Statistics of an artifact, as recorded on its file records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    pub name: String,
    /// Extension including the leading dot, empty if none.
    pub extension: String,
    pub size: u64,
    pub created: DateTime<Utc>,
}

/// A non-current dataset of the subject with its distributions.
///
/// A dataset left behind by an interrupted run may have no distributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousRevision {
    pub dataset: DatasetUri,
    pub distributions: Vec<DistributionUri>,
}
