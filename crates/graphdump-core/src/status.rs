//! Task status vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

const STATUS_BASE: &str = "http://redpencil.data.gift/id/concept/JobStatus/";

/// Status of a Task, stored as a concept URI under `adms:status`.
///
/// `Scheduled` is only ever written by the external scheduler; this service
/// writes `Busy` when a run starts and one of `Success`/`Failed` when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Scheduled,
    Busy,
    Success,
    Failed,
}

impl TaskStatus {
    /// Short name, also the last URI segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Busy => "busy",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Full concept URI.
    pub fn uri(&self) -> String {
        format!("{}{}", STATUS_BASE, self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
