//! Scheduled task lookup result.

use serde::{Deserialize, Serialize};

use crate::ids::{JobUri, TaskUri};

/// A task confirmed to be a scheduled dump task, together with its job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task: TaskUri,
    pub job: JobUri,
    pub job_operation: String,
}

impl ScheduledTask {
    /// True if the owning job runs `operation`.
    pub fn job_runs(&self, operation: &str) -> bool {
        self.job_operation == operation
    }
}
