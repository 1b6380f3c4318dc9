//! Delta notification payloads.

use serde::{Deserialize, Serialize};

use crate::ids::TaskUri;
use crate::sparql::Term;
use crate::status::TaskStatus;
use crate::vocab::ADMS_STATUS;

/// A single statement of a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    /// True if this statement sets `adms:status` to `status`.
    pub fn sets_status(&self, status: TaskStatus) -> bool {
        self.predicate.is_uri_eq(ADMS_STATUS) && self.object.is_uri_eq(&status.uri())
    }
}

/// One entry of the delta notification array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub inserts: Vec<Triple>,

    #[serde(default)]
    pub deletes: Vec<Triple>,
}

/// All inserted statements of a batch, in arrival order.
pub fn inserted(batch: &[ChangeSet]) -> Vec<&Triple> {
    batch.iter().flat_map(|cs| cs.inserts.iter()).collect()
}

/// Subject of the first inserted statement marking something as scheduled.
///
/// Only the first one is returned; a batch scheduling several tasks at once
/// only triggers the first.
pub fn first_scheduled_subject<'a>(
    inserts: impl IntoIterator<Item = &'a Triple>,
) -> Option<TaskUri> {
    inserts
        .into_iter()
        .find(|t| t.sets_status(TaskStatus::Scheduled))
        .map(|t| TaskUri::new(t.subject.value.clone()))
}
