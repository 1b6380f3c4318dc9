//! Detects scheduled dump tasks in delta batches.

use std::sync::Arc;

use graphdump_core::delta::{first_scheduled_subject, inserted};
use graphdump_core::sparql::escape_uri;
use graphdump_core::vocab::{JOB_TYPE, PREFIXES, TASK_TYPE};
use graphdump_core::{ChangeSet, JobUri, ScheduledTask, TaskStatus, TaskUri};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::PipelineError;
use crate::store::Store;

/// Finds the task a delta batch schedules, if it is a dump task.
pub struct TaskMatcher {
    store: Arc<dyn Store>,
    config: Arc<Config>,
}

impl TaskMatcher {
    pub fn new(store: Arc<dyn Store>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// Return the scheduled dump task in `batch`, if any.
    ///
    /// Only the first subject marked as scheduled is considered. Lookup errors
    /// are returned, not treated as "no match".
    pub async fn find_scheduled_task(
        &self,
        batch: &[ChangeSet],
    ) -> Result<Option<ScheduledTask>, PipelineError> {
        let Some(candidate) = first_scheduled_subject(inserted(batch)) else {
            return Ok(None);
        };
        debug!(task = %candidate, "Found scheduled subject in delta");

        let results = self
            .store
            .query(&scheduled_task_query(&candidate, &self.config.task_operation))
            .await?;

        for row in results.rows() {
            let task = ScheduledTask {
                task: candidate.clone(),
                job: JobUri::new(row.uri("job")?),
                job_operation: row.uri("jobOperation")?.to_string(),
            };
            if task.job_runs(&self.config.job_operation) {
                info!(task = %task.task, job = %task.job, "Scheduled dump task detected");
                return Ok(Some(task));
            }
            debug!(
                task = %task.task,
                job_operation = %task.job_operation,
                "Job operation does not match, ignoring"
            );
        }

        Ok(None)
    }
}

fn scheduled_task_query(task: &TaskUri, task_operation: &str) -> String {
    format!(
        r#"
    {PREFIXES}

    SELECT DISTINCT ?job ?task ?jobOperation WHERE {{
      BIND({task} as ?task)
      GRAPH ?g {{
          ?job a {job_type};
            task:operation ?jobOperation.

          ?task dct:isPartOf ?job;
            a {task_type};
            task:operation {operation};
            adms:status {scheduled}.
       }}
    }}
  "#,
        task = escape_uri(task.as_str()),
        job_type = escape_uri(JOB_TYPE),
        task_type = escape_uri(TASK_TYPE),
        operation = escape_uri(task_operation),
        scheduled = escape_uri(&TaskStatus::Scheduled.uri()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, FakeStore, TASK};
    use graphdump_core::vocab::{ADMS_STATUS, DEFAULT_OPERATION};
    use graphdump_core::{Binding, Term, Triple};

    fn scheduled_batch(task: &str) -> Vec<ChangeSet> {
        vec![ChangeSet {
            inserts: vec![Triple {
                subject: Term::uri(task),
                predicate: Term::uri(ADMS_STATUS),
                object: Term::uri(TaskStatus::Scheduled.uri()),
            }],
            deletes: vec![],
        }]
    }

    fn job_row(operation: &str) -> Binding {
        Binding::default()
            .with("job", Term::uri("http://redpencil.data.gift/id/job/1"))
            .with("task", Term::uri(TASK))
            .with("jobOperation", Term::uri(operation))
    }

    fn matcher(store: Arc<FakeStore>) -> (TaskMatcher, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(test_config(dir.path()));
        (TaskMatcher::new(store, config), dir)
    }

    #[tokio::test]
    async fn test_matching_job_operation() {
        let store = FakeStore::new();
        store.respond("?jobOperation", &["job", "task", "jobOperation"], vec![job_row(DEFAULT_OPERATION)]);
        let (matcher, _dir) = matcher(store.clone());

        let task = matcher
            .find_scheduled_task(&scheduled_batch(TASK))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(task.task.as_str(), TASK);
        assert_eq!(task.job.as_str(), "http://redpencil.data.gift/id/job/1");
        let queries = store.queries();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains(&format!("<{TASK}>")));
        assert!(queries[0].contains(&TaskStatus::Scheduled.uri()));
    }

    #[tokio::test]
    async fn test_other_job_operation_is_skipped() {
        let store = FakeStore::new();
        store.respond(
            "?jobOperation",
            &["job", "task", "jobOperation"],
            vec![job_row("http://redpencil.data.gift/id/jobs/concept/JobOperation/other")],
        );
        let (matcher, _dir) = matcher(store);

        assert!(matcher
            .find_scheduled_task(&scheduled_batch(TASK))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_no_scheduled_triple_skips_lookup() {
        let store = FakeStore::new();
        let (matcher, _dir) = matcher(store.clone());
        let batch = vec![ChangeSet {
            inserts: vec![Triple {
                subject: Term::uri(TASK),
                predicate: Term::uri(ADMS_STATUS),
                object: Term::uri(TaskStatus::Busy.uri()),
            }],
            deletes: vec![],
        }];

        assert!(matcher.find_scheduled_task(&batch).await.unwrap().is_none());
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_task_is_skipped() {
        let store = FakeStore::new();
        let (matcher, _dir) = matcher(store);
        assert!(matcher
            .find_scheduled_task(&scheduled_batch(TASK))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_lookup_error_propagates() {
        let store = FakeStore::new();
        store.fail_queries_containing("?jobOperation");
        let (matcher, _dir) = matcher(store);
        assert!(matches!(
            matcher.find_scheduled_task(&scheduled_batch(TASK)).await,
            Err(PipelineError::Store(_))
        ));
    }
}
