//! Delta notification handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use graphdump_core::delta::inserted;
use graphdump_core::ChangeSet;
use tracing::{debug, error, info};

use crate::http::responses::{ErrorResponse, MessageResponse};
use crate::http::HttpState;
use crate::matcher::TaskMatcher;

/// Delta notification endpoint.
///
/// Starts a dump run when the batch schedules a dump task and answers
/// immediately; the run itself reports through the task status.
pub async fn receive_delta(
    State(state): State<HttpState>,
    Json(batch): Json<Vec<ChangeSet>>,
) -> impl IntoResponse {
    state.app.metrics.delta_received();

    if inserted(&batch).is_empty() {
        debug!("Delta without inserts, skipping");
        return StatusCode::NO_CONTENT.into_response();
    }

    let matcher = TaskMatcher::new(state.app.store.clone(), state.app.config.clone());
    match matcher.find_scheduled_task(&batch).await {
        Ok(Some(scheduled)) => {
            info!(task = %scheduled.task, job = %scheduled.job, "Starting dump file production");
            state.pipeline.spawn(scheduled.task);
            (
                StatusCode::OK,
                Json(MessageResponse {
                    message: "Dump file production started".to_string(),
                }),
            )
                .into_response()
        }
        Ok(None) => {
            debug!("Delta does not schedule a dump task, skipping");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to look up scheduled task");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{task_graph_row, test_config, test_state, FakeExporter, FakeStore, TASK};
    use graphdump_core::vocab::{ADMS_STATUS, DEFAULT_OPERATION};
    use graphdump_core::{Binding, TaskStatus, Term, Triple};
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixture {
        store: Arc<FakeStore>,
        state: HttpState,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let store = FakeStore::new();
        let exporter = FakeExporter::new(&config.export_dir);
        let app = test_state(config, store.clone(), exporter);
        Fixture {
            store,
            state: HttpState::new(app),
            _dir: dir,
        }
    }

    fn scheduled_batch() -> Vec<ChangeSet> {
        vec![ChangeSet {
            inserts: vec![Triple {
                subject: Term::uri(TASK),
                predicate: Term::uri(ADMS_STATUS),
                object: Term::uri(TaskStatus::Scheduled.uri()),
            }],
            deletes: vec![],
        }]
    }

    fn job_row() -> Binding {
        Binding::default()
            .with("job", Term::uri("http://redpencil.data.gift/id/job/1"))
            .with("task", Term::uri(TASK))
            .with("jobOperation", Term::uri(DEFAULT_OPERATION))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_empty_inserts_is_no_content() {
        let f = fixture();
        let batch = vec![ChangeSet::default()];

        let response = receive_delta(State(f.state.clone()), Json(batch))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(f.store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_task_is_no_content() {
        let f = fixture();

        let response = receive_delta(State(f.state.clone()), Json(scheduled_batch()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(f.store.queries().len(), 1);
        assert!(f.store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_server_error() {
        let f = fixture();
        f.store.fail_queries_containing("?jobOperation");

        let response = receive_delta(State(f.state.clone()), Json(scheduled_batch()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("store error"));
    }

    #[tokio::test]
    async fn test_matching_task_starts_run() {
        let f = fixture();
        f.store
            .respond("?jobOperation", &["job", "task", "jobOperation"], vec![job_row()]);
        f.store.respond("?taskGraph", &["taskGraph"], vec![task_graph_row()]);

        let response = receive_delta(State(f.state.clone()), Json(scheduled_batch()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Dump file production started");

        let success = format!("adms:status <{}>", TaskStatus::Success.uri());
        for _ in 0..100 {
            if f.state.app.metrics.runs_succeeded() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(f.store.updates_containing(&success).len(), 1);
        assert_eq!(f.state.app.metrics.runs_succeeded(), 1);
    }
}
