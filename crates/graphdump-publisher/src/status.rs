//! Task status writes.

use graphdump_core::sparql::escape_uri;
use graphdump_core::{TaskStatus, TaskUri};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::store::Store;

/// Replace the status of `task` with `status`.
///
/// The status is rewritten in whichever graph currently holds it. A task
/// without a status triple is left untouched; a task whose status lives in
/// several graphs gets the new status in each of them. Both cases are logged.
pub async fn update_status(
    store: &dyn Store,
    task: &TaskUri,
    status: TaskStatus,
) -> Result<(), PipelineError> {
    let graphs = store.query(&status_graphs_query(task)).await?;
    match graphs.rows().len() {
        0 => warn!(task = %task, status = %status, "Task has no status triple, nothing to update"),
        1 => {}
        n => {
            let found: Vec<&str> = graphs.rows().iter().filter_map(|r| r.uri("g").ok()).collect();
            warn!(task = %task, graphs = ?found, count = n, "Task status is stored in several graphs");
        }
    }

    store.update(&status_update(task, status)).await?;
    info!(task = %task, status = %status, "Task status updated");
    Ok(())
}

fn status_graphs_query(task: &TaskUri) -> String {
    format!(
        r#"
    PREFIX adms: <http://www.w3.org/ns/adms#>

    SELECT DISTINCT ?g WHERE {{
      GRAPH ?g {{
        {task} adms:status ?status .
      }}
    }}
  "#,
        task = escape_uri(task.as_str())
    )
}

fn status_update(task: &TaskUri, status: TaskStatus) -> String {
    format!(
        r#"
    PREFIX adms: <http://www.w3.org/ns/adms#>

    DELETE {{
      GRAPH ?g {{
        {task} adms:status ?status .
      }}
    }}
    INSERT {{
      GRAPH ?g {{
        {task} adms:status {status} .
      }}
    }}
    WHERE {{
      GRAPH ?g {{
        {task} adms:status ?status .
      }}
    }}
  "#,
        task = escape_uri(task.as_str()),
        status = escape_uri(&status.uri())
    )
}
