//! Attaches produced files to the task as a result container.

use std::path::Path;
use std::sync::Arc;

use graphdump_core::sparql::{escape_string, escape_uri};
use graphdump_core::vocab::{DATA_CONTAINER_TYPE, PREFIXES, TASK_TYPE};
use graphdump_core::{ContainerUri, PhysicalFileUri, TaskUri};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::PipelineError;
use crate::store::Store;

pub struct ResultLinker {
    store: Arc<dyn Store>,
    config: Arc<Config>,
}

impl ResultLinker {
    pub fn new(store: Arc<dyn Store>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// Create a result container on `task` holding a copy of the file records
    /// of every path in `files`.
    ///
    /// A task that does not exist (or is not a `task:Task`) gets nothing; this
    /// is logged and reported as `None`, not as an error.
    pub async fn link_results(
        &self,
        task: &TaskUri,
        files: &[&Path],
    ) -> Result<Option<ContainerUri>, PipelineError> {
        let task_uri = escape_uri(task.as_str());
        let task_type = escape_uri(TASK_TYPE);
        let container_type = escape_uri(DATA_CONTAINER_TYPE);

        let found = self
            .store
            .query(&format!(
                r#"
     SELECT DISTINCT ?taskGraph WHERE {{
       GRAPH ?taskGraph {{
         {task_uri} a {task_type} .
       }}
     }}
  "#
            ))
            .await?;
        if found.is_empty() {
            warn!(task = %task, "Task not found or not a task, results are not linked");
            return Ok(None);
        }

        let container = ContainerUri::generate();
        let container_uri = escape_uri(container.uri.as_str());

        self.store
            .update(&format!(
                r#"
     {PREFIXES}
     INSERT {{
       GRAPH ?g {{
         ?task task:resultsContainer {container_uri} .
         {container_uri} a {container_type} ;
           mu:uuid {uuid} .
       }}
     }}
     WHERE {{
       BIND({task_uri} as ?task)
       GRAPH ?g {{
         ?task a {task_type}
       }}
     }}
  "#,
                uuid = escape_string(&container.uuid),
            ))
            .await?;

        let files_graph = escape_uri(&self.config.files_graph);
        for path in files {
            let file = PhysicalFileUri::from_path(path, &self.config.share_dir)?;
            self.store
                .update(&format!(
                    r#"
       {PREFIXES}
       INSERT {{
         GRAPH ?g {{
           {container_uri} task:hasFile ?file .
           ?file ?p ?o .
           ?logicalFile ?lp ?lo .
         }}
       }}
       WHERE {{
         BIND({file} as ?file)
         GRAPH ?g {{
           {container_uri} a {container_type}
         }}
         GRAPH {files_graph} {{
           ?file nie:dataSource ?logicalFile ; ?p ?o .
           ?logicalFile a nfo:FileDataObject ; ?lp ?lo .
         }}
       }}
    "#,
                    file = escape_uri(file.as_str()),
                ))
                .await?;
        }

        info!(task = %task, container = %container.uri, files = files.len(), "Results linked to task");
        Ok(Some(container.uri))
    }
}
