//! Test doubles for the store and the export engine.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use graphdump_core::vocab::{ADMS_STATUS, TASK_TYPE};
use graphdump_core::{Binding, QueryResults, TaskStatus, Term, TermKind};
use oxigraph::model::Term as RdfTerm;
use oxigraph::sparql::{EvaluationError, QueryResults as Solutions};

use crate::config::Config;
use crate::export::{ExportError, Exporter};
use crate::state::AppState;
use crate::store::{Store, StoreError};

/// Store that records every request and answers queries from canned results.
///
/// A canned result is returned for the first registered needle contained in
/// the query text; unmatched queries get an empty result set.
#[derive(Default)]
pub struct FakeStore {
    responses: Mutex<Vec<(String, QueryResults)>>,
    failing_queries: Mutex<Vec<String>>,
    failing_updates: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    updates: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, needle: &str, vars: &[&str], rows: Vec<Binding>) {
        self.responses
            .lock()
            .unwrap()
            .push((needle.to_string(), QueryResults::from_rows(vars, rows)));
    }

    pub fn fail_queries_containing(&self, needle: &str) {
        self.failing_queries.lock().unwrap().push(needle.to_string());
    }

    pub fn fail_updates_containing(&self, needle: &str) {
        self.failing_updates.lock().unwrap().push(needle.to_string());
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }

    pub fn updates_containing(&self, needle: &str) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|u| u.contains(needle))
            .collect()
    }
}

fn refused() -> StoreError {
    StoreError::Status {
        status: 500,
        body: "refused by fake store".to_string(),
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn query(&self, query: &str) -> Result<QueryResults, StoreError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self
            .failing_queries
            .lock()
            .unwrap()
            .iter()
            .any(|n| query.contains(n.as_str()))
        {
            return Err(refused());
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, results)| results.clone())
            .unwrap_or_default())
    }

    async fn update(&self, update: &str) -> Result<(), StoreError> {
        self.updates.lock().unwrap().push(update.to_string());
        if self
            .failing_updates
            .lock()
            .unwrap()
            .iter()
            .any(|n| update.contains(n.as_str()))
        {
            return Err(refused());
        }
        Ok(())
    }
}

/// Store backed by an in-memory SPARQL engine.
///
/// Updates are applied for real, so tests can check the state a sequence of
/// runs leaves behind.
pub struct MemoryStore {
    inner: oxigraph::store::Store,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: oxigraph::store::Store::new().unwrap(),
        })
    }

    /// Apply `update` directly.
    pub fn load(&self, update: &str) {
        self.inner.update(update).unwrap();
    }

    pub fn select(&self, query: &str) -> Vec<Binding> {
        select(&self.inner, query).unwrap().results.bindings
    }

    /// Insert [`TASK`] into the jobs graph with a scheduled status.
    pub fn seed_scheduled_task(&self) {
        self.load(&format!(
            "INSERT DATA {{ GRAPH <{JOBS_GRAPH}> {{ <{TASK}> a <{TASK_TYPE}> ; <{ADMS_STATUS}> <{}> . }} }}",
            TaskStatus::Scheduled.uri()
        ));
    }

    /// Every status value stored for [`TASK`], across graphs.
    pub fn task_statuses(&self) -> Vec<String> {
        self.select(&format!(
            "SELECT ?status WHERE {{ GRAPH ?g {{ <{TASK}> <{ADMS_STATUS}> ?status }} }}"
        ))
        .iter()
        .map(|row| row.uri("status").unwrap().to_string())
        .collect()
    }
}

fn engine_error(e: EvaluationError) -> StoreError {
    StoreError::Status {
        status: 500,
        body: e.to_string(),
    }
}

fn select(store: &oxigraph::store::Store, query: &str) -> Result<QueryResults, StoreError> {
    let Solutions::Solutions(solutions) = store.query(query).map_err(engine_error)? else {
        return Err(StoreError::Status {
            status: 400,
            body: "only SELECT queries are supported".to_string(),
        });
    };
    let vars: Vec<String> = solutions
        .variables()
        .iter()
        .map(|v| v.as_str().to_string())
        .collect();

    let mut rows = Vec::new();
    for solution in solutions {
        let solution = solution.map_err(engine_error)?;
        rows.push(
            solution
                .iter()
                .fold(Binding::default(), |row, (var, term)| {
                    row.with(var.as_str(), convert(term))
                }),
        );
    }

    let vars: Vec<&str> = vars.iter().map(String::as_str).collect();
    Ok(QueryResults::from_rows(&vars, rows))
}

fn convert(term: &RdfTerm) -> Term {
    match term {
        RdfTerm::NamedNode(node) => Term::uri(node.as_str()),
        RdfTerm::BlankNode(node) => Term {
            kind: TermKind::Bnode,
            value: node.as_str().to_string(),
            datatype: None,
            lang: None,
        },
        RdfTerm::Literal(literal) => match literal.language() {
            Some(lang) => Term {
                lang: Some(lang.to_string()),
                ..Term::literal(literal.value())
            },
            None if literal.datatype().as_str() == XSD_STRING => Term::literal(literal.value()),
            None => Term {
                kind: TermKind::TypedLiteral,
                value: literal.value().to_string(),
                datatype: Some(literal.datatype().as_str().to_string()),
                lang: None,
            },
        },
        #[allow(unreachable_patterns)]
        other => Term::literal(other.to_string()),
    }
}

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

#[async_trait]
impl Store for MemoryStore {
    async fn query(&self, query: &str) -> Result<QueryResults, StoreError> {
        select(&self.inner, query)
    }

    async fn update(&self, update: &str) -> Result<(), StoreError> {
        self.inner.update(update).map_err(engine_error)
    }
}

/// Exporter writing a small Turtle file where the engine would.
pub struct FakeExporter {
    export_dir: PathBuf,
    fail: bool,
    calls: Mutex<Vec<(String, String, u64)>>,
}

impl FakeExporter {
    pub fn new(export_dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            export_dir: export_dir.to_path_buf(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(export_dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            export_dir: export_dir.to_path_buf(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, String, u64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exporter for FakeExporter {
    async fn export_graph(
        &self,
        graph: &str,
        output_prefix: &str,
        row_ceiling: u64,
    ) -> Result<(), ExportError> {
        self.calls.lock().unwrap().push((
            graph.to_string(),
            output_prefix.to_string(),
            row_ceiling,
        ));
        if self.fail {
            return Err(ExportError::Engine("*** Error 42000: out of disk".to_string()));
        }
        let name = output_prefix.rsplit('/').next().unwrap_or(output_prefix);
        let body = format!("# Dump of graph <{graph}>\n<http://s> <http://p> \"o\" .\n");
        std::fs::write(self.export_dir.join(format!("{name}000001.ttl")), body)?;
        Ok(())
    }
}

pub const SUBJECT: &str = "http://data.lblod.info/datasets/delta-producer/dumps/CacheGraphDump";
pub const TASK: &str = "http://redpencil.data.gift/id/task/1";
pub const JOBS_GRAPH: &str = "http://mu.semte.ch/graphs/system/jobs";

/// Configuration rooted in `root`, with the share and export directories created.
pub fn test_config(root: &Path) -> Config {
    let share_dir = root.join("share");
    let export_dir = root.join("dumps");
    std::fs::create_dir_all(share_dir.join("delta-producer-dumps")).unwrap();
    std::fs::create_dir_all(&export_dir).unwrap();

    Config {
        http_bind_addr: "127.0.0.1:0".to_string(),
        sparql_endpoint: "http://database:8890/sparql".to_string(),
        virtuoso_host: "triplestore".to_string(),
        virtuoso_port: 1111,
        virtuoso_username: "dba".to_string(),
        virtuoso_password: "dba".to_string(),
        isql_path: "isql".to_string(),
        install_procedure: false,
        graph_to_dump: "http://mu.semte.ch/graphs/public".to_string(),
        dataset_graph: "http://mu.semte.ch/graphs/public".to_string(),
        files_graph: "http://mu.semte.ch/graphs/files".to_string(),
        dataset_subject: SUBJECT.to_string(),
        cleanup_old_dumps: true,
        job_operation: graphdump_core::vocab::DEFAULT_OPERATION.to_string(),
        task_operation: graphdump_core::vocab::DEFAULT_OPERATION.to_string(),
        service_name: "http://lblod.data.gift/services/graph-dump-service".to_string(),
        share_dir,
        relative_file_path: "delta-producer-dumps".to_string(),
        export_dir,
        export_prefix: "./dumps".to_string(),
        export_row_ceiling: 1_000_000_000_000,
    }
}

/// Shared state over the given test doubles.
pub fn test_state(config: Config, store: Arc<dyn Store>, exporter: Arc<FakeExporter>) -> Arc<AppState> {
    AppState::new(config, store, exporter)
}

/// Row binding the task's type graph, so result linking goes ahead.
pub fn task_graph_row() -> Binding {
    Binding::default().with("taskGraph", Term::uri(JOBS_GRAPH))
}
