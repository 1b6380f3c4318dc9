//! Graph export engine.
//!
//! The export itself runs inside Virtuoso as the `dump_one_graph` stored
//! procedure. It writes `<prefix>000001.ttl` (and further parts past the
//! ceiling) on the database host's filesystem.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::Config;

/// Source of the stored procedure, installed on startup.
pub const DUMP_PROCEDURE_SQL: &str = include_str!("../sql/dump_one_graph.sql");

/// Export engine errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to spawn or talk to the client process.
    #[error("failed to run isql: {0}")]
    Spawn(#[from] std::io::Error),

    /// Client process exited with an error code.
    #[error("isql exited with code {code}: {output}")]
    Exit { code: i32, output: String },

    /// Engine reported an error on an otherwise clean exit.
    #[error("export engine error: {0}")]
    Engine(String),
}

/// Writes a line-bounded export of a graph to `<output_prefix>000001.ttl`.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export_graph(
        &self,
        graph: &str,
        output_prefix: &str,
        row_ceiling: u64,
    ) -> Result<(), ExportError>;
}

/// Runs SQL against Virtuoso through its `isql` command line client.
#[derive(Debug, Clone)]
pub struct IsqlExporter {
    isql_path: String,
    address: String,
    username: String,
    password: String,
}

impl IsqlExporter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            isql_path: config.isql_path.clone(),
            address: format!("{}:{}", config.virtuoso_host, config.virtuoso_port),
            username: config.virtuoso_username.clone(),
            password: config.virtuoso_password.clone(),
        }
    }

    /// Create (or replace) the `dump_one_graph` procedure.
    pub async fn install_procedure(&self) -> Result<(), ExportError> {
        self.run_sql(DUMP_PROCEDURE_SQL).await?;
        info!(address = %self.address, "Stored procedure dump_one_graph installed");
        Ok(())
    }

    async fn run_sql(&self, sql: &str) -> Result<String, ExportError> {
        let mut cmd = Command::new(&self.isql_path);
        cmd.arg(&self.address)
            .arg(&self.username)
            .arg(&self.password)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(isql = %self.isql_path, address = %self.address, "Spawning isql");
        let mut child = cmd.spawn().map_err(|e| {
            error!(error = %e, isql = %self.isql_path, "Failed to spawn isql");
            e
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(sql.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            // Dropping stdin sends EOF so isql exits after the last statement.
        }

        let output = child.wait_with_output().await?;
        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(ExportError::Exit {
                code: output.status.code().unwrap_or(-1),
                output: text.trim().to_string(),
            });
        }
        if let Some(line) = text.lines().find(|l| l.contains("*** Error")) {
            return Err(ExportError::Engine(line.trim().to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl Exporter for IsqlExporter {
    async fn export_graph(
        &self,
        graph: &str,
        output_prefix: &str,
        row_ceiling: u64,
    ) -> Result<(), ExportError> {
        self.run_sql(&call_statement(graph, output_prefix, row_ceiling))
            .await
            .map(|_| ())
    }
}

fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn call_statement(graph: &str, output_prefix: &str, row_ceiling: u64) -> String {
    format!(
        "CALL dump_one_graph({}, {}, {});",
        sql_string(graph),
        sql_string(output_prefix),
        row_ceiling
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_statement() {
        assert_eq!(
            call_statement("http://mu.semte.ch/graphs/public", "./dumps/abc-", 10),
            "CALL dump_one_graph('http://mu.semte.ch/graphs/public', './dumps/abc-', 10);"
        );
    }

    #[test]
    fn test_call_statement_quotes() {
        assert!(call_statement("http://x/o'brien", "./d-", 1).contains("'http://x/o''brien'"));
    }

    #[test]
    fn test_procedure_source_is_embedded() {
        assert!(DUMP_PROCEDURE_SQL.contains("CREATE PROCEDURE dump_one_graph"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let exporter = IsqlExporter {
            isql_path: "/nonexistent/isql-binary".to_string(),
            address: "localhost:1111".to_string(),
            username: "dba".to_string(),
            password: "dba".to_string(),
        };
        let err = exporter
            .export_graph("http://g", "./dumps/x-", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Spawn(_)));
    }
}
