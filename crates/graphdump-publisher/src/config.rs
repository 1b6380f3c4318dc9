//! Publisher configuration.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it. The resolved value is shared read-only with every
//! component through [`crate::AppState`].

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use graphdump_core::vocab::DEFAULT_OPERATION;

const PUBLIC_GRAPH: &str = "http://mu.semte.ch/graphs/public";

/// Publisher configuration.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "graphdump-publisher",
    about = "Publishes versioned dumps of a graph when a dump task is scheduled"
)]
pub struct Config {
    /// HTTP bind address for the delta endpoint.
    #[arg(long, env = "HTTP_BIND_ADDR", default_value = "0.0.0.0:80")]
    pub http_bind_addr: String,

    /// SPARQL endpoint used for queries and updates.
    #[arg(long, env = "MU_SPARQL_ENDPOINT")]
    pub sparql_endpoint: String,

    /// Host of the Virtuoso instance running the export.
    #[arg(long, env = "VIRTUOSO_HOSTNAME")]
    pub virtuoso_host: String,

    #[arg(long, env = "VIRTUOSO_PORT", default_value_t = 1111)]
    pub virtuoso_port: u16,

    #[arg(long, env = "VIRTUOSO_USERNAME", default_value = "dba")]
    pub virtuoso_username: String,

    #[arg(long, env = "VIRTUOSO_PASSWORD", default_value = "dba", hide_env_values = true)]
    pub virtuoso_password: String,

    /// Path to the `isql` client binary.
    #[arg(long, env = "ISQL_PATH", default_value = "isql")]
    pub isql_path: String,

    /// Install the export stored procedure on startup.
    #[arg(long, env = "INSTALL_PROCEDURE", default_value_t = true, action = ArgAction::Set)]
    pub install_procedure: bool,

    /// Graph whose contents are dumped.
    #[arg(long, env = "GRAPH_TO_DUMP", default_value = PUBLIC_GRAPH)]
    pub graph_to_dump: String,

    /// Graph holding datasets and distributions.
    #[arg(long, env = "DCAT_DATASET_GRAPH", default_value = PUBLIC_GRAPH)]
    pub dataset_graph: String,

    /// Graph holding file records.
    #[arg(long, env = "FILES_GRAPH", default_value = PUBLIC_GRAPH)]
    pub files_graph: String,

    /// `dct:subject` shared by all revisions of the dump dataset.
    #[arg(long, env = "DATASET_URI")]
    pub dataset_subject: String,

    /// Delete previous revisions instead of deprecating them.
    #[arg(long, env = "CLEAN_OLD_DUMPS", default_value_t = true, action = ArgAction::Set)]
    pub cleanup_old_dumps: bool,

    /// Operation the owning job must have.
    #[arg(long, env = "JOB_OPERATION", default_value = DEFAULT_OPERATION)]
    pub job_operation: String,

    /// Operation the task itself must have.
    #[arg(long, env = "TASK_OPERATION", default_value = DEFAULT_OPERATION)]
    pub task_operation: String,

    /// Recorded as `dct:creator` of logical files.
    #[arg(long, env = "SERVICE_NAME", default_value = "graph-dump-service")]
    pub service_name: String,

    /// Root of the shared volume; paths below it map to `share://` URIs.
    #[arg(long, env = "SHARE_DIR", default_value = "/share")]
    pub share_dir: PathBuf,

    /// Directory below the share root receiving the dumps.
    #[arg(long, env = "RELATIVE_FILE_PATH", default_value = "delta-producer-dumps")]
    pub relative_file_path: String,

    /// Where this service sees the export engine's output.
    #[arg(long, env = "EXPORT_DIR", default_value = "/dumps")]
    pub export_dir: PathBuf,

    /// Output directory as passed to the export engine.
    #[arg(long, env = "EXPORT_PREFIX", default_value = "./dumps")]
    pub export_prefix: String,

    /// Ceiling handed to the export engine. Exceeding it is not detected.
    #[arg(long, env = "EXPORT_ROW_CEILING", default_value_t = 1_000_000_000_000)]
    pub export_row_ceiling: u64,
}

impl Config {
    /// Directory the published dumps end up in.
    pub fn dump_dir(&self) -> PathBuf {
        self.share_dir.join(&self.relative_file_path)
    }
}
