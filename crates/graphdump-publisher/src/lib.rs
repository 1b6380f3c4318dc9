//! Graph Dump Publisher Library
//!
//! Watches delta notifications for scheduled dump tasks, exports the
//! configured graph and publishes the result as a versioned DCAT dataset.

pub mod config;
pub mod error;
pub mod export;
pub mod files;
pub mod http;
pub mod linker;
pub mod matcher;
pub mod metrics;
pub mod pipeline;
pub mod producer;
pub mod state;
pub mod status;
pub mod store;
pub mod versioning;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::PipelineError;
pub use export::{Exporter, IsqlExporter};
pub use pipeline::Pipeline;
pub use state::AppState;
pub use store::{SparqlClient, Store};
