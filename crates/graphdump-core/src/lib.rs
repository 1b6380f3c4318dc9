//! Graph Dump Publisher Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - The triple store or the export engine
//! - The filesystem
//!
//! All types here describe the dump lifecycle: delta payloads, task status,
//! dataset/distribution identities and the SPARQL terms used to talk about them.

pub mod delta;
pub mod error;
pub mod ids;
pub mod model;
pub mod sparql;
pub mod status;
pub mod task;
pub mod vocab;

// Re-export commonly used types
pub use delta::{ChangeSet, Triple};
pub use error::CoreError;
pub use ids::{
    ContainerUri, DatasetUri, DistributionUri, JobUri, LogicalFileUri, Minted, PhysicalFileUri,
    TaskUri,
};
pub use model::{DistributionFormat, DumpArtifacts, FileStats, PreviousRevision};
pub use sparql::{Binding, QueryResults, Term, TermKind};
pub use status::TaskStatus;
pub use task::ScheduledTask;
