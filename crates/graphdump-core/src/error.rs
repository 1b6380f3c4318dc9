//! Core domain errors.

use thiserror::Error;

/// Core domain errors for the dump publisher.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A query result row lacks a variable the caller relies on.
    #[error("Missing binding for variable: {0}")]
    MissingBinding(String),

    /// A bound term has the wrong kind or an unparsable value.
    #[error("Invalid value for '{var}': {reason}")]
    InvalidValue { var: String, reason: String },

    /// Filesystem path that cannot be expressed as a storage URI.
    #[error("Path '{path}' is outside of share root '{root}'")]
    OutsideShare { path: String, root: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
