//! HTTP response types.

use serde::Serialize;

/// Acknowledgement for an accepted delta.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
