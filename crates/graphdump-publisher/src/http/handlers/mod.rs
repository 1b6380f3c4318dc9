//! HTTP request handlers.

mod delta;
mod health;

pub use delta::receive_delta;
pub use health::{greeting, health_check, metrics_handler};
