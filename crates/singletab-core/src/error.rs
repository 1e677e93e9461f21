//! Coordination error types
//!
//! Only invalid input surfaces as an error. Transport and storage failures
//! are logged and degrade to "no duplicate detected".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinationError {
    #[error("Namespace cannot be empty")]
    EmptyNamespace,

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Host error: {0}")]
    Host(#[from] singletab_host::HostError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
