//! Host error types

use thiserror::Error;

use crate::window::WindowId;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Opaque origin cannot host shared state: {0}")]
    OpaqueOrigin(String),

    #[error("Window is closed: {0}")]
    WindowClosed(WindowId),

    #[error("Broadcast channel is closed: {0}")]
    ChannelClosed(String),

    #[error("Not supported by this origin: {0}")]
    Unsupported(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] singletab_storage::StorageError),
}
