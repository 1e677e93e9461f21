//! SingleTab Host
//!
//! A deterministic model of the same-origin browser surface the tab
//! coordinator runs on: windows, named broadcast channels, origin-scoped
//! storage with cross-window change events, and unload hooks.
//!
//! Nothing is delivered synchronously. Posting a message or writing storage
//! only queues tasks on the origin; handlers run when the host pumps the
//! queue with [`Origin::run_until_idle`].

mod broadcast;
mod environment;
mod error;
mod origin;
mod storage;
mod window;

pub use broadcast::BroadcastChannel;
pub use environment::Environment;
pub use error::HostError;
pub use origin::{Capabilities, Origin};
pub use storage::{Storage, StorageEvent};
pub use window::{ListenerId, Window, WindowId};

pub type Result<T> = std::result::Result<T, HostError>;
