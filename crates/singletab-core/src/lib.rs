//! SingleTab Core
//!
//! Detects when more than one context of the same application is open
//! within an origin and tells each duplicate about it.
//!
//! A context picks one transport at creation: a named broadcast channel
//! when the platform has one, otherwise an active-context registry in
//! shared storage observed through change events. Detection is best-effort;
//! there is no heartbeat, so a context that dies without unloading leaves
//! its registry entry behind.

mod broadcast;
mod config;
mod decision;
mod error;
mod guard;
mod identity;
mod manager;
mod message;
mod registry;
mod shared_store;
mod state;
mod strategy;

pub use config::{Config, DEFAULT_DUPLICATE_MESSAGE, DEFAULT_REGISTRY_KEY_SUFFIX};
pub use decision::{DuplicateCallback, DuplicateDetector, Evidence};
pub use error::CoordinationError;
pub use guard::{GuardState, SingleTabGuard};
pub use identity::{ContextId, Namespace};
pub use manager::TabManager;
pub use message::{PresenceKind, PresenceMessage};
pub use registry::ActiveContextRegistry;
pub use state::LifecycleState;
pub use strategy::{StrategyKind, StrategyPreference};

pub use singletab_host::{Capabilities, Environment, Origin, Window};

pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
