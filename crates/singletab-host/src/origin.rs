//! Origin: the unit of sharing
//!
//! Every window, broadcast port and storage item belongs to exactly one
//! origin. The origin also owns the task queue through which all
//! cross-window delivery happens.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use singletab_storage::Database;

use crate::error::HostError;
use crate::storage::StorageEvent;
use crate::window::{ListenerId, Window, WindowId};
use crate::Result;

pub(crate) type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;
pub(crate) type StorageListener = Arc<dyn Fn(&StorageEvent) + Send + Sync>;
pub(crate) type UnloadListener = Arc<dyn Fn() + Send + Sync>;

/// Platform primitives an origin exposes to its windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Named same-origin publish/subscribe channels
    pub broadcast_channel: bool,
    /// Origin-scoped key-value storage with change events
    pub storage: bool,
}

impl Capabilities {
    /// A platform without broadcast channels, only storage
    pub fn storage_only() -> Self {
        Self {
            broadcast_channel: false,
            storage: true,
        }
    }

    /// A platform offering neither primitive
    pub fn none() -> Self {
        Self {
            broadcast_channel: false,
            storage: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            broadcast_channel: true,
            storage: true,
        }
    }
}

pub(crate) type PortId = u64;

pub(crate) struct PortEntry {
    pub(crate) name: String,
    pub(crate) window: WindowId,
    pub(crate) handler: Option<MessageHandler>,
}

#[derive(Default)]
pub(crate) struct WindowEntry {
    pub(crate) unload_listeners: Vec<(ListenerId, UnloadListener)>,
    pub(crate) storage_listeners: Vec<(ListenerId, StorageListener)>,
}

pub(crate) enum Task {
    Message { port: PortId, data: String },
    Storage { window: WindowId, event: StorageEvent },
}

#[derive(Default)]
pub(crate) struct OriginState {
    pub(crate) windows: HashMap<WindowId, WindowEntry>,
    pub(crate) ports: HashMap<PortId, PortEntry>,
    pub(crate) queue: VecDeque<Task>,
}

pub(crate) struct OriginShared {
    pub(crate) serialized: String,
    pub(crate) capabilities: Capabilities,
    pub(crate) db: Database,
    pub(crate) state: Mutex<OriginState>,
    next_id: AtomicU64,
}

impl OriginShared {
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// A scheme/host/port origin and everything shared within it
pub struct Origin {
    pub(crate) inner: Arc<OriginShared>,
}

impl Origin {
    /// Origin of `url` with every primitive available
    pub fn parse(url: &str) -> Result<Self> {
        Self::with_capabilities(url, Capabilities::default())
    }

    pub fn with_capabilities(url: &str, capabilities: Capabilities) -> Result<Self> {
        Self::with_database(url, capabilities, Database::open_in_memory()?)
    }

    /// Back the origin's storage with an existing database
    pub fn with_database(url: &str, capabilities: Capabilities, db: Database) -> Result<Self> {
        let parsed = url::Url::parse(url)?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(HostError::OpaqueOrigin(url.to_string()));
        }

        let serialized = origin.ascii_serialization();
        tracing::debug!(origin = %serialized, ?capabilities, "Created origin");

        Ok(Self {
            inner: Arc::new(OriginShared {
                serialized,
                capabilities,
                db,
                state: Mutex::new(OriginState::default()),
                next_id: AtomicU64::new(1),
            }),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.inner.serialized
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    /// Open a new browsing context in this origin
    pub fn open_window(&self) -> Window {
        let id = WindowId(self.inner.next_id());
        self.inner
            .state
            .lock()
            .windows
            .insert(id, WindowEntry::default());

        tracing::debug!(origin = %self.inner.serialized, window = %id, "Opened window");

        Window::new(id, self.clone())
    }

    pub fn window_count(&self) -> usize {
        self.inner.state.lock().windows.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Deliver queued messages and storage events until the queue is empty,
    /// including tasks queued by the handlers themselves.
    /// Returns the number of tasks processed.
    pub fn run_until_idle(&self) -> usize {
        let mut processed = 0;

        loop {
            // The lock must be released before any handler runs
            let task = self.inner.state.lock().queue.pop_front();
            match task {
                Some(task) => {
                    self.dispatch(task);
                    processed += 1;
                }
                None => break,
            }
        }

        processed
    }

    fn dispatch(&self, task: Task) {
        match task {
            Task::Message { port, data } => {
                let handler = {
                    let state = self.inner.state.lock();
                    state.ports.get(&port).and_then(|p| p.handler.clone())
                };

                match handler {
                    Some(handler) => handler(&data),
                    None => tracing::trace!(port, "Dropped message for closed or idle port"),
                }
            }
            Task::Storage { window, event } => {
                let listeners: Vec<StorageListener> = {
                    let state = self.inner.state.lock();
                    state
                        .windows
                        .get(&window)
                        .map(|w| w.storage_listeners.iter().map(|(_, l)| l.clone()).collect())
                        .unwrap_or_default()
                };

                for listener in listeners {
                    listener(&event);
                }
            }
        }
    }

    pub(crate) fn enqueue(&self, task: Task) {
        self.inner.state.lock().queue.push_back(task);
    }
}

impl Clone for Origin {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Origin")
            .field("origin", &self.inner.serialized)
            .field("capabilities", &self.inner.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_strips_path_and_query() {
        let origin = Origin::parse("https://app.example.com:8443/dashboard?tab=1").unwrap();
        assert_eq!(origin.as_str(), "https://app.example.com:8443");
    }

    #[test]
    fn test_default_port_is_elided() {
        let origin = Origin::parse("https://app.example.com:443/").unwrap();
        assert_eq!(origin.as_str(), "https://app.example.com");
    }

    #[test]
    fn test_opaque_origin_rejected() {
        let result = Origin::parse("data:text/html,hello");
        assert!(matches!(result, Err(HostError::OpaqueOrigin(_))));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            Origin::parse("not a url"),
            Err(HostError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_windows_share_the_origin() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let first = origin.open_window();
        let second = origin.open_window();

        assert_ne!(first.id(), second.id());
        assert_eq!(origin.window_count(), 2);

        first.close();
        assert_eq!(origin.window_count(), 1);
        assert_eq!(origin.run_until_idle(), 0);
    }
}
