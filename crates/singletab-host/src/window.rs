//! Window: one browsing context
//!
//! A window lives until [`Window::close`]. Closing runs the unload listeners
//! first, while the window can still talk to the rest of the origin, and then
//! detaches every port and listener it owned.

use std::sync::Arc;

use crate::origin::{Origin, StorageListener, UnloadListener};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Handle returned when registering a listener, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub struct Window {
    id: WindowId,
    origin: Origin,
}

impl Window {
    pub(crate) fn new(id: WindowId, origin: Origin) -> Self {
        Self { id, origin }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn is_closed(&self) -> bool {
        !self
            .origin
            .inner
            .state
            .lock()
            .windows
            .contains_key(&self.id)
    }

    pub fn broadcast_channel_supported(&self) -> bool {
        self.origin.capabilities().broadcast_channel
    }

    /// The origin's storage as seen from this window, if the platform has one
    pub fn local_storage(&self) -> Option<Storage> {
        if self.origin.capabilities().storage {
            Some(Storage::new(self.clone()))
        } else {
            None
        }
    }

    /// Run `listener` when the window is about to close.
    /// Registering on a closed window is accepted and never fires.
    pub fn add_unload_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.origin.inner.next_id());
        let listener: UnloadListener = Arc::new(listener);
        let mut state = self.origin.inner.state.lock();
        if let Some(entry) = state.windows.get_mut(&self.id) {
            entry.unload_listeners.push((id, listener));
        }
        id
    }

    pub fn remove_unload_listener(&self, id: ListenerId) -> bool {
        let mut state = self.origin.inner.state.lock();
        match state.windows.get_mut(&self.id) {
            Some(entry) => {
                let before = entry.unload_listeners.len();
                entry.unload_listeners.retain(|(l, _)| *l != id);
                entry.unload_listeners.len() != before
            }
            None => false,
        }
    }

    pub fn unload_listener_count(&self) -> usize {
        self.origin
            .inner
            .state
            .lock()
            .windows
            .get(&self.id)
            .map(|entry| entry.unload_listeners.len())
            .unwrap_or(0)
    }

    pub(crate) fn add_storage_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&crate::StorageEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.origin.inner.next_id());
        let listener: StorageListener = Arc::new(listener);
        let mut state = self.origin.inner.state.lock();
        if let Some(entry) = state.windows.get_mut(&self.id) {
            entry.storage_listeners.push((id, listener));
        }
        id
    }

    pub(crate) fn remove_storage_listener(&self, id: ListenerId) -> bool {
        let mut state = self.origin.inner.state.lock();
        match state.windows.get_mut(&self.id) {
            Some(entry) => {
                let before = entry.storage_listeners.len();
                entry.storage_listeners.retain(|(l, _)| *l != id);
                entry.storage_listeners.len() != before
            }
            None => false,
        }
    }

    pub fn storage_listener_count(&self) -> usize {
        self.origin
            .inner
            .state
            .lock()
            .windows
            .get(&self.id)
            .map(|entry| entry.storage_listeners.len())
            .unwrap_or(0)
    }

    /// Close the window: fire unload listeners, then detach everything.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let listeners: Vec<_> = {
            let state = self.origin.inner.state.lock();
            match state.windows.get(&self.id) {
                Some(entry) => entry
                    .unload_listeners
                    .iter()
                    .map(|(_, l)| Arc::clone(l))
                    .collect(),
                None => return,
            }
        };

        tracing::debug!(
            window = %self.id,
            listeners = listeners.len(),
            "Window unloading"
        );

        for listener in listeners {
            listener();
        }

        let mut state = self.origin.inner.state.lock();
        state.windows.remove(&self.id);
        state.ports.retain(|_, port| port.window != self.id);
    }

    /// Drop the window without running unload listeners, as a crashed
    /// or killed process would.
    pub fn terminate(&self) {
        let mut state = self.origin.inner.state.lock();
        if state.windows.remove(&self.id).is_some() {
            tracing::debug!(window = %self.id, "Window terminated without unload");
        }
        state.ports.retain(|_, port| port.window != self.id);
    }
}

impl Clone for Window {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            origin: self.origin.clone(),
        }
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("origin", &self.origin.as_str())
            .finish()
    }
}
