//! Origin-scoped key-value storage
//!
//! Every window of an origin sees the same items. A write that changes an
//! item queues a [`StorageEvent`] for every other open window; the writer is
//! never notified of its own change, and a write that leaves the value as it
//! was queues nothing.

use crate::error::HostError;
use crate::origin::Task;
use crate::window::{ListenerId, Window};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key, `None` when the whole store was cleared
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// The origin's storage as seen from one window
#[derive(Debug, Clone)]
pub struct Storage {
    window: Window,
}

impl Storage {
    pub(crate) fn new(window: Window) -> Self {
        Self { window }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let origin = self.window.origin();
        Ok(origin.inner.db.get_item(origin.as_str(), key)?)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        let origin = self.window.origin();
        let previous = origin.inner.db.set_item(origin.as_str(), key, value)?;

        if previous.as_deref() != Some(value) {
            self.notify_others(StorageEvent {
                key: Some(key.to_string()),
                old_value: previous,
                new_value: Some(value.to_string()),
            });
        }

        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.ensure_open()?;
        let origin = self.window.origin();
        let previous = origin.inner.db.remove_item(origin.as_str(), key)?;

        if previous.is_some() {
            self.notify_others(StorageEvent {
                key: Some(key.to_string()),
                old_value: previous,
                new_value: None,
            });
        }

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.ensure_open()?;
        let origin = self.window.origin();
        let removed = origin.inner.db.clear(origin.as_str())?;

        if removed > 0 {
            self.notify_others(StorageEvent {
                key: None,
                old_value: None,
                new_value: None,
            });
        }

        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let origin = self.window.origin();
        Ok(origin.inner.db.len(origin.as_str())?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Listen for changes made by other windows of the origin
    pub fn add_change_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        self.window.add_storage_listener(listener)
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.window.remove_storage_listener(id)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.window.is_closed() {
            return Err(HostError::WindowClosed(self.window.id()));
        }
        Ok(())
    }

    fn notify_others(&self, event: StorageEvent) {
        let origin = self.window.origin();
        let mut targets: Vec<_> = {
            let state = origin.inner.state.lock();
            state
                .windows
                .keys()
                .copied()
                .filter(|id| *id != self.window.id())
                .collect()
        };
        targets.sort_unstable();

        tracing::trace!(
            window = %self.window.id(),
            key = ?event.key,
            targets = targets.len(),
            "Queued storage events"
        );

        for window in targets {
            origin.enqueue(Task::Storage {
                window,
                event: event.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Origin;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorder(storage: &Storage) -> (ListenerId, Arc<Mutex<Vec<StorageEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let id = storage.add_change_listener(move |event| sink.lock().push(event.clone()));
        (id, events)
    }

    #[test]
    fn test_items_shared_across_windows() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let a = origin.open_window().local_storage().unwrap();
        let b = origin.open_window().local_storage().unwrap();

        a.set_item("app_tabs", "[\"x\"]").unwrap();
        assert_eq!(b.get_item("app_tabs").unwrap(), Some("[\"x\"]".to_string()));
        assert_eq!(b.len().unwrap(), 1);
    }

    #[test]
    fn test_writer_is_not_notified() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let a = origin.open_window().local_storage().unwrap();
        let b = origin.open_window().local_storage().unwrap();
        let (_, seen_a) = recorder(&a);
        let (_, seen_b) = recorder(&b);

        a.set_item("app_tabs", "[]").unwrap();
        assert!(seen_b.lock().is_empty());
        origin.run_until_idle();

        assert!(seen_a.lock().is_empty());
        assert_eq!(
            *seen_b.lock(),
            vec![StorageEvent {
                key: Some("app_tabs".to_string()),
                old_value: None,
                new_value: Some("[]".to_string()),
            }]
        );
    }

    #[test]
    fn test_unchanged_value_is_silent() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let a = origin.open_window().local_storage().unwrap();
        let b = origin.open_window().local_storage().unwrap();
        let (_, seen_b) = recorder(&b);

        a.set_item("k", "v").unwrap();
        a.set_item("k", "v").unwrap();
        origin.run_until_idle();
        assert_eq!(seen_b.lock().len(), 1);
    }

    #[test]
    fn test_removed_listener_is_silent() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let a = origin.open_window().local_storage().unwrap();
        let b = origin.open_window().local_storage().unwrap();
        let (id, seen_b) = recorder(&b);

        assert!(b.remove_change_listener(id));
        a.set_item("k", "v").unwrap();
        origin.run_until_idle();
        assert!(seen_b.lock().is_empty());
    }

    #[test]
    fn test_remove_and_clear_emit_events() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let a = origin.open_window().local_storage().unwrap();
        let b = origin.open_window().local_storage().unwrap();
        let (_, seen_b) = recorder(&b);

        a.set_item("k", "v").unwrap();
        a.remove_item("k").unwrap();
        a.remove_item("k").unwrap();
        a.set_item("other", "1").unwrap();
        a.clear().unwrap();
        origin.run_until_idle();

        let events = seen_b.lock();
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].new_value, None);
        assert_eq!(events[3].key, None);
        assert!(a.is_empty().unwrap());
    }

    #[test]
    fn test_write_after_close_fails() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let window = origin.open_window();
        let storage = window.local_storage().unwrap();

        window.close();
        assert!(matches!(
            storage.set_item("k", "v"),
            Err(HostError::WindowClosed(_))
        ));
    }
}
