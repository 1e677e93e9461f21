//! Shared-store fallback transport
//!
//! Presence is persisted in the origin's storage as an active-context
//! registry. Other contexts learn about it through storage change events.
//!
//! The rule is "registry non-empty means duplicate", applied at registration
//! and again on every change to the registry key. The registry does not
//! exclude our own entry, so once a second context appears the first one is
//! flagged as well.

use std::sync::Arc;

use singletab_host::{ListenerId, Storage};

use crate::decision::{DuplicateDetector, Evidence};
use crate::identity::ContextId;
use crate::registry::ActiveContextRegistry;

pub struct SharedStoreStrategy {
    registry: Arc<ActiveContextRegistry>,
    storage: Storage,
    listener: ListenerId,
    context_id: ContextId,
}

impl SharedStoreStrategy {
    /// Check for existing entries, start listening, then add ourselves
    pub fn register(
        storage: Storage,
        key: String,
        context_id: &ContextId,
        detector: Arc<DuplicateDetector>,
    ) -> Self {
        let registry = Arc::new(ActiveContextRegistry::new(storage.clone(), key));

        on_presence_changed(&registry, &detector);

        let listener = {
            let registry = Arc::clone(&registry);
            storage.add_change_listener(move |event| {
                if event.key.as_deref() == Some(registry.key()) {
                    on_presence_changed(&registry, &detector);
                }
            })
        };

        if let Err(e) = registry.append(context_id) {
            tracing::warn!(
                context_id = %context_id,
                key = %registry.key(),
                error = %e,
                "Failed to add tab to registry"
            );
        }

        Self {
            registry,
            storage,
            listener,
            context_id: context_id.clone(),
        }
    }

    /// Remove ourselves from the registry and stop listening
    pub fn unregister(&self) {
        if let Err(e) = self.registry.remove(&self.context_id) {
            tracing::warn!(
                context_id = %self.context_id,
                key = %self.registry.key(),
                error = %e,
                "Failed to remove tab from registry"
            );
        }
        self.storage.remove_change_listener(self.listener);
    }
}

fn on_presence_changed(registry: &ActiveContextRegistry, detector: &DuplicateDetector) {
    let entries = registry.read().len();
    detector.observe(Evidence::Registry { entries });
}
