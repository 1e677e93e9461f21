//! Tab Manager
//!
//! Owns one context's identity and lifecycle: picks a transport, registers
//! presence through it, and withdraws that presence exactly once, whether
//! via [`TabManager::cleanup`], the window unloading, or the manager being
//! dropped.

use parking_lot::Mutex;
use std::sync::Arc;

use singletab_host::{Environment, ListenerId, Window};

use crate::config::Config;
use crate::decision::{DuplicateCallback, DuplicateDetector};
use crate::error::CoordinationError;
use crate::identity::{ContextId, Namespace};
use crate::state::LifecycleState;
use crate::strategy::{Strategy, StrategyKind};
use crate::Result;

#[derive(Debug, Clone, Copy)]
enum TeardownReason {
    Cleanup,
    Unload,
    Dropped,
}

struct ManagerInner {
    context_id: ContextId,
    namespace: Namespace,
    window: Option<Window>,
    state: Mutex<LifecycleState>,
    strategy: Mutex<Option<Strategy>>,
    unload_listener: Mutex<Option<ListenerId>>,
    detector: Arc<DuplicateDetector>,
}

impl ManagerInner {
    fn transition_to(&self, target: LifecycleState) -> Result<()> {
        let mut state = self.state.lock();
        if !state.can_transition_to(target) {
            return Err(CoordinationError::InvalidTransition {
                from: state.to_string(),
                to: target.to_string(),
            });
        }

        tracing::debug!(
            context_id = %self.context_id,
            from = %*state,
            to = %target,
            "Tab lifecycle transition"
        );

        *state = target;
        Ok(())
    }

    fn teardown(&self, reason: TeardownReason) {
        // Only the first teardown of a registered context does anything
        if self.transition_to(LifecycleState::TornDown).is_err() {
            return;
        }

        let strategy = self.strategy.lock().take();
        if let Some(strategy) = &strategy {
            strategy.unregister();
        }

        let listener = self.unload_listener.lock().take();
        if let (Some(id), Some(window)) = (listener, &self.window) {
            window.remove_unload_listener(id);
        }

        tracing::info!(
            context_id = %self.context_id,
            namespace = %self.namespace,
            ?reason,
            "Unregistered tab"
        );
    }
}

pub struct TabManager {
    inner: Arc<ManagerInner>,
}

impl TabManager {
    /// Register this context under `namespace` with default configuration.
    ///
    /// `on_duplicate` runs every time another context of the namespace is
    /// observed. In a [`Environment::Server`] nothing is registered and
    /// `cleanup` does nothing.
    pub fn create(
        env: &Environment,
        namespace: &str,
        on_duplicate: Option<DuplicateCallback>,
    ) -> Result<Self> {
        Self::create_with_config(env, namespace, on_duplicate, &Config::default())
    }

    pub fn create_with_config(
        env: &Environment,
        namespace: &str,
        on_duplicate: Option<DuplicateCallback>,
        config: &Config,
    ) -> Result<Self> {
        let namespace = Namespace::new(namespace)?;
        let context_id = ContextId::generate();
        let detector = Arc::new(DuplicateDetector::new(context_id.clone(), on_duplicate));

        let manager = Self {
            inner: Arc::new(ManagerInner {
                context_id,
                namespace,
                window: env.window().cloned(),
                state: Mutex::new(LifecycleState::Uninitialized),
                strategy: Mutex::new(None),
                unload_listener: Mutex::new(None),
                detector,
            }),
        };

        match env.window() {
            Some(window) => manager.initialize(window, config)?,
            None => tracing::warn!(
                namespace = %manager.inner.namespace,
                "Tab coordination needs a browser window; skipping registration"
            ),
        }

        Ok(manager)
    }

    fn initialize(&self, window: &Window, config: &Config) -> Result<()> {
        let inner = &self.inner;

        let kind = match Strategy::select(window, config.strategy) {
            Some(kind) => kind,
            None => {
                tracing::warn!(
                    namespace = %inner.namespace,
                    "No broadcast channel or storage available; skipping registration"
                );
                return Ok(());
            }
        };

        inner.transition_to(LifecycleState::Registering)?;

        let registry_key = inner.namespace.registry_key(&config.registry_key_suffix);
        let strategy = match Strategy::register(
            kind,
            window,
            &inner.namespace,
            registry_key,
            &inner.context_id,
            Arc::clone(&inner.detector),
        ) {
            Ok(strategy) => strategy,
            Err(e) => {
                tracing::warn!(
                    context_id = %inner.context_id,
                    strategy = %kind,
                    error = %e,
                    "Failed to register tab"
                );
                inner.transition_to(LifecycleState::TornDown)?;
                return Ok(());
            }
        };
        *inner.strategy.lock() = Some(strategy);

        let weak = Arc::downgrade(inner);
        let listener = window.add_unload_listener(move || {
            if let Some(inner) = weak.upgrade() {
                inner.teardown(TeardownReason::Unload);
            }
        });
        *inner.unload_listener.lock() = Some(listener);

        inner.transition_to(LifecycleState::Active)?;

        tracing::info!(
            context_id = %inner.context_id,
            namespace = %inner.namespace,
            strategy = %kind,
            "Registered tab"
        );

        Ok(())
    }

    /// Withdraw presence and detach every listener. Repeated calls are no-ops.
    pub fn cleanup(&self) {
        self.inner.teardown(TeardownReason::Cleanup);
    }

    pub fn context_id(&self) -> &ContextId {
        &self.inner.context_id
    }

    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    pub fn state(&self) -> LifecycleState {
        *self.inner.state.lock()
    }

    /// Transport in use, `None` before registration and after teardown
    pub fn strategy(&self) -> Option<StrategyKind> {
        self.inner.strategy.lock().as_ref().map(Strategy::kind)
    }

    pub fn is_duplicate(&self) -> bool {
        self.inner.detector.is_duplicate()
    }

    pub fn duplicate_signals(&self) -> usize {
        self.inner.detector.signal_count()
    }
}

impl Drop for TabManager {
    fn drop(&mut self) {
        self.inner.teardown(TeardownReason::Dropped);
    }
}

impl std::fmt::Debug for TabManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabManager")
            .field("context_id", &self.inner.context_id)
            .field("namespace", &self.inner.namespace)
            .field("state", &self.state())
            .field("strategy", &self.strategy())
            .finish()
    }
}
