//! Transport selection
//!
//! Exactly one transport is chosen per context, once, from what the window
//! supports. After that every call goes straight to the chosen variant.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use singletab_host::Window;

use crate::broadcast::BroadcastStrategy;
use crate::decision::DuplicateDetector;
use crate::identity::{ContextId, Namespace};
use crate::shared_store::SharedStoreStrategy;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Broadcast,
    SharedStore,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Broadcast => write!(f, "broadcast"),
            StrategyKind::SharedStore => write!(f, "shared_store"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPreference {
    /// Broadcast when available, shared store otherwise
    #[default]
    Auto,
    Broadcast,
    SharedStore,
}

pub(crate) enum Strategy {
    Broadcast(BroadcastStrategy),
    SharedStore(SharedStoreStrategy),
}

impl Strategy {
    /// Probe the window. `None` when it offers neither transport.
    pub fn select(window: &Window, preference: StrategyPreference) -> Option<StrategyKind> {
        let broadcast = window.broadcast_channel_supported();
        let storage = window.origin().capabilities().storage;

        match preference {
            StrategyPreference::Auto => {}
            StrategyPreference::Broadcast if broadcast => return Some(StrategyKind::Broadcast),
            StrategyPreference::SharedStore if storage => return Some(StrategyKind::SharedStore),
            unavailable => tracing::warn!(
                preference = ?unavailable,
                "Preferred strategy unavailable, falling back to capability probe"
            ),
        }

        if broadcast {
            Some(StrategyKind::Broadcast)
        } else if storage {
            Some(StrategyKind::SharedStore)
        } else {
            None
        }
    }

    pub fn register(
        kind: StrategyKind,
        window: &Window,
        namespace: &Namespace,
        registry_key: String,
        context_id: &ContextId,
        detector: Arc<DuplicateDetector>,
    ) -> Result<Self> {
        match kind {
            StrategyKind::Broadcast => Ok(Strategy::Broadcast(BroadcastStrategy::register(
                window, namespace, context_id, detector,
            )?)),
            StrategyKind::SharedStore => {
                let storage = window
                    .local_storage()
                    .ok_or(singletab_host::HostError::Unsupported("Storage"))?;
                Ok(Strategy::SharedStore(SharedStoreStrategy::register(
                    storage,
                    registry_key,
                    context_id,
                    detector,
                )))
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Broadcast(_) => StrategyKind::Broadcast,
            Strategy::SharedStore(_) => StrategyKind::SharedStore,
        }
    }

    pub fn unregister(&self) {
        match self {
            Strategy::Broadcast(strategy) => strategy.unregister(),
            Strategy::SharedStore(strategy) => strategy.unregister(),
        }
    }
}
