//! Single-tab guard
//!
//! Binds a [`TabManager`] to the lifetime of a mounted UI component and
//! turns duplicate signals into the flags a view needs: whether this tab is
//! a duplicate, whether to show the warning, and what the warning says.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use singletab_host::Environment;

use crate::config::Config;
use crate::decision::DuplicateCallback;
use crate::manager::TabManager;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardState {
    pub is_duplicate: bool,
    pub show_warning: bool,
    pub message: Option<String>,
}

pub struct SingleTabGuard {
    state: Arc<RwLock<GuardState>>,
    manager: TabManager,
}

impl SingleTabGuard {
    pub fn mount(env: &Environment, app_id: &str) -> Result<Self> {
        Self::mount_with_config(env, app_id, &Config::default())
    }

    pub fn mount_with_config(env: &Environment, app_id: &str, config: &Config) -> Result<Self> {
        let state = Arc::new(RwLock::new(GuardState::default()));

        let sink = Arc::clone(&state);
        let message = config.duplicate_message.clone();
        let on_duplicate: DuplicateCallback = Arc::new(move || {
            let mut state = sink.write();
            state.is_duplicate = true;
            state.message = Some(message.clone());
            state.show_warning = true;
        });

        let manager = TabManager::create_with_config(env, app_id, Some(on_duplicate), config)?;

        Ok(Self { state, manager })
    }

    pub fn snapshot(&self) -> GuardState {
        self.state.read().clone()
    }

    pub fn is_duplicate(&self) -> bool {
        self.state.read().is_duplicate
    }

    pub fn show_warning(&self) -> bool {
        self.state.read().show_warning
    }

    pub fn message(&self) -> Option<String> {
        self.state.read().message.clone()
    }

    /// Whether a blocking overlay should be open
    pub fn modal_open(&self) -> bool {
        self.show_warning()
    }

    pub fn manager(&self) -> &TabManager {
        &self.manager
    }

    pub fn unmount(self) {
        self.manager.cleanup();
    }
}
