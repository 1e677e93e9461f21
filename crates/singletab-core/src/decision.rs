//! Duplicate decision
//!
//! Both transports funnel what they observe into one detector. The verdict
//! is local to this context and only ever moves from "unique" to "duplicate".
//! The callback runs for every signal; repeated signals are not collapsed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::identity::ContextId;

pub type DuplicateCallback = Arc<dyn Fn() + Send + Sync>;

/// A presence observation from the active transport
#[derive(Debug, Clone, Copy)]
pub enum Evidence<'a> {
    /// Another context announced itself on the channel
    Announcement { sender: &'a ContextId },
    /// The shared registry was read with this many entries
    Registry { entries: usize },
}

pub struct DuplicateDetector {
    context_id: ContextId,
    callback: Option<DuplicateCallback>,
    duplicate: AtomicBool,
    signals: AtomicUsize,
}

impl DuplicateDetector {
    pub fn new(context_id: ContextId, callback: Option<DuplicateCallback>) -> Self {
        Self {
            context_id,
            callback,
            duplicate: AtomicBool::new(false),
            signals: AtomicUsize::new(0),
        }
    }

    /// Apply the decision rule. Returns true when the evidence raised a signal.
    pub fn observe(&self, evidence: Evidence<'_>) -> bool {
        let raised = match evidence {
            Evidence::Announcement { sender } => *sender != self.context_id,
            // Non-empty is enough, even if the only entry is our own
            Evidence::Registry { entries } => entries > 0,
        };

        if raised {
            self.raise(evidence);
        }
        raised
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate.load(Ordering::SeqCst)
    }

    /// How many signals have been raised so far
    pub fn signal_count(&self) -> usize {
        self.signals.load(Ordering::SeqCst)
    }

    fn raise(&self, evidence: Evidence<'_>) {
        let first = !self.duplicate.swap(true, Ordering::SeqCst);
        let count = self.signals.fetch_add(1, Ordering::SeqCst) + 1;

        if first {
            tracing::info!(context_id = %self.context_id, ?evidence, "Duplicate tab detected");
        } else {
            tracing::debug!(context_id = %self.context_id, ?evidence, count, "Duplicate signal repeated");
        }

        if let Some(callback) = &self.callback {
            callback();
        }
    }
}

impl std::fmt::Debug for DuplicateDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDetector")
            .field("context_id", &self.context_id)
            .field("has_callback", &self.callback.is_some())
            .field("duplicate", &self.is_duplicate())
            .field("signals", &self.signal_count())
            .finish()
    }
}
