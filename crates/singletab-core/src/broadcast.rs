//! Broadcast transport
//!
//! Presence travels live over a channel named after the namespace. Nothing
//! is stored: a context only learns about announcements made while it is
//! subscribed, so two contexts opened within one delivery window can each
//! miss the other.

use std::sync::Arc;

use singletab_host::{BroadcastChannel, Window};

use crate::decision::{DuplicateDetector, Evidence};
use crate::identity::{ContextId, Namespace};
use crate::message::{PresenceKind, PresenceMessage};
use crate::Result;

pub struct BroadcastStrategy {
    channel: BroadcastChannel,
    context_id: ContextId,
}

impl BroadcastStrategy {
    /// Subscribe to the namespace channel and announce this context
    pub fn register(
        window: &Window,
        namespace: &Namespace,
        context_id: &ContextId,
        detector: Arc<DuplicateDetector>,
    ) -> Result<Self> {
        let channel = BroadcastChannel::open(window, namespace.as_str())?;

        channel.set_onmessage(move |data| match PresenceMessage::decode(data) {
            Ok(message) => on_presence_changed(&detector, &message),
            Err(e) => tracing::debug!(error = %e, "Ignoring malformed presence message"),
        });

        let announcement = PresenceMessage::new_tab(context_id).encode()?;
        channel.post_message(&announcement)?;

        Ok(Self {
            channel,
            context_id: context_id.clone(),
        })
    }

    /// Announce departure and release the channel
    pub fn unregister(&self) {
        if self.channel.is_closed() {
            return;
        }

        match PresenceMessage::tab_closed(&self.context_id).encode() {
            Ok(withdrawal) => {
                if let Err(e) = self.channel.post_message(&withdrawal) {
                    tracing::debug!(
                        context_id = %self.context_id,
                        error = %e,
                        "Could not announce tab closing"
                    );
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode presence message"),
        }

        self.channel.close();
    }
}

fn on_presence_changed(detector: &DuplicateDetector, message: &PresenceMessage) {
    match message.kind {
        PresenceKind::NewTab => {
            detector.observe(Evidence::Announcement {
                sender: &message.context_id,
            });
        }
        // No registry to update on this transport
        PresenceKind::TabClosed => {
            tracing::trace!(sender = %message.context_id, "Tab closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use singletab_host::Origin;

    #[test]
    fn test_announcement_reaches_existing_subscriber() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let namespace = Namespace::new("app").unwrap();

        let first_id = ContextId::generate();
        let first = Arc::new(DuplicateDetector::new(first_id.clone(), None));
        let _a = BroadcastStrategy::register(
            &origin.open_window(),
            &namespace,
            &first_id,
            Arc::clone(&first),
        )
        .unwrap();
        origin.run_until_idle();

        let second_id = ContextId::generate();
        let second = Arc::new(DuplicateDetector::new(second_id.clone(), None));
        let _b = BroadcastStrategy::register(
            &origin.open_window(),
            &namespace,
            &second_id,
            Arc::clone(&second),
        )
        .unwrap();
        origin.run_until_idle();

        // Only the earlier subscriber hears the announcement
        assert!(first.is_duplicate());
        assert!(!second.is_duplicate());
    }

    #[test]
    fn test_withdrawal_is_not_duplicate_evidence() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let namespace = Namespace::new("app").unwrap();
        let window = origin.open_window();

        let listener_id = ContextId::generate();
        let detector = Arc::new(DuplicateDetector::new(listener_id.clone(), None));
        let _listener =
            BroadcastStrategy::register(&window, &namespace, &listener_id, Arc::clone(&detector))
                .unwrap();

        let channel = BroadcastChannel::open(&origin.open_window(), "app").unwrap();
        let closed = PresenceMessage::tab_closed(&ContextId::from("gone"));
        channel.post_message(&closed.encode().unwrap()).unwrap();
        channel.post_message("garbage").unwrap();
        origin.run_until_idle();

        assert!(!detector.is_duplicate());
    }

    #[test]
    fn test_unregister_twice_sends_one_withdrawal() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        let namespace = Namespace::new("app").unwrap();

        let observer = BroadcastChannel::open(&origin.open_window(), "app").unwrap();
        let received = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        observer.set_onmessage(move |data| sink.lock().push(data.to_string()));

        let id = ContextId::generate();
        let detector = Arc::new(DuplicateDetector::new(id.clone(), None));
        let strategy =
            BroadcastStrategy::register(&origin.open_window(), &namespace, &id, detector).unwrap();

        strategy.unregister();
        strategy.unregister();
        origin.run_until_idle();

        let kinds: Vec<PresenceKind> = received
            .lock()
            .iter()
            .map(|data| PresenceMessage::decode(data).unwrap().kind)
            .collect();
        assert_eq!(kinds, vec![PresenceKind::NewTab, PresenceKind::TabClosed]);
    }
}
