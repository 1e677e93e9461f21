//! Named same-origin broadcast channels
//!
//! A message posted on a channel is queued for every *other* open channel
//! with the same name in the same origin. Recipients are fixed at post time;
//! a port closed before delivery simply never sees the message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::HostError;
use crate::origin::{MessageHandler, PortEntry, PortId, Task};
use crate::window::Window;
use crate::Result;

pub struct BroadcastChannel {
    name: String,
    port: PortId,
    window: Window,
    closed: AtomicBool,
}

impl BroadcastChannel {
    pub fn open(window: &Window, name: &str) -> Result<Self> {
        if !window.broadcast_channel_supported() {
            return Err(HostError::Unsupported("BroadcastChannel"));
        }

        let origin = window.origin();
        let port = origin.inner.next_id();
        {
            let mut state = origin.inner.state.lock();
            if !state.windows.contains_key(&window.id()) {
                return Err(HostError::WindowClosed(window.id()));
            }
            state.ports.insert(
                port,
                PortEntry {
                    name: name.to_string(),
                    window: window.id(),
                    handler: None,
                },
            );
        }

        tracing::trace!(window = %window.id(), channel = %name, port, "Opened broadcast channel");

        Ok(Self {
            name: name.to_string(),
            port,
            window: window.clone(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Replace the message handler
    pub fn set_onmessage<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let handler: MessageHandler = Arc::new(handler);
        let mut state = self.window.origin().inner.state.lock();
        if let Some(entry) = state.ports.get_mut(&self.port) {
            entry.handler = Some(handler);
        }
    }

    /// Queue `data` for every other port on this channel.
    /// Returns how many deliveries were queued.
    pub fn post_message(&self, data: &str) -> Result<usize> {
        if self.is_closed() {
            return Err(HostError::ChannelClosed(self.name.clone()));
        }

        let mut state = self.window.origin().inner.state.lock();
        if !state.ports.contains_key(&self.port) {
            // Owning window went away underneath us
            return Err(HostError::ChannelClosed(self.name.clone()));
        }

        let mut recipients: Vec<PortId> = state
            .ports
            .iter()
            .filter(|(id, entry)| **id != self.port && entry.name == self.name)
            .map(|(id, _)| *id)
            .collect();
        // Creation order, so delivery is reproducible
        recipients.sort_unstable();

        for port in &recipients {
            state.queue.push_back(Task::Message {
                port: *port,
                data: data.to_string(),
            });
        }

        tracing::trace!(
            channel = %self.name,
            recipients = recipients.len(),
            "Posted broadcast message"
        );

        Ok(recipients.len())
    }

    /// Stop sending and receiving. Safe to call repeatedly.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.window
            .origin()
            .inner
            .state
            .lock()
            .ports
            .remove(&self.port);
    }
}

impl Drop for BroadcastChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for BroadcastChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("name", &self.name)
            .field("window", &self.window.id())
            .field("closed", &self.is_closed())
            .finish()
    }
}
