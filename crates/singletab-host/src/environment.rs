//! Execution environment
//!
//! Code may run inside a live window or somewhere without one at all
//! (server-side evaluation). Callers branch on this instead of probing globals.

use crate::window::Window;

#[derive(Debug, Clone)]
pub enum Environment {
    /// A live browsing context
    Window(Window),
    /// No browsing context is present
    Server,
}

impl Environment {
    pub fn window(&self) -> Option<&Window> {
        match self {
            Environment::Window(window) => Some(window),
            Environment::Server => None,
        }
    }

    pub fn is_browser(&self) -> bool {
        matches!(self, Environment::Window(_))
    }
}

impl From<Window> for Environment {
    fn from(window: Window) -> Self {
        Environment::Window(window)
    }
}
