//! Presence messages exchanged over the broadcast channel
//!
//! Wire shape: `{"kind":"NEW_TAB","contextId":"..."}`

use serde::{Deserialize, Serialize};

use crate::identity::ContextId;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceKind {
    NewTab,
    TabClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMessage {
    pub kind: PresenceKind,
    pub context_id: ContextId,
}

impl PresenceMessage {
    pub fn new_tab(context_id: &ContextId) -> Self {
        Self {
            kind: PresenceKind::NewTab,
            context_id: context_id.clone(),
        }
    }

    pub fn tab_closed(context_id: &ContextId) -> Self {
        Self {
            kind: PresenceKind::TabClosed,
            context_id: context_id.clone(),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let message = PresenceMessage::new_tab(&ContextId::from("tab-1"));
        assert_eq!(
            message.encode().unwrap(),
            r#"{"kind":"NEW_TAB","contextId":"tab-1"}"#
        );

        let closed = PresenceMessage::decode(r#"{"kind":"TAB_CLOSED","contextId":"tab-2"}"#)
            .unwrap();
        assert_eq!(closed, PresenceMessage::tab_closed(&ContextId::from("tab-2")));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(PresenceMessage::decode(r#"{"kind":"PING","contextId":"x"}"#).is_err());
        assert!(PresenceMessage::decode("not json").is_err());
    }
}
