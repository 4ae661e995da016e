//! Wire messages
//!
//! One JSON object per WebSocket text frame, in both directions. All 64-bit
//! identifiers cross the wire as their exact decimal string form: the web
//! client's runtime only has IEEE-754 doubles, and a raw JSON number above
//! 2^53 would silently lose precision.

use easel_access::Principal;
use serde::{Deserialize, Serialize};

/// serde adapter encoding a `u64` as its decimal string
pub mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize `value` as a decimal string
    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Parse a decimal string back into a `u64`
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Client→server frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameKind {
    /// Request the exclusive edit lock
    EnterEdit,
    /// Forward an edit action (holder only)
    EditAction,
    /// Release the exclusive edit lock
    ExitEdit,
}

/// One inbound client frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Frame kind
    #[serde(rename = "type")]
    pub kind: FrameKind,
    /// Opaque edit action payload, forwarded verbatim
    #[serde(rename = "editAction", default, skip_serializing_if = "Option::is_none")]
    pub edit_action: Option<String>,
}

/// Server→client notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// Informational session event (viewer joined / left)
    Info,
    /// A principal acquired the edit lock
    EnterEdit,
    /// The lock holder performed an edit action
    EditAction,
    /// The lock holder released the edit lock
    ExitEdit,
}

/// Principal as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
    /// Principal id, as a decimal string
    #[serde(with = "u64_string")]
    pub id: u64,
    /// Display name
    pub display_name: String,
}

impl From<&Principal> for PrincipalView {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.0,
            display_name: principal.display_name.clone(),
        }
    }
}

/// One outbound notification, broadcast and discarded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification kind
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Human-readable event description
    pub message: String,
    /// The principal the event is attributed to
    pub user: PrincipalView,
    /// Opaque edit action payload, present only for `EditAction`
    #[serde(rename = "editAction", default, skip_serializing_if = "Option::is_none")]
    pub edit_action: Option<String>,
}

impl Notification {
    /// Informational notification (viewer joined / left)
    #[must_use]
    pub fn info(message: impl Into<String>, principal: &Principal) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
            user: principal.into(),
            edit_action: None,
        }
    }

    /// Edit lock acquired
    #[must_use]
    pub fn enter_edit(principal: &Principal) -> Self {
        Self {
            kind: NotificationKind::EnterEdit,
            message: format!("{} started editing", principal.display_name),
            user: principal.into(),
            edit_action: None,
        }
    }

    /// Edit action forwarded from the lock holder
    #[must_use]
    pub fn edit_action(principal: &Principal, action: impl Into<String>) -> Self {
        let action = action.into();
        Self {
            kind: NotificationKind::EditAction,
            message: format!("{} applied {}", principal.display_name, action),
            user: principal.into(),
            edit_action: Some(action),
        }
    }

    /// Edit lock released
    #[must_use]
    pub fn exit_edit(principal: &Principal) -> Self {
        Self {
            kind: NotificationKind::ExitEdit,
            message: format!("{} stopped editing", principal.display_name),
            user: principal.into(),
            edit_action: None,
        }
    }
}
