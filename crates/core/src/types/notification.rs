//! Client-side notification feed entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NotificationKind;

/// A notification waiting to be added to the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    /// Build a notification of the given kind.
    #[must_use]
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// A notification held in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}
