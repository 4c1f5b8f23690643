//! Port for best-effort push notifications.
//!
//! Delivery is fire-and-forget by contract: the booking service commits
//! its state transition first, dispatches on a spawned task, and logs
//! (never propagates) notifier failures.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// One push notification addressed to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct PushNote {
    pub recipient: Uuid,
    pub title: String,
    pub body: String,
    /// Structured payload for the client app (slot ids, reason tags).
    pub data: Value,
}

/// Errors raised by notifier adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifierError {
    /// The delivery channel rejected or dropped the note.
    #[error("notification delivery failed: {message}")]
    Delivery { message: String },
}

impl NotifierError {
    /// Helper for delivery failures.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }
}

/// Outbound port to the notification collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one note, best effort.
    async fn notify(&self, note: PushNote) -> Result<(), NotifierError>;
}
