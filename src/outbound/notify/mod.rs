//! Notification adapters.
//!
//! The default adapter logs each note instead of delivering it; a push
//! gateway adapter would slot in behind the same port.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{Notifier, NotifierError, PushNote};

/// Notifier that records deliveries in the log stream.
#[derive(Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, note: PushNote) -> Result<(), NotifierError> {
        info!(
            recipient = %note.recipient,
            title = %note.title,
            data = %note.data,
            "notification dispatched"
        );
        Ok(())
    }
}
