use serde_json::json;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::entities::notification::Model as NotificationModel;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// In-process push fan-out for notification delivery.
///
/// Explicitly constructed and injected through the application state; call
/// `initialize` before publishing and `shutdown` during teardown. Delivery is
/// fire-and-forget: subscribers that lag or disconnect simply miss messages
/// and recover through the notification polling endpoint. Clients de-duplicate
/// across the two paths by notification id.
pub struct PushGateway {
    channel: RwLock<Option<broadcast::Sender<String>>>,
}

impl PushGateway {
    pub fn new() -> Self {
        Self {
            channel: RwLock::new(None),
        }
    }

    /// Set up the broadcast transport. Idempotent; a second call replaces the
    /// channel and detaches existing subscribers.
    pub fn initialize(&self) {
        let (tx, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        *self.channel.write().expect("push channel lock poisoned") = Some(tx);
        info!("push gateway initialized");
    }

    pub fn shutdown(&self) {
        *self.channel.write().expect("push channel lock poisoned") = None;
        info!("push gateway shut down");
    }

    /// Subscribe to the live notification stream. Returns None when the
    /// gateway has not been initialized.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<String>> {
        self.channel
            .read()
            .expect("push channel lock poisoned")
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Publish a notification to connected subscribers. Returns Err only for
    /// reporting; callers must not fail workflow transitions on it.
    pub fn publish(&self, notification: &NotificationModel) -> Result<usize, String> {
        let guard = self.channel.read().expect("push channel lock poisoned");
        let Some(tx) = guard.as_ref() else {
            return Err("push gateway not initialized".to_string());
        };

        let payload = json!({
            "id": notification.id,
            "user_id": notification.user_id,
            "kind": notification.kind,
            "title": notification.title,
            "message": notification.message,
            "link": notification.link,
            "created_at": notification.created_at,
        })
        .to_string();

        match tx.send(payload) {
            Ok(receivers) => {
                debug!(notification_id = %notification.id, receivers, "notification pushed");
                Ok(receivers)
            }
            // No subscribers connected; polling covers delivery.
            Err(_) => Ok(0),
        }
    }
}

impl Default for PushGateway {
    fn default() -> Self {
        Self::new()
    }
}
