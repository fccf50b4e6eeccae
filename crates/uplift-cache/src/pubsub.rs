//! Best-effort publish/subscribe fanout.
//!
//! Used for cross-process cache-invalidation broadcast and live update
//! notifications. Publish is fire-and-forget: no delivery guarantee, no
//! retry, no persistence. Subscriptions share one underlying pub/sub
//! connection; callbacks are dispatched by channel name.

use crate::config::{CacheConfig, ReconnectConfig};
use crate::store::StoreBackend;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Callback invoked with each deserialized message on a channel.
pub type MessageHandler = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// Serialize and publish a message. Failures are logged and swallowed;
/// returns whether the publish was handed to the store.
pub async fn publish<T: Serialize>(store: &dyn StoreBackend, channel: &str, message: &T) -> bool {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(channel, error = %e, "failed to serialize pub/sub message");
            return false;
        }
    };

    match store.publish(channel, &payload).await {
        Ok(()) => {
            debug!(channel, "published message");
            true
        }
        Err(e) => {
            warn!(channel, error = %e, "publish failed");
            false
        }
    }
}

/// Shared subscription session over a single pub/sub connection.
///
/// The listener task subscribes to every registered channel; when the
/// channel set changes it tears the connection down and resubscribes, and
/// when the connection drops it reconnects under the configured backoff.
#[derive(Clone)]
pub struct Subscriber {
    url: String,
    reconnect: ReconnectConfig,
    handlers: Arc<Mutex<HashMap<String, MessageHandler>>>,
    changed: Arc<Notify>,
}

impl Subscriber {
    /// Create a subscriber for the configured backing store.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            url: config.url(),
            reconnect: config.reconnect.clone(),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Register a callback for a channel. Replaces any previous callback on
    /// the same channel.
    pub fn subscribe(&self, channel: impl Into<String>, handler: MessageHandler) {
        self.handlers.lock().insert(channel.into(), handler);
        self.changed.notify_one();
    }

    /// Remove the callback for a channel.
    pub fn unsubscribe(&self, channel: &str) {
        self.handlers.lock().remove(channel);
        self.changed.notify_one();
    }

    /// Currently subscribed channels.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.handlers.lock().keys().cloned().collect()
    }

    /// Spawn the background listener task.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let subscriber = self.clone();
        tokio::spawn(async move {
            let mut attempt: u32 = 0;
            loop {
                match subscriber.run().await {
                    Ok(()) => {
                        // Channel set changed; resubscribe immediately.
                        attempt = 0;
                    }
                    Err(e) => {
                        attempt = attempt.saturating_add(1);
                        let delay = subscriber.reconnect.delay_for_attempt(attempt);
                        warn!(
                            error = %e,
                            delay_ms = delay.as_millis() as u64,
                            "pub/sub listener error, reconnecting"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        })
    }

    /// One connection lifetime: subscribe to the current channel set and
    /// dispatch messages until the set changes (Ok) or the connection
    /// fails (Err).
    async fn run(&self) -> Result<(), String> {
        let channels = self.channels();
        if channels.is_empty() {
            // Nothing to listen for yet; wait for the first subscribe.
            self.changed.notified().await;
            return Ok(());
        }

        let client = redis::Client::open(self.url.as_str())
            .map_err(|e| format!("failed to create pub/sub client: {e}"))?;
        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| format!("failed to open pub/sub connection: {e}"))?;

        for channel in &channels {
            pubsub
                .subscribe(channel)
                .await
                .map_err(|e| format!("failed to subscribe to {channel}: {e}"))?;
        }
        info!(channels = channels.len(), "pub/sub listener subscribed");

        let mut stream = pubsub.on_message();
        loop {
            tokio::select! {
                message = stream.next() => {
                    match message {
                        Some(message) => {
                            let channel = message.get_channel_name().to_string();
                            match message.get_payload::<String>() {
                                Ok(payload) => dispatch(&self.handlers, &channel, &payload),
                                Err(e) => {
                                    warn!(channel = %channel, error = %e, "unreadable pub/sub payload");
                                }
                            }
                        }
                        None => return Err("pub/sub connection closed".to_string()),
                    }
                }
                () = self.changed.notified() => return Ok(()),
            }
        }
    }
}

/// Deserialize a payload and invoke the channel's handler. A malformed
/// message is logged and dropped without invoking the callback.
fn dispatch(handlers: &Mutex<HashMap<String, MessageHandler>>, channel: &str, payload: &str) {
    let handler = handlers.lock().get(channel).cloned();
    let Some(handler) = handler else {
        return;
    };

    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(message) => handler(message),
        Err(e) => {
            warn!(channel, error = %e, "dropping malformed pub/sub message");
        }
    }
}
