//! Push fan-out to subscribed HMI clients.
//!
//! Each subscriber owns a bounded mailbox drained by its own sender task
//! in the external transport. Broadcast is best-effort in registration
//! order: a closed mailbox detaches the subscriber silently, a full
//! mailbox drops that one message and counts it. Per-subscriber order is
//! FIFO; nothing is replayed on reconnect.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use vigil_common::analysis::AnalysisResult;
use vigil_common::telemetry::{SafetyStatus, SensorReading};

/// Mailbox capacity per subscriber.
const MAILBOX_DEPTH: usize = 64;

/// The four push message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    SensorData,
    SafetyStatus,
    AiAnalysis,
    SystemStatus,
}

/// One message as delivered to a subscriber mailbox.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub payload: Value,
}

/// A live subscription: keep the receiver, drop it to detach.
pub struct Subscription {
    pub id: u64,
    pub rx: mpsc::Receiver<PushMessage>,
}

#[derive(Debug)]
struct Subscriber {
    id: u64,
    filter: Option<String>,
    tx: mpsc::Sender<PushMessage>,
}

/// Registry of subscriber mailboxes with per-device filtering.
#[derive(Debug, Default)]
pub struct SubscriptionBroker {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    dropped: AtomicU64,
}

impl SubscriptionBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, optionally filtered to one device.
    pub fn subscribe(&self, device_filter: Option<String>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(MAILBOX_DEPTH);
        self.subscribers.lock().push(Subscriber {
            id,
            filter: device_filter.clone(),
            tx,
        });
        debug!(id, filter = ?device_filter, "subscriber registered");
        Subscription { id, rx }
    }

    /// Remove a subscriber explicitly.
    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().retain(|s| s.id != id);
    }

    /// Fan a message out to matching subscribers in registration order.
    ///
    /// A subscriber matches when it has no filter, the message has no
    /// device, or the two device ids are equal.
    pub fn broadcast(&self, kind: MessageKind, device_id: Option<&str>, payload: Value) {
        let message = PushMessage {
            kind,
            device_id: device_id.map(str::to_string),
            payload,
        };

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| {
            let matches = match (&s.filter, device_id) {
                (Some(filter), Some(device)) => filter == device,
                _ => true,
            };
            if !matches {
                return true;
            }
            match s.tx.try_send(message.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Receiver went away: detach silently.
                    debug!(id = s.id, "subscriber detached");
                    false
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    true
                }
            }
        });
    }

    pub fn publish_sensor_data(&self, reading: &SensorReading) {
        self.publish(MessageKind::SensorData, Some(&reading.device_id), reading);
    }

    pub fn publish_safety_status(&self, status: &SafetyStatus) {
        self.publish(MessageKind::SafetyStatus, Some(&status.device_id), status);
    }

    pub fn publish_analysis(&self, result: &AnalysisResult) {
        self.publish(MessageKind::AiAnalysis, Some(&result.device_id), result);
    }

    pub fn publish_system_status<T: Serialize>(&self, status: &T) {
        self.publish(MessageKind::SystemStatus, None, status);
    }

    fn publish<T: Serialize>(&self, kind: MessageKind, device_id: Option<&str>, value: &T) {
        match serde_json::to_value(value) {
            Ok(payload) => self.broadcast(kind, device_id, payload),
            Err(e) => warn!(?kind, "failed to serialize push payload: {e}"),
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Number of subscribers filtered to the given device.
    pub fn device_subscriber_count(&self, device_id: &str) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|s| s.filter.as_deref() == Some(device_id))
            .count()
    }

    /// Messages dropped on full mailboxes since startup.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn broadcast_reaches_unfiltered_subscribers() {
        let broker = SubscriptionBroker::new();
        let mut sub = broker.subscribe(None);
        broker.broadcast(MessageKind::SystemStatus, None, json!({"ok": true}));
        let msg = sub.rx.try_recv().unwrap();
        assert_eq!(msg.kind, MessageKind::SystemStatus);
        assert!(msg.device_id.is_none());
    }

    #[test]
    fn device_filter_selects_messages() {
        let broker = SubscriptionBroker::new();
        let mut filtered = broker.subscribe(Some("a".to_string()));
        let mut all = broker.subscribe(None);

        broker.broadcast(MessageKind::SensorData, Some("b"), json!({}));
        assert!(filtered.rx.try_recv().is_err());
        assert!(all.rx.try_recv().is_ok());

        broker.broadcast(MessageKind::SensorData, Some("a"), json!({}));
        assert!(filtered.rx.try_recv().is_ok());
        assert!(all.rx.try_recv().is_ok());
    }

    #[test]
    fn unfiltered_messages_reach_filtered_subscribers() {
        let broker = SubscriptionBroker::new();
        let mut filtered = broker.subscribe(Some("a".to_string()));
        broker.broadcast(MessageKind::SystemStatus, None, json!({}));
        assert!(filtered.rx.try_recv().is_ok());
    }

    #[test]
    fn dropped_receiver_detaches_silently() {
        let broker = SubscriptionBroker::new();
        let sub = broker.subscribe(None);
        let mut live = broker.subscribe(None);
        assert_eq!(broker.subscriber_count(), 2);

        drop(sub);
        broker.broadcast(MessageKind::SystemStatus, None, json!({}));
        assert_eq!(broker.subscriber_count(), 1);
        assert!(live.rx.try_recv().is_ok());
    }

    #[test]
    fn full_mailbox_drops_message_but_keeps_subscriber() {
        let broker = SubscriptionBroker::new();
        let mut sub = broker.subscribe(None);
        for _ in 0..=MAILBOX_DEPTH {
            broker.broadcast(MessageKind::SystemStatus, None, json!({}));
        }
        assert_eq!(broker.dropped_messages(), 1);
        assert_eq!(broker.subscriber_count(), 1);
        // Drain: exactly MAILBOX_DEPTH made it through, in order.
        let mut received = 0;
        while sub.rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, MAILBOX_DEPTH);
    }

    #[test]
    fn unsubscribe_removes_by_id() {
        let broker = SubscriptionBroker::new();
        let sub = broker.subscribe(Some("a".to_string()));
        assert_eq!(broker.device_subscriber_count("a"), 1);
        broker.unsubscribe(sub.id);
        assert_eq!(broker.device_subscriber_count("a"), 0);
    }

    #[test]
    fn per_subscriber_order_is_fifo() {
        let broker = SubscriptionBroker::new();
        let mut sub = broker.subscribe(None);
        for i in 0..5 {
            broker.broadcast(MessageKind::SensorData, Some("a"), json!({ "seq": i }));
        }
        for i in 0..5 {
            let msg = sub.rx.try_recv().unwrap();
            assert_eq!(msg.payload["seq"], i);
        }
    }
}
