//! # VIGIL Gateway
//!
//! The HMI-facing side of the pipeline: TTL caches over the hot read
//! paths, the latest-analysis store, push fan-out to subscribed clients,
//! the safety-gated command path, and the query operations the external
//! REST binding calls into.
//!
//! The HTTP/WebSocket surface itself is external; this crate supplies the
//! operations and the push mailboxes it consumes.

pub mod broker;
pub mod cache;
pub mod gate;
pub mod latest;
pub mod query;

pub use broker::{MessageKind, PushMessage, Subscription, SubscriptionBroker};
pub use cache::{AnalysisCache, CacheStats};
pub use gate::{CommandDecision, CommandGate};
pub use latest::LatestAnalysisStore;
pub use query::{DeviceData, GatewayQuery, SystemStatus};

/// Wall time in milliseconds since epoch.
#[inline]
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
