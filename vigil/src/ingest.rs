//! Bus ingress loop.
//!
//! Consumes raw publishes from the bounded ingress channel, decodes them
//! through the boundary codec, and dispatches: sensor readings into the
//! aggregator (plus cache invalidation and a `sensor_data` push), safety
//! statuses into the registry (plus a `safety_status` push). Malformed
//! payloads are counted and dropped; the loop never unwinds on a
//! per-message failure.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use vigil_common::codec::{self, DecodeStats};
use vigil_common::config::BusConfig;
use vigil_gateway::{GatewayQuery, SubscriptionBroker};
use vigil_telemetry::DataAggregator;

use crate::bus::BusMessage;

/// Decodes and dispatches ingress traffic.
pub struct IngestService {
    aggregator: Arc<DataAggregator>,
    broker: Arc<SubscriptionBroker>,
    query: Arc<GatewayQuery>,
    stats: Arc<DecodeStats>,
    topics: BusConfig,
}

impl IngestService {
    pub fn new(
        aggregator: Arc<DataAggregator>,
        broker: Arc<SubscriptionBroker>,
        query: Arc<GatewayQuery>,
        stats: Arc<DecodeStats>,
        topics: BusConfig,
    ) -> Self {
        Self {
            aggregator,
            broker,
            query,
            stats,
            topics,
        }
    }

    /// Run until shutdown flips or the transport side closes the channel.
    pub async fn run(
        &self,
        mut ingress: mpsc::Receiver<BusMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("ingest loop started");
        loop {
            tokio::select! {
                maybe_msg = ingress.recv() => {
                    match maybe_msg {
                        Some(msg) => self.dispatch(msg),
                        None => {
                            info!("ingress channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("ingest loop shutting down");
                    break;
                }
            }
        }
        let (sensor_ok, sensor_err) = self.stats.sensor_counts();
        let (safety_ok, safety_err) = self.stats.safety_counts();
        info!(sensor_ok, sensor_err, safety_ok, safety_err, "ingest loop stopped");
    }

    /// Route one message by topic. Never panics on malformed input.
    pub fn dispatch(&self, msg: BusMessage) {
        if msg.topic == self.topics.topic_sensor_data {
            match codec::decode_sensor_reading(&msg.payload) {
                Ok(reading) => {
                    self.stats.record_sensor(true);
                    self.query.invalidate_device(&reading.device_id);
                    self.broker.publish_sensor_data(&reading);
                    self.aggregator.add_reading(reading);
                }
                Err(e) => {
                    self.stats.record_sensor(false);
                    warn!(topic = %msg.topic, "dropped sensor payload: {e}");
                }
            }
        } else if msg.topic == self.topics.topic_safety {
            match codec::decode_safety_status(&msg.payload) {
                Ok(status) => {
                    self.stats.record_safety(true);
                    self.broker.publish_safety_status(&status);
                    self.aggregator.update_safety(status);
                }
                Err(e) => {
                    self.stats.record_safety(false);
                    warn!(topic = %msg.topic, "dropped safety payload: {e}");
                }
            }
        } else {
            debug!(topic = %msg.topic, "message on unknown topic ignored");
        }
    }
}
