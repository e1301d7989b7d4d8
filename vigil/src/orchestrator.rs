//! Periodic analysis orchestrator.
//!
//! A single timer drives the tick; each tick fans out over the devices
//! known to the aggregator, runs the analysis engine on each windowed
//! summary, and publishes the results to the cache, the push broker, and
//! the egress channel. A failure on one device is logged and skips only
//! that device. Shutdown aborts the next tick; a tick in progress runs to
//! completion, and missed ticks are dropped rather than replayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};
use vigil_analytics::AnalysisEngine;
use vigil_common::codec;
use vigil_common::config::VigilConfig;
use vigil_gateway::{GatewayQuery, SubscriptionBroker};
use vigil_telemetry::DataAggregator;

use crate::bus::{self, EgressFrame};

/// Drives the periodic summarize → analyze → publish pass.
pub struct AnalysisOrchestrator {
    aggregator: Arc<DataAggregator>,
    engine: Arc<AnalysisEngine>,
    query: Arc<GatewayQuery>,
    broker: Arc<SubscriptionBroker>,
    egress: mpsc::Sender<EgressFrame>,
    tick_period: Duration,
    publish_deadline: Duration,
    analysis_topic: String,
}

impl AnalysisOrchestrator {
    pub fn new(
        aggregator: Arc<DataAggregator>,
        engine: Arc<AnalysisEngine>,
        query: Arc<GatewayQuery>,
        broker: Arc<SubscriptionBroker>,
        egress: mpsc::Sender<EgressFrame>,
        config: &VigilConfig,
    ) -> Self {
        Self {
            aggregator,
            engine,
            query,
            broker,
            egress,
            tick_period: Duration::from_secs(config.pipeline.analysis_interval_seconds),
            publish_deadline: Duration::from_secs(config.bus.publish_timeout_seconds),
            analysis_topic: config.bus.topic_analysis.clone(),
        }
    }

    /// Run ticks until shutdown flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(period_s = self.tick_period.as_secs(), "orchestrator started");
        let mut ticker = interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_tick().await,
                _ = shutdown.changed() => {
                    info!("orchestrator shutting down");
                    break;
                }
            }
        }
    }

    /// One full fan-out over the known devices.
    pub async fn run_tick(&self) {
        let devices = self.aggregator.device_ids();
        debug!(devices = devices.len(), "analysis tick");

        for device_id in devices {
            match self.aggregator.aggregate(&device_id, None) {
                Ok(Some(summary)) => {
                    let result = self.engine.analyze(&summary);
                    self.query.record_analysis(result.clone());
                    self.broker.publish_analysis(&result);

                    match codec::encode_analysis(&result) {
                        Ok(payload) => {
                            bus::publish(
                                &self.egress,
                                EgressFrame {
                                    topic: self.analysis_topic.clone(),
                                    payload,
                                },
                                self.publish_deadline,
                            )
                            .await;
                        }
                        Err(e) => warn!(%device_id, "failed to encode analysis: {e}"),
                    }
                }
                Ok(None) => debug!(%device_id, "no readings in window, skipped"),
                // One device failing never stops the others.
                Err(e) => warn!(%device_id, "aggregation failed, device skipped: {e}"),
            }
        }
    }
}
