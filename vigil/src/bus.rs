//! Bus channel plumbing.
//!
//! The transport (MQTT or otherwise) lives outside this process boundary.
//! Incoming publishes are handed over as [`BusMessage`]s on a bounded
//! channel; outgoing frames leave on the egress channel with a
//! per-operation deadline. Bursts beyond the queue depth are absorbed by
//! the sender side of the transport, not here.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;
use vigil_common::analysis::CommandFrame;
use vigil_common::codec;
use vigil_common::config::BusConfig;

/// One raw publish received from the transport.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// One encoded frame bound for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressFrame {
    pub topic: String,
    pub payload: String,
}

/// Egress queue depth; the transport drains this continuously.
const EGRESS_QUEUE_DEPTH: usize = 256;
/// Command hand-off queue depth between the gate and the egress pump.
pub const COMMAND_QUEUE_DEPTH: usize = 64;

/// Build the bounded ingress channel per configuration.
pub fn ingress_channel(config: &BusConfig) -> (mpsc::Sender<BusMessage>, mpsc::Receiver<BusMessage>) {
    mpsc::channel(config.ingress_queue_depth)
}

/// Build the egress channel.
pub fn egress_channel() -> (mpsc::Sender<EgressFrame>, mpsc::Receiver<EgressFrame>) {
    mpsc::channel(EGRESS_QUEUE_DEPTH)
}

/// Publish one frame with the configured deadline.
///
/// A timeout or closed channel is logged and swallowed; egress problems
/// never propagate into the analytic path.
pub async fn publish(tx: &mpsc::Sender<EgressFrame>, frame: EgressFrame, deadline: Duration) {
    let topic = frame.topic.clone();
    if let Err(e) = tx.send_timeout(frame, deadline).await {
        warn!(topic, "egress publish failed: {e}");
    }
}

/// Pump accepted command frames from the gate onto the egress channel.
///
/// Runs until the gate side closes or shutdown flips.
pub async fn run_command_egress(
    mut commands: mpsc::Receiver<CommandFrame>,
    egress: mpsc::Sender<EgressFrame>,
    config: BusConfig,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let deadline = Duration::from_secs(config.publish_timeout_seconds);
    loop {
        tokio::select! {
            maybe_frame = commands.recv() => {
                let Some(frame) = maybe_frame else { break };
                match codec::encode_command(&frame) {
                    Ok(payload) => {
                        publish(
                            &egress,
                            EgressFrame {
                                topic: config.topic_commands.clone(),
                                payload,
                            },
                            deadline,
                        )
                        .await;
                    }
                    Err(e) => warn!("failed to encode command frame: {e}"),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_delivers_within_deadline() {
        let (tx, mut rx) = egress_channel();
        publish(
            &tx,
            EgressFrame {
                topic: "t".to_string(),
                payload: "{}".to_string(),
            },
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(rx.recv().await.unwrap().topic, "t");
    }

    #[tokio::test]
    async fn publish_to_closed_channel_is_swallowed() {
        let (tx, rx) = egress_channel();
        drop(rx);
        // Must not panic or error out.
        publish(
            &tx,
            EgressFrame {
                topic: "t".to_string(),
                payload: "{}".to_string(),
            },
            Duration::from_millis(10),
        )
        .await;
    }

    #[tokio::test]
    async fn command_egress_encodes_and_routes() {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (egress_tx, mut egress_rx) = egress_channel();
        let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let config = BusConfig::default();

        let pump = tokio::spawn(run_command_egress(cmd_rx, egress_tx, config, shutdown_rx));

        cmd_tx
            .send(CommandFrame {
                timestamp: 123,
                command_type: "feed_hold".to_string(),
                parameters: json!({}),
            })
            .await
            .unwrap();

        let frame = egress_rx.recv().await.unwrap();
        assert_eq!(frame.topic, "vigil/control/commands");
        assert!(frame.payload.contains("feed_hold"));

        drop(cmd_tx);
        pump.await.unwrap();
    }
}
