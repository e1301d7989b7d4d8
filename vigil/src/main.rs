//! # VIGIL Service
//!
//! Industrial telemetry middleware between field devices and operator
//! HMIs: ingests sensor and safety events from the bus, maintains bounded
//! per-device state, runs the periodic analytics pass, and serves results
//! through the gateway read path and push broker.
//!
//! The bus transport and HTTP binding attach from outside: the transport
//! feeds the ingress channel and drains egress; the REST layer calls into
//! [`vigil_gateway::GatewayQuery`] and [`vigil_gateway::CommandGate`].

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use vigil::bus::{self, COMMAND_QUEUE_DEPTH};
use vigil::{AnalysisOrchestrator, IngestService};
use vigil_analytics::AnalysisEngine;
use vigil_common::codec::DecodeStats;
use vigil_common::config::{ConfigLoader, VigilConfig};
use vigil_gateway::{
    AnalysisCache, CommandGate, GatewayQuery, LatestAnalysisStore, SubscriptionBroker,
};
use vigil_telemetry::{DataAggregator, SafetyRegistry};

#[derive(Parser, Debug)]
#[command(name = "vigil", about = "Telemetry-to-analytics middleware")]
struct Args {
    /// Path to the TOML configuration file (defaults apply when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => VigilConfig::load(path)?,
        None => VigilConfig::default(),
    };
    // Invalid configuration is fatal before anything spins up.
    if let Err(e) = config.validate() {
        eprintln!("configuration invalid: {e}");
        return Err(e.into());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.shared.log_level.as_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(service = %config.shared.service_name, "starting VIGIL");

    // Shared state, injected explicitly. Constructed once, never
    // re-created mid-run.
    let safety = Arc::new(SafetyRegistry::new());
    let aggregator = Arc::new(DataAggregator::new(
        config.pipeline.window_size_seconds,
        config.pipeline.max_points,
        Arc::clone(&safety),
    ));
    let engine = Arc::new(AnalysisEngine::new(&config.analytics));
    let cache = Arc::new(AnalysisCache::new(&config.cache));
    let latest = Arc::new(LatestAnalysisStore::new());
    let query = Arc::new(GatewayQuery::new(
        Arc::clone(&aggregator),
        Arc::clone(&cache),
        Arc::clone(&latest),
    ));
    let broker = Arc::new(SubscriptionBroker::new());
    let decode_stats = Arc::new(DecodeStats::new());

    // Channels toward and from the external transport.
    let (ingress_tx, ingress_rx) = bus::ingress_channel(&config.bus);
    let (egress_tx, mut egress_rx) = bus::egress_channel();
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

    // The gate is handed to the REST binding together with the query
    // handles; it consults the same safety registry as the aggregator.
    let gate = CommandGate::new(Arc::clone(&safety), command_tx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ingest = IngestService::new(
        Arc::clone(&aggregator),
        Arc::clone(&broker),
        Arc::clone(&query),
        Arc::clone(&decode_stats),
        config.bus.clone(),
    );
    let orchestrator = AnalysisOrchestrator::new(
        Arc::clone(&aggregator),
        Arc::clone(&engine),
        Arc::clone(&query),
        Arc::clone(&broker),
        egress_tx.clone(),
        &config,
    );

    let ingest_handle = {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { ingest.run(ingress_rx, shutdown).await })
    };
    let orchestrator_handle = {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { orchestrator.run(shutdown).await })
    };
    let command_handle = tokio::spawn(bus::run_command_egress(
        command_rx,
        egress_tx,
        config.bus.clone(),
        shutdown_rx.clone(),
    ));
    // Until a transport attaches, drain egress so publishes never back up.
    let egress_handle = {
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_frame = egress_rx.recv() => {
                        let Some(frame) = maybe_frame else { break };
                        debug!(topic = %frame.topic, bytes = frame.payload.len(), "egress frame");
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    };

    info!("pipeline running; waiting for transport traffic");

    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!("unable to listen for shutdown signal: {e}"),
    }

    let _ = shutdown_tx.send(true);
    // Keep the transport attach points alive until the loops drain.
    drop(ingress_tx);
    drop(gate);

    let _ = ingest_handle.await;
    let _ = orchestrator_handle.await;
    let _ = command_handle.await;
    let _ = egress_handle.await;

    info!(
        subscribers = broker.subscriber_count(),
        devices = aggregator.device_ids().len(),
        "VIGIL stopped"
    );
    Ok(())
}
