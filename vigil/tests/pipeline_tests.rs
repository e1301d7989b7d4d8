//! End-to-end pipeline scenarios: bus ingress through analysis to the
//! gateway read path, the safety gate, and cache staleness.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, watch};
use vigil::bus::{self, EgressFrame};
use vigil::{AnalysisOrchestrator, BusMessage, IngestService};
use vigil_analytics::AnalysisEngine;
use vigil_common::analysis::{AnalysisResult, ControlCommand};
use vigil_common::codec::DecodeStats;
use vigil_common::config::VigilConfig;
use vigil_common::telemetry::{AggregatedSummary, VibrationStats};
use vigil_gateway::{
    AnalysisCache, CommandGate, GatewayQuery, LatestAnalysisStore, SubscriptionBroker,
};
use vigil_telemetry::{DataAggregator, SafetyRegistry};

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

struct Rig {
    config: VigilConfig,
    safety: Arc<SafetyRegistry>,
    aggregator: Arc<DataAggregator>,
    query: Arc<GatewayQuery>,
    broker: Arc<SubscriptionBroker>,
    ingest: IngestService,
    orchestrator: AnalysisOrchestrator,
    egress_rx: mpsc::Receiver<EgressFrame>,
}

fn rig() -> Rig {
    let config = VigilConfig::default();
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
    let (egress_tx, egress_rx) = bus::egress_channel();

    let ingest = IngestService::new(
        Arc::clone(&aggregator),
        Arc::clone(&broker),
        Arc::clone(&query),
        Arc::new(DecodeStats::new()),
        config.bus.clone(),
    );
    let orchestrator = AnalysisOrchestrator::new(
        Arc::clone(&aggregator),
        engine,
        Arc::clone(&query),
        Arc::clone(&broker),
        egress_tx,
        &config,
    );

    Rig {
        config,
        safety,
        aggregator,
        query,
        broker,
        ingest,
        orchestrator,
        egress_rx,
    }
}

fn sensor_msg(
    topic: &str,
    device: &str,
    ts_ms: i64,
    currents: &[f64],
    vib: (f64, f64, f64, f64),
    temps: &[f64],
) -> BusMessage {
    let payload = json!({
        "timestamp": ts_ms,
        "device_id": device,
        "motor_currents": currents,
        "vibration": {"x": vib.0, "y": vib.1, "z": vib.2, "magnitude": vib.3},
        "temperatures": temps,
    });
    BusMessage {
        topic: topic.to_string(),
        payload: payload.to_string().into_bytes(),
    }
}

fn safety_msg(topic: &str, device: &str, emergency_stop: bool) -> BusMessage {
    let payload = json!({
        "timestamp": now_ms(),
        "device_id": device,
        "emergency_stop": emergency_stop,
        "door_closed": true,
        "overload_detected": false,
        "temperature_ok": true,
    });
    BusMessage {
        topic: topic.to_string(),
        payload: payload.to_string().into_bytes(),
    }
}

fn feed_nominal(rig: &Rig, device: &str) {
    let base = now_ms() - 1_000;
    let topic = rig.config.bus.topic_sensor_data.clone();
    for i in 0..10 {
        rig.ingest.dispatch(sensor_msg(
            &topic,
            device,
            base + i * 100,
            &[5.0, 5.1, 4.9],
            (0.8, 0.9, 0.85, 1.8),
            &[45.0, 46.0, 44.5],
        ));
    }
}

// ─── Scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn nominal_operation_reports_clean() {
    let mut rig = rig();
    feed_nominal(&rig, "cnc-01");

    rig.orchestrator.run_tick().await;

    let result = rig.query.ai_analysis("cnc-01").expect("analysis present");
    assert!(!result.anomaly_detected);
    assert!(result.predicted_wear_level < 0.01);
    assert!(
        result
            .recommendations
            .iter()
            .any(|r| r.contains("normal parameters"))
    );
    assert_eq!(result.anomaly_description, "No anomalies detected");

    // The result also left on the egress channel as an encoded frame.
    let frame = rig.egress_rx.try_recv().unwrap();
    assert_eq!(frame.topic, rig.config.bus.topic_analysis);
    let decoded: AnalysisResult = serde_json::from_str(&frame.payload).unwrap();
    assert_eq!(decoded.device_id, "cnc-01");
}

#[tokio::test]
async fn current_spike_is_detected() {
    let rig = rig();
    feed_nominal(&rig, "cnc-02");
    let topic = rig.config.bus.topic_sensor_data.clone();
    rig.ingest.dispatch(sensor_msg(
        &topic,
        "cnc-02",
        now_ms(),
        &[13.0, 13.0, 13.0],
        (0.8, 0.9, 0.85, 1.8),
        &[45.0, 46.0, 44.5],
    ));

    rig.orchestrator.run_tick().await;

    let result = rig.query.ai_analysis("cnc-02").unwrap();
    assert!(result.anomaly_detected);
    assert!(result.anomaly_score >= 0.9);
    assert!(result.anomaly_description.contains("spike"));
}

#[tokio::test]
async fn vibration_axis_imbalance_names_axis() {
    let rig = rig();
    let base = now_ms() - 1_000;
    let topic = rig.config.bus.topic_sensor_data.clone();
    for i in 0..10 {
        rig.ingest.dispatch(sensor_msg(
            &topic,
            "cnc-03",
            base + i * 100,
            &[5.0, 5.1, 4.9],
            (1.0, 5.0, 1.0, 5.2),
            &[45.0, 46.0, 44.5],
        ));
    }

    rig.orchestrator.run_tick().await;

    let result = rig.query.ai_analysis("cnc-03").unwrap();
    assert!(result.anomaly_detected);
    assert!(result.anomaly_score >= 0.5);
    assert!(result.anomaly_description.contains("Y axis"));
}

#[test]
fn wear_accumulates_and_resets() {
    let engine = AnalysisEngine::new(&VigilConfig::default().analytics);
    let summary = AggregatedSummary {
        device_id: "mill-01".to_string(),
        time_window_start: 0.0,
        time_window_end: 3600.0,
        current_mean: vec![10.0, 10.0],
        current_std: vec![0.2, 0.2],
        current_max: vec![10.5, 10.4],
        vibration_mean: VibrationStats {
            x: 0.4,
            y: 0.4,
            z: 0.4,
            magnitude: 1.0,
        },
        vibration_std: VibrationStats::default(),
        vibration_max: VibrationStats {
            x: 0.6,
            y: 0.6,
            z: 0.6,
            magnitude: 1.4,
        },
        temperature_mean: vec![42.0],
        temperature_std: vec![0.4],
        temperature_max: vec![44.0],
        sample_count: 60,
    };

    let mut last = 0.0;
    for _ in 0..100 {
        let result = engine.analyze(&summary);
        assert!(result.predicted_wear_level > last);
        last = result.predicted_wear_level;
    }
    // 100 one-hour windows; factor = (10/5)^1.5 load × 1.225 spike.
    let expected = 100.0 * 2.0_f64.powf(1.5) * (1.1 + 2.5 * 0.05);
    assert!((engine.accumulated_wear_hours("mill-01") - expected).abs() < 1e-6);

    engine.reset_wear("mill-01");
    assert_eq!(engine.accumulated_wear_hours("mill-01"), 0.0);
    let after = engine.analyze(&summary);
    assert!(after.predicted_wear_level < last);
}

#[tokio::test]
async fn safety_gate_follows_registry() {
    let rig = rig();
    let (command_tx, mut command_rx) = mpsc::channel(8);
    let gate = CommandGate::new(Arc::clone(&rig.safety), command_tx);
    let command = ControlCommand {
        command_type: "feed_hold".to_string(),
        parameters: json!({}),
    };
    let safety_topic = rig.config.bus.topic_safety.clone();

    // Emergency stop posted: commands rejected.
    rig.ingest.dispatch(safety_msg(&safety_topic, "cnc-01", true));
    let rejected = gate.try_command(command.clone());
    assert!(!rejected.is_accepted());
    assert_eq!(
        rejected,
        vigil_gateway::CommandDecision::Rejected {
            reason: "system_not_safe".to_string()
        }
    );
    assert!(command_rx.try_recv().is_err());

    // Stop cleared: commands flow again.
    rig.ingest.dispatch(safety_msg(&safety_topic, "cnc-01", false));
    assert!(gate.try_command(command).is_accepted());
    assert_eq!(command_rx.try_recv().unwrap().command_type, "feed_hold");
}

#[test]
fn cache_staleness_bounds_reads() {
    // Scaled-down TTLs: the AI kind expires between the two reads.
    let cache = AnalysisCache::with_ttls(
        Duration::from_millis(100),
        Duration::from_millis(100),
        Duration::from_millis(100),
        Duration::from_millis(100),
    );
    let result = AnalysisResult {
        timestamp: 1,
        device_id: "cnc-01".to_string(),
        anomaly_detected: false,
        anomaly_score: 0.0,
        anomaly_description: String::new(),
        predicted_wear_level: 0.0,
        estimated_remaining_hours: 0,
        recommendations: vec![],
        confidence: 0.0,
        analysis_details: vigil_common::analysis::AnalysisDetails {
            current_anomaly: 0.0,
            vibration_anomaly: 0.0,
            temperature_anomaly: 0.0,
            wear_factors: vec![],
            samples_analyzed: 0,
            time_window_seconds: 0.0,
        },
    };

    cache.set_ai_analysis("cnc-01", result);
    std::thread::sleep(Duration::from_millis(50));
    assert!(cache.ai_analysis("cnc-01").is_some());
    std::thread::sleep(Duration::from_millis(70));
    assert!(cache.ai_analysis("cnc-01").is_none());
}

// ─── Robustness ─────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_ingress_is_dropped_not_fatal() {
    let rig = rig();
    let stats = Arc::new(DecodeStats::new());
    let ingest = IngestService::new(
        Arc::clone(&rig.aggregator),
        Arc::clone(&rig.broker),
        Arc::clone(&rig.query),
        Arc::clone(&stats),
        rig.config.bus.clone(),
    );

    ingest.dispatch(BusMessage {
        topic: rig.config.bus.topic_sensor_data.clone(),
        payload: b"{broken".to_vec(),
    });
    ingest.dispatch(BusMessage {
        topic: "someone/else/topic".to_string(),
        payload: b"{}".to_vec(),
    });
    ingest.dispatch(sensor_msg(
        &rig.config.bus.topic_sensor_data,
        "cnc-01",
        now_ms(),
        &[5.0],
        (0.1, 0.1, 0.1, 0.2),
        &[40.0],
    ));

    assert_eq!(stats.sensor_counts(), (1, 1));
    assert_eq!(rig.aggregator.device_ids(), vec!["cnc-01"]);
}

#[tokio::test]
async fn ingest_loop_exits_on_shutdown() {
    let rig = rig();
    let (tx, rx) = bus::ingress_channel(&rig.config.bus);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move { rig.ingest.run(rx, shutdown_rx).await });
    tx.send(sensor_msg(
        "vigil/sensor/data",
        "cnc-01",
        now_ms(),
        &[5.0],
        (0.1, 0.1, 0.1, 0.2),
        &[40.0],
    ))
    .await
    .unwrap();

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("ingest loop must exit on shutdown")
        .unwrap();
}

#[tokio::test]
async fn orchestrator_exits_on_shutdown_between_ticks() {
    let rig = rig();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { rig.orchestrator.run(shutdown_rx).await });

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("orchestrator must exit on shutdown")
        .unwrap();
}

#[tokio::test]
async fn subscribers_receive_pipeline_pushes() {
    let rig = rig();
    let mut sub = rig.broker.subscribe(Some("cnc-01".to_string()));
    feed_nominal(&rig, "cnc-01");
    feed_nominal(&rig, "cnc-99");

    rig.orchestrator.run_tick().await;

    let mut kinds = Vec::new();
    while let Ok(msg) = sub.rx.try_recv() {
        assert_eq!(msg.device_id.as_deref(), Some("cnc-01"));
        kinds.push(msg.kind);
    }
    assert!(kinds.contains(&vigil_gateway::MessageKind::SensorData));
    assert!(kinds.contains(&vigil_gateway::MessageKind::AiAnalysis));
}
