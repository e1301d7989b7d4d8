//! Analysis value types: per-channel verdicts, wear predictions, the
//! combined per-device result, and actuator command shapes.

use serde::{Deserialize, Serialize};

/// Verdict of one channel-family analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub is_anomaly: bool,
    /// Severity in [0, 1].
    pub score: f64,
    /// Human-readable findings, "; "-joined when several rules fired.
    pub description: String,
    /// Fixed sensor-trust constant for the channel family, in [0, 1].
    pub confidence: f64,
}

impl AnomalyVerdict {
    /// Verdict for a channel family where no rule fired.
    pub fn normal(description: &str, confidence: f64) -> Self {
        Self {
            is_anomaly: false,
            score: 0.0,
            description: description.to_string(),
            confidence,
        }
    }
}

/// Wear prediction for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearPrediction {
    /// Accumulated wear normalized to [0, 1].
    pub wear_level: f64,
    /// Remaining lifetime at current stress [h], floored to integer.
    pub estimated_remaining_hours: i64,
    /// Stress conditions that accelerated wear this window.
    pub contributing_factors: Vec<String>,
    /// `0.75 − 0.2 · wear_level`.
    pub confidence: f64,
}

/// Per-channel detail envelope published with every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub current_anomaly: f64,
    pub vibration_anomaly: f64,
    pub temperature_anomaly: f64,
    pub wear_factors: Vec<String>,
    pub samples_analyzed: usize,
    pub time_window_seconds: f64,
}

/// Combined analysis published per device per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Milliseconds since epoch at assembly time.
    pub timestamp: i64,
    pub device_id: String,
    pub anomaly_detected: bool,
    /// Maximum score across the three channel families, in [0, 1].
    pub anomaly_score: f64,
    pub anomaly_description: String,
    pub predicted_wear_level: f64,
    pub estimated_remaining_hours: i64,
    pub recommendations: Vec<String>,
    /// Mean of the minimum triggered channel confidence and the wear
    /// confidence.
    pub confidence: f64,
    pub analysis_details: AnalysisDetails,
}

/// Actuator command as submitted by an HMI caller.
///
/// Parameters are opaque to the pipeline; only the safety gate and the
/// egress stamping touch the command at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub command_type: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Command as published on the egress channel, stamped at acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandFrame {
    /// Milliseconds since epoch at acceptance.
    pub timestamp: i64,
    pub command_type: String,
    pub parameters: serde_json::Value,
}
