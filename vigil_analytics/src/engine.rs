//! Per-device analysis: detection, wear, recommendations, and the
//! combined result.
//!
//! The engine is the single place where the three channel verdicts are
//! folded together. Detection runs against the pre-update baseline; the
//! summary is folded into the baseline only after the result is
//! assembled, so re-running a tick over unchanged buffers differs only in
//! its timestamp and the wear accumulation.

use tracing::debug;
use vigil_common::analysis::{AnalysisDetails, AnalysisResult};
use vigil_common::config::AnalyticsConfig;
use vigil_common::telemetry::AggregatedSummary;

use crate::anomaly::AnomalyDetector;
use crate::now_millis;
use crate::recommend::generate_recommendations;
use crate::wear::WearPredictor;

/// Runs the full analytics pass for one device summary.
#[derive(Debug)]
pub struct AnalysisEngine {
    detector: AnomalyDetector,
    wear: WearPredictor,
}

impl AnalysisEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            detector: AnomalyDetector::new(config.z_threshold),
            wear: WearPredictor::new(config.nominal_lifetime_hours),
        }
    }

    /// Analyze one summary and fold it into the device baselines.
    pub fn analyze(&self, summary: &AggregatedSummary) -> AnalysisResult {
        let current = self.detector.detect_current(summary);
        let vibration = self.detector.detect_vibration(summary);
        let temperature = self.detector.detect_temperature(summary);

        let mut descriptions: Vec<&str> = Vec::new();
        let mut max_score: f64 = 0.0;
        let mut min_confidence: f64 = 1.0;
        for verdict in [&current, &vibration, &temperature] {
            if verdict.is_anomaly {
                descriptions.push(&verdict.description);
                max_score = max_score.max(verdict.score);
                min_confidence = min_confidence.min(verdict.confidence);
            }
        }

        let anomaly_detected = !descriptions.is_empty();
        let anomaly_description = if anomaly_detected {
            descriptions.join("; ")
        } else {
            "No anomalies detected".to_string()
        };

        let wear = self.wear.predict(summary);
        let overall_confidence = (min_confidence + wear.confidence) / 2.0;

        let recommendations = generate_recommendations(summary, max_score, wear.wear_level);

        let result = AnalysisResult {
            timestamp: now_millis(),
            device_id: summary.device_id.clone(),
            anomaly_detected,
            anomaly_score: max_score,
            anomaly_description,
            predicted_wear_level: wear.wear_level,
            estimated_remaining_hours: wear.estimated_remaining_hours,
            recommendations,
            confidence: overall_confidence,
            analysis_details: AnalysisDetails {
                current_anomaly: current.score,
                vibration_anomaly: vibration.score,
                temperature_anomaly: temperature.score,
                wear_factors: wear.contributing_factors,
                samples_analyzed: summary.sample_count,
                time_window_seconds: summary.window_seconds(),
            },
        };

        // Fold the summary in last: this tick compared against the
        // baseline as it stood before.
        self.detector.update_baseline(summary);

        debug!(
            device_id = %result.device_id,
            anomaly = result.anomaly_detected,
            score = result.anomaly_score,
            wear = result.predicted_wear_level,
            "analysis complete"
        );

        result
    }

    /// Zero the accumulated wear for a device.
    pub fn reset_wear(&self, device_id: &str) {
        self.wear.reset(device_id);
    }

    /// Accumulated stress-weighted hours for a device.
    pub fn accumulated_wear_hours(&self, device_id: &str) -> f64 {
        self.wear.accumulated_hours(device_id)
    }
}
