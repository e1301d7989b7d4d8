//! Statistical anomaly detection over aggregated summaries.
//!
//! Three independent analyzers (current, vibration, temperature), each
//! combining z-score checks against the adaptive baseline with fixed
//! domain thresholds. Within an analyzer the score is the maximum across
//! triggered rules and findings are "; "-joined.

use vigil_common::analysis::AnomalyVerdict;
use vigil_common::telemetry::AggregatedSummary;

use crate::baseline::{
    BaselineStore, CURRENT_SEED_STD, TEMPERATURE_SEED_STD, VIBRATION_SEED_STD,
};

/// Sensor-trust constants per channel family.
const CURRENT_CONFIDENCE: f64 = 0.85;
const VIBRATION_CONFIDENCE: f64 = 0.80;
const TEMPERATURE_CONFIDENCE: f64 = 0.90;

/// Absolute current ceiling [A].
const CURRENT_SPIKE_LIMIT: f64 = 12.0;
/// Motor-to-motor mean difference that flags an imbalance [A].
const CURRENT_IMBALANCE_LIMIT: f64 = 2.0;
/// Mean vibration magnitude of moderate concern [m/s²].
const VIBRATION_ELEVATED: f64 = 5.0;
/// Peak vibration magnitude of high concern [m/s²].
const VIBRATION_SPIKE: f64 = 10.0;
/// High temperature threshold [°C].
const TEMPERATURE_HIGH: f64 = 70.0;
/// Elevated temperature threshold [°C].
const TEMPERATURE_ELEVATED: f64 = 60.0;
/// Mean shift over baseline that flags a rapid increase [°C].
const TEMPERATURE_RISE_LIMIT: f64 = 10.0;

/// Z-score and threshold-rule detector with per-device baselines.
#[derive(Debug)]
pub struct AnomalyDetector {
    z_threshold: f64,
    baselines: BaselineStore,
}

impl AnomalyDetector {
    pub fn new(z_threshold: f64) -> Self {
        Self {
            z_threshold,
            baselines: BaselineStore::new(),
        }
    }

    /// Score a z-score exceedance into [0, 1].
    fn z_score_severity(&self, z: f64) -> f64 {
        (z / (self.z_threshold * 2.0)).min(1.0)
    }

    /// Detect per-motor current anomalies.
    pub fn detect_current(&self, summary: &AggregatedSummary) -> AnomalyVerdict {
        let mut findings: Vec<String> = Vec::new();
        let mut max_score: f64 = 0.0;
        let device = &summary.device_id;

        for (i, (&mean, &max_val)) in summary
            .current_mean
            .iter()
            .zip(&summary.current_max)
            .enumerate()
        {
            let mean = mean as f64;
            let max_val = max_val as f64;

            // Baseline z-score; std=0 never raises.
            if let Some(b) = self.baselines.get(device, &format!("current_{i}")) {
                if b.std > 0.0 {
                    let z = ((mean - b.mean) / b.std).abs();
                    if z > self.z_threshold {
                        max_score = max_score.max(self.z_score_severity(z));
                        findings.push(format!(
                            "Motor {} current anomaly: {:.2}A (expected {:.2}±{:.2})",
                            i + 1,
                            mean,
                            b.mean,
                            b.std
                        ));
                    }
                }
            }

            if max_val > CURRENT_SPIKE_LIMIT {
                max_score = max_score.max(0.9);
                findings.push(format!("Motor {} current spike: {:.2}A", i + 1, max_val));
            }

            if i > 0 {
                let diff = (mean - summary.current_mean[0] as f64).abs();
                if diff > CURRENT_IMBALANCE_LIMIT {
                    max_score = max_score.max(0.6);
                    findings.push(format!(
                        "Current imbalance detected: {diff:.2}A difference"
                    ));
                }
            }
        }

        verdict(findings, max_score, "Current levels normal", CURRENT_CONFIDENCE)
    }

    /// Detect vibration anomalies.
    pub fn detect_vibration(&self, summary: &AggregatedSummary) -> AnomalyVerdict {
        let mut findings: Vec<String> = Vec::new();
        let mut max_score: f64 = 0.0;

        let magnitude = summary.vibration_mean.magnitude as f64;
        let max_magnitude = summary.vibration_max.magnitude as f64;

        if magnitude > VIBRATION_ELEVATED {
            max_score = max_score.max(0.6);
            findings.push(format!("Elevated vibration: {magnitude:.2} m/s²"));
        }

        if max_magnitude > VIBRATION_SPIKE {
            max_score = max_score.max(0.9);
            findings.push(format!("High vibration spike: {max_magnitude:.2} m/s²"));
        }

        // One axis dominating the others suggests misalignment.
        let axes = [
            summary.vibration_mean.x.abs() as f64,
            summary.vibration_mean.y.abs() as f64,
            summary.vibration_mean.z.abs() as f64,
        ];
        let (dominant, &largest) = axes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap_or((0, &0.0));
        let smallest = axes.iter().cloned().fold(f64::INFINITY, f64::min);
        if largest > 2.0 * smallest {
            max_score = max_score.max(0.5);
            let name = ["X", "Y", "Z"][dominant];
            findings.push(format!("Vibration imbalance on {name} axis"));
        }

        if let Some(b) = self
            .baselines
            .get(&summary.device_id, "vibration_magnitude")
        {
            if b.std > 0.0 {
                let z = ((magnitude - b.mean) / b.std).abs();
                if z > self.z_threshold {
                    max_score = max_score.max(self.z_score_severity(z));
                    findings.push(format!("Vibration pattern anomaly (z-score: {z:.2})"));
                }
            }
        }

        verdict(
            findings,
            max_score,
            "Vibration levels normal",
            VIBRATION_CONFIDENCE,
        )
    }

    /// Detect per-sensor temperature anomalies.
    pub fn detect_temperature(&self, summary: &AggregatedSummary) -> AnomalyVerdict {
        let mut findings: Vec<String> = Vec::new();
        let mut max_score: f64 = 0.0;
        let device = &summary.device_id;

        for (i, (&mean, &max_val)) in summary
            .temperature_mean
            .iter()
            .zip(&summary.temperature_max)
            .enumerate()
        {
            let mean = mean as f64;
            let max_val = max_val as f64;

            if max_val > TEMPERATURE_HIGH {
                max_score = max_score.max(0.8);
                findings.push(format!(
                    "Sensor {} high temperature: {:.1}°C",
                    i + 1,
                    max_val
                ));
            } else if max_val > TEMPERATURE_ELEVATED {
                max_score = max_score.max(0.5);
                findings.push(format!(
                    "Sensor {} elevated temperature: {:.1}°C",
                    i + 1,
                    max_val
                ));
            }

            if let Some(b) = self.baselines.get(device, &format!("temp_{i}")) {
                let rise = mean - b.mean;
                if rise > TEMPERATURE_RISE_LIMIT {
                    max_score = max_score.max(0.7);
                    findings.push(format!(
                        "Sensor {} rapid temperature increase: +{:.1}°C",
                        i + 1,
                        rise
                    ));
                }
            }
        }

        verdict(
            findings,
            max_score,
            "Temperature levels normal",
            TEMPERATURE_CONFIDENCE,
        )
    }

    /// Fold the summary into the device baselines.
    ///
    /// Called after detection for the tick, so detections always compare
    /// against the pre-update baseline.
    pub fn update_baseline(&self, summary: &AggregatedSummary) {
        let device = &summary.device_id;

        for (i, &mean) in summary.current_mean.iter().enumerate() {
            self.baselines.observe(
                device,
                &format!("current_{i}"),
                mean as f64,
                CURRENT_SEED_STD,
            );
        }

        let magnitude = summary.vibration_mean.magnitude as f64;
        if magnitude > 0.0 {
            self.baselines
                .observe(device, "vibration_magnitude", magnitude, VIBRATION_SEED_STD);
        }

        for (i, &mean) in summary.temperature_mean.iter().enumerate() {
            self.baselines.observe(
                device,
                &format!("temp_{i}"),
                mean as f64,
                TEMPERATURE_SEED_STD,
            );
        }
    }

    /// Read access for tests and diagnostics.
    pub fn baseline(&self, device_id: &str, channel: &str) -> Option<crate::baseline::ChannelBaseline> {
        self.baselines.get(device_id, channel)
    }
}

fn verdict(
    findings: Vec<String>,
    max_score: f64,
    normal_text: &str,
    confidence: f64,
) -> AnomalyVerdict {
    if findings.is_empty() {
        AnomalyVerdict::normal(normal_text, confidence)
    } else {
        AnomalyVerdict {
            is_anomaly: true,
            score: max_score,
            description: findings.join("; "),
            confidence,
        }
    }
}
