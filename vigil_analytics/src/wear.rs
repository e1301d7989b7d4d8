//! Cumulative wear prediction from operating stress.
//!
//! Empirical model: each summary window contributes
//! `(t_end − t_start) / 3600 × wear_factor` hours to the device's
//! accumulated wear, where the wear factor multiplies up under load,
//! vibration, and thermal stress. Window seconds are always converted to
//! hours before the factor is applied.

use std::collections::HashMap;

use parking_lot::Mutex;
use vigil_common::analysis::WearPrediction;
use vigil_common::telemetry::AggregatedSummary;

/// Mean current above which load accelerates wear [A].
const LOAD_CURRENT_LIMIT: f64 = 5.0;
/// Peak current above which spikes accelerate wear [A].
const SPIKE_CURRENT_LIMIT: f64 = 8.0;
/// Mean vibration magnitude above which wear accelerates [m/s²].
const VIBRATION_LIMIT: f64 = 3.0;
/// Vibration magnitude variability that suggests misalignment [m/s²].
const VIBRATION_STD_LIMIT: f64 = 1.0;
/// Peak temperature above which thermal stress accelerates wear [°C].
const TEMPERATURE_LIMIT: f64 = 50.0;
/// Max-to-mean temperature spread that indicates cycling fatigue [°C].
const TEMPERATURE_RANGE_LIMIT: f64 = 15.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Per-device cumulative wear state and predictor.
#[derive(Debug)]
pub struct WearPredictor {
    nominal_lifetime_hours: f64,
    accumulated: Mutex<HashMap<String, f64>>,
}

impl WearPredictor {
    pub fn new(nominal_lifetime_hours: f64) -> Self {
        Self {
            nominal_lifetime_hours,
            accumulated: Mutex::new(HashMap::new()),
        }
    }

    /// Accumulate the window's stress-weighted operating time and predict
    /// the device's wear level and remaining lifetime.
    pub fn predict(&self, summary: &AggregatedSummary) -> WearPrediction {
        let mut factors: Vec<String> = Vec::new();
        let mut wear_factor = 1.0_f64;

        // Current load.
        let avg_current = mean(&summary.current_mean);
        let max_current = max(&summary.current_max);

        if avg_current > LOAD_CURRENT_LIMIT {
            wear_factor *= (avg_current / LOAD_CURRENT_LIMIT).powf(1.5);
            factors.push(format!("High load operation ({avg_current:.1}A)"));
        }
        if max_current > SPIKE_CURRENT_LIMIT {
            wear_factor *= 1.1 + (max_current - SPIKE_CURRENT_LIMIT) * 0.05;
            factors.push(format!("Current spikes ({max_current:.1}A)"));
        }

        // Vibration stress.
        let vib_magnitude = summary.vibration_mean.magnitude as f64;
        if vib_magnitude > VIBRATION_LIMIT {
            wear_factor *= 1.0 + (vib_magnitude - VIBRATION_LIMIT) * 0.15;
            factors.push(format!("Elevated vibration ({vib_magnitude:.2} m/s²)"));
        }
        if summary.vibration_std.magnitude as f64 > VIBRATION_STD_LIMIT {
            wear_factor *= 1.15;
            factors.push("Vibration variability (possible misalignment)".to_string());
        }

        // Thermal stress.
        let max_temp = max(&summary.temperature_max);
        if max_temp > TEMPERATURE_LIMIT {
            wear_factor *= 1.0 + (max_temp - TEMPERATURE_LIMIT) * 0.02;
            factors.push(format!("Elevated temperature ({max_temp:.1}°C)"));
        }
        let avg_temp = mean(&summary.temperature_mean);
        if max_temp - avg_temp > TEMPERATURE_RANGE_LIMIT {
            wear_factor *= 1.1;
            factors.push("Temperature cycling".to_string());
        }

        // Window seconds become hours before the factor applies.
        let window_hours = summary.window_seconds() / SECONDS_PER_HOUR;
        let increment = window_hours * wear_factor;

        let accumulated = {
            let mut map = self.accumulated.lock();
            let entry = map.entry(summary.device_id.clone()).or_insert(0.0);
            *entry += increment;
            *entry
        };

        let wear_level = (accumulated / self.nominal_lifetime_hours).min(1.0);
        let remaining_nominal = (self.nominal_lifetime_hours - accumulated).max(0.0);
        let estimated_remaining_hours = (remaining_nominal / wear_factor).floor() as i64;

        if wear_level > 0.7 {
            factors.push(format!("High accumulated wear ({:.1}%)", wear_level * 100.0));
        } else if wear_level > 0.5 {
            factors.push(format!(
                "Moderate accumulated wear ({:.1}%)",
                wear_level * 100.0
            ));
        }

        if factors.is_empty() {
            factors.push("Normal operating conditions".to_string());
        }

        // Uncertainty grows with wear.
        let confidence = 0.75 - wear_level * 0.2;

        WearPrediction {
            wear_level,
            estimated_remaining_hours,
            contributing_factors: factors,
            confidence,
        }
    }

    /// Zero the accumulated wear for a device (after maintenance).
    pub fn reset(&self, device_id: &str) {
        if let Some(entry) = self.accumulated.lock().get_mut(device_id) {
            *entry = 0.0;
        }
    }

    /// Accumulated stress-weighted hours for a device.
    pub fn accumulated_hours(&self, device_id: &str) -> f64 {
        self.accumulated
            .lock()
            .get(device_id)
            .copied()
            .unwrap_or(0.0)
    }
}

fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

fn max(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|&v| v as f64)
        .fold(f64::NEG_INFINITY, f64::max)
}
