//! Rule-based operating recommendations.
//!
//! A pure mapping from one summary plus the current anomaly score and wear
//! level to an ordered, duplicate-free list of advisory strings. No hidden
//! state; identical inputs always produce identical output.

use vigil_common::telemetry::AggregatedSummary;

/// Generate advisory recommendations for one device.
///
/// Always returns at least one entry; when no rule fires, a single
/// "continue normal operation" note is emitted.
pub fn generate_recommendations(
    summary: &AggregatedSummary,
    anomaly_score: f64,
    wear_level: f64,
) -> Vec<String> {
    let mut recommendations: Vec<String> = Vec::new();
    let mut push = |text: &str| {
        if !recommendations.iter().any(|r| r == text) {
            recommendations.push(text.to_string());
        }
    };

    let avg_current = mean(&summary.current_mean);
    let max_current = max(&summary.current_max);

    // Current draw.
    if avg_current > 6.0 {
        push("Consider reducing load or operating speed to decrease current consumption");
    }
    if summary.current_mean.len() > 1 {
        let spread = max(&summary.current_mean) - min(&summary.current_mean);
        if spread > 1.5 {
            push("Current imbalance detected - check for mechanical binding or motor issues");
        }
    }
    if avg_current > 3.0 && avg_current < 5.0 {
        push("System operating in optimal current range - maintain current settings");
    }
    if max_current > avg_current * 1.5 {
        push("Frequent current spikes detected - consider smoother acceleration profiles");
    }

    // Vibration.
    let vib_magnitude = summary.vibration_mean.magnitude as f64;
    if vib_magnitude > 5.0 {
        push("High vibration levels - schedule maintenance check for bearings and alignment");
    } else if vib_magnitude > 3.0 {
        push("Elevated vibration - consider re-balancing rotating components");
    }

    let axes = [
        summary.vibration_mean.x.abs() as f64,
        summary.vibration_mean.y.abs() as f64,
        summary.vibration_mean.z.abs() as f64,
    ];
    let largest = axes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let smallest = axes.iter().cloned().fold(f64::INFINITY, f64::min);
    if largest > 2.0 * smallest {
        let dominant = ["X", "Y", "Z"][axes
            .iter()
            .position(|&a| a == largest)
            .unwrap_or(0)];
        push(&format!(
            "Dominant {dominant}-axis vibration suggests alignment issue in that direction"
        ));
    }

    // Temperature.
    let max_temp = max(&summary.temperature_max);
    if max_temp > 60.0 {
        push("High operating temperature - improve cooling or reduce duty cycle");
    } else if max_temp > 50.0 {
        push("Monitor temperature trends - ensure adequate ventilation");
    }
    let avg_temp = mean(&summary.temperature_mean);
    if max_temp - avg_temp > 15.0 {
        push("Large temperature variations - consider thermal management improvements");
    }

    // Wear.
    if wear_level > 0.8 {
        push("URGENT: High wear level detected - schedule preventive maintenance immediately");
    } else if wear_level > 0.6 {
        push("Moderate wear level - plan maintenance within next service window");
    } else if wear_level > 0.4 {
        push("Wear accumulation progressing normally - continue monitoring");
    }

    // Anomaly severity.
    if anomaly_score > 0.7 {
        push("Significant anomaly detected - investigate system conditions promptly");
    } else if anomaly_score > 0.5 {
        push("Minor anomaly detected - review recent operational changes");
    }

    // All-clear note.
    if summary.sample_count > 0 && anomaly_score < 0.3 && wear_level < 0.4 && vib_magnitude < 3.0 {
        push("System operating within normal parameters - no immediate action required");
    }

    // Energy efficiency.
    if avg_current > 5.0 && avg_temp > 45.0 {
        push("Consider optimizing operating parameters for better energy efficiency");
    }

    if recommendations.is_empty() {
        recommendations
            .push("Insufficient data for specific recommendations - continue normal operation".to_string());
    }

    recommendations
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

fn min(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|&v| v as f64)
        .fold(f64::INFINITY, f64::min)
}
