//! Windowed aggregation of sensor readings.
//!
//! Readings are admitted unconditionally into the device ring; the sliding
//! window applies at aggregation time. Summaries are computed column-wise
//! over dense float32 matrices: mean, population standard deviation
//! (divisor N), and max per channel.

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use vigil_common::telemetry::{
    AggregatedSummary, SafetyStatus, SensorReading, VibrationStats,
};

use crate::error::{TelemetryError, TelemetryResult};
use crate::now_seconds;
use crate::ring::RingBufferStore;
use crate::safety::SafetyRegistry;

/// Vibration matrix columns: x, y, z, magnitude.
const VIB_COLUMNS: usize = 4;

/// Admits readings and produces windowed statistical summaries.
///
/// Owns the ring buffer store; safety statuses are delegated to the shared
/// [`SafetyRegistry`] so the command gate sees the same authority.
#[derive(Debug)]
pub struct DataAggregator {
    store: RingBufferStore,
    safety: Arc<SafetyRegistry>,
    window_seconds: u64,
}

impl DataAggregator {
    pub fn new(window_seconds: u64, max_points: usize, safety: Arc<SafetyRegistry>) -> Self {
        Self {
            store: RingBufferStore::new(max_points, window_seconds),
            safety,
            window_seconds,
        }
    }

    /// Admit a reading into the device's ring (arrival order).
    pub fn add_reading(&self, reading: SensorReading) {
        self.store.append(reading);
    }

    /// [`add_reading`](Self::add_reading) with an explicit "now" [s].
    pub fn add_reading_at(&self, reading: SensorReading, now: f64) {
        self.store.append_at(reading, now);
    }

    /// Record the latest safety status for a device.
    pub fn update_safety(&self, status: SafetyStatus) {
        self.safety.update(status);
    }

    /// Most recent safety status for a device.
    pub fn latest_safety(&self, device_id: &str) -> Option<SafetyStatus> {
        self.safety.latest(device_id)
    }

    /// System-wide safe predicate (false while no device has reported).
    pub fn system_safe(&self) -> bool {
        self.safety.system_safe()
    }

    /// Summarize the device's readings inside the sliding window.
    ///
    /// `window_seconds` overrides the configured window when given.
    /// Returns `Ok(None)` for unknown devices and for windows with no
    /// readings; both are ordinary absence, not errors.
    pub fn aggregate(
        &self,
        device_id: &str,
        window_seconds: Option<u64>,
    ) -> TelemetryResult<Option<AggregatedSummary>> {
        self.aggregate_at(device_id, window_seconds, now_seconds())
    }

    /// [`aggregate`](Self::aggregate) with an explicit "now" [s since epoch].
    pub fn aggregate_at(
        &self,
        device_id: &str,
        window_seconds: Option<u64>,
        now: f64,
    ) -> TelemetryResult<Option<AggregatedSummary>> {
        let Some(buffered) = self.store.snapshot(device_id) else {
            return Ok(None);
        };

        let window = window_seconds.unwrap_or(self.window_seconds) as f64;
        let cutoff = now - window;
        let recent: Vec<&SensorReading> = buffered
            .iter()
            .filter(|r| r.timestamp_seconds() >= cutoff)
            .collect();

        if recent.is_empty() {
            return Ok(None);
        }

        summarize(device_id, &recent).map(Some)
    }

    /// The most recent `count` readings for a device, oldest first.
    pub fn recent_readings(&self, device_id: &str, count: usize) -> Vec<SensorReading> {
        self.store.recent(device_id, count)
    }

    /// All device ids known to the ring store, sorted.
    pub fn device_ids(&self) -> Vec<String> {
        self.store.device_ids()
    }

    /// Number of buffered readings for a device.
    pub fn buffered(&self, device_id: &str) -> usize {
        self.store.len(device_id)
    }
}

/// Column-wise summarization over dense float32 matrices.
///
/// Channel counts are fixed by the first reading in the window; any
/// divergence inside the window fails fast.
fn summarize(device_id: &str, readings: &[&SensorReading]) -> TelemetryResult<AggregatedSummary> {
    let n = readings.len();
    let k_curr = readings[0].motor_currents.len();
    let k_temp = readings[0].temperatures.len();

    let mut currents = Array2::<f32>::zeros((n, k_curr));
    let mut vibrations = Array2::<f32>::zeros((n, VIB_COLUMNS));
    let mut temperatures = Array2::<f32>::zeros((n, k_temp));

    for (i, r) in readings.iter().enumerate() {
        if r.motor_currents.len() != k_curr {
            return Err(TelemetryError::ShapeMismatch {
                device_id: device_id.to_string(),
                channel: "motor_currents",
                expected: k_curr,
                found: r.motor_currents.len(),
            });
        }
        if r.temperatures.len() != k_temp {
            return Err(TelemetryError::ShapeMismatch {
                device_id: device_id.to_string(),
                channel: "temperatures",
                expected: k_temp,
                found: r.temperatures.len(),
            });
        }

        currents
            .row_mut(i)
            .assign(&ArrayView1::from(&r.motor_currents[..]));
        vibrations.row_mut(i).assign(&ArrayView1::from(&[
            r.vibration.x,
            r.vibration.y,
            r.vibration.z,
            r.vibration.magnitude,
        ][..]));
        temperatures
            .row_mut(i)
            .assign(&ArrayView1::from(&r.temperatures[..]));
    }

    let current_mean = currents.sum_axis(Axis(0)) / n as f32;
    let current_std = currents.std_axis(Axis(0), 0.0);
    let current_max = col_max(&currents);

    let vib_mean = vibrations.sum_axis(Axis(0)) / n as f32;
    let vib_std = vibrations.std_axis(Axis(0), 0.0);
    let vib_max = col_max(&vibrations);

    let temperature_mean = temperatures.sum_axis(Axis(0)) / n as f32;
    let temperature_std = temperatures.std_axis(Axis(0), 0.0);
    let temperature_max = col_max(&temperatures);

    Ok(AggregatedSummary {
        device_id: device_id.to_string(),
        time_window_start: readings[0].timestamp_seconds(),
        time_window_end: readings[n - 1].timestamp_seconds(),
        current_mean: current_mean.to_vec(),
        current_std: current_std.to_vec(),
        current_max: current_max.to_vec(),
        vibration_mean: vib_stats(&vib_mean),
        vibration_std: vib_stats(&vib_std),
        vibration_max: vib_stats(&vib_max),
        temperature_mean: temperature_mean.to_vec(),
        temperature_std: temperature_std.to_vec(),
        temperature_max: temperature_max.to_vec(),
        sample_count: n,
    })
}

fn col_max(matrix: &Array2<f32>) -> Array1<f32> {
    matrix.fold_axis(Axis(0), f32::NEG_INFINITY, |acc, &x| acc.max(x))
}

fn vib_stats(column: &Array1<f32>) -> VibrationStats {
    VibrationStats {
        x: column[0],
        y: column[1],
        z: column[2],
        magnitude: column[3],
    }
}
