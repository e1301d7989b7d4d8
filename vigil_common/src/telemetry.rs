//! Telemetry event types shared between the ingest path and the analytics
//! pipeline.
//!
//! `SensorReading` and `SafetyStatus` are immutable events as they arrive
//! from the bus; `AggregatedSummary` is the windowed statistical view the
//! aggregator produces for the analyzers.

use serde::{Deserialize, Serialize};

/// One accelerometer sample, in m/s² per axis plus the combined magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VibrationSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub magnitude: f32,
}

/// Immutable sensor event from one field device.
///
/// Channel vectors carry at least one element; per device, their lengths
/// stay stable after the first accepted reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Milliseconds since epoch.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    /// Field device identifier.
    pub device_id: String,
    /// Per-motor drive current [A], ordered by motor index.
    pub motor_currents: Vec<f32>,
    /// Accelerometer sample [m/s²].
    pub vibration: VibrationSample,
    /// Per-sensor temperature [°C], ordered by sensor index.
    pub temperatures: Vec<f32>,
}

impl SensorReading {
    /// Reading timestamp in seconds since epoch.
    #[inline]
    pub fn timestamp_seconds(&self) -> f64 {
        self.timestamp_ms as f64 / 1000.0
    }
}

/// Immutable safety event from one field device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStatus {
    /// Milliseconds since epoch.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    /// Field device identifier.
    pub device_id: String,
    /// Emergency stop circuit is tripped.
    pub emergency_stop: bool,
    /// Machine door/guard is closed.
    pub door_closed: bool,
    /// Drive overload detected upstream.
    pub overload_detected: bool,
    /// All monitored temperatures within limits.
    pub temperature_ok: bool,
}

impl SafetyStatus {
    /// Returns true when every safety flag permits actuation.
    #[inline]
    pub const fn is_safe(&self) -> bool {
        !self.emergency_stop && self.door_closed && !self.overload_detected && self.temperature_ok
    }
}

/// Column statistics for the vibration matrix, keyed by axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VibrationStats {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub magnitude: f32,
}

/// Windowed statistical summary for one device.
///
/// Vector fields are aligned to the device's channel indices:
/// `current_mean.len() == current_std.len() == current_max.len()` and
/// equals the reading's motor count; same for the temperature vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSummary {
    pub device_id: String,
    /// First accepted reading timestamp [s since epoch].
    pub time_window_start: f64,
    /// Last accepted reading timestamp [s since epoch].
    pub time_window_end: f64,

    pub current_mean: Vec<f32>,
    pub current_std: Vec<f32>,
    pub current_max: Vec<f32>,

    pub vibration_mean: VibrationStats,
    pub vibration_std: VibrationStats,
    pub vibration_max: VibrationStats,

    pub temperature_mean: Vec<f32>,
    pub temperature_std: Vec<f32>,
    pub temperature_max: Vec<f32>,

    /// Number of readings admitted into the window.
    pub sample_count: usize,
}

impl AggregatedSummary {
    /// Window length [s].
    #[inline]
    pub fn window_seconds(&self) -> f64 {
        self.time_window_end - self.time_window_start
    }
}
