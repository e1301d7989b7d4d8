//! Boundary codec for the bus.
//!
//! The only authoritative encoder/decoder for the wire schema. Ingress
//! payloads are JSON objects; unknown fields are ignored, structurally
//! invalid payloads are rejected with a [`CodecError`] and counted by the
//! caller via [`DecodeStats`]. Decoding never panics on malformed input.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::analysis::{AnalysisResult, CommandFrame};
use crate::telemetry::{SafetyStatus, SensorReading};

/// Errors produced while decoding or encoding bus payloads.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Payload is not valid JSON or misses required fields.
    #[error("malformed payload: {source}")]
    Malformed {
        /// Source JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A channel sequence arrived empty.
    #[error("empty channel sequence '{channel}' from device {device_id}")]
    EmptyChannel {
        /// Offending device.
        device_id: String,
        /// Channel family name.
        channel: &'static str,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Decode success/failure counters, shared with the ingest loop.
#[derive(Debug, Default)]
pub struct DecodeStats {
    sensor_ok: AtomicU64,
    sensor_err: AtomicU64,
    safety_ok: AtomicU64,
    safety_err: AtomicU64,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sensor(&self, ok: bool) {
        let counter = if ok { &self.sensor_ok } else { &self.sensor_err };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_safety(&self, ok: bool) {
        let counter = if ok { &self.safety_ok } else { &self.safety_err };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// (decoded, dropped) counts for sensor payloads.
    pub fn sensor_counts(&self) -> (u64, u64) {
        (
            self.sensor_ok.load(Ordering::Relaxed),
            self.sensor_err.load(Ordering::Relaxed),
        )
    }

    /// (decoded, dropped) counts for safety payloads.
    pub fn safety_counts(&self) -> (u64, u64) {
        (
            self.safety_ok.load(Ordering::Relaxed),
            self.safety_err.load(Ordering::Relaxed),
        )
    }
}

/// Decode a sensor reading from an ingress payload.
///
/// Rejects readings whose current or temperature sequences are empty; the
/// pipeline assumes schema-stable devices with at least one channel each.
pub fn decode_sensor_reading(payload: &[u8]) -> CodecResult<SensorReading> {
    let reading: SensorReading = serde_json::from_slice(payload)?;
    if reading.motor_currents.is_empty() {
        return Err(CodecError::EmptyChannel {
            device_id: reading.device_id,
            channel: "motor_currents",
        });
    }
    if reading.temperatures.is_empty() {
        return Err(CodecError::EmptyChannel {
            device_id: reading.device_id,
            channel: "temperatures",
        });
    }
    Ok(reading)
}

/// Decode a safety status from an ingress payload.
pub fn decode_safety_status(payload: &[u8]) -> CodecResult<SafetyStatus> {
    Ok(serde_json::from_slice(payload)?)
}

/// Encode an analysis result for the egress channel.
pub fn encode_analysis(result: &AnalysisResult) -> CodecResult<String> {
    Ok(serde_json::to_string(result)?)
}

/// Encode a sensor reading (round-trip partner of [`decode_sensor_reading`]).
pub fn encode_sensor_reading(reading: &SensorReading) -> CodecResult<String> {
    Ok(serde_json::to_string(reading)?)
}

/// Encode an accepted command for the egress channel.
pub fn encode_command(frame: &CommandFrame) -> CodecResult<String> {
    Ok(serde_json::to_string(frame)?)
}
