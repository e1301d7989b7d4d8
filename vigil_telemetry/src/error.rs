//! Error types for telemetry storage and aggregation.

use thiserror::Error;

/// Errors that can occur while summarizing a device window.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A reading inside the window has a different channel count than the
    /// first accepted reading. Devices are schema-stable; this is a device
    /// fault, not a recoverable condition.
    #[error(
        "channel shape mismatch for device {device_id}: {channel} expected {expected}, found {found}"
    )]
    ShapeMismatch {
        /// Offending device.
        device_id: String,
        /// Channel family name.
        channel: &'static str,
        /// Length established by the first reading in the window.
        expected: usize,
        /// Length actually found.
        found: usize,
    },
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
