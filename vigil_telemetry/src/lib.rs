//! # VIGIL Telemetry
//!
//! Bounded per-device storage and windowed summarization of sensor
//! telemetry, plus the authoritative safety registry.
//!
//! ## Components
//!
//! - [`ring::RingBufferStore`] - time-ordered, capacity-bounded reading
//!   storage, one ring per device behind a coarse per-device lock
//! - [`aggregator::DataAggregator`] - admission and windowed float32
//!   statistics for the analytics pipeline
//! - [`safety::SafetyRegistry`] - latest safety status per device and the
//!   system-wide safe predicate
//!
//! Readers and writers interleave freely; every read observes a consistent
//! snapshot of a ring. Nothing in this crate persists across restarts.

pub mod aggregator;
pub mod error;
pub mod ring;
pub mod safety;

pub use aggregator::DataAggregator;
pub use error::{TelemetryError, TelemetryResult};
pub use ring::RingBufferStore;
pub use safety::SafetyRegistry;

/// Wall time in seconds since epoch.
#[inline]
pub(crate) fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
