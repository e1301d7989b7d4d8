//! # VIGIL Analytics
//!
//! The periodic analytics pass over aggregated telemetry: statistical
//! anomaly detection with adaptive per-device baselines, cumulative wear
//! prediction, and rule-based recommendations, combined per device by
//! [`engine::AnalysisEngine`].
//!
//! All analyzers are advisory. Safety-critical decisions stay in the
//! safety registry and command gate; nothing here actuates anything.
//!
//! State (baselines, accumulated wear) lives in memory only and is cleared
//! by process restart.

pub mod anomaly;
pub mod baseline;
pub mod engine;
pub mod recommend;
pub mod wear;

pub use anomaly::AnomalyDetector;
pub use engine::AnalysisEngine;
pub use wear::WearPredictor;

/// Wall time in milliseconds since epoch.
#[inline]
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
