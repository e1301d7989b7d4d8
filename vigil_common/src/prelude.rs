//! Common re-exports for VIGIL crates.

pub use crate::analysis::{
    AnalysisDetails, AnalysisResult, AnomalyVerdict, CommandFrame, ControlCommand, WearPrediction,
};
pub use crate::codec::{CodecError, CodecResult, DecodeStats};
pub use crate::config::{ConfigError, ConfigLoader, VigilConfig};
pub use crate::telemetry::{
    AggregatedSummary, SafetyStatus, SensorReading, VibrationSample, VibrationStats,
};
