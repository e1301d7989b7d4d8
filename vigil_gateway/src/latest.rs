//! Latest analysis result per device.
//!
//! The TTL cache bounds staleness for hot readers; this store answers
//! "latest or absent" after the TTL has lapsed between orchestrator ticks.
//! Cleared only by process restart.

use std::collections::HashMap;

use parking_lot::RwLock;
use vigil_common::analysis::AnalysisResult;

/// Latest [`AnalysisResult`] per device.
#[derive(Debug, Default)]
pub struct LatestAnalysisStore {
    results: RwLock<HashMap<String, AnalysisResult>>,
}

impl LatestAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, result: AnalysisResult) {
        self.results
            .write()
            .insert(result.device_id.clone(), result);
    }

    pub fn get(&self, device_id: &str) -> Option<AnalysisResult> {
        self.results.read().get(device_id).cloned()
    }

    /// Timestamp of the most recent stored result [ms], if any.
    pub fn last_analysis_millis(&self) -> Option<i64> {
        self.results.read().values().map(|r| r.timestamp).max()
    }

    /// Number of devices with at least one analysis.
    pub fn device_count(&self) -> usize {
        self.results.read().len()
    }
}
