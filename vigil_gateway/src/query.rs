//! HMI query operations.
//!
//! The external REST binding calls into these; every read goes through the
//! TTL cache first and rebuilds from the aggregator or the latest store on
//! a miss. Absence is `None`, distinguishable from any error the binding
//! might add on top.

use std::sync::Arc;

use serde::Serialize;
use vigil_common::analysis::AnalysisResult;
use vigil_common::telemetry::{SafetyStatus, SensorReading};
use vigil_telemetry::DataAggregator;

use crate::cache::AnalysisCache;
use crate::latest::LatestAnalysisStore;

/// Default reading count for device-data queries.
const DEFAULT_READING_COUNT: usize = 100;

/// Recent readings plus the latest safety status for one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceData {
    pub device_id: String,
    pub readings: Vec<SensorReading>,
    pub safety: Option<SafetyStatus>,
}

/// Dashboard status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub is_safe: bool,
    pub devices_online: Vec<String>,
    /// Timestamp of the newest analysis [ms], absent before the first tick.
    pub last_analysis: Option<i64>,
}

/// Read-side operations backed by the cache, aggregator, and latest store.
#[derive(Debug)]
pub struct GatewayQuery {
    aggregator: Arc<DataAggregator>,
    cache: Arc<AnalysisCache>,
    latest: Arc<LatestAnalysisStore>,
}

impl GatewayQuery {
    pub fn new(
        aggregator: Arc<DataAggregator>,
        cache: Arc<AnalysisCache>,
        latest: Arc<LatestAnalysisStore>,
    ) -> Self {
        Self {
            aggregator,
            cache,
            latest,
        }
    }

    /// Ordered list of known device ids.
    pub fn devices(&self) -> Vec<String> {
        if let Some(devices) = self.cache.device_list() {
            return devices;
        }
        let devices = self.aggregator.device_ids();
        self.cache.set_device_list(devices.clone());
        devices
    }

    /// Last `count` readings and latest safety for a device; absent for a
    /// device with no buffered readings.
    pub fn device_data(&self, device_id: &str, count: Option<usize>) -> Option<DeviceData> {
        let count = count.unwrap_or(DEFAULT_READING_COUNT);
        if let Some(data) = self.cache.device_data(device_id, count) {
            return Some(data);
        }

        let readings = self.aggregator.recent_readings(device_id, count);
        if readings.is_empty() {
            return None;
        }
        let data = DeviceData {
            device_id: device_id.to_string(),
            readings,
            safety: self.aggregator.latest_safety(device_id),
        };
        self.cache.set_device_data(device_id, count, data.clone());
        Some(data)
    }

    /// Latest analysis for a device, or absent before its first tick.
    pub fn ai_analysis(&self, device_id: &str) -> Option<AnalysisResult> {
        if let Some(result) = self.cache.ai_analysis(device_id) {
            return Some(result);
        }
        let result = self.latest.get(device_id)?;
        self.cache.set_ai_analysis(device_id, result.clone());
        Some(result)
    }

    /// Dashboard snapshot of safety and device presence.
    pub fn system_status(&self) -> SystemStatus {
        if let Some(status) = self.cache.system_status() {
            return status;
        }
        let status = SystemStatus {
            is_safe: self.aggregator.system_safe(),
            devices_online: self.aggregator.device_ids(),
            last_analysis: self.latest.last_analysis_millis(),
        };
        self.cache.set_system_status(status.clone());
        status
    }

    /// Store a freshly computed analysis on both read paths. Called by the
    /// orchestrator once per device per tick.
    pub fn record_analysis(&self, result: AnalysisResult) {
        self.cache
            .set_ai_analysis(&result.device_id, result.clone());
        self.latest.insert(result);
    }

    /// Drop cached reads for a device after fresh telemetry arrived.
    pub fn invalidate_device(&self, device_id: &str) {
        self.cache.invalidate_device(device_id);
    }
}
