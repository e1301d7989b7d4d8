//! TTL caching for the HMI read paths.
//!
//! Four independent caches with fixed TTLs keep the hot endpoints off the
//! aggregator: device list (5 s), device data (1 s), AI analysis (10 s),
//! system status (2 s). A read that misses returns `None` and never
//! triggers recomputation here; the query layer decides whether to rebuild.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;
use vigil_common::analysis::AnalysisResult;
use vigil_common::config::CacheConfig;

use crate::query::{DeviceData, SystemStatus};

/// A single-TTL cache with expiry on read.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, (Instant, V)>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// The cached value, unless it is absent or has outlived the TTL.
    /// Expired entries are removed on the way out.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some((written, _)) => written.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(_, value)| value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().insert(key, (Instant::now(), value));
    }

    pub fn remove(&self, key: &K) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Keep only entries whose key satisfies the predicate.
    pub fn retain_keys(&self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.lock().retain(|k, _| keep(k));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Cache hit/miss statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub hit_rate_percent: f64,
    pub device_list_entries: usize,
    pub device_data_entries: usize,
    pub ai_analysis_entries: usize,
    pub system_status_entries: usize,
}

/// The four HMI read caches with shared hit/miss accounting.
#[derive(Debug)]
pub struct AnalysisCache {
    device_list: TtlCache<(), Vec<String>>,
    device_data: TtlCache<(String, usize), DeviceData>,
    ai_analysis: TtlCache<String, AnalysisResult>,
    system_status: TtlCache<(), SystemStatus>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AnalysisCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            device_list: TtlCache::new(Duration::from_secs(config.device_list_ttl_seconds)),
            device_data: TtlCache::new(Duration::from_secs(config.device_data_ttl_seconds)),
            ai_analysis: TtlCache::new(Duration::from_secs(config.ai_analysis_ttl_seconds)),
            system_status: TtlCache::new(Duration::from_secs(config.system_status_ttl_seconds)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Build with explicit TTLs (short ones keep the expiry tests fast).
    pub fn with_ttls(device_list: Duration, device_data: Duration, ai: Duration, status: Duration) -> Self {
        Self {
            device_list: TtlCache::new(device_list),
            device_data: TtlCache::new(device_data),
            ai_analysis: TtlCache::new(ai),
            system_status: TtlCache::new(status),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn device_list(&self) -> Option<Vec<String>> {
        let value = self.device_list.get(&());
        self.record(value.is_some());
        value
    }

    pub fn set_device_list(&self, devices: Vec<String>) {
        self.device_list.insert((), devices);
    }

    pub fn device_data(&self, device_id: &str, count: usize) -> Option<DeviceData> {
        let value = self.device_data.get(&(device_id.to_string(), count));
        self.record(value.is_some());
        value
    }

    pub fn set_device_data(&self, device_id: &str, count: usize, data: DeviceData) {
        self.device_data.insert((device_id.to_string(), count), data);
    }

    pub fn ai_analysis(&self, device_id: &str) -> Option<AnalysisResult> {
        let value = self.ai_analysis.get(&device_id.to_string());
        self.record(value.is_some());
        value
    }

    pub fn set_ai_analysis(&self, device_id: &str, analysis: AnalysisResult) {
        self.ai_analysis.insert(device_id.to_string(), analysis);
    }

    pub fn system_status(&self) -> Option<SystemStatus> {
        let value = self.system_status.get(&());
        self.record(value.is_some());
        value
    }

    pub fn set_system_status(&self, status: SystemStatus) {
        self.system_status.insert((), status);
    }

    /// Drop every cached entry for a device across the device-data and AI
    /// kinds. Called when fresh telemetry arrives.
    pub fn invalidate_device(&self, device_id: &str) {
        self.device_data.retain_keys(|(id, _)| id != device_id);
        self.ai_analysis.remove(&device_id.to_string());
        debug!(device_id, "cache invalidated");
    }

    pub fn clear_all(&self) {
        self.device_list.clear();
        self.device_data.clear();
        self.ai_analysis.clear();
        self.system_status.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            total_requests: total,
            hit_rate_percent: hit_rate,
            device_list_entries: self.device_list.len(),
            device_data_entries: self.device_data.len(),
            ai_analysis_entries: self.ai_analysis.len(),
            system_status_entries: self.system_status.len(),
        }
    }
}
