//! Bounded per-device reading storage.
//!
//! One `VecDeque` ring per device, capacity `max_points`, behind a coarse
//! per-device mutex. Appends evict the oldest reading when full; a
//! retention sweep after each append drops readings older than ten
//! aggregation windows.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use vigil_common::telemetry::SensorReading;

use crate::now_seconds;

/// How many aggregation windows of history the sweep keeps.
const RETENTION_WINDOWS: f64 = 10.0;

type DeviceRing = Arc<Mutex<VecDeque<SensorReading>>>;

/// Mapping from device id to its bounded, time-ordered reading ring.
///
/// The outer map lock is only held to locate or create a ring; all reading
/// traffic goes through the per-device mutex.
#[derive(Debug)]
pub struct RingBufferStore {
    devices: RwLock<HashMap<String, DeviceRing>>,
    max_points: usize,
    retention_seconds: f64,
}

impl RingBufferStore {
    /// Create a store with the given per-device capacity and aggregation
    /// window (the sweep retains `10 × window_seconds` of history).
    pub fn new(max_points: usize, window_seconds: u64) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            max_points,
            retention_seconds: RETENTION_WINDOWS * window_seconds as f64,
        }
    }

    /// Append a reading in arrival order, evicting the oldest when full,
    /// then sweep out readings past the retention horizon.
    pub fn append(&self, reading: SensorReading) {
        self.append_at(reading, now_seconds());
    }

    /// [`append`](Self::append) with an explicit "now" [s since epoch].
    pub fn append_at(&self, reading: SensorReading, now: f64) {
        let ring = self.ring_for(&reading.device_id);
        let mut buf = ring.lock();

        if buf.len() == self.max_points {
            buf.pop_front();
        }
        buf.push_back(reading);

        let horizon = now - self.retention_seconds;
        while buf
            .front()
            .is_some_and(|r| r.timestamp_seconds() < horizon)
        {
            buf.pop_front();
        }
    }

    /// Consistent snapshot of a device's ring, oldest first.
    ///
    /// Returns `None` for a device never seen.
    pub fn snapshot(&self, device_id: &str) -> Option<Vec<SensorReading>> {
        let ring = self.devices.read().get(device_id).cloned()?;
        let buf = ring.lock();
        Some(buf.iter().cloned().collect())
    }

    /// The most recent `count` readings for a device, oldest first.
    pub fn recent(&self, device_id: &str, count: usize) -> Vec<SensorReading> {
        let Some(ring) = self.devices.read().get(device_id).cloned() else {
            return Vec::new();
        };
        let buf = ring.lock();
        let skip = buf.len().saturating_sub(count);
        buf.iter().skip(skip).cloned().collect()
    }

    /// All known device ids, sorted.
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of buffered readings for a device (0 if never seen).
    pub fn len(&self, device_id: &str) -> usize {
        self.devices
            .read()
            .get(device_id)
            .map(|ring| ring.lock().len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, device_id: &str) -> bool {
        self.len(device_id) == 0
    }

    fn ring_for(&self, device_id: &str) -> DeviceRing {
        if let Some(ring) = self.devices.read().get(device_id) {
            return Arc::clone(ring);
        }
        let mut map = self.devices.write();
        Arc::clone(
            map.entry(device_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::with_capacity(16)))),
        )
    }
}
