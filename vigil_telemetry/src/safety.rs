//! Safety registry: latest safety status per device.
//!
//! Decisions derived from this registry are authoritative for the command
//! gate. An empty registry means no field node has reported in yet and is
//! treated as unsafe.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::warn;
use vigil_common::telemetry::SafetyStatus;

/// Tracks the most recent [`SafetyStatus`] per device.
#[derive(Debug, Default)]
pub struct SafetyRegistry {
    latest: RwLock<HashMap<String, SafetyStatus>>,
}

impl SafetyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest status for a device, replacing any previous one.
    pub fn update(&self, status: SafetyStatus) {
        if !status.is_safe() {
            warn!(
                device_id = %status.device_id,
                emergency_stop = status.emergency_stop,
                door_closed = status.door_closed,
                overload_detected = status.overload_detected,
                temperature_ok = status.temperature_ok,
                "safety alert"
            );
        }
        self.latest.write().insert(status.device_id.clone(), status);
    }

    /// Most recent status for a device, or `None` if it never reported.
    pub fn latest(&self, device_id: &str) -> Option<SafetyStatus> {
        self.latest.read().get(device_id).cloned()
    }

    /// System-wide safe predicate: every known device is safe, and at
    /// least one device is known.
    pub fn system_safe(&self) -> bool {
        let map = self.latest.read();
        !map.is_empty() && map.values().all(SafetyStatus::is_safe)
    }

    /// Number of devices that have reported a safety status.
    pub fn device_count(&self) -> usize {
        self.latest.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(device: &str, emergency_stop: bool) -> SafetyStatus {
        SafetyStatus {
            timestamp_ms: 1_000,
            device_id: device.to_string(),
            emergency_stop,
            door_closed: true,
            overload_detected: false,
            temperature_ok: true,
        }
    }

    #[test]
    fn empty_registry_is_unsafe() {
        let reg = SafetyRegistry::new();
        assert!(!reg.system_safe());
    }

    #[test]
    fn all_devices_safe_means_system_safe() {
        let reg = SafetyRegistry::new();
        reg.update(status("a", false));
        reg.update(status("b", false));
        assert!(reg.system_safe());
    }

    #[test]
    fn one_unsafe_device_poisons_the_system() {
        let reg = SafetyRegistry::new();
        reg.update(status("a", false));
        reg.update(status("b", true));
        assert!(!reg.system_safe());
    }

    #[test]
    fn later_update_replaces_earlier() {
        let reg = SafetyRegistry::new();
        reg.update(status("a", true));
        assert!(!reg.system_safe());
        reg.update(status("a", false));
        assert!(reg.system_safe());
        assert_eq!(reg.device_count(), 1);
    }

    #[test]
    fn latest_is_absent_for_unknown_device() {
        let reg = SafetyRegistry::new();
        assert!(reg.latest("ghost").is_none());
    }
}
