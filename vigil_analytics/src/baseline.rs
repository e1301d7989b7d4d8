//! Adaptive per-device channel baselines.
//!
//! Each channel keeps a `(mean, std)` pair maintained by exponential
//! moving average with weight α = 0.1. The std is the EMA of the absolute
//! deviation from the updated mean, not a population estimate; the
//! summarization path computes those separately and the two are never
//! merged.

use std::collections::HashMap;

use parking_lot::Mutex;

/// EMA weight for both mean and deviation updates.
const EMA_ALPHA: f64 = 0.1;

/// Initial std estimate for current channels [A].
pub const CURRENT_SEED_STD: f64 = 0.5;
/// Initial std estimate for the vibration magnitude channel [m/s²].
pub const VIBRATION_SEED_STD: f64 = 0.5;
/// Initial std estimate for temperature channels [°C].
pub const TEMPERATURE_SEED_STD: f64 = 2.0;

/// One channel's adaptive statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelBaseline {
    pub mean: f64,
    pub std: f64,
}

/// Per-device, per-channel baseline store.
///
/// Channels are named `current_i`, `temp_i`, and `vibration_magnitude`.
/// Entries are created on first observation and live until process
/// restart.
#[derive(Debug, Default)]
pub struct BaselineStore {
    devices: Mutex<HashMap<String, HashMap<String, ChannelBaseline>>>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current baseline for a channel, if one has been established.
    pub fn get(&self, device_id: &str, channel: &str) -> Option<ChannelBaseline> {
        self.devices
            .lock()
            .get(device_id)
            .and_then(|channels| channels.get(channel))
            .copied()
    }

    /// Fold one observation into the channel baseline.
    ///
    /// First observation seeds `mean = x` and `std = seed_std`; afterwards
    /// `μ' = 0.9μ + 0.1x` and `σ' = 0.9σ + 0.1·|x − μ'|`.
    pub fn observe(&self, device_id: &str, channel: &str, value: f64, seed_std: f64) {
        let mut devices = self.devices.lock();
        let channels = devices.entry(device_id.to_string()).or_default();

        let updated = match channels.get(channel) {
            Some(prev) => {
                let mean = (1.0 - EMA_ALPHA) * prev.mean + EMA_ALPHA * value;
                let std = (1.0 - EMA_ALPHA) * prev.std + EMA_ALPHA * (value - mean).abs();
                ChannelBaseline { mean, std }
            }
            None => ChannelBaseline {
                mean: value,
                std: seed_std,
            },
        };
        channels.insert(channel.to_string(), updated);
    }

    /// Number of devices with at least one established channel.
    pub fn device_count(&self) -> usize {
        self.devices.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_seeds_mean_and_std() {
        let store = BaselineStore::new();
        store.observe("a", "current_0", 5.0, CURRENT_SEED_STD);
        let b = store.get("a", "current_0").unwrap();
        assert_eq!(b.mean, 5.0);
        assert_eq!(b.std, 0.5);
    }

    #[test]
    fn ema_update_arithmetic() {
        let store = BaselineStore::new();
        store.observe("a", "temp_0", 40.0, TEMPERATURE_SEED_STD);
        store.observe("a", "temp_0", 50.0, TEMPERATURE_SEED_STD);
        let b = store.get("a", "temp_0").unwrap();
        // μ' = 0.9·40 + 0.1·50 = 41, σ' = 0.9·2 + 0.1·|50−41| = 2.7
        assert!((b.mean - 41.0).abs() < 1e-9);
        assert!((b.std - 2.7).abs() < 1e-9);
    }

    #[test]
    fn channels_are_independent() {
        let store = BaselineStore::new();
        store.observe("a", "current_0", 1.0, CURRENT_SEED_STD);
        store.observe("a", "current_1", 9.0, CURRENT_SEED_STD);
        assert_eq!(store.get("a", "current_0").unwrap().mean, 1.0);
        assert_eq!(store.get("a", "current_1").unwrap().mean, 9.0);
        assert!(store.get("a", "current_2").is_none());
    }

    #[test]
    fn devices_are_independent() {
        let store = BaselineStore::new();
        store.observe("a", "vibration_magnitude", 1.0, VIBRATION_SEED_STD);
        assert!(store.get("b", "vibration_magnitude").is_none());
        assert_eq!(store.device_count(), 1);
    }
}
