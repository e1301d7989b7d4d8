//! Configuration loading traits and types.
//!
//! All VIGIL programs load a single TOML file through the [`ConfigLoader`]
//! trait. Parsing is strict (`deny_unknown_fields`); every section carries
//! a `validate()` method with explicit numeric bounds. Invalid
//! configuration at startup is fatal.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Log level for configuration.
///
/// Serializes to lowercase strings: "trace", "debug", "info", "warn",
/// "error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string accepted by `tracing_subscriber::EnvFilter`.
    pub const fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Unknown field in TOML (strict parsing with `deny_unknown_fields`).
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Returns `ConfigError::UnknownField` for keys rejected by strict parsing
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(format!("{}: {}", path.display(), e))
            }
        })?;

        toml::from_str(&content).map_err(|e| {
            let msg = e.to_string();
            // Detect "unknown field" errors from serde(deny_unknown_fields).
            if msg.contains("unknown field") {
                ConfigError::UnknownField(format!("{}: {}", path.display(), msg))
            } else {
                ConfigError::ParseError(format!("{}: {}", path.display(), msg))
            }
        })
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Shared section ─────────────────────────────────────────────────

fn default_log_level() -> LogLevel {
    LogLevel::Info
}
fn default_service_name() -> String {
    "vigil".to_string()
}

/// Common configuration fields shared across VIGIL programs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "vigil".to_string(),
        }
    }
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Pipeline section ───────────────────────────────────────────────

fn default_window_size_s() -> u64 {
    10
}
fn default_max_points() -> usize {
    1000
}
fn default_analysis_interval_s() -> u64 {
    60
}

/// Aggregation window and orchestrator cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Sliding aggregation window [s] (1..=3600).
    #[serde(default = "default_window_size_s")]
    pub window_size_seconds: u64,
    /// Ring buffer capacity per device (1..=1_000_000).
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    /// Orchestrator tick period [s] (1..=86_400).
    #[serde(default = "default_analysis_interval_s")]
    pub analysis_interval_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size_seconds: 10,
            max_points: 1000,
            analysis_interval_seconds: 60,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=3600).contains(&self.window_size_seconds) {
            return Err(ConfigError::ValidationError(format!(
                "pipeline.window_size_seconds={} out of range [1, 3600]",
                self.window_size_seconds
            )));
        }
        if !(1..=1_000_000).contains(&self.max_points) {
            return Err(ConfigError::ValidationError(format!(
                "pipeline.max_points={} out of range [1, 1000000]",
                self.max_points
            )));
        }
        if !(1..=86_400).contains(&self.analysis_interval_seconds) {
            return Err(ConfigError::ValidationError(format!(
                "pipeline.analysis_interval_seconds={} out of range [1, 86400]",
                self.analysis_interval_seconds
            )));
        }
        Ok(())
    }
}

// ─── Analytics section ──────────────────────────────────────────────

fn default_z_threshold() -> f64 {
    3.0
}
fn default_nominal_lifetime_h() -> f64 {
    10_000.0
}

/// Detection and wear model knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Z-score cutoff for baseline anomalies (0.5..=20.0).
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
    /// Component lifetime the wear level is normalized against [h].
    #[serde(default = "default_nominal_lifetime_h")]
    pub nominal_lifetime_hours: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            nominal_lifetime_hours: 10_000.0,
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.5..=20.0).contains(&self.z_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "analytics.z_threshold={} out of range [0.5, 20.0]",
                self.z_threshold
            )));
        }
        if self.nominal_lifetime_hours <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "analytics.nominal_lifetime_hours={} must be > 0",
                self.nominal_lifetime_hours
            )));
        }
        Ok(())
    }
}

// ─── Cache section ──────────────────────────────────────────────────

fn default_device_list_ttl_s() -> u64 {
    5
}
fn default_device_data_ttl_s() -> u64 {
    1
}
fn default_ai_analysis_ttl_s() -> u64 {
    10
}
fn default_system_status_ttl_s() -> u64 {
    2
}

/// TTLs for the four HMI read caches [s].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Device list changes rarely.
    #[serde(default = "default_device_list_ttl_s")]
    pub device_list_ttl_seconds: u64,
    /// Fresh sensor data is needed more frequently.
    #[serde(default = "default_device_data_ttl_s")]
    pub device_data_ttl_seconds: u64,
    /// Analysis is expensive, cache longer.
    #[serde(default = "default_ai_analysis_ttl_s")]
    pub ai_analysis_ttl_seconds: u64,
    /// System status for dashboards.
    #[serde(default = "default_system_status_ttl_s")]
    pub system_status_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            device_list_ttl_seconds: 5,
            device_data_ttl_seconds: 1,
            ai_analysis_ttl_seconds: 10,
            system_status_ttl_seconds: 2,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, ttl) in [
            ("device_list_ttl_seconds", self.device_list_ttl_seconds),
            ("device_data_ttl_seconds", self.device_data_ttl_seconds),
            ("ai_analysis_ttl_seconds", self.ai_analysis_ttl_seconds),
            ("system_status_ttl_seconds", self.system_status_ttl_seconds),
        ] {
            if !(1..=3600).contains(&ttl) {
                return Err(ConfigError::ValidationError(format!(
                    "cache.{name}={ttl} out of range [1, 3600]"
                )));
            }
        }
        Ok(())
    }
}

// ─── Bus section ────────────────────────────────────────────────────

fn default_topic_sensor_data() -> String {
    "vigil/sensor/data".to_string()
}
fn default_topic_safety() -> String {
    "vigil/sensor/safety".to_string()
}
fn default_topic_analysis() -> String {
    "vigil/ai/analysis".to_string()
}
fn default_topic_commands() -> String {
    "vigil/control/commands".to_string()
}
fn default_publish_timeout_s() -> u64 {
    5
}
fn default_ingress_queue_depth() -> usize {
    256
}

/// Bus topic map and channel sizing.
///
/// The transport itself is external; these names route decoded frames to
/// and from the in-process channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    #[serde(default = "default_topic_sensor_data")]
    pub topic_sensor_data: String,
    #[serde(default = "default_topic_safety")]
    pub topic_safety: String,
    #[serde(default = "default_topic_analysis")]
    pub topic_analysis: String,
    #[serde(default = "default_topic_commands")]
    pub topic_commands: String,
    /// Per-publish deadline [s] (1..=60).
    #[serde(default = "default_publish_timeout_s")]
    pub publish_timeout_seconds: u64,
    /// Bounded ingress queue depth (1..=65_536).
    #[serde(default = "default_ingress_queue_depth")]
    pub ingress_queue_depth: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            topic_sensor_data: default_topic_sensor_data(),
            topic_safety: default_topic_safety(),
            topic_analysis: default_topic_analysis(),
            topic_commands: default_topic_commands(),
            publish_timeout_seconds: 5,
            ingress_queue_depth: 256,
        }
    }
}

impl BusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, topic) in [
            ("topic_sensor_data", &self.topic_sensor_data),
            ("topic_safety", &self.topic_safety),
            ("topic_analysis", &self.topic_analysis),
            ("topic_commands", &self.topic_commands),
        ] {
            if topic.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "bus.{name} cannot be empty"
                )));
            }
        }
        if !(1..=60).contains(&self.publish_timeout_seconds) {
            return Err(ConfigError::ValidationError(format!(
                "bus.publish_timeout_seconds={} out of range [1, 60]",
                self.publish_timeout_seconds
            )));
        }
        if !(1..=65_536).contains(&self.ingress_queue_depth) {
            return Err(ConfigError::ValidationError(format!(
                "bus.ingress_queue_depth={} out of range [1, 65536]",
                self.ingress_queue_depth
            )));
        }
        Ok(())
    }
}

// ─── Top-level config ───────────────────────────────────────────────

/// Top-level service configuration — loaded from `vigil.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VigilConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

impl VigilConfig {
    /// Validate every section. Any failure is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.pipeline.validate()?;
        self.analytics.validate()?;
        self.cache.validate()?;
        self.bus.validate()?;
        Ok(())
    }
}
