//! VIGIL Common Library
//!
//! Shared types, the wire codec, and configuration loading for all VIGIL
//! workspace crates.
//!
//! # Module Structure
//!
//! - [`telemetry`] - Sensor/safety event types and aggregated summaries
//! - [`analysis`] - Analysis result, wear prediction, and command types
//! - [`codec`] - The authoritative bus encoder/decoder
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! vigil_common = { workspace = true }
//! ```
//!
//! Then import:
//! ```rust
//! use vigil_common::prelude::*;
//! use vigil_common::config::{ConfigLoader, VigilConfig};
//! ```

pub mod analysis;
pub mod codec;
pub mod config;
pub mod prelude;
pub mod telemetry;
