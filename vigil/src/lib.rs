//! # VIGIL Service Library
//!
//! Wires the telemetry, analytics, and gateway crates into the running
//! pipeline: the bus channel plumbing, the ingress dispatch loop, and the
//! periodic analysis orchestrator.
//!
//! The binary in `main.rs` owns process concerns (CLI, logging, config,
//! shutdown); everything here is plain library code so the pipeline can be
//! driven end-to-end from tests.

pub mod bus;
pub mod ingest;
pub mod orchestrator;

pub use bus::{BusMessage, EgressFrame};
pub use ingest::IngestService;
pub use orchestrator::AnalysisOrchestrator;
