//! End-to-end staging pipeline

pub mod orchestrator;

pub use orchestrator::{StagingOrchestrator, StagingOutcome};
