//! Signing orchestration.

pub mod orchestrator;

pub use orchestrator::SigningOrchestrator;
