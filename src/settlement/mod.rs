//! Submission and verification subsystem.

pub mod service;

pub use service::{PaymentVerification, SettlementService};
