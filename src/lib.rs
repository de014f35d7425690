//! Ledger payment, wallet-signing and benefit-issuance engine for a
//! crowdfunding platform.
//!
//! # Architecture Overview
//!
//! ```text
//! ledger::factory ──▶ signing (external wallet, human approval)
//!        │                      │
//!        ▼                      ▼
//! settlement::submit ──▶ settlement::verify_payment  (trust boundary)
//!                                │
//!                                ▼
//!                    donations::recorder (txHash-unique, atomic credit)
//!                                │
//!                                ▼
//!                    benefits::issuance ──▶ custody (encrypted issuer keys)
//! ```
//!
//! The platform's HTTP layer calls [`flow::DonationFlow::process`]; every
//! other subsystem hangs off that path.

// Core subsystems
pub mod custody;
pub mod error;
pub mod flow;
pub mod ledger;
pub mod settlement;
pub mod signing;
pub mod wallet;

// Records and persistence port
pub mod benefits;
pub mod donations;
pub mod store;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use flow::{DonationFlow, DonationOutcome, DonationRequest};
