//! Benefit issuance subsystem.
//!
//! # Data Flow
//! ```text
//! recorded Donation
//!     → issuance.rs (eligibility, supply reservation, per-benefit minting)
//!     → custody (issuer signing) + settlement (submission)
//!     → BenefitHolding + TransactionLog rows
//! ```

pub mod issuance;
pub mod types;

pub use issuance::{BenefitIssuer, IssuanceReport, SkippedBenefit};
pub use types::{BenefitDefinition, BenefitHolding};
