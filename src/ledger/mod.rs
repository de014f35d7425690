//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! strkey/amount/asset (validated primitives)
//!     → envelope.rs (operation sets, wire form, hashing, signatures)
//!     → factory.rs (build payment / trustline / issuance envelopes)
//!     → horizon.rs (account loads, submission, transaction lookups)
//! ```

pub mod amount;
pub mod asset;
pub mod envelope;
pub mod factory;
pub mod horizon;
pub mod strkey;

pub use amount::Amount;
pub use asset::Asset;
pub use envelope::{Memo, Operation, TransactionEnvelope};
pub use factory::TxFactory;
pub use horizon::{HorizonClient, SubmitResult};
