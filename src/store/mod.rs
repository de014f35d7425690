//! Relational store port.
//!
//! The platform's relational schema is owned elsewhere; this subsystem only
//! performs keyed reads/writes, uniqueness checks and atomic increments
//! through the [`Store`] trait. `memory.rs` is the concurrency-safe
//! reference implementation used by tests and development setups.
//!
//! # Design Decisions
//! - Uniqueness violations are data (`InsertOutcome::Duplicate`), not
//!   errors: callers decide whether a duplicate is a conflict (donations)
//!   or a success (issuer accounts)
//! - Balance credit and supply reservation are store-level atomics; the
//!   engine never does read-then-write on either

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::benefits::types::{BenefitDefinition, BenefitHolding};
use crate::custody::issuer::IssuerAccount;
use crate::donations::types::{Donation, DonationStatus};
use crate::error::Result;
use crate::ledger::amount::Amount;

pub use memory::MemoryStore;

/// Outcome of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key already existed; nothing was written.
    Duplicate,
}

/// Which ledger-affecting operation a log row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Payment,
    Trustline,
    Issuance,
    Funding,
}

/// Terminal status of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Failed,
}

/// Append-only audit record of a ledger-affecting attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLog {
    pub id: String,
    pub tx_type: TxType,
    pub tx_hash: Option<String>,
    pub status: TxStatus,
    pub error_message: Option<String>,
    /// Epoch seconds.
    pub created_at: u64,
}

impl TransactionLog {
    pub fn success(tx_type: TxType, tx_hash: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tx_type,
            tx_hash: Some(tx_hash.into()),
            status: TxStatus::Success,
            error_message: None,
            created_at: crate::ledger::envelope::unix_now(),
        }
    }

    pub fn failure(tx_type: TxType, tx_hash: Option<String>, error: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tx_type,
            tx_hash,
            status: TxStatus::Failed,
            error_message: Some(error.into()),
            created_at: crate::ledger::envelope::unix_now(),
        }
    }
}

/// Keyed access to the platform's relational records.
#[async_trait]
pub trait Store: Send + Sync {
    // Projects (owned externally; the engine only reads what it needs)

    /// Receiving wallet of a project, if the project exists.
    async fn project_wallet(&self, project_id: &str) -> Result<Option<String>>;

    /// Atomically credit a project's running balance; returns the new total.
    async fn credit_project_balance(&self, project_id: &str, amount: Amount) -> Result<Amount>;

    // Issuer accounts

    async fn issuer_for_project(&self, project_id: &str) -> Result<Option<IssuerAccount>>;

    /// Insert guarded by the unique `project_id` constraint.
    async fn insert_issuer(&self, account: IssuerAccount) -> Result<InsertOutcome>;

    async fn mark_issuer_funded(&self, project_id: &str) -> Result<()>;

    // Donations

    async fn donation_by_tx_hash(&self, tx_hash: &str) -> Result<Option<Donation>>;

    /// Insert guarded by the globally unique `tx_hash` constraint.
    async fn insert_donation(&self, donation: Donation) -> Result<InsertOutcome>;

    async fn update_donation_status(&self, donation_id: &str, status: DonationStatus) -> Result<()>;

    // Benefits

    async fn benefit(&self, benefit_id: &str) -> Result<Option<BenefitDefinition>>;

    async fn benefits_for_project(&self, project_id: &str) -> Result<Vec<BenefitDefinition>>;

    /// Atomically reserve `quantity` units of supply: succeeds only while
    /// `issued_supply + quantity <= total_supply`. Never a blind write.
    async fn reserve_benefit_supply(&self, benefit_id: &str, quantity: u32) -> Result<bool>;

    /// Return previously reserved supply after a failed issuance.
    async fn release_benefit_supply(&self, benefit_id: &str, quantity: u32) -> Result<()>;

    async fn insert_holding(&self, holding: BenefitHolding) -> Result<()>;

    // Audit

    async fn append_tx_log(&self, entry: TransactionLog) -> Result<()>;
}
