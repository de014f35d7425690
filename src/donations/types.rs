//! Donation records and lifecycle.

use serde::{Deserialize, Serialize};

use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;

/// Lifecycle of a donation from the client building a payment to benefits
/// settling.
///
/// `Rejected` is terminal and reachable only from verification failure; a
/// rejected donation is never retried automatically; the client must
/// produce a fresh signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Envelope built, not yet signed/submitted by the client.
    Pending,
    /// Signed envelope relayed to the ledger.
    Submitted,
    /// Settlement independently re-derived from the ledger.
    Verified,
    /// Donation row persisted; balance credited.
    Recorded,
    /// Benefit issuance in progress.
    BenefitsProcessing,
    /// All eligible benefits handled.
    Settled,
    /// Verification failed. Terminal.
    Rejected,
}

impl DonationStatus {
    /// Legal forward transitions.
    pub fn can_advance_to(&self, next: DonationStatus) -> bool {
        use DonationStatus::*;
        matches!(
            (self, next),
            (Pending, Submitted)
                | (Submitted, Verified)
                | (Submitted, Rejected)
                | (Verified, Recorded)
                | (Recorded, BenefitsProcessing)
                | (BenefitsProcessing, Settled)
        )
    }
}

/// A verified incoming payment. Immutable once created apart from its
/// status advancing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,
    pub project_id: String,
    /// The donor's wallet account id (`G…`).
    pub donor_wallet: String,
    pub amount: Amount,
    pub asset: Asset,
    /// Ledger transaction hash. Globally unique: the idempotency key.
    pub tx_hash: String,
    /// Network passphrase the payment settled on.
    pub network: String,
    pub status: DonationStatus,
    /// Epoch seconds.
    pub created_at: u64,
}
