//! Benefit definitions and holdings.

use serde::{Deserialize, Serialize};

use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;

/// A limited-supply reward tier defined by a project owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitDefinition {
    pub id: String,
    pub project_id: String,
    /// Asset code minted for this benefit. Unique per project.
    pub asset_code: String,
    pub total_supply: u32,
    /// Monotonic; never exceeds `total_supply`.
    pub issued_supply: u32,
    /// Smallest donation that qualifies.
    pub minimum_donation: Amount,
    /// Donation asset this tier prices against.
    pub currency: Asset,
    pub is_active: bool,
}

impl BenefitDefinition {
    /// Units still available to issue.
    pub fn remaining_supply(&self) -> u32 {
        self.total_supply.saturating_sub(self.issued_supply)
    }

    /// Whether a donation of `amount` in `asset` qualifies for this tier.
    pub fn qualifies(&self, amount: Amount, asset: &Asset) -> bool {
        self.is_active
            && &self.currency == asset
            && amount >= self.minimum_donation
            && self.remaining_supply() > 0
    }
}

/// A minted reward linked to the donation that earned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitHolding {
    pub id: String,
    pub benefit_id: String,
    pub donation_id: String,
    /// Wallet the benefit tokens were minted to.
    pub holder_wallet: String,
    pub quantity: u32,
}
