//! Concurrency-safe in-memory store.
//!
//! Reference implementation of [`Store`] used by tests and development
//! setups. Uniqueness constraints, the balance credit and supply
//! reservation are atomic under DashMap's per-entry locking, which is what
//! lets the concurrency properties in `tests/` assert exact outcomes.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Mutex;

use crate::benefits::types::{BenefitDefinition, BenefitHolding};
use crate::custody::issuer::IssuerAccount;
use crate::donations::types::{Donation, DonationStatus};
use crate::error::{EngineError, Result};
use crate::ledger::amount::Amount;
use crate::store::{InsertOutcome, Store, TransactionLog};

#[derive(Default)]
pub struct MemoryStore {
    project_wallets: DashMap<String, String>,
    balances: DashMap<String, i64>,
    issuers: DashMap<String, IssuerAccount>,
    donations: DashMap<String, Donation>,
    /// tx_hash → donation id; the uniqueness constraint.
    donations_by_hash: DashMap<String, String>,
    benefits: DashMap<String, BenefitDefinition>,
    holdings: DashMap<String, BenefitHolding>,
    tx_logs: Mutex<Vec<TransactionLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Test/dev seeding helpers. Projects and benefit definitions are owned
    // by the platform's CRUD layer, not this engine.

    pub fn put_project(&self, project_id: &str, wallet: &str) {
        self.project_wallets
            .insert(project_id.to_string(), wallet.to_string());
    }

    pub fn put_benefit(&self, definition: BenefitDefinition) {
        self.benefits.insert(definition.id.clone(), definition);
    }

    pub fn donation_count(&self) -> usize {
        self.donations.len()
    }

    pub fn holdings(&self) -> Vec<BenefitHolding> {
        self.holdings.iter().map(|r| r.value().clone()).collect()
    }

    pub fn logs(&self) -> Vec<TransactionLog> {
        self.tx_logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn project_wallet(&self, project_id: &str) -> Result<Option<String>> {
        Ok(self.project_wallets.get(project_id).map(|r| r.value().clone()))
    }

    async fn credit_project_balance(&self, project_id: &str, amount: Amount) -> Result<Amount> {
        let mut entry = self.balances.entry(project_id.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount.stroops());
        Amount::from_stroops(*entry)
    }

    async fn issuer_for_project(&self, project_id: &str) -> Result<Option<IssuerAccount>> {
        Ok(self.issuers.get(project_id).map(|r| r.value().clone()))
    }

    async fn insert_issuer(&self, account: IssuerAccount) -> Result<InsertOutcome> {
        match self.issuers.entry(account.project_id.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn mark_issuer_funded(&self, project_id: &str) -> Result<()> {
        match self.issuers.get_mut(project_id) {
            Some(mut account) => {
                account.is_funded = true;
                Ok(())
            }
            None => Err(EngineError::Store(format!(
                "no issuer for project {}",
                project_id
            ))),
        }
    }

    async fn donation_by_tx_hash(&self, tx_hash: &str) -> Result<Option<Donation>> {
        let id = match self.donations_by_hash.get(tx_hash) {
            Some(r) => r.value().clone(),
            None => return Ok(None),
        };
        Ok(self.donations.get(&id).map(|r| r.value().clone()))
    }

    async fn insert_donation(&self, donation: Donation) -> Result<InsertOutcome> {
        match self.donations_by_hash.entry(donation.tx_hash.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(donation.id.clone());
                self.donations.insert(donation.id.clone(), donation);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn update_donation_status(&self, donation_id: &str, status: DonationStatus) -> Result<()> {
        match self.donations.get_mut(donation_id) {
            Some(mut donation) => {
                donation.status = status;
                Ok(())
            }
            None => Err(EngineError::Store(format!("no donation {}", donation_id))),
        }
    }

    async fn benefit(&self, benefit_id: &str) -> Result<Option<BenefitDefinition>> {
        Ok(self.benefits.get(benefit_id).map(|r| r.value().clone()))
    }

    async fn benefits_for_project(&self, project_id: &str) -> Result<Vec<BenefitDefinition>> {
        Ok(self
            .benefits
            .iter()
            .filter(|r| r.value().project_id == project_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn reserve_benefit_supply(&self, benefit_id: &str, quantity: u32) -> Result<bool> {
        match self.benefits.get_mut(benefit_id) {
            Some(mut benefit) => {
                // Compare-and-increment under the entry lock.
                if benefit.issued_supply.saturating_add(quantity) <= benefit.total_supply {
                    benefit.issued_supply += quantity;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            None => Err(EngineError::Store(format!("no benefit {}", benefit_id))),
        }
    }

    async fn release_benefit_supply(&self, benefit_id: &str, quantity: u32) -> Result<()> {
        match self.benefits.get_mut(benefit_id) {
            Some(mut benefit) => {
                benefit.issued_supply = benefit.issued_supply.saturating_sub(quantity);
                Ok(())
            }
            None => Err(EngineError::Store(format!("no benefit {}", benefit_id))),
        }
    }

    async fn insert_holding(&self, holding: BenefitHolding) -> Result<()> {
        self.holdings.insert(holding.id.clone(), holding);
        Ok(())
    }

    async fn append_tx_log(&self, entry: TransactionLog) -> Result<()> {
        self.tx_logs.lock().unwrap().push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::asset::Asset;

    fn benefit(total: u32, issued: u32) -> BenefitDefinition {
        BenefitDefinition {
            id: "b1".into(),
            project_id: "p1".into(),
            asset_code: "GOLD".into(),
            total_supply: total,
            issued_supply: issued,
            minimum_donation: Amount::parse("1").unwrap(),
            currency: Asset::Native,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_balance_credit_accumulates() {
        let store = MemoryStore::new();
        let ten = Amount::parse("10").unwrap();
        assert_eq!(store.credit_project_balance("p1", ten).await.unwrap(), ten);
        let total = store.credit_project_balance("p1", ten).await.unwrap();
        assert_eq!(total, Amount::parse("20").unwrap());
    }

    #[tokio::test]
    async fn test_supply_reservation_is_bounded() {
        let store = MemoryStore::new();
        store.put_benefit(benefit(2, 0));

        assert!(store.reserve_benefit_supply("b1", 1).await.unwrap());
        assert!(store.reserve_benefit_supply("b1", 1).await.unwrap());
        assert!(!store.reserve_benefit_supply("b1", 1).await.unwrap());

        store.release_benefit_supply("b1", 1).await.unwrap();
        assert!(store.reserve_benefit_supply("b1", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_donation_tx_hash_uniqueness() {
        let store = MemoryStore::new();
        let donation = Donation {
            id: "d1".into(),
            project_id: "p1".into(),
            donor_wallet: "GDONOR".into(),
            amount: Amount::parse("5").unwrap(),
            asset: Asset::Native,
            tx_hash: "abc123".into(),
            network: "Test SDF Network ; September 2015".into(),
            status: DonationStatus::Recorded,
            created_at: 0,
        };
        assert_eq!(
            store.insert_donation(donation.clone()).await.unwrap(),
            InsertOutcome::Inserted
        );

        let mut replay = donation;
        replay.id = "d2".into();
        assert_eq!(
            store.insert_donation(replay).await.unwrap(),
            InsertOutcome::Duplicate
        );
        assert_eq!(store.donation_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_reservation_never_oversells() {
        use futures_util::future::join_all;
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        store.put_benefit(benefit(1, 0));

        let attempts = (0..8).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.reserve_benefit_supply("b1", 1).await.unwrap() })
        });
        let wins: usize = join_all(attempts)
            .await
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();

        assert_eq!(wins, 1);
        let benefit = store.benefit("b1").await.unwrap().unwrap();
        assert_eq!(benefit.issued_supply, 1);
    }
}
