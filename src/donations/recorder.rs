//! Idempotent donation recording.
//!
//! # Responsibilities
//! - txHash-keyed duplicate rejection, checked before any ledger call
//! - Creation of the Donation row only after verification succeeded
//! - Atomic project balance credit (store-level, never read-then-write)

use std::sync::Arc;
use uuid::Uuid;

use crate::donations::types::{Donation, DonationStatus};
use crate::error::{EngineError, Result};
use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;
use crate::ledger::envelope::unix_now;
use crate::store::{InsertOutcome, Store};

pub struct DonationRecorder {
    store: Arc<dyn Store>,
}

impl DonationRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Reject a tx hash that was already credited.
    ///
    /// Runs before verification so a replay never costs a ledger round
    /// trip.
    pub async fn check_duplicate(&self, tx_hash: &str) -> Result<()> {
        if self.store.donation_by_tx_hash(tx_hash).await?.is_some() {
            return Err(EngineError::DuplicateTransaction(tx_hash.to_string()));
        }
        Ok(())
    }

    /// Persist a verified donation and credit the project balance.
    ///
    /// The insert is guarded by the store's unique tx_hash constraint, so
    /// two racing requests for the same hash produce exactly one row; the
    /// loser gets `DuplicateTransaction`.
    pub async fn record(
        &self,
        project_id: &str,
        donor_wallet: &str,
        amount: Amount,
        asset: Asset,
        tx_hash: &str,
        network: &str,
    ) -> Result<Donation> {
        let donation = Donation {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            donor_wallet: donor_wallet.to_string(),
            amount,
            asset,
            tx_hash: tx_hash.to_string(),
            network: network.to_string(),
            status: DonationStatus::Recorded,
            created_at: unix_now(),
        };

        match self.store.insert_donation(donation.clone()).await? {
            InsertOutcome::Inserted => {}
            InsertOutcome::Duplicate => {
                return Err(EngineError::DuplicateTransaction(tx_hash.to_string()));
            }
        }

        let balance = self.store.credit_project_balance(project_id, amount).await?;
        tracing::info!(
            project = %project_id,
            donation = %donation.id,
            amount = %amount,
            balance = %balance,
            "Donation recorded"
        );
        Ok(donation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn recorder() -> (DonationRecorder, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (DonationRecorder::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_record_then_duplicate() {
        let (recorder, store) = recorder();
        let ten = Amount::parse("10").unwrap();

        recorder
            .record("p1", "GDONOR", ten, Asset::Native, "hash-1", "testnet")
            .await
            .unwrap();
        assert!(recorder.check_duplicate("hash-1").await.is_err());
        assert!(recorder.check_duplicate("hash-2").await.is_ok());
        assert_eq!(store.donation_count(), 1);
    }

    #[tokio::test]
    async fn test_racing_records_yield_one_row() {
        let (recorder, store) = recorder();
        let recorder = Arc::new(recorder);
        let ten = Amount::parse("10").unwrap();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let recorder = recorder.clone();
                tokio::spawn(async move {
                    recorder
                        .record("p1", "GDONOR", ten, Asset::Native, "hash-race", "testnet")
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.donation_count(), 1);
    }

    #[tokio::test]
    async fn test_balance_credited_once_per_donation() {
        let (recorder, store) = recorder();
        let ten = Amount::parse("10").unwrap();

        recorder
            .record("p1", "GDONOR", ten, Asset::Native, "h1", "testnet")
            .await
            .unwrap();
        recorder
            .record("p1", "GOTHER", ten, Asset::Native, "h2", "testnet")
            .await
            .unwrap();

        // Second credit of the same hash never happens
        let _ = recorder
            .record("p1", "GDONOR", ten, Asset::Native, "h1", "testnet")
            .await
            .unwrap_err();

        let balance = store
            .credit_project_balance("p1", Amount::ZERO)
            .await
            .unwrap();
        assert_eq!(balance, Amount::parse("20").unwrap());
    }
}
