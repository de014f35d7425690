//! Transaction factory.
//!
//! # Responsibilities
//! - Build unsigned payment, trustline and issuance envelopes
//! - Load the source sequence number fresh from the ledger on every build
//! - Stamp the fixed fee and validity window
//!
//! Two concurrent builds from the same source race on the sequence number;
//! callers serialize per source or retry on `tx_bad_seq`.

use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;
use crate::ledger::envelope::{
    Memo, Operation, TimeBounds, Transaction, TransactionEnvelope, BASE_FEE,
};
use crate::ledger::horizon::HorizonClient;
use crate::ledger::strkey;

/// Builds unsigned envelopes against a fixed network.
pub struct TxFactory {
    horizon: Arc<HorizonClient>,
    network_passphrase: String,
}

impl TxFactory {
    pub fn new(horizon: Arc<HorizonClient>, network_passphrase: impl Into<String>) -> Self {
        Self {
            horizon,
            network_passphrase: network_passphrase.into(),
        }
    }

    /// Build a single-payment envelope from `source` to `destination`.
    ///
    /// Validates shapes locally, then loads the source's current sequence
    /// number from the ledger.
    pub async fn build_payment(
        &self,
        source: &str,
        destination: &str,
        amount: Amount,
        asset: Asset,
        memo: Option<&str>,
    ) -> Result<TransactionEnvelope> {
        strkey::decode_account_id(source)?;
        strkey::decode_account_id(destination)?;
        if !amount.is_positive() {
            return Err(EngineError::Validation(format!(
                "payment amount must be positive, got {}",
                amount
            )));
        }
        let memo = match memo {
            Some(text) => Memo::text(text)?,
            None => Memo::None,
        };

        let operations = vec![Operation::Payment {
            destination: destination.to_string(),
            asset,
            amount,
        }];
        self.assemble(source, operations, memo).await
    }

    /// Build one envelope holding a change-trust operation per asset.
    ///
    /// Batching keeps the donor at a single signing prompt no matter how
    /// many benefit assets they opt into.
    pub async fn build_trustline(
        &self,
        trustor: &str,
        assets: &[Asset],
    ) -> Result<TransactionEnvelope> {
        strkey::decode_account_id(trustor)?;
        if assets.is_empty() {
            return Err(EngineError::Validation(
                "trustline build requires at least one asset".into(),
            ));
        }

        let mut operations = Vec::with_capacity(assets.len());
        for asset in assets {
            if asset.is_native() {
                return Err(EngineError::Validation(
                    "the native asset does not use trustlines".into(),
                ));
            }
            operations.push(Operation::ChangeTrust {
                asset: asset.clone(),
                limit: Amount::MAX,
            });
        }
        self.assemble(trustor, operations, Memo::None).await
    }

    /// Build an issuance envelope: a single payment of `asset_code` from the
    /// issuer to `recipient`.
    pub async fn build_issuance(
        &self,
        issuer: &str,
        recipient: &str,
        asset_code: &str,
        amount: Amount,
    ) -> Result<TransactionEnvelope> {
        let asset = Asset::credit(asset_code, issuer)?;
        self.build_payment(issuer, recipient, amount, asset, None).await
    }

    async fn assemble(
        &self,
        source: &str,
        operations: Vec<Operation>,
        memo: Memo,
    ) -> Result<TransactionEnvelope> {
        // Fresh sequence on every build; a stale one is rejected by the
        // ledger, never silently reused.
        let sequence = self.horizon.sequence_for(source).await? + 1;
        let fee = BASE_FEE * operations.len() as u32;

        Ok(TransactionEnvelope {
            tx: Transaction {
                source: source.to_string(),
                fee,
                sequence,
                time_bounds: TimeBounds::standard(),
                memo,
                operations,
            },
            network_passphrase: self.network_passphrase.clone(),
            signatures: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::strkey::encode_account_id;

    // Builds that fail validation never reach the ledger, so a client with
    // an unroutable URL is fine here.
    fn offline_factory() -> TxFactory {
        let network = crate::config::schema::NetworkConfig {
            horizon_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };
        TxFactory::new(
            Arc::new(HorizonClient::new(&network, 1).unwrap()),
            network.passphrase,
        )
    }

    #[tokio::test]
    async fn test_rejects_malformed_source() {
        let factory = offline_factory();
        let destination = encode_account_id(&[2u8; 32]);
        let result = factory
            .build_payment("not-an-account", &destination, Amount::parse("1").unwrap(), Asset::Native, None)
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_zero_amount() {
        let factory = offline_factory();
        let source = encode_account_id(&[1u8; 32]);
        let destination = encode_account_id(&[2u8; 32]);
        let result = factory
            .build_payment(&source, &destination, Amount::ZERO, Asset::Native, None)
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_trustline_rejects_native_and_empty() {
        let factory = offline_factory();
        let trustor = encode_account_id(&[1u8; 32]);

        let result = factory.build_trustline(&trustor, &[]).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));

        let result = factory.build_trustline(&trustor, &[Asset::Native]).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_validation_runs_before_any_ledger_call() {
        // The offline factory cannot reach a ledger; a validation error
        // (rather than a transport error) proves the ordering.
        let factory = offline_factory();
        let source = encode_account_id(&[1u8; 32]);
        let result = factory
            .build_payment(&source, "bogus", Amount::parse("1").unwrap(), Asset::Native, None)
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
