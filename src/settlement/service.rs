//! Ledger submission and independent settlement verification.
//!
//! # Responsibilities
//! - Relay signed envelopes, surfacing the ledger's diagnostics
//! - Re-derive settlement from the ledger before anything is trusted
//! - Confirm trustline settlement with bounded retry
//!
//! `verify_payment` is the trust boundary of the whole engine: a client's
//! claim of payment is never believed until the transaction is fetched from
//! the public ledger and found to contain a matching payment operation.

use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::RetryConfig;
use crate::error::{EngineError, Result};
use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;
use crate::ledger::envelope::{unix_now, TransactionEnvelope};
use crate::ledger::horizon::{HorizonClient, SubmitResult};
use crate::resilience::retry::retry_fixed;

/// Verification verdict. `valid == false` always carries the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    pub valid: bool,
    pub error: Option<String>,
}

impl PaymentVerification {
    fn ok() -> Self {
        Self { valid: true, error: None }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

pub struct SettlementService {
    horizon: Arc<HorizonClient>,
    trustline_attempts: u32,
    trustline_interval: Duration,
}

impl SettlementService {
    pub fn new(horizon: Arc<HorizonClient>, retries: &RetryConfig) -> Self {
        Self {
            horizon,
            trustline_attempts: retries.trustline_attempts,
            trustline_interval: Duration::from_millis(retries.trustline_interval_ms),
        }
    }

    /// Relay a signed envelope to the ledger.
    ///
    /// An envelope past its validity window is rejected locally: it must be
    /// rebuilt, not resubmitted. Once this call returns the hash there is
    /// no cancelling the transaction.
    pub async fn submit(&self, envelope: &TransactionEnvelope) -> Result<SubmitResult> {
        if envelope.signatures.is_empty() {
            return Err(EngineError::Validation("refusing to submit an unsigned envelope".into()));
        }
        if envelope.is_expired(unix_now()) {
            return Err(EngineError::Validation(
                "envelope validity window has closed; rebuild the transaction".into(),
            ));
        }
        let result = self.horizon.submit(envelope).await?;
        tracing::info!(hash = %result.hash, successful = result.successful, "Envelope submitted");
        Ok(result)
    }

    /// Independently verify that `tx_hash` settled a payment matching
    /// expectations.
    ///
    /// Requires the transaction to exist and be marked successful, and at
    /// least one of its payment operations to match destination, asset and
    /// amount (within one stroop).
    pub async fn verify_payment(
        &self,
        tx_hash: &str,
        expected_destination: &str,
        expected_amount: Amount,
        expected_asset: &Asset,
    ) -> Result<PaymentVerification> {
        let record = match self.horizon.transaction(tx_hash).await? {
            Some(record) => record,
            None => return Ok(PaymentVerification::invalid("transaction not found on the ledger")),
        };
        if !record.successful {
            return Ok(PaymentVerification::invalid("transaction failed on the ledger"));
        }

        let operations = self.horizon.operations(tx_hash).await?;
        for op in &operations {
            if op.op_type != "payment" {
                continue;
            }
            if op.to.as_deref() != Some(expected_destination) {
                continue;
            }
            let asset_type = op.asset_type.as_deref().unwrap_or("");
            if !expected_asset.matches_record(asset_type, op.asset_code.as_deref(), op.asset_issuer.as_deref()) {
                continue;
            }
            let settled = match op.amount.as_deref().map(Amount::parse) {
                Some(Ok(amount)) => amount,
                _ => continue,
            };
            if expected_amount.diff_stroops(&settled) <= 1 {
                return Ok(PaymentVerification::ok());
            }
        }

        Ok(PaymentVerification::invalid(format!(
            "no payment operation to {} of {} {} found in {} operation(s)",
            expected_destination,
            expected_amount,
            expected_asset,
            operations.len()
        )))
    }

    /// Confirm that `account` holds a trustline to `asset`, retrying while
    /// the change-trust transaction settles: up to `trustline_attempts`
    /// probes at a fixed interval, then a definite answer.
    pub async fn confirm_trustline(&self, account: &str, asset: &Asset) -> Result<bool> {
        let horizon = self.horizon.clone();
        let found = retry_fixed(self.trustline_attempts, self.trustline_interval, || {
            let horizon = horizon.clone();
            let asset = asset.clone();
            let account = account.to_string();
            async move {
                match horizon.has_trustline(&account, &asset).await? {
                    true => Ok(Some(())),
                    false => Ok(None),
                }
            }
        })
        .await?;
        Ok(found.is_some())
    }
}
