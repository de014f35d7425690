//! Routes unsigned envelopes to the active wallet session.
//!
//! The `sign` call is an external suspension point: it blocks on a human
//! approving or rejecting in the provider's own UI. No internal timeout is
//! imposed; callers that want one wrap the call in `tokio::time::timeout`.
//! Rejection surfaces as `UserCancelled`, never as a technical failure.

use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::ledger::envelope::TransactionEnvelope;
use crate::wallet::WalletManager;

pub struct SigningOrchestrator {
    manager: Arc<WalletManager>,
}

impl SigningOrchestrator {
    pub fn new(manager: Arc<WalletManager>) -> Self {
        Self { manager }
    }

    /// Have the connected wallet sign `envelope`.
    ///
    /// Returns the decoded signed envelope. A signer that returns an
    /// envelope with no signatures is a protocol violation, not a
    /// cancellation.
    pub async fn sign(&self, envelope: &TransactionEnvelope) -> Result<TransactionEnvelope> {
        let provider = self
            .manager
            .active_provider()
            .await
            .ok_or_else(|| EngineError::WalletUnavailable("no wallet session".into()))?;

        let unsigned_b64 = envelope.to_base64()?;
        let signed_b64 = provider
            .sign(&unsigned_b64, &envelope.network_passphrase)
            .await?;

        let signed = TransactionEnvelope::from_base64(&signed_b64)?;
        if signed.signatures.is_empty() {
            return Err(EngineError::Validation(
                "wallet returned an envelope with no signatures".into(),
            ));
        }
        if signed.tx != envelope.tx {
            return Err(EngineError::Validation(
                "wallet returned an envelope for a different transaction".into(),
            ));
        }
        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SigningStage;
    use crate::ledger::amount::Amount;
    use crate::ledger::asset::Asset;
    use crate::ledger::envelope::{Memo, Operation, TimeBounds, Transaction};
    use crate::ledger::strkey::encode_account_id;
    use crate::wallet::{WalletProvider, WalletSession};
    use async_trait::async_trait;
    use ed25519_dalek::SigningKey;

    fn envelope() -> TransactionEnvelope {
        TransactionEnvelope {
            tx: Transaction {
                source: encode_account_id(&[1u8; 32]),
                fee: 100,
                sequence: 7,
                time_bounds: TimeBounds::standard(),
                memo: Memo::None,
                operations: vec![Operation::Payment {
                    destination: encode_account_id(&[2u8; 32]),
                    asset: Asset::Native,
                    amount: Amount::parse("5").unwrap(),
                }],
            },
            network_passphrase: "Test SDF Network ; September 2015".into(),
            signatures: Vec::new(),
        }
    }

    enum Behavior {
        SignProperly,
        Reject,
        ReturnUnsigned,
    }

    struct ScriptedProvider {
        behavior: Behavior,
    }

    #[async_trait]
    impl WalletProvider for ScriptedProvider {
        fn id(&self) -> &str {
            "scripted"
        }
        async fn detect(&self) -> bool {
            true
        }
        async fn connect(&self) -> Result<WalletSession> {
            Ok(WalletSession::new(
                "scripted",
                encode_account_id(&[1u8; 32]),
                "Test SDF Network ; September 2015".to_string(),
            ))
        }
        async fn sign(&self, envelope_b64: &str, _network: &str) -> Result<String> {
            match self.behavior {
                Behavior::SignProperly => {
                    let mut envelope = TransactionEnvelope::from_base64(envelope_b64)?;
                    envelope.sign(&SigningKey::from_bytes(&[9u8; 32]));
                    envelope.to_base64()
                }
                Behavior::Reject => Err(EngineError::UserCancelled(SigningStage::Sign)),
                Behavior::ReturnUnsigned => Ok(envelope_b64.to_string()),
            }
        }
        async fn disconnect(&self) {}
    }

    async fn orchestrator(behavior: Behavior) -> SigningOrchestrator {
        let mut manager = WalletManager::new();
        manager.register(Arc::new(ScriptedProvider { behavior }));
        let manager = Arc::new(manager);
        manager.connect("scripted").await.unwrap();
        SigningOrchestrator::new(manager)
    }

    #[tokio::test]
    async fn test_routes_to_active_provider() {
        let orchestrator = orchestrator(Behavior::SignProperly).await;
        let unsigned = envelope();
        let signed = orchestrator.sign(&unsigned).await.unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert_eq!(signed.tx, unsigned.tx);
    }

    #[tokio::test]
    async fn test_rejection_is_cancellation() {
        let orchestrator = orchestrator(Behavior::Reject).await;
        let err = orchestrator.sign(&envelope()).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_unsigned_return_is_a_protocol_error() {
        let orchestrator = orchestrator(Behavior::ReturnUnsigned).await;
        let err = orchestrator.sign(&envelope()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(!err.is_cancelled());
    }

    #[tokio::test]
    async fn test_no_session_is_unavailable() {
        let manager = Arc::new(WalletManager::new());
        let orchestrator = SigningOrchestrator::new(manager);
        let err = orchestrator.sign(&envelope()).await.unwrap_err();
        assert!(matches!(err, EngineError::WalletUnavailable(_)));
    }
}
