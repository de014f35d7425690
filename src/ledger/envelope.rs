//! Transaction envelopes.
//!
//! # Responsibilities
//! - Model the operation set of a not-yet-submitted transaction
//! - Canonical JSON + base64 wire form exchanged with wallet providers
//!   and the ledger API
//! - Network-scoped hashing and ed25519 signatures
//!
//! An envelope is valid for a short window after it is built; an expired,
//! unsubmitted envelope must be rebuilt, never resubmitted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{EngineError, Result};
use crate::ledger::amount::Amount;
use crate::ledger::asset::Asset;

/// Fee charged per operation, in stroops.
pub const BASE_FEE: u32 = 100;

/// How long a freshly built envelope stays submittable.
pub const VALIDITY_WINDOW_SECS: u64 = 180;

/// Current wall-clock time as seconds since the epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Absolute validity window of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    /// Window starting now, open for [`VALIDITY_WINDOW_SECS`].
    pub fn standard() -> Self {
        let now = unix_now();
        Self {
            min_time: now,
            max_time: now + VALIDITY_WINDOW_SECS,
        }
    }
}

/// Optional transaction memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Memo {
    None,
    Text(String),
}

impl Memo {
    /// Build a text memo, enforcing the ledger's 28-byte limit.
    pub fn text(s: &str) -> Result<Self> {
        if s.len() > 28 {
            return Err(EngineError::Validation(format!(
                "memo exceeds 28 bytes: '{}'",
                s
            )));
        }
        Ok(Memo::Text(s.to_string()))
    }
}

/// A single ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Move `amount` of `asset` to `destination`.
    Payment {
        destination: String,
        asset: Asset,
        amount: Amount,
    },
    /// Open (or adjust) a trustline from the transaction source to `asset`.
    ChangeTrust { asset: Asset, limit: Amount },
}

/// The signable body of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Source account (`G…`). Its sequence number orders submission.
    pub source: String,
    /// Total fee in stroops ([`BASE_FEE`] per operation).
    pub fee: u32,
    /// Sequence number this transaction consumes.
    pub sequence: i64,
    pub time_bounds: TimeBounds,
    pub memo: Memo,
    pub operations: Vec<Operation>,
}

/// A signature over the envelope hash, hinted by the signer's key tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    /// Hex of the last four bytes of the signing public key.
    pub hint: String,
    /// Base64 ed25519 signature bytes.
    pub signature: String,
}

/// A transaction plus the network it is bound to and any signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    /// Passphrase of the target network; part of the hash, so an envelope
    /// signed for one network cannot replay on another.
    pub network_passphrase: String,
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    /// Wire form: canonical JSON, base64-encoded.
    pub fn to_base64(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| EngineError::Validation(format!("unencodable envelope: {}", e)))?;
        Ok(BASE64.encode(json))
    }

    /// Decode the wire form.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s)
            .map_err(|e| EngineError::Validation(format!("envelope is not valid base64: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::Validation(format!("envelope does not decode: {}", e)))
    }

    /// Network-scoped transaction hash: `sha256(sha256(passphrase) ‖ tx-json)`.
    pub fn hash(&self) -> [u8; 32] {
        let network_id = Sha256::digest(self.network_passphrase.as_bytes());
        let tx_json = serde_json::to_vec(&self.tx).expect("transaction body serializes");
        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(&tx_json);
        hasher.finalize().into()
    }

    /// Hex form of [`hash`](Self::hash), as carried in `tx_hash` fields.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    /// Append a signature over the envelope hash.
    pub fn sign(&mut self, key: &SigningKey) {
        let signature = key.sign(&self.hash());
        let public = key.verifying_key().to_bytes();
        self.signatures.push(DecoratedSignature {
            hint: hex::encode(&public[28..]),
            signature: BASE64.encode(signature.to_bytes()),
        });
    }

    /// True once the validity window has closed.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.tx.time_bounds.max_time
    }

    /// The payment operations in this envelope.
    pub fn payments(&self) -> impl Iterator<Item = &Operation> {
        self.tx
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::Payment { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::strkey::encode_account_id;

    fn sample_envelope() -> TransactionEnvelope {
        TransactionEnvelope {
            tx: Transaction {
                source: encode_account_id(&[1u8; 32]),
                fee: BASE_FEE,
                sequence: 42,
                time_bounds: TimeBounds::standard(),
                memo: Memo::None,
                operations: vec![Operation::Payment {
                    destination: encode_account_id(&[2u8; 32]),
                    asset: Asset::Native,
                    amount: Amount::parse("10").unwrap(),
                }],
            },
            network_passphrase: "Test SDF Network ; September 2015".into(),
            signatures: Vec::new(),
        }
    }

    #[test]
    fn test_base64_round_trip() {
        let envelope = sample_envelope();
        let encoded = envelope.to_base64().unwrap();
        let decoded = TransactionEnvelope::from_base64(&encoded).unwrap();
        assert_eq!(decoded, envelope);
        assert_eq!(decoded.payments().count(), 1);
    }

    #[test]
    fn test_hash_is_network_scoped() {
        let envelope = sample_envelope();
        let mut other = envelope.clone();
        other.network_passphrase = "Public Global Network ; September 2015".into();
        assert_ne!(envelope.hash(), other.hash());
        assert_eq!(envelope.hash_hex().len(), 64);
    }

    #[test]
    fn test_hash_ignores_signatures() {
        let mut envelope = sample_envelope();
        let before = envelope.hash();
        let key = SigningKey::from_bytes(&[3u8; 32]);
        envelope.sign(&key);
        assert_eq!(envelope.hash(), before);
        assert_eq!(envelope.signatures.len(), 1);
    }

    #[test]
    fn test_signature_verifies() {
        use ed25519_dalek::{Signature, Verifier};

        let mut envelope = sample_envelope();
        let key = SigningKey::from_bytes(&[3u8; 32]);
        envelope.sign(&key);

        let sig_bytes = BASE64
            .decode(&envelope.signatures[0].signature)
            .unwrap();
        let signature = Signature::from_slice(&sig_bytes).unwrap();
        key.verifying_key()
            .verify(&envelope.hash(), &signature)
            .unwrap();
    }

    #[test]
    fn test_expiry() {
        let envelope = sample_envelope();
        let now = unix_now();
        assert!(!envelope.is_expired(now));
        assert!(envelope.is_expired(now + VALIDITY_WINDOW_SECS + 1));
    }

    #[test]
    fn test_memo_length_limit() {
        assert!(Memo::text("thanks for the coffee").is_ok());
        assert!(Memo::text("this memo is much too long to fit").is_err());
    }

    #[test]
    fn test_rejects_garbage_wire_forms() {
        assert!(TransactionEnvelope::from_base64("!!!").is_err());
        assert!(TransactionEnvelope::from_base64(&BASE64.encode(b"{}")).is_err());
    }
}
