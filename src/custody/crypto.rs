//! Secret-key encryption at rest.
//!
//! # Security
//! - AES-256-GCM only (authenticated encryption)
//! - Random 12-byte nonce per encryption
//! - 16-byte authentication tag stored with the ciphertext
//! - Master key lives in config/environment, never in a persisted record
//! - Decryption fails closed on any tamper or key mismatch

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::config::schema::CustodyConfig;
use crate::error::{EngineError, Result};

/// The 32-byte symmetric master key.
pub struct MasterKey([u8; 32]);

impl MasterKey {
    /// Parse a 64-character hex key.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key)
            .map_err(|_| EngineError::CustodyFailure("master key is not valid hex".into()))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| EngineError::CustodyFailure("master key must be 32 bytes".into()))?;
        Ok(Self(key))
    }

    /// Resolve the key from custody configuration: inline hex if set,
    /// otherwise the named environment variable.
    pub fn from_config(config: &CustodyConfig) -> Result<Self> {
        if let Some(hex_key) = &config.master_key_hex {
            return Self::from_hex(hex_key);
        }
        let hex_key = std::env::var(&config.master_key_env).map_err(|_| {
            EngineError::CustodyFailure(format!(
                "environment variable {} not set",
                config.master_key_env
            ))
        })?;
        Self::from_hex(&hex_key)
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material.
        f.debug_struct("MasterKey").finish_non_exhaustive()
    }
}

/// An encrypted secret: `nonce ‖ ciphertext ‖ tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBox {
    nonce: [u8; 12],
    ciphertext: Vec<u8>,
    tag: [u8; 16],
}

impl SecretBox {
    /// Encrypt `plaintext` under `key` with a fresh random nonce.
    pub fn encrypt(key: &MasterKey, plaintext: &[u8]) -> Result<Self> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut combined = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| EngineError::CustodyFailure("encryption failed".into()))?;

        // aes-gcm appends the tag; store it separately.
        let tag_offset = combined.len() - 16;
        let mut tag = [0u8; 16];
        tag.copy_from_slice(&combined[tag_offset..]);
        combined.truncate(tag_offset);

        Ok(Self {
            nonce: nonce.into(),
            ciphertext: combined,
            tag,
        })
    }

    /// Decrypt and authenticate. Any integrity or key failure is
    /// `CustodyFailure`; no partial plaintext is ever returned.
    pub fn decrypt(&self, key: &MasterKey) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
        let mut combined = self.ciphertext.clone();
        combined.extend_from_slice(&self.tag);
        cipher
            .decrypt(Nonce::from_slice(&self.nonce), combined.as_ref())
            .map_err(|_| EngineError::CustodyFailure("decryption failed: tampered ciphertext or wrong key".into()))
    }

    /// Storage form: base64 of `nonce ‖ ciphertext ‖ tag`.
    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(12 + self.ciphertext.len() + 16);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes.extend_from_slice(&self.tag);
        BASE64.encode(bytes)
    }

    /// Parse the storage form.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s)
            .map_err(|_| EngineError::CustodyFailure("stored secret is not valid base64".into()))?;
        if bytes.len() < 28 {
            return Err(EngineError::CustodyFailure("stored secret is truncated".into()));
        }
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&bytes[..12]);
        let mut tag = [0u8; 16];
        tag.copy_from_slice(&bytes[bytes.len() - 16..]);
        Ok(Self {
            nonce,
            ciphertext: bytes[12..bytes.len() - 16].to_vec(),
            tag,
        })
    }
}
