//! Per-project issuer account custody.
//!
//! # Security
//! - Secret seeds are generated here, encrypted immediately, and persisted
//!   only in encrypted form
//! - Decryption happens on demand, inside the one signing call that needs
//!   it; plaintext is never cached or returned
//! - Keys are never logged

use ed25519_dalek::SigningKey;
use std::sync::Arc;

use crate::config::schema::NetworkKind;
use crate::custody::crypto::{MasterKey, SecretBox};
use crate::error::{EngineError, Result};
use crate::ledger::envelope::{unix_now, TransactionEnvelope};
use crate::ledger::horizon::HorizonClient;
use crate::ledger::strkey;
use crate::store::{InsertOutcome, Store, TransactionLog, TxType};

/// A project's minting authority as persisted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuerAccount {
    /// One issuer per project; unique in the store.
    pub project_id: String,
    /// Public account id (`G…`).
    pub public_key: String,
    /// Base64 `nonce ‖ ciphertext ‖ tag` of the strkey seed.
    pub encrypted_secret: String,
    pub network: NetworkKind,
    pub is_funded: bool,
    /// Epoch seconds.
    pub created_at: u64,
}

/// Creates, funds and signs with per-project issuer accounts.
pub struct IssuerCustodian {
    store: Arc<dyn Store>,
    horizon: Arc<HorizonClient>,
    master_key: MasterKey,
    network: NetworkKind,
}

impl IssuerCustodian {
    pub fn new(
        store: Arc<dyn Store>,
        horizon: Arc<HorizonClient>,
        master_key: MasterKey,
        network: NetworkKind,
    ) -> Self {
        Self {
            store,
            horizon,
            master_key,
            network,
        }
    }

    /// Fetch or lazily create the project's issuer account.
    ///
    /// Idempotent under races: two concurrent calls yield exactly one
    /// persisted account: the store's uniqueness constraint decides, and
    /// the loser treats the duplicate as success.
    pub async fn ensure_issuer(&self, project_id: &str) -> Result<IssuerAccount> {
        if let Some(existing) = self.store.issuer_for_project(project_id).await? {
            return Ok(existing);
        }

        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        let public_key = strkey::encode_account_id(signing_key.verifying_key().as_bytes());
        let seed = strkey::encode_seed(&signing_key.to_bytes());
        let encrypted_secret = SecretBox::encrypt(&self.master_key, seed.as_bytes())?.to_base64();

        let account = IssuerAccount {
            project_id: project_id.to_string(),
            public_key: public_key.clone(),
            encrypted_secret,
            network: self.network,
            is_funded: false,
            created_at: unix_now(),
        };

        match self.store.insert_issuer(account.clone()).await? {
            InsertOutcome::Inserted => {
                tracing::info!(project = %project_id, issuer = %public_key, "Issuer account created");
            }
            InsertOutcome::Duplicate => {
                // Lost the race; the other writer's account is the account.
                return self
                    .store
                    .issuer_for_project(project_id)
                    .await?
                    .ok_or_else(|| EngineError::Store("issuer vanished after duplicate insert".into()));
            }
        }

        if self.network.is_test() {
            self.fund(project_id).await?;
            return self
                .store
                .issuer_for_project(project_id)
                .await?
                .ok_or_else(|| EngineError::Store("issuer vanished after funding".into()));
        }

        tracing::warn!(
            project = %project_id,
            issuer = %public_key,
            "Issuer created unfunded; public-network funding is a manual transfer"
        );
        Ok(account)
    }

    /// Fund the project's issuer account.
    ///
    /// Test network: a faucet call, after which the account is marked
    /// funded. Public network: explicitly unsupported; fund the printed
    /// public key with an out-of-band transfer and mark it funded through
    /// the platform's ops tooling.
    pub async fn fund(&self, project_id: &str) -> Result<()> {
        if !self.network.is_test() {
            return Err(EngineError::UnsupportedOperation(
                "issuer funding on the public network is a manual out-of-band transfer".into(),
            ));
        }
        let account = self
            .store
            .issuer_for_project(project_id)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("project {} has no issuer", project_id)))?;
        if account.is_funded {
            return Ok(());
        }

        match self.horizon.fund_account(&account.public_key).await {
            Ok(()) => {
                self.store.mark_issuer_funded(project_id).await?;
                self.store
                    .append_tx_log(TransactionLog::success(TxType::Funding, account.public_key.clone()))
                    .await?;
                tracing::info!(project = %project_id, "Issuer account funded via faucet");
                Ok(())
            }
            Err(e) => {
                self.store
                    .append_tx_log(TransactionLog::failure(TxType::Funding, None, e.to_string()))
                    .await?;
                Err(e)
            }
        }
    }

    /// Sign `envelope` with the project's issuer key.
    ///
    /// The seed is decrypted, used, and dropped inside this call.
    pub async fn sign_as_issuer(
        &self,
        project_id: &str,
        envelope: &TransactionEnvelope,
    ) -> Result<TransactionEnvelope> {
        let account = self
            .store
            .issuer_for_project(project_id)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("project {} has no issuer", project_id)))?;

        let seed_bytes = SecretBox::from_base64(&account.encrypted_secret)?
            .decrypt(&self.master_key)?;
        let seed_str = std::str::from_utf8(&seed_bytes)
            .map_err(|_| EngineError::CustodyFailure("decrypted seed is not valid strkey".into()))?;
        let seed = strkey::decode_seed(seed_str)
            .map_err(|_| EngineError::CustodyFailure("decrypted seed does not decode".into()))?;

        let signing_key = SigningKey::from_bytes(&seed);
        let mut signed = envelope.clone();
        signed.sign(&signing_key);
        Ok(signed)
    }
}

impl std::fmt::Debug for IssuerCustodian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerCustodian")
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
