//! Multi-wallet kit provider.
//!
//! Wraps several concrete wallets behind one provider object. `connect`
//! selects the first wallet whose backend responds and holds it as the
//! kit's internal handle; `disconnect` must release that handle or the kit
//! keeps the underlying wallet locked.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{EngineError, Result};
use crate::wallet::{WalletProvider, WalletRpc, WalletSession};

pub struct KitProvider {
    id: String,
    wallets: Vec<(String, Arc<dyn WalletRpc>)>,
    /// The selected wallet, held for the lifetime of one session.
    selected: RwLock<Option<Arc<dyn WalletRpc>>>,
}

impl KitProvider {
    pub fn new(id: impl Into<String>, wallets: Vec<(String, Arc<dyn WalletRpc>)>) -> Self {
        Self {
            id: id.into(),
            wallets,
            selected: RwLock::new(None),
        }
    }

    /// True while the kit holds a selected-wallet handle.
    pub async fn holds_handle(&self) -> bool {
        self.selected.read().await.is_some()
    }
}

#[async_trait]
impl WalletProvider for KitProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn detect(&self) -> bool {
        for (_, rpc) in &self.wallets {
            if rpc.is_available().await {
                return true;
            }
        }
        false
    }

    async fn connect(&self) -> Result<WalletSession> {
        for (name, rpc) in &self.wallets {
            if !rpc.is_available().await {
                continue;
            }
            let address = rpc.get_public_key().await?;
            let network = rpc.get_network().await?;
            *self.selected.write().await = Some(rpc.clone());
            tracing::info!(provider = %self.id, wallet = %name, address = %address, "Kit wallet connected");
            return Ok(WalletSession::new(&self.id, address, network));
        }
        Err(EngineError::WalletUnavailable(self.id.clone()))
    }

    async fn sign(&self, envelope_b64: &str, network: &str) -> Result<String> {
        let selected = self.selected.read().await.clone();
        match selected {
            Some(rpc) => rpc.sign_transaction(envelope_b64, network).await,
            None => Err(EngineError::WalletUnavailable(self.id.clone())),
        }
    }

    async fn disconnect(&self) {
        // Releasing the handle is what actually frees the inner wallet.
        *self.selected.write().await = None;
        tracing::debug!(provider = %self.id, "Kit handle released");
    }
}
