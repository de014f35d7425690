//! Redirect/intent-based web wallet provider.
//!
//! The backend is a hosted web signer, so there is nothing to inject and
//! nothing to poll: the provider always reports available. `connect` and
//! `sign` open an out-of-process flow (a browser tab or app intent) and
//! suspend until the user completes or abandons it; the adapter behind
//! [`WalletRpc`] owns that round trip.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::wallet::{WalletProvider, WalletRpc, WalletSession};

pub struct RedirectProvider {
    id: String,
    rpc: Arc<dyn WalletRpc>,
}

impl RedirectProvider {
    pub fn new(id: impl Into<String>, rpc: Arc<dyn WalletRpc>) -> Self {
        Self { id: id.into(), rpc }
    }
}

#[async_trait]
impl WalletProvider for RedirectProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn detect(&self) -> bool {
        // Hosted flow: there is no local install to detect.
        true
    }

    async fn connect(&self) -> Result<WalletSession> {
        let address = self.rpc.get_public_key().await?;
        let network = self.rpc.get_network().await?;
        tracing::info!(provider = %self.id, address = %address, "Wallet connected via redirect flow");
        Ok(WalletSession::new(&self.id, address, network))
    }

    async fn sign(&self, envelope_b64: &str, network: &str) -> Result<String> {
        self.rpc.sign_transaction(envelope_b64, network).await
    }

    async fn disconnect(&self) {
        tracing::debug!(provider = %self.id, "Redirect wallet disconnected");
    }
}
