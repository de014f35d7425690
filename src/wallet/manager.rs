//! Provider registry and session management.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{EngineError, Result};
use crate::wallet::{WalletProvider, WalletSession};

/// Registry of wallet providers plus the single active session.
///
/// A manager is scoped to one calling context (one user session); it is not
/// process-wide state. At most one wallet session is active per manager, and
/// connecting replaces any prior session.
pub struct WalletManager {
    providers: HashMap<String, Arc<dyn WalletProvider>>,
    active: RwLock<Option<ActiveSession>>,
}

struct ActiveSession {
    provider: Arc<dyn WalletProvider>,
    session: WalletSession,
}

impl WalletManager {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            active: RwLock::new(None),
        }
    }

    /// Register a provider under its id.
    pub fn register(&mut self, provider: Arc<dyn WalletProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Registered provider ids.
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Connect to the named provider, replacing any existing session.
    pub async fn connect(&self, provider_id: &str) -> Result<WalletSession> {
        let provider = self
            .providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| EngineError::Validation(format!("unknown wallet provider '{}'", provider_id)))?;

        // Replace semantics: the old session is gone even if the new
        // connect fails.
        self.disconnect().await;

        let session = provider.connect().await?;
        *self.active.write().await = Some(ActiveSession {
            provider,
            session: session.clone(),
        });
        Ok(session)
    }

    /// The active session, if any.
    pub async fn session(&self) -> Option<WalletSession> {
        self.active.read().await.as_ref().map(|a| a.session.clone())
    }

    /// The provider behind the active session.
    pub(crate) async fn active_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.active.read().await.as_ref().map(|a| a.provider.clone())
    }

    /// Disconnect and drop the active session, if any.
    pub async fn disconnect(&self) {
        if let Some(active) = self.active.write().await.take() {
            active.provider.disconnect().await;
            tracing::info!(provider = %active.session.provider_id, "Wallet session closed");
        }
    }
}

impl Default for WalletManager {
    fn default() -> Self {
        Self::new()
    }
}
