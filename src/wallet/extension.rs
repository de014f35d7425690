//! Extension-injected wallet provider.
//!
//! The extension injects its API asynchronously, so availability is polled:
//! up to `detect_attempts` probes at `detect_interval` (25 × 200ms by
//! default, ~5s) before the provider is declared not installed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::RetryConfig;
use crate::error::{EngineError, Result};
use crate::resilience::retry::poll_until;
use crate::wallet::{WalletProvider, WalletRpc, WalletSession};

pub struct ExtensionProvider {
    id: String,
    rpc: Arc<dyn WalletRpc>,
    detect_attempts: u32,
    detect_interval: Duration,
}

impl ExtensionProvider {
    pub fn new(id: impl Into<String>, rpc: Arc<dyn WalletRpc>, retries: &RetryConfig) -> Self {
        Self {
            id: id.into(),
            rpc,
            detect_attempts: retries.detect_attempts,
            detect_interval: Duration::from_millis(retries.detect_interval_ms),
        }
    }
}

#[async_trait]
impl WalletProvider for ExtensionProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn detect(&self) -> bool {
        let rpc = self.rpc.clone();
        poll_until(self.detect_attempts, self.detect_interval, move || {
            let rpc = rpc.clone();
            async move { rpc.is_available().await }
        })
        .await
    }

    async fn connect(&self) -> Result<WalletSession> {
        if !self.detect().await {
            return Err(EngineError::WalletUnavailable(self.id.clone()));
        }
        let address = self.rpc.get_public_key().await?;
        let network = self.rpc.get_network().await?;
        tracing::info!(provider = %self.id, address = %address, "Wallet connected");
        Ok(WalletSession::new(&self.id, address, network))
    }

    async fn sign(&self, envelope_b64: &str, network: &str) -> Result<String> {
        self.rpc.sign_transaction(envelope_b64, network).await
    }

    async fn disconnect(&self) {
        tracing::debug!(provider = %self.id, "Wallet disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SigningStage;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Becomes available after a fixed number of probes.
    struct LateRpc {
        probes: AtomicU32,
        available_after: u32,
    }

    #[async_trait]
    impl WalletRpc for LateRpc {
        async fn is_available(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst) + 1 >= self.available_after
        }
        async fn get_public_key(&self) -> Result<String> {
            Ok("GPUB".into())
        }
        async fn get_network(&self) -> Result<String> {
            Ok("Test SDF Network ; September 2015".into())
        }
        async fn sign_transaction(&self, envelope_b64: &str, _network: &str) -> Result<String> {
            Ok(envelope_b64.to_string())
        }
    }

    struct RejectingRpc;

    #[async_trait]
    impl WalletRpc for RejectingRpc {
        async fn is_available(&self) -> bool {
            true
        }
        async fn get_public_key(&self) -> Result<String> {
            Ok("GPUB".into())
        }
        async fn get_network(&self) -> Result<String> {
            Ok("Test SDF Network ; September 2015".into())
        }
        async fn sign_transaction(&self, _envelope_b64: &str, _network: &str) -> Result<String> {
            Err(EngineError::UserCancelled(SigningStage::Sign))
        }
    }

    fn fast_retries(attempts: u32) -> RetryConfig {
        RetryConfig {
            detect_attempts: attempts,
            detect_interval_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_detect_finds_late_injection() {
        let rpc = Arc::new(LateRpc {
            probes: AtomicU32::new(0),
            available_after: 3,
        });
        let provider = ExtensionProvider::new("extension", rpc.clone(), &fast_retries(25));
        assert!(provider.detect().await);
        assert_eq!(rpc.probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_detect_gives_up_after_bounded_polls() {
        let rpc = Arc::new(LateRpc {
            probes: AtomicU32::new(0),
            available_after: u32::MAX,
        });
        let provider = ExtensionProvider::new("extension", rpc.clone(), &fast_retries(5));
        assert!(!provider.detect().await);
        assert_eq!(rpc.probes.load(Ordering::SeqCst), 5);

        let err = provider.connect().await.unwrap_err();
        assert!(matches!(err, EngineError::WalletUnavailable(_)));
    }

    #[tokio::test]
    async fn test_rejection_stays_cancellation() {
        let provider = ExtensionProvider::new("extension", Arc::new(RejectingRpc), &fast_retries(1));
        let err = provider.sign("AAAA", "testnet").await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
