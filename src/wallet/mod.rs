//! Wallet provider abstraction.
//!
//! # Data Flow
//! ```text
//! WalletRpc (external provider API: isAvailable / getPublicKey / sign)
//!     → provider variants (extension.rs, redirect.rs, kit.rs)
//!     → manager.rs (registry + the single active session)
//! ```
//!
//! # Design Decisions
//! - A closed set of provider variants behind one capability interface
//!   `{detect, connect, sign, disconnect}`, selected via a registry keyed
//!   by provider id
//! - The active session is a value scoped to its manager, not process-wide
//!   state; connecting replaces any prior session
//! - User cancellation surfaces as `UserCancelled`, never as a technical
//!   failure

pub mod extension;
pub mod kit;
pub mod manager;
pub mod redirect;

use async_trait::async_trait;

use crate::error::Result;
use crate::ledger::envelope::unix_now;

pub use extension::ExtensionProvider;
pub use kit::KitProvider;
pub use manager::WalletManager;
pub use redirect::RedirectProvider;

/// An active signing relationship with an external wallet.
///
/// Never persisted; replaced on re-connect, destroyed on disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub provider_id: String,
    /// The wallet's public account id (`G…`).
    pub address: String,
    /// Passphrase of the network the wallet reports.
    pub network: String,
    /// Epoch seconds when the session was established.
    pub connected_at: u64,
}

impl WalletSession {
    pub(crate) fn new(provider_id: &str, address: String, network: String) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            address,
            network,
            connected_at: unix_now(),
        }
    }
}

/// Capability interface over one external signing backend.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Registry key for this provider.
    fn id(&self) -> &str;

    /// Whether the backend is reachable at all. May poll; always bounded.
    async fn detect(&self) -> bool;

    /// Establish a session. Suspends on the user approving in the
    /// provider's own UI.
    async fn connect(&self) -> Result<WalletSession>;

    /// Sign a base64 envelope for `network`. Suspends indefinitely on the
    /// human; callers add their own timeout if they want one.
    async fn sign(&self, envelope_b64: &str, network: &str) -> Result<String>;

    /// Tear down the session and release any backend handle.
    async fn disconnect(&self);
}

/// The raw API surface an external wallet exposes.
///
/// Implementations adapt the concrete transport (injected extension bridge,
/// redirect/intent flow, kit object). Rejection by the user must be returned
/// as [`crate::error::EngineError::UserCancelled`]; anything else is a
/// technical failure.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    async fn is_available(&self) -> bool;
    async fn get_public_key(&self) -> Result<String>;
    async fn get_network(&self) -> Result<String>;
    async fn sign_transaction(&self, envelope_b64: &str, network: &str) -> Result<String>;
}
