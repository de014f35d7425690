//! Engine-wide error taxonomy.
//!
//! # Design Decisions
//! - One enum; callers branch on variants, never on message strings
//! - User cancellation is a distinct variant, not a failure message
//! - Per-benefit issuance failures carry the benefit id so the parent
//!   donation flow can log and continue

use thiserror::Error;

/// Where a user-facing signing interaction was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStage {
    /// Cancelled while approving the wallet connection.
    Connect,
    /// Cancelled while approving a transaction signature.
    Sign,
}

impl std::fmt::Display for SigningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningStage::Connect => write!(f, "connect"),
            SigningStage::Sign => write!(f, "sign"),
        }
    }
}

/// Errors that can occur across the payment and issuance engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed address, amount, asset or envelope. Rejected before any
    /// network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Wallet provider was not detected after bounded retry, or has no
    /// usable session.
    #[error("wallet provider '{0}' is not available")]
    WalletUnavailable(String),

    /// The user explicitly rejected a connect or sign prompt. Benign;
    /// never auto-retried.
    #[error("user cancelled at {0}")]
    UserCancelled(SigningStage),

    /// The ledger rejected a submitted envelope. Carries the ledger's
    /// diagnostic. Not auto-retried: the source sequence is now stale.
    #[error("ledger rejected submission: {diagnostic}")]
    LedgerSubmissionFailed { diagnostic: String },

    /// A settled transaction did not match expectations. Terminal;
    /// nothing is recorded.
    #[error("payment verification failed: {0}")]
    VerificationFailed(String),

    /// The transaction hash was already recorded. Rejected before any
    /// ledger call.
    #[error("transaction {0} is already recorded")]
    DuplicateTransaction(String),

    /// A single benefit could not be issued. Logged and skipped; does not
    /// fail the parent donation.
    #[error("issuance of benefit {benefit_id} failed: {reason}")]
    IssuanceFailed { benefit_id: String, reason: String },

    /// Key decryption or integrity failure. Fatal; no partial signing is
    /// attempted.
    #[error("custody failure: {0}")]
    CustodyFailure(String),

    /// The operation is not supported in the current configuration
    /// (e.g. faucet funding on the public network).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Ledger API transport failure (connection, timeout, malformed
    /// response).
    #[error("ledger request failed: {0}")]
    Horizon(String),

    /// Backing store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    /// True if this error is an explicit user cancellation rather than a
    /// technical failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::UserCancelled(_))
    }

    /// True if this error is terminal for the donation (never retried with
    /// the same signed envelope).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineError::VerificationFailed(_) | EngineError::DuplicateTransaction(_)
        )
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
