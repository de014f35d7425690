//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Log level configurable via RUST_LOG
//!
//! Secrets (master keys, decrypted seeds) are never logged anywhere in the
//! crate; this module only wires the subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops (useful in tests).
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "funding_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
