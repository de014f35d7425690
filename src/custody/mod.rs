//! Issuer key custody subsystem.
//!
//! # Security Constraints
//! - The master key comes from config/environment, never from a persisted
//!   record
//! - Secrets are encrypted with AES-256-GCM before they touch the store
//! - Decrypted seeds live only inside the signing call that needs them
//! - Nothing in this module logs key material

pub mod crypto;
pub mod issuer;

pub use crypto::{MasterKey, SecretBox};
pub use issuer::{IssuerAccount, IssuerCustodian};
