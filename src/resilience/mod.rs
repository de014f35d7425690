//! Bounded retry and backoff helpers.
//!
//! # Design Decisions
//! - Polling is always bounded: fixed interval, fixed max attempts,
//!   returning a definite found/not-found outcome
//! - Jittered exponential backoff for transport-level retries

pub mod backoff;
pub mod retry;

pub use backoff::calculate_backoff;
pub use retry::{poll_until, retry_fixed};
