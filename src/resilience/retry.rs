//! Fixed-interval bounded retry.
//!
//! Replaces open-ended polling loops: a fixed number of attempts at a fixed
//! interval, then a definite outcome. Used for extension-wallet detection and
//! trustline settlement confirmation.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Poll `op` until it yields `Some(T)` or `max_attempts` is exhausted.
///
/// The first attempt runs immediately; subsequent attempts are spaced by
/// `interval`. An `Err` from `op` aborts the loop and propagates: transport
/// failure is not the same as "not there yet".
pub async fn retry_fixed<T, E, F, Fut>(
    max_attempts: u32,
    interval: Duration,
    mut op: F,
) -> std::result::Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
{
    for attempt in 1..=max_attempts {
        match op().await? {
            Some(value) => return Ok(Some(value)),
            None => {
                if attempt < max_attempts {
                    sleep(interval).await;
                }
            }
        }
    }
    Ok(None)
}

/// Infallible variant for boolean probes (e.g. provider availability).
///
/// Returns true as soon as `op` does, false after `max_attempts` misses.
pub async fn poll_until<F, Fut>(max_attempts: u32, interval: Duration, mut op: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=max_attempts {
        if op().await {
            return true;
        }
        if attempt < max_attempts {
            sleep(interval).await;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retry_fixed_finds_late_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let result: Result<Option<u32>, ()> =
            retry_fixed(5, Duration::from_millis(1), move || {
                let c = c.clone();
                async move {
                    let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(if n >= 3 { Some(n) } else { None })
                }
            })
            .await;

        assert_eq!(result.unwrap(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fixed_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let result: Result<Option<u32>, ()> =
            retry_fixed(4, Duration::from_millis(1), move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            })
            .await;

        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_fixed_propagates_errors() {
        let result: Result<Option<u32>, &str> =
            retry_fixed(5, Duration::from_millis(1), || async { Err("down") }).await;
        assert_eq!(result.unwrap_err(), "down");
    }

    #[tokio::test]
    async fn test_poll_until_bounded() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();

        let found = poll_until(3, Duration::from_millis(1), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                false
            }
        })
        .await;

        assert!(!found);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
