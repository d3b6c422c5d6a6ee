//! Bounded polling helpers.
//!
//! The remote application's timing is not under this crate's control, so
//! readiness checks poll a condition with backoff up to a hard ceiling
//! instead of sleeping for a fixed interval.

use std::future::Future;
use std::time::{Duration, Instant};

/// Configuration for polling operations
#[derive(Clone)]
pub struct PollConfig {
    pub timeout_ms: u64,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub use_exponential_backoff: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10000,
            initial_interval_ms: 100,
            max_interval_ms: 500,
            use_exponential_backoff: true,
        }
    }
}

impl PollConfig {
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            ..Self::default()
        }
    }
}

/// Generic polling function with optional exponential backoff
///
/// Calls `check_fn` repeatedly until it returns `true` or the timeout is
/// reached. Returns `true` if the condition was met, `false` if timed out.
pub async fn wait_until<F, Fut>(check_fn: F, config: PollConfig) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut interval = config.initial_interval_ms;

    while start.elapsed() < timeout {
        if check_fn().await {
            return true;
        }

        tokio::time::sleep(Duration::from_millis(interval)).await;

        if config.use_exponential_backoff {
            interval = (interval * 3 / 2).min(config.max_interval_ms);
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_true_once_condition_holds() {
        let calls = AtomicU32::new(0);
        let ok = wait_until(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                calls.load(Ordering::SeqCst) >= 3
            },
            PollConfig {
                timeout_ms: 2000,
                initial_interval_ms: 1,
                max_interval_ms: 5,
                use_exponential_backoff: false,
            },
        )
        .await;
        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_at_the_ceiling() {
        let ok = wait_until(|| async { false }, PollConfig::with_timeout(20)).await;
        assert!(!ok);
    }
}
