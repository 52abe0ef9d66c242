//! Retry for writer-lock contention.
//!
//! Every connection carries a `busy_timeout`, so `SQLite` already waits on a
//! locked database before giving up. Starting an IMMEDIATE transaction can
//! still fail with `database is locked` when many writers pile up beyond
//! that window; beginning the transaction again after a short backoff is
//! always safe because nothing has been written yet.

use std::future::Future;
use std::time::Duration;

use crate::error::{DatabaseError, is_busy_error};

/// Configuration for retry behavior on a locked database.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails with a non-busy error, or attempts run out.
///
/// # Errors
///
/// Returns the last error from `op`.
pub async fn retry_busy<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, DatabaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, libsql::Error>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if is_busy_error(&e) && attempt < config.max_attempts => {
                let delay = config.delay_for(attempt);
                tracing::debug!(attempt, ?delay, "database locked, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
