// src/fetch/retry.rs

use std::future::Future;

use thiserror::Error;
use tracing::{error, warn};

/// Terminal failure of a retried dataset download.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{source_id}: download exhausted after {attempts} attempts: {last_error}")]
    Exhausted {
        source_id: String,
        attempts: u32,
        last_error: String,
    },
}

/// Immediate-retry policy for the dataset downloads: a fixed attempt budget,
/// no backoff, no jitter. Every error from the operation counts as retryable;
/// the operation covers download and parse together, so a malformed body is
/// retried the same as a network failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 10 }
    }
}

impl RetryPolicy {
    /// Drive `op` until it succeeds or the attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, source_id: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempts < self.max_attempts => {
                    warn!(source = source_id, attempt = attempts, error = %e, "retrying");
                }
                Err(e) => {
                    error!(source = source_id, attempts, error = %e, "exhausted retries");
                    return Err(FetchError::Exhausted {
                        source_id: source_id.to_string(),
                        attempts,
                        last_error: e.to_string(),
                    });
                }
            }
        }
    }
}
