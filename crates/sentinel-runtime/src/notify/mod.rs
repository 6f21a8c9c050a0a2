//! Report Delivery
//!
//! A `Notifier` pushes a rendered report somewhere a human will read it.

mod telegram;

pub use telegram::{TelegramConfig, TelegramNotifier};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, RuntimeError};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one markdown message
    async fn send(&self, text: &str) -> Result<()>;

    fn name(&self) -> &str;
}

/// How often and how patiently to retry a delivery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,

    /// Wait after the first failure; the n-th failure waits n times this
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Send with linear back-off.
///
/// Stops early on errors that cannot succeed on retry (bad request, API
/// rejection) and reports the last error seen.
pub async fn send_with_retry(
    notifier: &dyn Notifier,
    text: &str,
    policy: RetryPolicy,
) -> Result<()> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match notifier.send(text).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        if attempt >= attempts || !err.is_retryable() {
            return Err(RuntimeError::Delivery {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        tracing::warn!(
            "{} delivery attempt {}/{} failed: {}",
            notifier.name(),
            attempt,
            attempts,
            err
        );
        tokio::time::sleep(policy.base_delay * attempt).await;
    }
}

/// Writes reports to the log instead of delivering them
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        tracing::info!("Report:\n{}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "Log"
    }
}
