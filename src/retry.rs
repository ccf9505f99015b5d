use crate::config::MovementRetryConfig;
use crate::errors::ServiceError;
use rand::Rng;
use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry tuning for write-conflict retries. Business-rule failures are
/// terminal and never pass through here.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,
    /// Base delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(500),
        }
    }
}

impl From<&MovementRetryConfig> for RetryConfig {
    fn from(cfg: &MovementRetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms.max(cfg.base_delay_ms)),
        }
    }
}

/// Exponential backoff with full jitter, capped at `max_delay`.
pub fn backoff_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
    let exp = cfg
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp.min(cfg.max_delay);
    if capped.is_zero() {
        return capped;
    }
    let jitter_micros = rand::thread_rng().gen_range(0..=capped.as_micros() as u64);
    Duration::from_micros(jitter_micros)
}

/// Whether a storage error is a transient write conflict worth retrying.
///
/// Covers serialization failures and deadlocks surfaced by Postgres and the
/// lock-busy errors surfaced by SQLite.
pub fn is_retryable_conflict(err: &DbErr) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("could not serialize")
        || msg.contains("deadlock")
        || msg.contains("lock timeout")
        || msg.contains("database is locked")
        || msg.contains("database table is locked")
}

fn retryable_service_error(err: &ServiceError) -> bool {
    match err {
        ServiceError::DatabaseError(db_err) => is_retryable_conflict(db_err),
        _ => false,
    }
}

/// Runs `operation` up to `cfg.max_attempts` times, sleeping a jittered
/// backoff between attempts. Exhaustion surfaces as `Conflict` so callers can
/// retry at their own level.
pub async fn with_conflict_retry<F, Fut, T>(
    cfg: &RetryConfig,
    mut operation: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("Operation succeeded after {} attempts", attempt);
                }
                return Ok(result);
            }
            Err(err) if retryable_service_error(&err) => {
                if attempt >= cfg.max_attempts {
                    warn!("Write conflict persisted after {} attempts: {}", attempt, err);
                    return Err(ServiceError::Conflict(format!(
                        "write conflict after {} attempts: {}",
                        attempt, err
                    )));
                }
                let delay = backoff_delay(cfg, attempt);
                debug!(
                    "Attempt {} hit a write conflict ({}); retrying in {:?}",
                    attempt, err, delay
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
