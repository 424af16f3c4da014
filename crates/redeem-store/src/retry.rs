//! Bounded retry around the store's transaction primitive.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::records::{ReadSet, WriteSet};
use crate::traits::RedemptionStore;

/// Jittered exponential backoff for transaction retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64, max_delay_ms: u64, jitter_pct: f64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            jitter_pct,
        }
        .clamped()
    }

    /// Pull every field into its usable range: at least one attempt, a
    /// non-zero base delay, a cap no lower than the base, jitter in `[0, 1]`.
    pub fn clamped(self) -> Self {
        let base_delay_ms = self.base_delay_ms.max(1);
        let jitter_pct = if self.jitter_pct.is_nan() {
            0.0
        } else {
            self.jitter_pct.clamp(0.0, 1.0)
        };
        Self {
            max_attempts: self.max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: self.max_delay_ms.max(base_delay_ms),
            jitter_pct,
        }
    }

    pub fn next_delay(&self, attempt: usize) -> Duration {
        let exp = 2_u64.saturating_pow(attempt.min(u32::MAX as usize) as u32);
        let delay = self.base_delay_ms.saturating_mul(exp).min(self.max_delay_ms);
        let jittered = if self.jitter_pct > 0.0 {
            let spread = (delay as f64 * self.jitter_pct) as i64;
            let delta = rand::thread_rng().gen_range(-spread..=spread);
            delay.saturating_add_signed(delta)
        } else {
            delay
        };
        Duration::from_millis(jittered)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 10, 500, 0.2)
    }
}

/// What a transaction function hands back: the writes to commit and the
/// value to return once they are durable.
#[derive(Debug)]
pub struct TxPlan<T> {
    pub writes: WriteSet,
    pub output: T,
}

/// Why a transaction did not commit.
#[derive(Debug)]
pub enum TxError<E> {
    /// The transaction function refused; nothing was written.
    Aborted(E),
    /// A non-retryable store fault.
    Store(StoreError),
    /// Every attempt hit a retryable store error.
    Exhausted { attempts: usize, last: StoreError },
}

/// Run `f` as one atomic unit against `code` and the pool.
///
/// Each attempt reads a fresh [`ReadSet`], lets `f` derive writes from it,
/// and commits them against the versions read. Retryable store errors
/// (conflicts, unavailability) restart the attempt after a backoff delay,
/// up to `policy.max_attempts` attempts. `f` may run more than once, so it
/// must not have side effects outside its return value.
pub async fn run_transaction<S, F, T, E>(
    store: &S,
    code: &str,
    policy: &RetryPolicy,
    mut f: F,
) -> Result<T, TxError<E>>
where
    S: RedemptionStore + ?Sized,
    F: FnMut(&ReadSet) -> Result<TxPlan<T>, E>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = match store.read(code).await {
            Ok(reads) => match f(&reads) {
                Ok(plan) => {
                    let versions = reads.versions();
                    match store.commit(&versions, plan.writes).await {
                        Ok(()) => return Ok(plan.output),
                        Err(e) => e,
                    }
                }
                Err(e) => return Err(TxError::Aborted(e)),
            },
            Err(e) => e,
        };

        if !result.is_retryable() {
            return Err(TxError::Store(result));
        }
        if attempt >= policy.max_attempts {
            warn!(attempts = attempt, error = %result, "transaction retries exhausted");
            return Err(TxError::Exhausted {
                attempts: attempt,
                last: result,
            });
        }
        let delay = policy.next_delay(attempt - 1);
        debug!(attempt, ?delay, error = %result, "retrying transaction");
        sleep(delay).await;
    }
}
