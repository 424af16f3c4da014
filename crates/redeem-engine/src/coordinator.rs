//! The redemption transaction coordinator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use redeem_decider::{display_symbols, Decider, Decision, RandomSource, Reels, ThreadRandom};
use redeem_store::{run_transaction, ReadSet, RedemptionStore, RetryPolicy, TxPlan, WriteSet};
use redeem_types::{OutcomeRecord, RequesterId, Symbol};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{RedeemError, RedeemResult};
use crate::public::PublicConfigReader;

/// What the caller learns from a successful redemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionResult {
    pub won: bool,
    pub reward_symbol: Option<Symbol>,
    pub display_symbols: Reels,
    pub reward_label: Option<String>,
    pub remaining_after: u64,
}

/// Orchestrates one redemption as a single atomic unit against the store.
///
/// The coordinator holds no mutable state of its own. Each call reads the
/// code and the pool, decides, and commits the code write, the pool
/// decrement (on a win) and the outcome record together. A commit that
/// loses a race is retried from a fresh read, so a code is consumed at most
/// once and the pool is never decremented twice from the same count.
pub struct Coordinator<S: ?Sized> {
    store: Arc<S>,
    planner: Planner,
    retry: RetryPolicy,
}

/// Everything one transaction attempt needs besides the store.
#[derive(Clone)]
struct Planner {
    decider: Arc<Decider>,
    rng: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl<S: RedemptionStore + ?Sized + 'static> Coordinator<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let config = config.normalized();
        Self {
            store,
            planner: Planner {
                decider: Arc::new(Decider::new(config.symbols)),
                rng: Arc::new(ThreadRandom),
                clock: Arc::new(SystemClock),
            },
            retry: config.retry,
        }
    }

    /// Replace the randomness source.
    pub fn with_random(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.planner.rng = rng;
        self
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.planner.clock = clock;
        self
    }

    /// A public config reader over the same store.
    pub fn public_reader(&self) -> PublicConfigReader<S> {
        PublicConfigReader::new(Arc::clone(&self.store))
    }

    /// Redeem `code` on behalf of `requester`.
    ///
    /// Errors before the commit leave every record untouched. A failed
    /// commit applies nothing. The transaction runs on its own task, so
    /// once started it completes whether or not the caller is still
    /// waiting; resubmitting the same code afterwards yields
    /// [`RedeemError::AlreadyUsed`].
    pub async fn redeem(
        &self,
        code: &str,
        requester: Option<RequesterId>,
    ) -> RedeemResult<RedemptionResult> {
        if code.is_empty() {
            return Err(RedeemError::InvalidInput("code must not be empty".into()));
        }
        debug!(code, "redeem attempt");

        let store = Arc::clone(&self.store);
        let planner = self.planner.clone();
        let retry = self.retry.clone();
        let owned = code.to_string();
        let task = tokio::spawn(async move {
            run_transaction(&*store, &owned, &retry, |reads| {
                planner.plan(reads, requester.clone())
            })
            .await
        });
        let result = task
            .await
            .map_err(|e| RedeemError::Internal(format!("redemption task failed: {e}")))?;

        match result {
            Ok(result) => {
                if result.won {
                    info!(remaining = result.remaining_after, "prize awarded");
                }
                Ok(result)
            }
            Err(err) => {
                let err = RedeemError::from(err);
                debug!(code, kind = err.kind(), "redeem rejected");
                Err(err)
            }
        }
    }
}

impl Planner {
    /// Derive the writes for one attempt. Pure apart from the injected
    /// randomness and clock.
    fn plan(
        &self,
        reads: &ReadSet,
        requester: Option<RequesterId>,
    ) -> RedeemResult<TxPlan<RedemptionResult>> {
        let code = reads.code_record.as_ref().ok_or(RedeemError::NotFound)?;
        if code.value.used {
            return Err(RedeemError::AlreadyUsed);
        }
        let pool = &reads
            .pool
            .as_ref()
            .ok_or(RedeemError::ConfigUnavailable)?
            .value;
        pool.validate()
            .map_err(|_| RedeemError::ConfigUnavailable)?;

        let decision = self
            .decider
            .decide(pool.remaining, pool.win_probability, &*self.rng);
        let reels = display_symbols(&decision, self.decider.symbols(), &*self.rng);
        let now = self.clock.now();

        let mut record = code.value.clone();
        record
            .mark_redeemed(decision.is_win(), now, requester.clone())
            .map_err(|_| RedeemError::AlreadyUsed)?;

        let (pool_write, outcome, result) = match decision {
            Decision::Win { symbol } => {
                let mut updated = pool.clone();
                updated
                    .record_win(now)
                    .map_err(|e| RedeemError::Internal(e.to_string()))?;
                let outcome = OutcomeRecord::win(
                    reads.code.as_str(),
                    symbol.clone(),
                    pool.reward_label.clone(),
                    now,
                    requester,
                );
                let result = RedemptionResult {
                    won: true,
                    reward_symbol: Some(symbol),
                    display_symbols: reels,
                    reward_label: Some(pool.reward_label.clone()),
                    remaining_after: updated.remaining,
                };
                (Some(updated), outcome, result)
            }
            Decision::Lose => {
                let outcome = OutcomeRecord::loss(reads.code.as_str(), now, requester);
                let result = RedemptionResult {
                    won: false,
                    reward_symbol: None,
                    display_symbols: reels,
                    reward_label: None,
                    remaining_after: pool.remaining,
                };
                (None, outcome, result)
            }
        };

        Ok(TxPlan {
            writes: WriteSet {
                code: Some(record),
                pool: pool_write,
                outcome: Some(outcome),
            },
            output: result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use redeem_decider::{SeededSource, SequenceSource};
    use redeem_store::{
        InMemoryRedemptionStore, OutcomeLedger, ReadVersions, StoreError, StoreResult,
    };
    use redeem_types::{CodeRecord, PoolConfig};
    use tokio::time::{sleep, timeout};

    use crate::audit::audit;
    use crate::clock::FixedClock;

    fn config(max_attempts: usize) -> EngineConfig {
        EngineConfig {
            retry: RetryPolicy::new(max_attempts, 1, 4, 0.0),
            ..EngineConfig::default()
        }
    }

    fn store_with(codes: &[&str], pool: Option<PoolConfig>) -> Arc<InMemoryRedemptionStore> {
        let store = InMemoryRedemptionStore::new();
        store.provision_codes(codes.iter().copied()).unwrap();
        if let Some(pool) = pool {
            store.put_pool(pool).unwrap();
        }
        Arc::new(store)
    }

    fn coordinator<S: RedemptionStore + ?Sized + 'static>(store: Arc<S>) -> Coordinator<S> {
        Coordinator::new(store, config(64)).with_random(Arc::new(SeededSource::new(42)))
    }

    fn codes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("CODE-{i:03}")).collect()
    }

    #[tokio::test]
    async fn empty_code_is_invalid_input() {
        let store = store_with(&[], Some(PoolConfig::new(1, 1.0, "Mug")));
        let err = coordinator(store).redeem("", None).await.unwrap_err();
        assert!(matches!(err, RedeemError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let store = store_with(&["A"], Some(PoolConfig::new(1, 1.0, "Mug")));
        let engine = coordinator(Arc::clone(&store));
        assert_eq!(engine.redeem("B", None).await.unwrap_err(), RedeemError::NotFound);
        // Exact match only.
        assert_eq!(engine.redeem("a", None).await.unwrap_err(), RedeemError::NotFound);
        assert_eq!(store.outcome_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_pool_is_config_unavailable_and_leaves_code_unused() {
        let store = store_with(&["A"], None);
        let engine = coordinator(Arc::clone(&store));
        assert_eq!(
            engine.redeem("A", None).await.unwrap_err(),
            RedeemError::ConfigUnavailable
        );
        let reads = store.read("A").await.unwrap();
        assert!(!reads.code_record.unwrap().value.used);

        // Retrying once the pool exists succeeds.
        store.put_pool(PoolConfig::new(1, 0.0, "Mug")).unwrap();
        assert!(engine.redeem("A", None).await.is_ok());
    }

    #[tokio::test]
    async fn win_updates_code_pool_and_ledger_together() {
        let store = store_with(&["A"], Some(PoolConfig::new(3, 1.0, "Concert tickets")));
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let engine = Coordinator::new(Arc::clone(&store), config(4))
            .with_random(Arc::new(SequenceSource::new([0.0], [1])))
            .with_clock(Arc::new(FixedClock(at)));

        let result = engine
            .redeem("A", Some(RequesterId::new("player-1")))
            .await
            .unwrap();
        assert!(result.won);
        assert_eq!(result.reward_symbol, Some(Symbol::from("💰")));
        assert_eq!(result.display_symbols, [
            Symbol::from("💰"),
            Symbol::from("💰"),
            Symbol::from("💰")
        ]);
        assert_eq!(result.reward_label.as_deref(), Some("Concert tickets"));
        assert_eq!(result.remaining_after, 2);

        let reads = store.read("A").await.unwrap();
        let code = reads.code_record.unwrap().value;
        assert!(code.used);
        assert_eq!(code.is_winner, Some(true));
        assert_eq!(code.redeemed_at, Some(at));
        assert_eq!(code.redeemer_id, Some(RequesterId::new("player-1")));

        let pool = reads.pool.unwrap().value;
        assert_eq!(pool.remaining, 2);
        assert_eq!(pool.last_win_at, Some(at));

        let outcome = store.outcome_for_code("A").await.unwrap().unwrap();
        assert!(outcome.won);
        assert_eq!(outcome.reward_symbol, Some(Symbol::from("💰")));
        assert_eq!(outcome.reward_label.as_deref(), Some("Concert tickets"));
        assert_eq!(outcome.timestamp, at);
        assert_eq!(outcome.redeemer_id, Some(RequesterId::new("player-1")));
    }

    #[tokio::test]
    async fn loss_leaves_pool_untouched() {
        let store = store_with(&["A"], Some(PoolConfig::new(3, 0.5, "Mug")));
        let engine = Coordinator::new(Arc::clone(&store), config(4))
            .with_random(Arc::new(SequenceSource::new([0.7], [0, 0, 1])));

        let result = engine.redeem("A", None).await.unwrap();
        assert!(!result.won);
        assert!(result.reward_symbol.is_none());
        assert!(result.reward_label.is_none());
        assert_eq!(result.remaining_after, 3);

        let pool = store.pool().await.unwrap().unwrap();
        assert_eq!(pool.remaining, 3);
        assert!(pool.last_win_at.is_none());

        let code = store.read("A").await.unwrap().code_record.unwrap().value;
        assert_eq!(code.is_winner, Some(false));
        let outcome = store.outcome_for_code("A").await.unwrap().unwrap();
        assert!(!outcome.won);
        assert!(outcome.reward_label.is_none());
    }

    #[tokio::test]
    async fn same_code_twice_sequentially() {
        let store = store_with(&["A"], Some(PoolConfig::new(5, 1.0, "Mug")));
        let engine = coordinator(Arc::clone(&store));

        let first = engine.redeem("A", None).await.unwrap();
        assert!(first.won);
        assert_eq!(
            engine.redeem("A", None).await.unwrap_err(),
            RedeemError::AlreadyUsed
        );
        assert_eq!(store.pool().await.unwrap().unwrap().remaining, 4);
        assert_eq!(store.outcome_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn zero_probability_never_wins() {
        let all = codes(200);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let store = store_with(&refs, Some(PoolConfig::new(100, 0.0, "Mug")));
        let engine = coordinator(Arc::clone(&store));
        for code in &all {
            assert!(!engine.redeem(code, None).await.unwrap().won);
        }
        assert_eq!(store.pool().await.unwrap().unwrap().remaining, 100);
    }

    #[tokio::test]
    async fn empty_pool_never_wins() {
        let all = codes(200);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let store = store_with(&refs, Some(PoolConfig::new(0, 1.0, "Mug")));
        let engine = coordinator(Arc::clone(&store));
        for code in &all {
            let result = engine.redeem(code, None).await.unwrap();
            assert!(!result.won);
            assert_eq!(result.remaining_after, 0);
        }
    }

    #[tokio::test]
    async fn displays_match_outcomes() {
        let all = codes(300);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let store = store_with(&refs, Some(PoolConfig::new(150, 0.5, "Mug")));
        let engine = coordinator(Arc::clone(&store));
        for code in &all {
            let result = engine.redeem(code, None).await.unwrap();
            let [a, b, c] = &result.display_symbols;
            if result.won {
                let symbol = result.reward_symbol.as_ref().unwrap();
                assert!(a == symbol && b == symbol && c == symbol);
            } else {
                assert!(!(a == b && b == c), "loss displayed as three of a kind");
            }
        }
    }

    #[tokio::test]
    async fn invalid_pool_probability_is_config_unavailable() {
        // Bypass put_pool validation the way a hand-edited backend might.
        struct BadPoolStore(InMemoryRedemptionStore);

        #[async_trait]
        impl RedemptionStore for BadPoolStore {
            async fn read(&self, code: &str) -> StoreResult<ReadSet> {
                let mut reads = self.0.read(code).await?;
                if let Some(pool) = reads.pool.as_mut() {
                    pool.value.win_probability = 3.0;
                }
                Ok(reads)
            }
            async fn commit(&self, v: &ReadVersions, w: WriteSet) -> StoreResult<()> {
                self.0.commit(v, w).await
            }
            async fn pool(&self) -> StoreResult<Option<PoolConfig>> {
                self.0.pool().await
            }
            async fn scan_codes(&self) -> StoreResult<Vec<(String, CodeRecord)>> {
                self.0.scan_codes().await
            }
        }

        let inner = InMemoryRedemptionStore::new();
        inner.provision_code("A").unwrap();
        inner.put_pool(PoolConfig::new(1, 0.5, "Mug")).unwrap();
        let engine = coordinator(Arc::new(BadPoolStore(inner)));
        assert_eq!(
            engine.redeem("A", None).await.unwrap_err(),
            RedeemError::ConfigUnavailable
        );
    }

    /// Commits fail with `error` for the first `failures` calls.
    struct FailingStore {
        inner: InMemoryRedemptionStore,
        failures: AtomicUsize,
        error: StoreError,
    }

    #[async_trait]
    impl RedemptionStore for FailingStore {
        async fn read(&self, code: &str) -> StoreResult<ReadSet> {
            self.inner.read(code).await
        }
        async fn commit(&self, v: &ReadVersions, w: WriteSet) -> StoreResult<()> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(self.error.clone());
            }
            self.inner.commit(v, w).await
        }
        async fn pool(&self) -> StoreResult<Option<PoolConfig>> {
            self.inner.pool().await
        }
        async fn scan_codes(&self) -> StoreResult<Vec<(String, CodeRecord)>> {
            self.inner.scan_codes().await
        }
    }

    fn failing_store(failures: usize, error: StoreError) -> Arc<FailingStore> {
        let inner = InMemoryRedemptionStore::new();
        inner.provision_code("A").unwrap();
        inner.put_pool(PoolConfig::new(1, 1.0, "Mug")).unwrap();
        Arc::new(FailingStore {
            inner,
            failures: AtomicUsize::new(failures),
            error,
        })
    }

    #[tokio::test]
    async fn failed_commit_rolls_back_everything() {
        let store = failing_store(1, StoreError::Backend("disk full".into()));
        let engine = coordinator(Arc::clone(&store));

        let err = engine.redeem("A", None).await.unwrap_err();
        assert!(err.is_retryable());

        let reads = store.read("A").await.unwrap();
        assert!(!reads.code_record.unwrap().value.used);
        assert_eq!(reads.pool.unwrap().value.remaining, 1);
        assert_eq!(store.inner.outcome_count().await.unwrap(), 0);

        // The caller may retry later and the code is still good.
        assert!(engine.redeem("A", None).await.unwrap().won);
    }

    #[tokio::test]
    async fn conflict_exhaustion_is_internal() {
        let store = failing_store(
            100,
            StoreError::Conflict {
                record: "pool".into(),
            },
        );
        let engine = Coordinator::new(Arc::clone(&store), config(3));
        let err = engine.redeem("A", None).await.unwrap_err();
        assert!(matches!(err, RedeemError::Internal(_)));
        assert!(!store.read("A").await.unwrap().code_record.unwrap().value.used);
    }

    #[tokio::test]
    async fn transient_conflicts_are_retried_transparently() {
        let store = failing_store(
            2,
            StoreError::Conflict {
                record: "pool".into(),
            },
        );
        let engine = coordinator(Arc::clone(&store));
        let result = engine.redeem("A", None).await.unwrap();
        assert!(result.won);
        assert_eq!(result.remaining_after, 0);
    }

    #[tokio::test]
    async fn abandoned_redemption_still_completes() {
        let store = failing_store(
            1,
            StoreError::Conflict {
                record: "pool".into(),
            },
        );
        let engine = Coordinator::new(
            Arc::clone(&store),
            EngineConfig {
                retry: RetryPolicy::new(4, 200, 400, 0.0),
                ..EngineConfig::default()
            },
        )
        .with_random(Arc::new(SeededSource::new(42)));

        // The caller walks away while the first retry is backing off.
        let abandoned = timeout(Duration::from_millis(50), engine.redeem("A", None)).await;
        assert!(abandoned.is_err());

        let mut used = false;
        for _ in 0..100 {
            used = store.read("A").await.unwrap().code_record.unwrap().value.used;
            if used {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert!(used, "transaction did not finish after the caller left");
        assert_eq!(store.inner.outcome_count().await.unwrap(), 1);
        assert_eq!(
            engine.redeem("A", None).await.unwrap_err(),
            RedeemError::AlreadyUsed
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_prize_goes_to_exactly_one_of_two_codes() {
        let store = store_with(&["A", "B"], Some(PoolConfig::new(1, 1.0, "Mug")));
        let engine = Arc::new(coordinator(Arc::clone(&store)));

        let a = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.redeem("A", None).await }
        });
        let b = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.redeem("B", None).await }
        });
        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert!(a.won ^ b.won, "exactly one code must win");
        assert_eq!(store.pool().await.unwrap().unwrap().remaining, 0);
        assert!(audit(&*store).await.unwrap().is_consistent());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_same_code_redeems_once() {
        let store = store_with(&["A"], Some(PoolConfig::new(10, 1.0, "Mug")));
        let engine = Arc::new(coordinator(Arc::clone(&store)));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine
                        .redeem("A", Some(RequesterId::new(format!("p{i}"))))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        let mut already_used = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(RedeemError::AlreadyUsed) => already_used += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(already_used, 15);
        assert_eq!(store.pool().await.unwrap().unwrap().remaining, 9);
        assert_eq!(store.outcome_count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_codes_never_overdraw_the_pool() {
        let all = codes(60);
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let store = store_with(&refs, Some(PoolConfig::new(10, 1.0, "Mug")));
        let engine = Arc::new(coordinator(Arc::clone(&store)));

        let handles: Vec<_> = all
            .iter()
            .cloned()
            .map(|code| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.redeem(&code, None).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().won {
                wins += 1;
            }
        }
        assert_eq!(wins, 10);
        assert_eq!(store.pool().await.unwrap().unwrap().remaining, 0);

        let report = audit(&*store).await.unwrap();
        assert!(report.is_consistent(), "{:?}", report.problems);
        assert_eq!(report.winning_codes, 10);
        assert_eq!(report.winning_outcomes, 10);
        assert_eq!(report.outcomes, 60);

        let ids: HashSet<_> = store
            .outcomes()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids.len(), 60);
    }

    #[tokio::test]
    async fn public_reader_shares_the_store() {
        let store = store_with(&["A"], Some(PoolConfig::new(1, 1.0, "Mug")));
        let engine = coordinator(Arc::clone(&store));
        engine.redeem("A", None).await.unwrap();
        let public = engine.public_reader().get_public_config().await.unwrap();
        assert_eq!(public.remaining, Some(0));
        assert_eq!(public.reward_label.as_deref(), Some("Mug"));
    }
}
