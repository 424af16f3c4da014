//! Storage interfaces consumed by the engine.
//!
//! Any backend (in-memory, document database, SQL) implements these traits.
//! Field names and semantics of the records are fixed by `redeem-types`;
//! their physical encoding is up to the backend.

use async_trait::async_trait;

use redeem_types::{CodeRecord, OutcomeRecord, PoolConfig};

use crate::error::StoreResult;
use crate::records::{ReadSet, ReadVersions, WriteSet};

/// Transactional storage for code records and the pool singleton.
///
/// Implementations must be thread-safe and shared by every engine instance
/// that redeems against the same pool. They must guarantee:
///
/// - `read` returns a mutually consistent snapshot of one code and the pool.
/// - `commit` applies the whole write set atomically, and only if every
///   version in `versions` is still current. Otherwise it returns
///   [`StoreError::Conflict`](crate::StoreError::Conflict) and applies nothing.
/// - A used code is never reset and never receives a second outcome record.
#[async_trait]
pub trait RedemptionStore: Send + Sync {
    /// Read one code record and the pool together.
    async fn read(&self, code: &str) -> StoreResult<ReadSet>;

    /// Apply `writes` if nothing in `versions` has changed.
    async fn commit(&self, versions: &ReadVersions, writes: WriteSet) -> StoreResult<()>;

    /// Read the pool outside any transaction.
    ///
    /// Returns `Ok(None)` if no pool has been configured.
    async fn pool(&self) -> StoreResult<Option<PoolConfig>>;

    /// Every code record, sorted by code. Administrative scan; the
    /// redemption path never calls it.
    async fn scan_codes(&self) -> StoreResult<Vec<(String, CodeRecord)>>;
}

/// Read boundary of the append-only outcome ledger.
#[async_trait]
pub trait OutcomeLedger: Send + Sync {
    /// All outcome records in append order.
    async fn outcomes(&self) -> StoreResult<Vec<OutcomeRecord>>;

    /// The outcome recorded for `code`, if it has been redeemed.
    async fn outcome_for_code(&self, code: &str) -> StoreResult<Option<OutcomeRecord>>;

    /// Number of outcome records appended so far.
    async fn outcome_count(&self) -> StoreResult<u64> {
        Ok(self.outcomes().await?.len() as u64)
    }
}
