//! In-memory redemption store for tests, simulations, and embedding.
//!
//! [`InMemoryRedemptionStore`] keeps every record behind one `RwLock`. Reads
//! take the shared lock; a commit takes the exclusive lock only long enough
//! to validate versions and apply its write set, so redemptions of unrelated
//! codes never wait on one another's decision logic.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use redeem_types::{CodeRecord, OutcomeRecord, PoolConfig};

use crate::error::{StoreError, StoreResult};
use crate::records::{ReadSet, ReadVersions, Versioned, WriteSet};
use crate::traits::{OutcomeLedger, RedemptionStore};

/// An in-memory implementation of [`RedemptionStore`] and [`OutcomeLedger`].
///
/// Data is lost when the store is dropped.
pub struct InMemoryRedemptionStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    codes: HashMap<String, Versioned<CodeRecord>>,
    pool: Option<Versioned<PoolConfig>>,
    outcomes: Vec<OutcomeRecord>,
    outcome_index: HashMap<String, usize>,
}

impl InMemoryRedemptionStore {
    /// Create a new empty store with no codes and no pool.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
        }
    }

    fn state(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn state_mut(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    /// Register an unused code. Returns `false` and leaves the existing
    /// record untouched if the code is already known.
    pub fn provision_code(&self, code: impl Into<String>) -> StoreResult<bool> {
        let mut state = self.state_mut()?;
        let code = code.into();
        if state.codes.contains_key(&code) {
            return Ok(false);
        }
        state
            .codes
            .insert(code, Versioned::new(1, CodeRecord::unused()));
        Ok(true)
    }

    /// Register many unused codes; returns how many were new.
    pub fn provision_codes<I, C>(&self, codes: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let mut added = 0;
        for code in codes {
            if self.provision_code(code)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Create or replace the pool, as an administrator would.
    ///
    /// Replacing bumps the pool version, so redemptions that read the old
    /// pool will conflict and retry against the new one.
    pub fn put_pool(&self, pool: PoolConfig) -> StoreResult<()> {
        pool.validate()
            .map_err(|e| StoreError::Invariant(e.to_string()))?;
        let mut state = self.state_mut()?;
        let version = state.pool.as_ref().map(|p| p.version + 1).unwrap_or(1);
        state.pool = Some(Versioned::new(version, pool));
        Ok(())
    }

    /// Number of provisioned codes.
    pub fn code_count(&self) -> StoreResult<usize> {
        Ok(self.state()?.codes.len())
    }

    fn validate(state: &StoreState, versions: &ReadVersions, writes: &WriteSet) -> StoreResult<()> {
        let current_code = state.codes.get(&versions.code);
        let code_version = current_code.map(|c| c.version).unwrap_or(0);
        if code_version != versions.code_version {
            return Err(StoreError::Conflict {
                record: format!("code {}", versions.code),
            });
        }
        let pool_version = state.pool.as_ref().map(|p| p.version).unwrap_or(0);
        if pool_version != versions.pool_version {
            return Err(StoreError::Conflict {
                record: "pool".into(),
            });
        }

        if let Some(update) = &writes.code {
            let existing = current_code
                .ok_or_else(|| StoreError::MissingRecord(format!("code {}", versions.code)))?;
            if existing.value.used {
                return Err(StoreError::Invariant(format!(
                    "code {} is already used",
                    versions.code
                )));
            }
            if !update.used {
                return Err(StoreError::Invariant(
                    "code write must mark the code used".into(),
                ));
            }
        }

        if let Some(pool) = &writes.pool {
            if state.pool.is_none() {
                return Err(StoreError::MissingRecord("pool".into()));
            }
            pool.validate()
                .map_err(|e| StoreError::Invariant(e.to_string()))?;
        }

        if let Some(outcome) = &writes.outcome {
            if outcome.code != versions.code {
                return Err(StoreError::Invariant(format!(
                    "outcome for {} committed with code {}",
                    outcome.code, versions.code
                )));
            }
            if state.outcome_index.contains_key(&outcome.code) {
                return Err(StoreError::Invariant(format!(
                    "code {} already has an outcome",
                    outcome.code
                )));
            }
        }

        Ok(())
    }
}

impl Default for InMemoryRedemptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedemptionStore for InMemoryRedemptionStore {
    async fn read(&self, code: &str) -> StoreResult<ReadSet> {
        let state = self.state()?;
        Ok(ReadSet {
            code: code.to_string(),
            code_record: state.codes.get(code).cloned(),
            pool: state.pool.clone(),
        })
    }

    async fn commit(&self, versions: &ReadVersions, writes: WriteSet) -> StoreResult<()> {
        let mut state = self.state_mut()?;
        Self::validate(&state, versions, &writes)?;

        // Everything below is infallible; the write set lands whole.
        if let Some(update) = writes.code {
            if let Some(record) = state.codes.get_mut(&versions.code) {
                record.version += 1;
                record.value = update;
            }
        }
        if let Some(update) = writes.pool {
            if let Some(pool) = state.pool.as_mut() {
                pool.version += 1;
                pool.value = update;
            }
        }
        if let Some(outcome) = writes.outcome {
            let index = state.outcomes.len();
            state.outcome_index.insert(outcome.code.clone(), index);
            state.outcomes.push(outcome);
        }
        debug!(
            code_version = versions.code_version,
            pool_version = versions.pool_version,
            "commit applied"
        );
        Ok(())
    }

    async fn pool(&self) -> StoreResult<Option<PoolConfig>> {
        Ok(self.state()?.pool.as_ref().map(|p| p.value.clone()))
    }

    async fn scan_codes(&self) -> StoreResult<Vec<(String, CodeRecord)>> {
        let state = self.state()?;
        let mut codes: Vec<(String, CodeRecord)> = state
            .codes
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect();
        codes.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(codes)
    }
}

#[async_trait]
impl OutcomeLedger for InMemoryRedemptionStore {
    async fn outcomes(&self) -> StoreResult<Vec<OutcomeRecord>> {
        Ok(self.state()?.outcomes.clone())
    }

    async fn outcome_for_code(&self, code: &str) -> StoreResult<Option<OutcomeRecord>> {
        let state = self.state()?;
        Ok(state
            .outcome_index
            .get(code)
            .and_then(|&i| state.outcomes.get(i))
            .cloned())
    }

    async fn outcome_count(&self) -> StoreResult<u64> {
        Ok(self.state()?.outcomes.len() as u64)
    }
}

impl std::fmt::Debug for InMemoryRedemptionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("InMemoryRedemptionStore");
        match self.inner.read() {
            Ok(state) => debug
                .field("codes", &state.codes.len())
                .field("has_pool", &state.pool.is_some())
                .field("outcomes", &state.outcomes.len()),
            Err(_) => debug.field("poisoned", &true),
        };
        debug.finish()
    }
}
