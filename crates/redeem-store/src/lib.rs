//! Transactional record store for the redemption engine.
//!
//! The store owns physical persistence and concurrency control for three
//! record families: code records, the pool singleton, and the append-only
//! outcome ledger. The engine never locks anything itself; every
//! cross-request guarantee comes from the transaction primitive here.
//!
//! # Transaction Model
//!
//! Every record carries a version. A transaction reads a [`ReadSet`] (one
//! code record plus the pool), computes a [`WriteSet`], and commits it
//! against the versions it observed. If any observed record changed in the
//! meantime the commit is rejected with [`StoreError::Conflict`] and nothing
//! is applied. [`run_transaction`] wraps that cycle in a bounded retry loop
//! with exponential backoff.
//!
//! # Design Rules
//!
//! 1. A commit applies its whole write set or none of it.
//! 2. A used code is never reset, and a code never gets a second outcome.
//! 3. Transactions on disjoint codes only meet inside the commit's short
//!    critical section; nothing is held between read and commit.
//! 4. Codes are created only through provisioning, never through commits.
//!
//! # Modules
//!
//! - [`error`] — [`StoreError`] and [`StoreResult`]
//! - [`records`] — [`Versioned`], [`ReadSet`], [`WriteSet`], [`ReadVersions`]
//! - [`traits`] — [`RedemptionStore`] and [`OutcomeLedger`]
//! - [`memory`] — [`InMemoryRedemptionStore`]
//! - [`retry`] — [`RetryPolicy`] and [`run_transaction`]
//! - [`projection`] — [`LedgerSummary`] over the outcome ledger

pub mod error;
pub mod memory;
pub mod projection;
pub mod records;
pub mod retry;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRedemptionStore;
pub use projection::LedgerSummary;
pub use records::{ReadSet, ReadVersions, Versioned, WriteSet};
pub use retry::{run_transaction, RetryPolicy, TxError, TxPlan};
pub use traits::{OutcomeLedger, RedemptionStore};
