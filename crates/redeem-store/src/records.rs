use serde::{Deserialize, Serialize};

use redeem_types::{CodeRecord, OutcomeRecord, PoolConfig};

/// A record together with the version it was read at.
///
/// Versions start at 1 for a stored record and grow by one per committed
/// write. An absent record is treated as version 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}

fn version_of<T>(record: &Option<Versioned<T>>) -> u64 {
    record.as_ref().map(|r| r.version).unwrap_or(0)
}

/// Consistent snapshot of everything one redemption reads.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadSet {
    pub code: String,
    pub code_record: Option<Versioned<CodeRecord>>,
    pub pool: Option<Versioned<PoolConfig>>,
}

impl ReadSet {
    /// The versions a commit must validate against.
    pub fn versions(&self) -> ReadVersions {
        ReadVersions {
            code: self.code.clone(),
            code_version: version_of(&self.code_record),
            pool_version: version_of(&self.pool),
        }
    }
}

/// Versions observed by a transaction, checked again at commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadVersions {
    pub code: String,
    pub code_version: u64,
    pub pool_version: u64,
}

/// Writes derived by a transaction, applied together or not at all.
///
/// The code write targets the code named in the [`ReadVersions`] it is
/// committed with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteSet {
    pub code: Option<CodeRecord>,
    pub pool: Option<PoolConfig>,
    pub outcome: Option<OutcomeRecord>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.pool.is_none() && self.outcome.is_none()
    }
}
