/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A record observed by the transaction changed before commit.
    #[error("transaction conflict on {record}")]
    Conflict { record: String },

    /// The backend is temporarily unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write would break a record invariant.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// A write targeted a record that was never provisioned.
    #[error("record not provisioned: {0}")]
    MissingRecord(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend fault, including poisoned locks.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Transient errors worth retrying the whole transaction for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Unavailable(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
