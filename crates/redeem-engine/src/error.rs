use std::path::PathBuf;

use thiserror::Error;

use redeem_store::{StoreError, TxError};

/// Every way a redemption can fail, as seen by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedeemError {
    /// Malformed request. Not retryable as-is.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The code was never provisioned.
    #[error("code not found")]
    NotFound,

    /// The code has already been redeemed.
    #[error("code already used")]
    AlreadyUsed,

    /// No usable pool configuration exists.
    #[error("pool configuration unavailable")]
    ConfigUnavailable,

    /// Store failure or retry exhaustion. Safe to retry later.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RedeemError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid-input",
            Self::NotFound => "not-found",
            Self::AlreadyUsed => "already-used",
            Self::ConfigUnavailable => "config-unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for RedeemError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TxError<RedeemError>> for RedeemError {
    fn from(err: TxError<RedeemError>) -> Self {
        match err {
            TxError::Aborted(e) => e,
            TxError::Store(e) => e.into(),
            TxError::Exhausted { attempts, last } => {
                Self::Internal(format!("gave up after {attempts} attempts: {last}"))
            }
        }
    }
}

pub type RedeemResult<T> = Result<T, RedeemError>;

/// Errors loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
