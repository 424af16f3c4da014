use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    #[error("win probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("prize pool is exhausted")]
    PoolExhausted,

    #[error("code has already been redeemed")]
    AlreadyRedeemed,

    #[error("invalid symbol set: {0}")]
    InvalidSymbolSet(String),
}
