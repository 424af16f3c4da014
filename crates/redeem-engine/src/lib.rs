//! Redemption engine: exactly-once code redemption against a shared prize
//! pool.
//!
//! A caller presents a code; the [`Coordinator`] decides, exactly once and
//! safely under concurrent attempts, whether it wins, consumes a prize if
//! so, and records an immutable outcome. All mutual exclusion lives in the
//! store's transaction primitive, so any number of stateless engine
//! instances can share one store.
//!
//! Transport, authentication, code provisioning, and pool administration
//! are the caller's concern.

pub mod audit;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod public;

pub use audit::{audit, AuditReport};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use coordinator::{Coordinator, RedemptionResult};
pub use error::{ConfigError, RedeemError, RedeemResult};
pub use public::PublicConfigReader;

// Re-export the types callers need to drive the engine.
pub use redeem_decider::{RandomSource, SeededSource, SequenceSource, ThreadRandom};
pub use redeem_store::{InMemoryRedemptionStore, OutcomeLedger, RedemptionStore, RetryPolicy};
pub use redeem_types::{
    PoolConfig, PublicConfig, RequesterId, Symbol, SymbolSet, DEFAULT_WIN_PROBABILITY,
};
