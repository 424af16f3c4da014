//! Foundation types for the redemption engine.
//!
//! This crate provides the persisted record shapes and value types shared by
//! every other crate in the workspace. Field names and semantics here are the
//! contract every store backend must preserve.
//!
//! # Key Types
//!
//! - [`CodeRecord`] — State of a single-use redemption code
//! - [`PoolConfig`] — The shared prize pool singleton
//! - [`OutcomeRecord`] — Immutable audit entry for one redemption
//! - [`Symbol`] / [`SymbolSet`] — Reward symbols shown to the player
//! - [`RequesterId`] / [`OutcomeId`] — Identifiers
//! - [`PublicConfig`] — Non-sensitive projection of the pool

pub mod code;
pub mod error;
pub mod identity;
pub mod outcome;
pub mod pool;
pub mod symbol;

pub use code::CodeRecord;
pub use error::TypeError;
pub use identity::{OutcomeId, RequesterId};
pub use outcome::OutcomeRecord;
pub use pool::{PoolConfig, PublicConfig, DEFAULT_WIN_PROBABILITY};
pub use symbol::{Symbol, SymbolSet};
