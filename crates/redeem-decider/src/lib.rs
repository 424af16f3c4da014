//! Outcome decider for the redemption engine.
//!
//! Everything here is pure computation over an injected [`RandomSource`]:
//! no I/O, no shared state, no hidden global generator. Tests swap in a
//! [`SequenceSource`] to script exact draws.
//!
//! # Modules
//!
//! - [`random`] — The [`RandomSource`] capability and its implementations
//! - [`decider`] — The win/lose rule: [`Decider`] and [`Decision`]
//! - [`display`] — Three-reel symbol selection for a decision

pub mod decider;
pub mod display;
pub mod random;

pub use decider::{Decider, Decision};
pub use display::{display_symbols, Reels};
pub use random::{RandomSource, SeededSource, SequenceSource, ThreadRandom};
