use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Win probability applied when a pool configuration does not set one.
pub const DEFAULT_WIN_PROBABILITY: f64 = 0.1;

fn default_win_probability() -> f64 {
    DEFAULT_WIN_PROBABILITY
}

/// The shared prize pool singleton.
///
/// Edited by administrators outside the engine. The engine only ever
/// touches `remaining` and `last_win_at`, and only through [`record_win`].
///
/// [`record_win`]: PoolConfig::record_win
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub remaining: u64,
    #[serde(default = "default_win_probability")]
    pub win_probability: f64,
    #[serde(default)]
    pub reward_label: String,
    #[serde(default)]
    pub last_win_at: Option<DateTime<Utc>>,
}

impl PoolConfig {
    pub fn new(remaining: u64, win_probability: f64, reward_label: impl Into<String>) -> Self {
        Self {
            remaining,
            win_probability,
            reward_label: reward_label.into(),
            last_win_at: None,
        }
    }

    /// Reject probabilities outside `[0, 1]`, including NaN.
    pub fn validate(&self) -> Result<(), TypeError> {
        if !(0.0..=1.0).contains(&self.win_probability) {
            return Err(TypeError::InvalidProbability(self.win_probability));
        }
        Ok(())
    }

    /// Consume one prize.
    pub fn record_win(&mut self, at: DateTime<Utc>) -> Result<(), TypeError> {
        self.remaining = self
            .remaining
            .checked_sub(1)
            .ok_or(TypeError::PoolExhausted)?;
        self.last_win_at = Some(at);
        Ok(())
    }

    /// The public projection of this pool. Never includes the probability.
    pub fn public(&self) -> PublicConfig {
        PublicConfig {
            reward_label: Some(self.reward_label.clone()),
            remaining: Some(self.remaining),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(0, DEFAULT_WIN_PROBABILITY, String::new())
    }
}

/// Non-sensitive view of the pool.
///
/// Both fields are `None` when no pool has been configured yet; that empty
/// projection serializes as `{}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

impl PublicConfig {
    pub fn is_empty(&self) -> bool {
        self.reward_label.is_none() && self.remaining.is_none()
    }
}
