use std::path::Path;

use serde::{Deserialize, Serialize};

use redeem_store::RetryPolicy;
use redeem_types::SymbolSet;

use crate::error::ConfigError;

/// Tunables for a [`Coordinator`](crate::Coordinator).
///
/// ```toml
/// symbols = ["💎", "💰", "👑", "🍀", "⭐"]
///
/// [retry]
/// max_attempts = 5
/// base_delay_ms = 10
/// max_delay_ms = 500
/// jitter_pct = 0.2
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backoff for transactions that hit store conflicts.
    pub retry: RetryPolicy,
    /// Symbols a win is drawn from and reels are filled with.
    pub symbols: SymbolSet,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        Ok(config.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Clamp the retry policy into its usable range.
    pub fn normalized(self) -> Self {
        Self {
            retry: self.retry.clamped(),
            ..self
        }
    }
}
