//! Scenario files: a pool, a batch of provisioned codes, and engine tuning.
//!
//! ```toml
//! codes = ["SPRING-001", "SPRING-002", "SPRING-003"]
//!
//! [pool]
//! remaining = 2
//! reward_label = "Concert tickets"
//! win_probability = 0.25   # defaults to 0.1
//!
//! [engine.retry]
//! max_attempts = 8
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use redeem_engine::{EngineConfig, InMemoryRedemptionStore, PoolConfig};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub pool: Option<PoolConfig>,
    pub codes: Vec<String>,
    pub engine: EngineConfig,
}

impl Scenario {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let mut scenario: Self = toml::from_str(raw).context("invalid scenario")?;
        scenario.engine = scenario.engine.normalized();
        if let Some(pool) = &scenario.pool {
            pool.validate().context("invalid pool")?;
        }
        if scenario.codes.iter().any(String::is_empty) {
            anyhow::bail!("scenario contains an empty code");
        }
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// Build a fresh store holding this scenario's codes and pool.
    pub fn provision(&self) -> anyhow::Result<Arc<InMemoryRedemptionStore>> {
        let store = InMemoryRedemptionStore::new();
        store.provision_codes(self.codes.iter().cloned())?;
        if let Some(pool) = &self.pool {
            store.put_pool(pool.clone())?;
        }
        Ok(Arc::new(store))
    }

    pub fn initial_remaining(&self) -> Option<u64> {
        self.pool.as_ref().map(|p| p.remaining)
    }
}
