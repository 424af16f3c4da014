use serde::{Deserialize, Serialize};

use redeem_types::{Symbol, SymbolSet};

use crate::random::RandomSource;

/// Result of evaluating one redemption against the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Win { symbol: Symbol },
    Lose,
}

impl Decision {
    pub fn is_win(&self) -> bool {
        matches!(self, Self::Win { .. })
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Win { symbol } => Some(symbol),
            Self::Lose => None,
        }
    }
}

/// Chooses win or lose for a redemption.
///
/// A win requires `remaining > 0` and a unit draw strictly below
/// `probability`. An empty pool or a non-positive probability is a loss
/// without consuming any draw, so those cases are exact rather than merely
/// unlikely.
#[derive(Clone, Debug, Default)]
pub struct Decider {
    symbols: SymbolSet,
}

impl Decider {
    pub fn new(symbols: SymbolSet) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn decide(&self, remaining: u64, probability: f64, rng: &dyn RandomSource) -> Decision {
        if remaining == 0 || probability.is_nan() || probability <= 0.0 {
            return Decision::Lose;
        }
        if rng.unit() < probability {
            let symbol = self.symbols.get(rng.index(self.symbols.len())).clone();
            Decision::Win { symbol }
        } else {
            Decision::Lose
        }
    }
}
