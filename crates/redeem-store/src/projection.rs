//! Read-side projections over the outcome ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use redeem_types::{OutcomeRecord, Symbol};

use crate::error::StoreResult;
use crate::traits::OutcomeLedger;

/// Aggregate view of every outcome recorded so far.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub attempts: u64,
    pub wins: u64,
    pub losses: u64,
    pub wins_by_symbol: BTreeMap<Symbol, u64>,
    pub last_win_at: Option<DateTime<Utc>>,
}

impl LedgerSummary {
    pub fn from_records(records: &[OutcomeRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.attempts += 1;
            if record.won {
                summary.wins += 1;
                if let Some(symbol) = &record.reward_symbol {
                    *summary.wins_by_symbol.entry(symbol.clone()).or_default() += 1;
                }
                summary.last_win_at = summary.last_win_at.max(Some(record.timestamp));
            } else {
                summary.losses += 1;
            }
        }
        summary
    }

    pub async fn build<L: OutcomeLedger + ?Sized>(ledger: &L) -> StoreResult<Self> {
        let records = ledger.outcomes().await?;
        Ok(Self::from_records(&records))
    }

    /// Fraction of attempts that won, or `None` before the first attempt.
    pub fn win_rate(&self) -> Option<f64> {
        (self.attempts > 0).then(|| self.wins as f64 / self.attempts as f64)
    }
}
