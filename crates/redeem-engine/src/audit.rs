//! Consistency checks across code records and the outcome ledger.
//!
//! Used by tests and the simulator to confirm that no code was marked a
//! winner without a matching outcome, and the reverse.

use std::collections::HashMap;

use serde::Serialize;

use redeem_store::{OutcomeLedger, RedemptionStore};

use crate::error::RedeemResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub codes: usize,
    pub used_codes: usize,
    pub winning_codes: usize,
    pub outcomes: usize,
    pub winning_outcomes: usize,
    pub remaining: Option<u64>,
    pub problems: Vec<String>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.problems.is_empty()
    }

    /// Check the pool against the prize count it started with: every prize
    /// is either still in the pool or accounted for by a winning outcome.
    pub fn check_pool_accounting(&mut self, initial_remaining: u64) {
        let Some(remaining) = self.remaining else {
            self.problems.push("no pool configured".into());
            return;
        };
        let accounted = remaining + self.winning_outcomes as u64;
        if accounted != initial_remaining {
            self.problems.push(format!(
                "pool started at {initial_remaining} but {remaining} remain after {} wins",
                self.winning_outcomes
            ));
        }
    }
}

pub async fn audit<S>(store: &S) -> RedeemResult<AuditReport>
where
    S: RedemptionStore + OutcomeLedger + ?Sized,
{
    let codes = store.scan_codes().await?;
    let outcomes = store.outcomes().await?;
    let pool = store.pool().await?;

    let mut report = AuditReport {
        codes: codes.len(),
        outcomes: outcomes.len(),
        remaining: pool.map(|p| p.remaining),
        ..AuditReport::default()
    };

    let mut by_code: HashMap<&str, Vec<bool>> = HashMap::new();
    for outcome in &outcomes {
        by_code.entry(outcome.code.as_str()).or_default().push(outcome.won);
        if outcome.won {
            report.winning_outcomes += 1;
            if outcome.reward_symbol.is_none() || outcome.reward_label.is_none() {
                report
                    .problems
                    .push(format!("winning outcome {} lacks its reward", outcome.id));
            }
        }
    }

    let mut known = 0;
    for (code, record) in &codes {
        let recorded = by_code.get(code.as_str());
        if record.used {
            report.used_codes += 1;
        }
        if record.is_winner() {
            report.winning_codes += 1;
        }
        match (record.used, recorded.map(Vec::as_slice)) {
            (false, None) => {
                if record.is_winner.is_some() || record.redeemed_at.is_some() {
                    report
                        .problems
                        .push(format!("unused code {code} carries outcome fields"));
                }
            }
            (false, Some(_)) => {
                known += 1;
                report
                    .problems
                    .push(format!("unused code {code} has an outcome"));
            }
            (true, None) => report
                .problems
                .push(format!("used code {code} has no outcome")),
            (true, Some([won])) => {
                known += 1;
                if record.is_winner != Some(*won) || record.redeemed_at.is_none() {
                    report
                        .problems
                        .push(format!("code {code} disagrees with its outcome"));
                }
            }
            (true, Some(many)) => {
                known += 1;
                report
                    .problems
                    .push(format!("code {code} has {} outcomes", many.len()));
            }
        }
    }

    if known != by_code.len() {
        report.problems.push(format!(
            "{} outcome(s) reference unknown codes",
            by_code.len() - known
        ));
    }

    Ok(report)
}
