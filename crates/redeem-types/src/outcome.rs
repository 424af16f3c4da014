use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{OutcomeId, RequesterId};
use crate::symbol::Symbol;

/// Immutable audit entry for one processed redemption.
///
/// `reward_symbol` and `reward_label` are set only for winning outcomes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub id: OutcomeId,
    pub code: String,
    pub won: bool,
    pub reward_symbol: Option<Symbol>,
    pub reward_label: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub redeemer_id: Option<RequesterId>,
}

impl OutcomeRecord {
    pub fn win(
        code: impl Into<String>,
        symbol: Symbol,
        reward_label: impl Into<String>,
        timestamp: DateTime<Utc>,
        redeemer_id: Option<RequesterId>,
    ) -> Self {
        Self {
            id: OutcomeId::new(),
            code: code.into(),
            won: true,
            reward_symbol: Some(symbol),
            reward_label: Some(reward_label.into()),
            timestamp,
            redeemer_id,
        }
    }

    pub fn loss(
        code: impl Into<String>,
        timestamp: DateTime<Utc>,
        redeemer_id: Option<RequesterId>,
    ) -> Self {
        Self {
            id: OutcomeId::new(),
            code: code.into(),
            won: false,
            reward_symbol: None,
            reward_label: None,
            timestamp,
            redeemer_id,
        }
    }
}
