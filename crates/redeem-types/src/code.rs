use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::RequesterId;

/// State of a single-use redemption code.
///
/// Codes are provisioned unused by an external process. The engine flips
/// `used` exactly once and sets the outcome fields in the same write; a used
/// code is never reset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub used: bool,
    pub is_winner: Option<bool>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub redeemer_id: Option<RequesterId>,
}

impl CodeRecord {
    /// A freshly provisioned code.
    pub fn unused() -> Self {
        Self::default()
    }

    /// Mark the code consumed, recording the outcome fields together.
    pub fn mark_redeemed(
        &mut self,
        won: bool,
        at: DateTime<Utc>,
        redeemer: Option<RequesterId>,
    ) -> Result<(), TypeError> {
        if self.used {
            return Err(TypeError::AlreadyRedeemed);
        }
        self.used = true;
        self.is_winner = Some(won);
        self.redeemed_at = Some(at);
        self.redeemer_id = redeemer;
        Ok(())
    }

    pub fn is_winner(&self) -> bool {
        self.is_winner == Some(true)
    }
}
