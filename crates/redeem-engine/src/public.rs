use std::sync::Arc;

use redeem_store::RedemptionStore;
use redeem_types::PublicConfig;

use crate::error::RedeemResult;

/// Read-only view of the pool for unauthenticated callers.
///
/// Bypasses the coordinator: one plain read, no transaction. The win
/// probability is never exposed.
pub struct PublicConfigReader<S: ?Sized> {
    store: Arc<S>,
}

impl<S: RedemptionStore + ?Sized> PublicConfigReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Current reward label and remaining prize count, or an empty
    /// [`PublicConfig`] when no pool has been configured yet.
    pub async fn get_public_config(&self) -> RedeemResult<PublicConfig> {
        Ok(self
            .store
            .pool()
            .await?
            .map(|pool| pool.public())
            .unwrap_or_default())
    }
}
