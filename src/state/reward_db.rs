use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

/// Height of the last reward mint.
pub trait RewardStore: Send + Sync {
    fn last_mint_height(&self) -> Result<Option<u64>>;
    fn set_last_mint_height(&self, height: u64) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemRewardStore {
    last: Arc<RwLock<Option<u64>>>,
}

impl InMemRewardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RewardStore for InMemRewardStore {
    fn last_mint_height(&self) -> Result<Option<u64>> {
        Ok(*self.last.read())
    }

    fn set_last_mint_height(&self, height: u64) -> Result<()> {
        *self.last.write() = Some(height);
        Ok(())
    }
}
