//! Producer ranking index: entries are filed under `(votes, regid)` so the
//! highest totals iterate first.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::types::Regid;

pub trait DelegateStore: Send + Sync {
    /// Up to `limit` candidates, highest vote total first.
    fn get_active(&self, limit: usize) -> Result<Vec<Regid>>;
    /// File `id` under `total`.
    fn set_votes(&self, id: Regid, total: u64) -> Result<()>;
    /// Remove the entry filed under `old_total`, if any.
    fn erase_votes(&self, id: Regid, old_total: u64) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemDelegateStore {
    index: Arc<RwLock<BTreeSet<(Reverse<u64>, Regid)>>>,
}

impl InMemDelegateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: Regid, total: u64) -> bool {
        self.index.read().contains(&(Reverse(total), id))
    }
}

impl DelegateStore for InMemDelegateStore {
    fn get_active(&self, limit: usize) -> Result<Vec<Regid>> {
        Ok(self.index.read().iter().take(limit).map(|(_, id)| *id).collect())
    }

    fn set_votes(&self, id: Regid, total: u64) -> Result<()> {
        self.index.write().insert((Reverse(total), id));
        Ok(())
    }

    fn erase_votes(&self, id: Regid, old_total: u64) -> Result<()> {
        self.index.write().remove(&(Reverse(old_total), id));
        Ok(())
    }
}
