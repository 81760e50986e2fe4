//! Deployed contract records, keyed by the contract's regid.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::Regid;
use crate::utils::serde_helpers::{as_hex, from_hex};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ContractRecord {
    /// account allowed to redeploy or hand over the contract
    pub maintainer: Regid,
    #[serde(serialize_with = "as_hex", deserialize_with = "from_hex")]
    pub code: Vec<u8>,
    /// ABI document in JSON form
    pub abi: String,
    #[serde(default)]
    pub memo: String,
    /// sha256 of `code`, hex encoded
    #[serde(default)]
    pub code_hash: String,
}

pub trait ContractStore: Send + Sync {
    fn get(&self, id: &Regid) -> Result<Option<ContractRecord>>;
    fn save(&self, id: Regid, record: ContractRecord) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemContractStore {
    inner: Arc<RwLock<HashMap<Regid, ContractRecord>>>,
}

impl InMemContractStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContractStore for InMemContractStore {
    fn get(&self, id: &Regid) -> Result<Option<ContractRecord>> {
        Ok(self.inner.read().get(id).cloned())
    }

    fn save(&self, id: Regid, record: ContractRecord) -> Result<()> {
        self.inner.write().insert(id, record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_replaces_record() {
        let store = InMemContractStore::new();
        let id = Regid::new(9, 1);
        store.save(id, ContractRecord { memo: "v1".into(), ..Default::default() }).unwrap();
        store.save(id, ContractRecord { memo: "v2".into(), ..Default::default() }).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().memo, "v2");
        assert!(store.get(&Regid::new(9, 2)).unwrap().is_none());
    }
}
