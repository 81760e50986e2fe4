//! Account store abstraction.
//! - Account struct (regid, per-symbol balances, received votes)
//! - AccountStore trait (pluggable persistence engine)
//! - InMemAccountStore (HashMap behind a RwLock, for tests/dev)

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{Asset, Regid, Symbol};
use crate::utils::errors::{EngineError, Result as EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Account {
    pub regid: Regid,
    /// balance per symbol, in the symbol's smallest unit
    #[serde(default)]
    pub balances: BTreeMap<Symbol, u64>,
    /// total votes received as a producer candidate
    #[serde(default)]
    pub received_votes: u64,
}

impl Account {
    pub fn new(regid: Regid) -> Self {
        Self { regid, ..Default::default() }
    }

    pub fn balance(&self, symbol: Symbol) -> u64 {
        self.balances.get(&symbol).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, quantity: Asset) -> EngineResult<()> {
        let amount = positive(quantity)?;
        let slot = self.balances.entry(quantity.symbol).or_insert(0);
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| EngineError::NativeAssert(format!("balance overflow for {}", self.regid)))?;
        Ok(())
    }

    pub fn debit(&mut self, quantity: Asset) -> EngineResult<()> {
        let amount = positive(quantity)?;
        let current = self.balance(quantity.symbol);
        if current < amount {
            return Err(EngineError::NativeAssert(format!(
                "insufficient funds: {} has {}, needs {}",
                self.regid,
                Asset { amount: current as i64, symbol: quantity.symbol },
                quantity
            )));
        }
        self.balances.insert(quantity.symbol, current - amount);
        Ok(())
    }
}

fn positive(quantity: Asset) -> EngineResult<u64> {
    if quantity.amount <= 0 {
        return Err(EngineError::NativeAssert(format!("amount must be positive, got {quantity}")));
    }
    Ok(quantity.amount as u64)
}

/// Trait for an account persistence engine.
pub trait AccountStore: Send + Sync {
    fn get(&self, id: &Regid) -> Result<Option<Account>>;
    fn set(&self, id: Regid, account: Account) -> Result<()>;

    fn exists(&self, id: &Regid) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }
}

/// In-memory account store (good for tests/dev)
#[derive(Debug, Default, Clone)]
pub struct InMemAccountStore {
    inner: Arc<RwLock<HashMap<Regid, Account>>>,
}

impl InMemAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot ordered by regid.
    pub fn all(&self) -> Vec<Account> {
        let mut out: Vec<Account> = self.inner.read().values().cloned().collect();
        out.sort_by_key(|a| a.regid);
        out
    }
}

impl AccountStore for InMemAccountStore {
    fn get(&self, id: &Regid) -> Result<Option<Account>> {
        Ok(self.inner.read().get(id).cloned())
    }

    fn set(&self, id: Regid, account: Account) -> Result<()> {
        self.inner.write().insert(id, account);
        Ok(())
    }
}
