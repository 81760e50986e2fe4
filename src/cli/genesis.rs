use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::state::{
    Account, AccountStore, ContractRecord, ContractStore, Database, DelegateStore, InMemHandles, RewardStore,
};
use crate::types::{Regid, SymbolCode};

/// Initial state for an in-memory run of the engine.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Genesis {
    /// block height the transaction executes at
    pub height: u64,
    pub accounts: Vec<Account>,
    pub contracts: Vec<GenesisContract>,
    pub prices: Vec<GenesisPrice>,
    pub last_mint_height: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisContract {
    pub regid: Regid,
    #[serde(flatten)]
    pub record: ContractRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisPrice {
    pub base: SymbolCode,
    pub quote: SymbolCode,
    pub price: u64,
}

impl Genesis {
    /// Load genesis state from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let genesis: Genesis =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(genesis)
    }

    /// Fresh in-memory stores holding this state.
    pub fn build(&self) -> Result<(Database, InMemHandles)> {
        let (db, handles) = Database::in_memory();
        for account in &self.accounts {
            handles.accounts.set(account.regid, account.clone())?;
            if account.received_votes > 0 {
                handles.delegates.set_votes(account.regid, account.received_votes)?;
            }
        }
        for contract in &self.contracts {
            handles.contracts.save(contract.regid, contract.record.clone())?;
        }
        for price in &self.prices {
            handles.prices.set_price(price.base, price.quote, price.price);
        }
        if let Some(height) = self.last_mint_height {
            handles.rewards.set_last_mint_height(height)?;
        }
        Ok((db, handles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Symbol;

    #[test]
    fn builds_stores_from_json() {
        let genesis: Genesis = serde_json::from_str(
            r#"{
                "height": 7,
                "accounts": [
                    {"regid": "10-1", "balances": {"8,SYS": 500}},
                    {"regid": "10-2", "received_votes": 9}
                ],
                "contracts": [{"regid": "20-1", "maintainer": "10-1", "code": "0061736d", "abi": "{}"}],
                "prices": [{"base": "SYS", "quote": "USD", "price": 42}]
            }"#,
        )
        .unwrap();
        let (db, handles) = genesis.build().unwrap();

        let sys: Symbol = "8,SYS".parse().unwrap();
        assert_eq!(db.accounts.get(&Regid::new(10, 1)).unwrap().unwrap().balance(sys), 500);
        assert!(handles.delegates.contains(Regid::new(10, 2), 9));
        assert_eq!(db.contracts.get(&Regid::new(20, 1)).unwrap().unwrap().code, vec![0, 0x61, 0x73, 0x6d]);
        let usd: SymbolCode = "USD".parse().unwrap();
        assert_eq!(db.prices.get_price(sys.code(), usd).unwrap(), Some(42));
        assert_eq!(genesis.height, 7);
    }
}
