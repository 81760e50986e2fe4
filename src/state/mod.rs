//! State collaborators consumed by the engine.
//!
//! The engine only reads and writes through these traits; durability and
//! rollback of a failed transaction belong to the implementation behind them.

pub mod account_db;
pub mod contract_db;
pub mod delegate_db;
pub mod price_feed;
pub mod reward_db;

pub use account_db::{Account, AccountStore, InMemAccountStore};
pub use contract_db::{ContractRecord, ContractStore, InMemContractStore};
pub use delegate_db::{DelegateStore, InMemDelegateStore};
pub use price_feed::{InMemPriceFeed, PriceFeedStore};
pub use reward_db::{InMemRewardStore, RewardStore};

/// Stores owned by the caller for the duration of one transaction.
pub struct Database {
    pub accounts: Box<dyn AccountStore>,
    pub contracts: Box<dyn ContractStore>,
    pub delegates: Box<dyn DelegateStore>,
    pub prices: Box<dyn PriceFeedStore>,
    pub rewards: Box<dyn RewardStore>,
}

/// Handles to the in-memory stores behind a `Database`, for seeding and
/// inspection.
#[derive(Debug, Default, Clone)]
pub struct InMemHandles {
    pub accounts: InMemAccountStore,
    pub contracts: InMemContractStore,
    pub delegates: InMemDelegateStore,
    pub prices: InMemPriceFeed,
    pub rewards: InMemRewardStore,
}

impl Database {
    pub fn in_memory() -> (Self, InMemHandles) {
        let handles = InMemHandles::default();
        let db = Database {
            accounts: Box::new(handles.accounts.clone()),
            contracts: Box::new(handles.contracts.clone()),
            delegates: Box::new(handles.delegates.clone()),
            prices: Box::new(handles.prices.clone()),
            rewards: Box::new(handles.rewards.clone()),
        };
        (db, handles)
    }
}
