//! Read side of the price oracle. Aggregation happens elsewhere; the engine
//! only looks up the latest median per pair.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::types::SymbolCode;

pub trait PriceFeedStore: Send + Sync {
    /// Price of one `base` in `quote`, scaled by 10^8.
    fn get_price(&self, base: SymbolCode, quote: SymbolCode) -> Result<Option<u64>>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemPriceFeed {
    prices: Arc<RwLock<HashMap<(SymbolCode, SymbolCode), u64>>>,
}

impl InMemPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, base: SymbolCode, quote: SymbolCode, price: u64) {
        self.prices.write().insert((base, quote), price);
    }
}

impl PriceFeedStore for InMemPriceFeed {
    fn get_price(&self, base: SymbolCode, quote: SymbolCode) -> Result<Option<u64>> {
        Ok(self.prices.read().get(&(base, quote)).copied())
    }
}
