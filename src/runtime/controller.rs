//! Per-transaction driver: owns the accumulators that outlive a single
//! dispatch (cost, recipient count, receipts) and runs each root inline
//! transaction through an `ExecutionContext`.

use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::codec::Pack;
use crate::config::EngineConfig;
use crate::native::NativeRegistry;
use crate::runtime::context::ExecutionContext;
use crate::runtime::executor::BytecodeExecutor;
use crate::runtime::transaction::{InlineTransaction, InlineTransactionTrace, Receipt, TransactionTrace};
use crate::state::Database;
use crate::types::Regid;
use crate::utils::errors::{EngineError, Result};

pub struct TransactionController<'a> {
    pub(crate) registry: &'a NativeRegistry,
    pub(crate) executor: &'a dyn BytecodeExecutor,
    pub(crate) db: &'a Database,
    pub(crate) config: &'a EngineConfig,
    height: u64,
    tx_hash: [u8; 32],
    run_cost: u64,
    recipients_size: u64,
    receipts: Vec<Receipt>,
    started: Instant,
}

impl<'a> TransactionController<'a> {
    pub fn new(
        registry: &'a NativeRegistry,
        executor: &'a dyn BytecodeExecutor,
        db: &'a Database,
        config: &'a EngineConfig,
        height: u64,
    ) -> Self {
        Self {
            registry,
            executor,
            db,
            config,
            height,
            tx_hash: [0u8; 32],
            run_cost: 0,
            recipients_size: 0,
            receipts: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Run every root inline transaction at depth 0. Any failure aborts the
    /// whole transaction; effects already written to the stores are left for
    /// the caller to roll back.
    pub fn execute(mut self, trxs: &[InlineTransaction]) -> Result<TransactionTrace> {
        self.started = Instant::now();
        self.tx_hash = Sha256::digest(trxs.packed()).into();
        let trx_id = self.trx_id();
        debug!(trx_id = %trx_id, count = trxs.len(), height = self.height, "executing transaction");

        let mut traces = Vec::with_capacity(trxs.len());
        for trx in trxs {
            let mut trace = InlineTransactionTrace::new(trx, trx.contract);
            self.execute_inline_transaction(&mut trace, trx, trx.contract, 0)?;
            traces.push(trace);
        }

        let fuel = &self.config.fuel;
        let size = trxs.packed_size() as u64;
        self.add_cost(size.saturating_mul(fuel.store_fuel_per_byte));
        self.add_cost(self.recipients_size.saturating_mul(fuel.notice_fuel_per_recipient));

        let elapsed_us = self.elapsed_us();
        info!(trx_id = %trx_id, run_cost = self.run_cost, elapsed_us, "transaction executed");
        Ok(TransactionTrace {
            trx_id,
            elapsed_us,
            run_cost: self.run_cost,
            traces,
            receipts: self.receipts,
        })
    }

    /// Dispatch `trx` to `receiver` in a fresh context at `depth`.
    pub fn execute_inline_transaction(
        &mut self,
        trace: &mut InlineTransactionTrace,
        trx: &InlineTransaction,
        receiver: Regid,
        depth: u32,
    ) -> Result<()> {
        self.check_deadline()?;
        let mut ctx = ExecutionContext::new(self, trx, receiver, depth);
        ctx.execute(trace)
    }

    pub fn hash(&self) -> [u8; 32] {
        self.tx_hash
    }

    pub fn trx_id(&self) -> String {
        hex::encode(self.tx_hash)
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn run_cost(&self) -> u64 {
        self.run_cost
    }

    pub fn add_cost(&mut self, fuel: u64) {
        self.run_cost = self.run_cost.saturating_add(fuel);
    }

    pub(crate) fn add_recipient(&mut self) {
        self.recipients_size += 1;
    }

    pub fn push_receipt(&mut self, receipt: Receipt) {
        self.receipts.push(receipt);
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    fn elapsed_us(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    pub fn check_deadline(&self) -> Result<()> {
        if self.started.elapsed() > self.config.limits.max_transaction_duration() {
            return Err(EngineError::Timeout { limit_ms: self.config.limits.max_transaction_duration_ms });
        }
        Ok(())
    }
}
