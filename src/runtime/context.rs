//! Execution of one inline transaction against one receiver, plus the
//! recipients it notifies and the inline transactions it queues.
//!
//! Native handlers and the bytecode executor both see the same
//! `ExecutionContext`, so the engine cannot tell them apart.

use std::time::Instant;

use tracing::{debug, warn};

use crate::abi::{AbiDef, AbiSerializer};
use crate::codec::Pack;
use crate::config::EngineConfig;
use crate::native;
use crate::runtime::controller::TransactionController;
use crate::runtime::transaction::{
    InlineTransaction, InlineTransactionTrace, Permission, Receipt, CODE_PERMISSION,
};
use crate::state::Database;
use crate::types::{Name, Regid, SymbolCode};
use crate::utils::errors::{EngineError, Result};
use crate::utils::logging::log_console;

pub struct ExecutionContext<'c, 'a> {
    control: &'c mut TransactionController<'a>,
    trx: &'c InlineTransaction,
    receiver: Regid,
    recurse_depth: u32,
    notified: Vec<Regid>,
    notified_count: usize,
    inline_transactions: Vec<InlineTransaction>,
    console: String,
}

impl<'c, 'a> ExecutionContext<'c, 'a> {
    pub fn new(
        control: &'c mut TransactionController<'a>,
        trx: &'c InlineTransaction,
        receiver: Regid,
        recurse_depth: u32,
    ) -> Self {
        Self {
            control,
            trx,
            receiver,
            recurse_depth,
            notified: Vec::new(),
            notified_count: 0,
            inline_transactions: Vec::new(),
            console: String::new(),
        }
    }

    /// Run the receiver, then every notified recipient in order, then drain
    /// the inline queue one level deeper. Nothing queued here runs before
    /// all recipients at this level have finished.
    pub fn execute(&mut self, trace: &mut InlineTransactionTrace) -> Result<()> {
        self.notified.push(self.receiver);
        self.execute_one(trace)?;

        let mut i = 1;
        while i < self.notified.len() {
            self.receiver = self.notified[i];
            let mut child = InlineTransactionTrace::new(self.trx, self.receiver);
            self.execute_one(&mut child)?;
            trace.inline_traces.push(child);
            i += 1;
        }

        let queued = std::mem::take(&mut self.inline_transactions);
        for inline in &queued {
            let mut child = InlineTransactionTrace::new(inline, inline.contract);
            self.control
                .execute_inline_transaction(&mut child, inline, inline.contract, self.recurse_depth + 1)?;
            trace.inline_traces.push(child);
        }
        Ok(())
    }

    fn execute_one(&mut self, trace: &mut InlineTransactionTrace) -> Result<()> {
        let start = Instant::now();
        trace.receiver = self.receiver;

        let outcome = self.dispatch();
        let console = std::mem::take(&mut self.console);
        if let Err(source) = outcome {
            warn!(
                contract = %self.trx.contract,
                action = %self.trx.action,
                receiver = %self.receiver,
                error = %source,
                "dispatch failed"
            );
            return Err(EngineError::Dispatch {
                contract: self.trx.contract,
                action: self.trx.action,
                receiver: self.receiver,
                console,
                source: Box::new(source),
            });
        }

        trace.trx_id = self.control.trx_id();
        trace.elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        if self.control.config.contracts_console {
            log_console(self.trx.contract, self.trx.action, self.receiver, &console);
        }
        trace.console = console;
        Ok(())
    }

    fn dispatch(&mut self) -> Result<()> {
        let registry = self.control.registry;
        let action = self.trx.action;

        if let Some(handler) = registry.handler(self.receiver) {
            // native modules do not listen to notifications
            if self.receiver != self.trx.contract {
                return Ok(());
            }
            debug!(receiver = %self.receiver, action = %action, depth = self.recurse_depth, "native dispatch");
            return handler(self, action);
        }

        let executor = self.control.executor;
        match self.get_code(self.receiver)? {
            Some(code) if !code.is_empty() => {
                debug!(receiver = %self.receiver, action = %action, depth = self.recurse_depth, "bytecode dispatch");
                executor.execute(&code, self)
            }
            _ => Ok(()),
        }
    }

    pub fn receiver(&self) -> Regid {
        self.receiver
    }

    pub fn contract(&self) -> Regid {
        self.trx.contract
    }

    pub fn action(&self) -> Name {
        self.trx.action
    }

    pub fn data(&self) -> &[u8] {
        &self.trx.data
    }

    pub fn authorization(&self) -> &[Permission] {
        &self.trx.authorization
    }

    pub fn trx(&self) -> &InlineTransaction {
        self.trx
    }

    pub fn depth(&self) -> u32 {
        self.recurse_depth
    }

    pub fn height(&self) -> u64 {
        self.control.height()
    }

    pub fn db(&self) -> &'a Database {
        self.control.db
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.control.config
    }

    pub fn notified(&self) -> &[Regid] {
        &self.notified
    }

    pub fn pending_inline(&self) -> &[InlineTransaction] {
        &self.inline_transactions
    }

    pub fn console(&self) -> &str {
        &self.console
    }

    pub fn console_append(&mut self, text: &str) {
        self.console.push_str(text);
    }

    pub fn has_authorization(&self, account: Regid) -> bool {
        self.trx.authorization.iter().any(|p| p.account == account)
    }

    /// Only the authorization of the message being dispatched counts.
    pub fn require_auth(&self, account: Regid) -> Result<()> {
        if !self.has_authorization(account) {
            warn!(account = %account, receiver = %self.receiver, "missing authority");
            return Err(EngineError::MissingAuth(account));
        }
        Ok(())
    }

    pub fn has_recipient(&self, account: Regid) -> bool {
        self.notified.contains(&account)
    }

    pub fn notify_recipient(&mut self, account: Regid) -> Result<()> {
        if self.has_recipient(account) {
            return Ok(());
        }
        let max = self.control.config.limits.max_recipients_size;
        if self.notified_count >= max {
            return Err(EngineError::RecipientsExceeded { max });
        }
        self.notified_count += 1;
        self.notified.push(account);
        self.control.add_recipient();
        Ok(())
    }

    /// Validate and queue `trx` for dispatch after this level completes.
    ///
    /// A target of the bank module, or of any contract other than the
    /// receiver, accepts only the receiver's code permission. A call back
    /// into the receiver accepts the receiver's own permissions and any
    /// permission carried by the inbound transaction.
    pub fn execute_inline(&mut self, trx: InlineTransaction) -> Result<()> {
        let limits = &self.control.config.limits;
        if self.recurse_depth >= limits.max_inline_transaction_depth {
            return Err(EngineError::InlineDepthExceeded { max: limits.max_inline_transaction_depth });
        }
        if trx.data.len() > limits.max_inline_transaction_bytes {
            return Err(EngineError::InlineTransactionTooBig {
                size: trx.data.len(),
                max: limits.max_inline_transaction_bytes,
            });
        }
        if self.inline_transactions.len() >= limits.max_inline_transactions_size {
            return Err(EngineError::InlineQueueFull { max: limits.max_inline_transactions_size });
        }

        for p in &trx.authorization {
            let code_only = p.account == self.receiver && p.perm == CODE_PERMISSION;
            let allowed = if trx.contract == native::BANK_ID {
                code_only
            } else if trx.contract == self.receiver {
                p.account == self.receiver || self.trx.authorization.contains(p)
            } else {
                code_only
            };
            if !allowed {
                warn!(
                    target_contract = %trx.contract,
                    account = %p.account,
                    perm = %p.perm,
                    receiver = %self.receiver,
                    "inline authorization rejected"
                );
                return Err(EngineError::MissingInlineAuth {
                    contract: trx.contract,
                    account: p.account,
                    perm: p.perm,
                });
            }
        }

        debug!(
            from = %self.receiver,
            to = %trx.contract,
            action = %trx.action,
            depth = self.recurse_depth + 1,
            "inline transaction queued"
        );
        self.inline_transactions.push(trx);
        Ok(())
    }

    /// Storage growth is charged; shrinkage is not refunded.
    pub fn update_storage_usage(&mut self, account: Regid, delta_bytes: i64) -> Result<()> {
        if delta_bytes > 0 {
            let fee = (delta_bytes as u64).saturating_mul(self.control.config.fuel.store_fuel_per_byte);
            debug!(account = %account, bytes = delta_bytes, fee, "storage usage charged");
            self.control.add_cost(fee);
        }
        Ok(())
    }

    /// Charge the serialized size of the current message.
    pub fn charge_trx_size(&mut self) {
        let size = self.trx.packed_size() as u64;
        let fee = size.saturating_mul(self.control.config.fuel.store_fuel_per_byte);
        self.control.add_cost(fee);
    }

    pub fn push_receipt(&mut self, receipt: Receipt) {
        self.control.push_receipt(receipt);
    }

    pub fn is_account(&self, id: Regid) -> Result<bool> {
        Ok(self.db().accounts.exists(&id)?)
    }

    pub fn get_code(&self, id: Regid) -> Result<Option<Vec<u8>>> {
        Ok(self.db().contracts.get(&id)?.map(|record| record.code))
    }

    pub fn get_maintainer(&self, id: Regid) -> Result<Option<Regid>> {
        Ok(self.db().contracts.get(&id)?.map(|record| record.maintainer))
    }

    /// Native modules publish their ABI; deployed contracts store JSON.
    pub fn get_abi(&self, contract: Regid) -> Result<AbiDef> {
        if let Some(packed) = self.control.registry.abi(contract) {
            return Ok(AbiDef::from_packed(&packed)?);
        }
        let record = self
            .db()
            .contracts
            .get(&contract)?
            .ok_or_else(|| EngineError::Contract(format!("contract {contract} does not exist")))?;
        Ok(AbiDef::from_json(&record.abi)?)
    }

    pub fn abi_serializer(&self, contract: Regid) -> Result<AbiSerializer> {
        let abi = self.get_abi(contract)?;
        Ok(AbiSerializer::new(&abi, self.config().limits.abi_limits())?)
    }

    pub fn get_active_producers(&self) -> Result<Vec<Regid>> {
        Ok(self.db().delegates.get_active(self.config().voting.active_producers)?)
    }

    pub fn get_system_asset_price(&self, base: SymbolCode, quote: SymbolCode) -> Result<Option<u64>> {
        Ok(self.db().prices.get_price(base, quote)?)
    }
}
