//! Inline transactions, permissions, receipts and execution traces.

use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, DataStream, Pack, Unpack};
use crate::types::{Asset, Name, Regid};
use crate::utils::serde_helpers::{as_hex, from_hex};

/// Code-level authority of a contract over itself.
pub const CODE_PERMISSION: Name = Name::from_static("wasmio_code");
pub const OWNER_PERMISSION: Name = Name::from_static("wasmio_owner");

/// `account` grants `perm` to the executing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub account: Regid,
    pub perm: Name,
}

impl Permission {
    pub fn new(account: Regid, perm: Name) -> Self {
        Self { account, perm }
    }

    pub fn code(account: Regid) -> Self {
        Self::new(account, CODE_PERMISSION)
    }
}

impl Pack for Permission {
    fn pack(&self, out: &mut Vec<u8>) {
        self.account.pack(out);
        self.perm.pack(out);
    }
}

impl Unpack for Permission {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(Permission { account: Regid::unpack(ds)?, perm: Name::unpack(ds)? })
    }
}

/// A message to a contract. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineTransaction {
    pub contract: Regid,
    pub action: Name,
    #[serde(default)]
    pub authorization: Vec<Permission>,
    #[serde(default, serialize_with = "as_hex", deserialize_with = "from_hex")]
    pub data: Vec<u8>,
}

impl InlineTransaction {
    pub fn new(contract: Regid, action: Name, authorization: Vec<Permission>, data: Vec<u8>) -> Self {
        Self { contract, action, authorization, data }
    }

    /// Build with `data` packed from a typed value.
    pub fn with_args<T: Pack>(contract: Regid, action: Name, authorization: Vec<Permission>, args: &T) -> Self {
        Self::new(contract, action, authorization, args.packed())
    }
}

impl Pack for InlineTransaction {
    fn pack(&self, out: &mut Vec<u8>) {
        self.contract.pack(out);
        self.action.pack(out);
        self.authorization.pack(out);
        self.data.pack(out);
    }
}

impl Unpack for InlineTransaction {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(InlineTransaction {
            contract: Regid::unpack(ds)?,
            action: Name::unpack(ds)?,
            authorization: Vec::unpack(ds)?,
            data: Vec::unpack(ds)?,
        })
    }
}

/// Balance movement emitted by native modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub from: Regid,
    pub to: Regid,
    pub quantity: Asset,
    pub memo: String,
}

/// One dispatch: the primary receiver, or a notified recipient, or a queued
/// inline transaction. Children mirror the call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineTransactionTrace {
    pub trx_id: String,
    pub receiver: Regid,
    pub trx: InlineTransaction,
    pub elapsed_us: u64,
    pub console: String,
    pub inline_traces: Vec<InlineTransactionTrace>,
}

impl InlineTransactionTrace {
    pub fn new(trx: &InlineTransaction, receiver: Regid) -> Self {
        Self {
            trx_id: String::new(),
            receiver,
            trx: trx.clone(),
            elapsed_us: 0,
            console: String::new(),
            inline_traces: Vec::new(),
        }
    }

    /// Every receiver in dispatch order, depth first.
    pub fn receivers(&self) -> Vec<Regid> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(t) = stack.pop() {
            out.push(t.receiver);
            stack.extend(t.inline_traces.iter().rev());
        }
        out
    }
}

/// Result of running one submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTrace {
    pub trx_id: String,
    pub elapsed_us: u64,
    pub run_cost: u64,
    pub traces: Vec<InlineTransactionTrace>,
    pub receipts: Vec<Receipt>,
}
