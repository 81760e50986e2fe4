//! Runtime module: dispatches inline transactions to native modules or
//! deployed bytecode.
//!
//! Exposes:
//! - TransactionController: one submitted transaction, its cost and trace.
//! - ExecutionContext: one dispatch against one receiver.
//! - BytecodeExecutor: seam to the contract virtual machine.
//! - transaction: wire types, permissions, traces and receipts.

pub mod context;
pub mod controller;
pub mod executor;
pub mod transaction;

pub use context::ExecutionContext;
pub use controller::TransactionController;
pub use executor::{BytecodeExecutor, NoBytecodeExecutor};
pub use transaction::{
    InlineTransaction, InlineTransactionTrace, Permission, Receipt, TransactionTrace, CODE_PERMISSION,
    OWNER_PERMISSION,
};
