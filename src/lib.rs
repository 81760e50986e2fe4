//! Contract invocation engine.
//!
//! Routes inline transactions to native modules or deployed bytecode,
//! enforces capability-based authorization and bounded recursion, and
//! converts action data between its binary and JSON forms through a
//! contract's ABI.

pub mod abi;
pub mod cli;
pub mod codec;
pub mod config;
pub mod native;
pub mod runtime;
pub mod state;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;

pub use config::EngineConfig;
pub use native::NativeRegistry;
pub use runtime::{BytecodeExecutor, ExecutionContext, InlineTransaction, TransactionController, TransactionTrace};
pub use state::Database;
pub use utils::errors::{EngineError, ErrorKind, Result};
