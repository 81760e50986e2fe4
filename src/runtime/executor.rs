//! Seam to the bytecode virtual machine.
//!
//! The engine never interprets contract code itself. It hands the code and a
//! mutable context to a `BytecodeExecutor`; the executor calls back into the
//! context (`require_auth`, `execute_inline`, `notify_recipient`, ...) and
//! reports failure through the returned `Result`.

use crate::runtime::context::ExecutionContext;
use crate::utils::errors::{EngineError, Result};

pub trait BytecodeExecutor {
    fn execute(&self, code: &[u8], ctx: &mut ExecutionContext<'_, '_>) -> Result<()>;
}

/// Executor for hosts that only run native modules.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBytecodeExecutor;

impl BytecodeExecutor for NoBytecodeExecutor {
    fn execute(&self, code: &[u8], ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
        Err(EngineError::Executor(format!(
            "no bytecode executor configured ({} bytes of code at {})",
            code.len(),
            ctx.receiver()
        )))
    }
}
