//! Helpers shared by the native modules.

use crate::codec::{self, Unpack};
use crate::runtime::context::ExecutionContext;
use crate::state::Account;
use crate::types::Regid;
use crate::utils::errors::{EngineError, Result};

pub const MAX_MEMO_SIZE: usize = 256;

/// Fail the current action with a native-module assertion.
macro_rules! native_assert {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            return Err($crate::utils::errors::EngineError::NativeAssert(format!($($arg)+)));
        }
    };
}

pub(crate) use native_assert;

/// Every native action: the receiver must be the module itself, and the
/// message size is charged.
pub fn begin_action(ctx: &mut ExecutionContext<'_, '_>, module: Regid) -> Result<()> {
    if ctx.receiver() != module {
        return Err(EngineError::WrongReceiver { module, receiver: ctx.receiver() });
    }
    ctx.charge_trx_size();
    Ok(())
}

pub fn read_args<T: Unpack>(ctx: &ExecutionContext<'_, '_>) -> Result<T> {
    Ok(codec::unpack(ctx.data())?)
}

pub fn load_account(ctx: &ExecutionContext<'_, '_>, id: Regid) -> Result<Account> {
    ctx.db().accounts.get(&id)?.ok_or(EngineError::AccountNotFound(id))
}

pub fn store_account(ctx: &ExecutionContext<'_, '_>, account: Account) -> Result<()> {
    Ok(ctx.db().accounts.set(account.regid, account)?)
}

pub fn check_memo(memo: &str) -> Result<()> {
    native_assert!(memo.len() <= MAX_MEMO_SIZE, "memo has more than {} bytes", MAX_MEMO_SIZE);
    Ok(())
}
