//! Bank module: moves balances between accounts.

use tracing::info;

use super::commons::{begin_action, check_memo, load_account, native_assert, read_args, store_account};
use super::BANK_ID;
use crate::abi::AbiDef;
use crate::codec::Pack;
use crate::runtime::context::ExecutionContext;
use crate::runtime::transaction::Receipt;
use crate::types::{Asset, Name, Regid};
use crate::utils::errors::{EngineError, Result};

pub const TRANSFER: Name = Name::from_static("transfer");
pub const TRANSFER_PRECISION: u8 = 8;

pub fn abi() -> Vec<u8> {
    let mut abi = AbiDef::default();
    abi.add_struct(
        "transfer",
        "",
        &[("from", "regid"), ("to", "regid"), ("quantity", "asset"), ("memo", "string")],
    )
    .add_action(TRANSFER, "transfer");
    abi.packed()
}

pub fn dispatch(ctx: &mut ExecutionContext<'_, '_>, action: Name) -> Result<()> {
    begin_action(ctx, BANK_ID)?;
    match action {
        TRANSFER => transfer(ctx),
        _ => Err(EngineError::ActionNotFound { module: BANK_ID, action }),
    }
}

fn transfer(ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
    let (from, to, quantity, memo): (Regid, Regid, Asset, String) = read_args(ctx)?;

    ctx.require_auth(from)?;
    native_assert!(from != to, "cannot transfer to self");
    native_assert!(ctx.is_account(to)?, "to account '{}' does not exist", to);
    native_assert!(quantity.is_valid(), "invalid quantity");
    native_assert!(quantity.amount > 0, "must transfer positive quantity");
    native_assert!(
        quantity.symbol.precision() == TRANSFER_PRECISION,
        "quantity precision must be {}, got {}",
        TRANSFER_PRECISION,
        quantity.symbol.precision()
    );
    check_memo(&memo)?;

    let mut from_account = load_account(ctx, from)?;
    from_account.debit(quantity)?;
    store_account(ctx, from_account)?;

    let mut to_account = load_account(ctx, to)?;
    to_account.credit(quantity)?;
    store_account(ctx, to_account)?;

    info!(from = %from, to = %to, quantity = %quantity, "transfer");
    ctx.push_receipt(Receipt { from, to, quantity, memo });
    ctx.notify_recipient(from)?;
    ctx.notify_recipient(to)?;
    Ok(())
}
