//! Producer voting and block reward minting.
//!
//! Both actions are driven by the governance contract named in
//! `[voting]`; end users never call this module directly.

use tracing::info;

use super::commons::{begin_action, check_memo, load_account, native_assert, read_args, store_account};
use super::VOTING_ID;
use crate::abi::AbiDef;
use crate::codec::Pack;
use crate::runtime::context::ExecutionContext;
use crate::runtime::transaction::{InlineTransaction, Permission, Receipt};
use crate::types::{Asset, Name, Regid};
use crate::utils::errors::{EngineError, Result};

pub const VOTE: Name = Name::from_static("vote");
pub const MINT_REWARDS: Name = Name::from_static("mintrewards");
pub const ON_MINT: Name = Name::from_static("on_mint");

pub fn abi() -> Vec<u8> {
    let mut abi = AbiDef::default();
    abi.add_struct("vote", "", &[("candidate", "regid"), ("votes", "int64"), ("memo", "string")])
        .add_struct("mintrewards", "", &[("to", "regid"), ("memo", "string")])
        .add_action(VOTE, "vote")
        .add_action(MINT_REWARDS, "mintrewards");
    abi.packed()
}

pub fn dispatch(ctx: &mut ExecutionContext<'_, '_>, action: Name) -> Result<()> {
    begin_action(ctx, VOTING_ID)?;
    match action {
        VOTE => vote(ctx),
        MINT_REWARDS => mint_rewards(ctx),
        _ => Err(EngineError::ActionNotFound { module: VOTING_ID, action }),
    }
}

fn vote(ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
    let (candidate, votes, memo): (Regid, i64, String) = read_args(ctx)?;

    ctx.require_auth(ctx.config().voting.governance_contract)?;
    check_memo(&memo)?;

    let mut account = load_account(ctx, candidate)?;
    let old_total = account.received_votes;
    let new_total = if votes >= 0 {
        old_total.checked_add(votes.unsigned_abs())
    } else {
        old_total.checked_sub(votes.unsigned_abs())
    };
    let Some(new_total) = new_total else {
        return Err(EngineError::NativeAssert(format!(
            "votes of '{candidate}' out of range: {old_total} {votes:+}"
        )));
    };

    account.received_votes = new_total;
    store_account(ctx, account)?;

    // a zero delta files and then erases the same entry
    let delegates = &ctx.db().delegates;
    delegates.set_votes(candidate, new_total)?;
    delegates.erase_votes(candidate, old_total)?;

    info!(candidate = %candidate, old_total, new_total, "votes updated");
    Ok(())
}

fn mint_rewards(ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
    let (to, memo): (Regid, String) = read_args(ctx)?;

    let voting = &ctx.config().voting;
    let governance = voting.governance_contract;
    ctx.require_auth(governance)?;
    check_memo(&memo)?;

    let height = ctx.height();
    let last = ctx.db().rewards.last_mint_height()?.unwrap_or(voting.reward_start_height);
    native_assert!(height > last, "no rewards to mint at height {} (last mint at {})", height, last);

    let amount = i64::try_from(height - last)
        .ok()
        .and_then(|blocks| blocks.checked_mul(voting.reward_per_block))
        .ok_or_else(|| EngineError::NativeAssert(format!("rewards overflow at height {height}")))?;
    let quantity = Asset::new(amount, ctx.config().system_symbol)?;
    native_assert!(quantity.amount > 0, "rewards must be positive, got {}", quantity);

    let mut account = load_account(ctx, to)?;
    account.credit(quantity)?;
    store_account(ctx, account)?;
    ctx.db().rewards.set_last_mint_height(height)?;

    info!(to = %to, quantity = %quantity, height, "rewards minted");
    ctx.push_receipt(Receipt { from: VOTING_ID, to, quantity, memo: memo.clone() });
    ctx.execute_inline(InlineTransaction::with_args(
        governance,
        ON_MINT,
        vec![Permission::code(VOTING_ID)],
        &(to, quantity, memo),
    ))
}
