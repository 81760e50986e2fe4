//! Code deployment module.
//!
//! Contract records live in the contract store keyed by the contract's
//! regid. The first deployer becomes the maintainer; only the maintainer
//! may redeploy or hand the contract over.

use sha2::{Digest, Sha256};
use tracing::info;

use super::commons::{begin_action, check_memo, native_assert, read_args};
use super::SETCODE_ID;
use crate::abi::{AbiDef, AbiSerializer};
use crate::codec::Pack;
use crate::runtime::context::ExecutionContext;
use crate::state::ContractRecord;
use crate::types::{Name, Regid};
use crate::utils::errors::{EngineError, Result};

pub const SETCODE: Name = Name::from_static("setcode");
pub const SETCODER: Name = Name::from_static("setcoder");

pub fn abi() -> Vec<u8> {
    let mut abi = AbiDef::default();
    abi.add_struct(
        "setcode",
        "",
        &[("account", "regid"), ("code", "bytes"), ("abi", "string"), ("memo", "string")],
    )
    .add_struct("setcoder", "", &[("contract", "regid"), ("maintainer", "regid")])
    .add_action(SETCODE, "setcode")
    .add_action(SETCODER, "setcoder");
    abi.packed()
}

pub fn dispatch(ctx: &mut ExecutionContext<'_, '_>, action: Name) -> Result<()> {
    begin_action(ctx, SETCODE_ID)?;
    match action {
        SETCODE => setcode(ctx),
        SETCODER => setcoder(ctx),
        _ => Err(EngineError::ActionNotFound { module: SETCODE_ID, action }),
    }
}

fn setcode(ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
    let (account, code, abi, memo): (Regid, Vec<u8>, String, String) = read_args(ctx)?;

    ctx.require_auth(account)?;
    native_assert!(ctx.is_account(account)?, "account '{}' does not exist", account);
    native_assert!(!code.is_empty(), "code of contract '{}' is empty", account);
    check_memo(&memo)?;

    let def = AbiDef::from_json(&abi)?;
    AbiSerializer::new(&def, ctx.config().limits.abi_limits())?;

    let existing = ctx.db().contracts.get(&account)?;
    let maintainer = match &existing {
        Some(record) => {
            if record.maintainer != account {
                ctx.require_auth(record.maintainer)?;
            }
            record.maintainer
        }
        None => account,
    };
    let old_size = existing.as_ref().map_or(0, |r| r.code.len() + r.abi.len());
    let new_size = code.len() + abi.len();

    let code_hash = hex::encode(Sha256::digest(&code));
    info!(contract = %account, maintainer = %maintainer, code_hash = %code_hash, bytes = code.len(), "contract deployed");

    ctx.db().contracts.save(account, ContractRecord { maintainer, code, abi, memo, code_hash })?;
    ctx.update_storage_usage(account, new_size as i64 - old_size as i64)
}

fn setcoder(ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
    let (contract, maintainer): (Regid, Regid) = read_args(ctx)?;

    let mut record = ctx
        .db()
        .contracts
        .get(&contract)?
        .ok_or_else(|| EngineError::Contract(format!("contract {contract} does not exist")))?;
    ctx.require_auth(record.maintainer)?;
    native_assert!(ctx.is_account(maintainer)?, "maintainer '{}' does not exist", maintainer);

    info!(contract = %contract, from = %record.maintainer, to = %maintainer, "maintainer changed");
    record.maintainer = maintainer;
    ctx.db().contracts.save(contract, record)?;
    Ok(())
}
