//! Integration tests: deploy contracts, run transactions across native and
//! bytecode receivers, check state and traces.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::thread;

use crate::codec::Pack;
use crate::config::EngineConfig;
use crate::native::bank::TRANSFER;
use crate::native::setcode::SETCODE;
use crate::native::voting::{MINT_REWARDS, ON_MINT, VOTE};
use crate::native::{NativeRegistry, BANK_ID, SETCODE_ID, VOTING_ID};
use crate::runtime::{
    BytecodeExecutor, ExecutionContext, InlineTransaction, Permission, TransactionController, TransactionTrace,
};
use crate::state::{Account, AccountStore, ContractStore, Database, DelegateStore, InMemHandles};
use crate::types::{Asset, Name, Regid, Symbol};
use crate::utils::errors::{EngineError, ErrorKind, Result};

type Program = Box<dyn Fn(&mut ExecutionContext<'_, '_>) -> Result<()>>;

/// Executor keyed by code bytes, standing in for a virtual machine.
#[derive(Default)]
struct Programs {
    by_code: HashMap<Vec<u8>, Program>,
}

impl Programs {
    fn with(mut self, code: &[u8], program: impl Fn(&mut ExecutionContext<'_, '_>) -> Result<()> + 'static) -> Self {
        self.by_code.insert(code.to_vec(), Box::new(program));
        self
    }
}

impl BytecodeExecutor for Programs {
    fn execute(&self, code: &[u8], ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
        match self.by_code.get(code) {
            Some(program) => program(ctx),
            None => Err(EngineError::Executor(format!("unknown program {}", hex::encode(code)))),
        }
    }
}

const ALICE: Regid = Regid::new(10, 1);
const BOB: Regid = Regid::new(10, 2);
const EXCHANGE: Regid = Regid::new(20, 1);
const GOVERNANCE: Regid = Regid::new(0, 1000);

const EXCHANGE_CODE: &[u8] = b"exchange";
const WALLET_CODE: &[u8] = b"wallet";
const GOVERNANCE_CODE: &[u8] = b"governance";

const ABI: &str = r#"{
    "structs": [{"name": "pay", "base": "", "fields": [{"name": "to", "type": "regid"}, {"name": "quantity", "type": "asset"}]}],
    "actions": [{"name": "pay", "type": "pay"}]
}"#;

fn sys(text: &str) -> Asset {
    text.parse().unwrap()
}

fn sys_symbol() -> Symbol {
    EngineConfig::default().system_symbol
}

struct Chain {
    db: Database,
    handles: InMemHandles,
    registry: NativeRegistry,
    config: EngineConfig,
    height: u64,
}

impl Chain {
    fn new() -> Self {
        let (db, handles) = Database::in_memory();
        for id in [ALICE, BOB, EXCHANGE, GOVERNANCE] {
            db.accounts.set(id, Account::new(id)).unwrap();
        }
        let mut alice = Account::new(ALICE);
        alice.credit(sys("100.00000000 SYS")).unwrap();
        db.accounts.set(ALICE, alice).unwrap();
        Chain { db, handles, registry: NativeRegistry::with_builtin_modules(), config: EngineConfig::default(), height: 1 }
    }

    fn run(&self, executor: &dyn BytecodeExecutor, trxs: &[InlineTransaction]) -> Result<TransactionTrace> {
        TransactionController::new(&self.registry, executor, &self.db, &self.config, self.height).execute(trxs)
    }

    fn deploy(&self, account: Regid, code: &[u8]) {
        let data = (account, code.to_vec(), ABI, "").packed();
        let trx = InlineTransaction::new(SETCODE_ID, SETCODE, vec![Permission::code(account)], data);
        self.run(&Programs::default(), &[trx]).unwrap();
    }

    fn balance(&self, id: Regid) -> u64 {
        self.handles.accounts.get(&id).unwrap().unwrap().balance(sys_symbol())
    }
}

fn transfer(from: Regid, to: Regid, quantity: Asset, auth: Permission) -> InlineTransaction {
    InlineTransaction::with_args(BANK_ID, TRANSFER, vec![auth], &(from, to, quantity, ""))
}

fn pay(to: Regid, quantity: Asset, auth: Vec<Permission>) -> InlineTransaction {
    InlineTransaction::with_args(EXCHANGE, Name::from_static("pay"), auth, &(to, quantity))
}

/// Pays out of its own balance through the bank.
fn exchange(ctx: &mut ExecutionContext<'_, '_>) -> Result<()> {
    if ctx.receiver() != EXCHANGE || ctx.action() != Name::from_static("pay") {
        return Ok(());
    }
    let abi = ctx.abi_serializer(EXCHANGE)?;
    let args = abi.action_data_to_json(ctx.action(), ctx.data())?;
    let to: Regid = serde_json::from_value(args["to"].clone()).map_err(|e| EngineError::Contract(e.to_string()))?;
    let quantity: Asset =
        serde_json::from_value(args["quantity"].clone()).map_err(|e| EngineError::Contract(e.to_string()))?;
    ctx.console_append(&format!("paying {quantity} to {to}\n"));
    ctx.execute_inline(transfer(EXCHANGE, to, quantity, Permission::code(EXCHANGE)))
}

#[test]
fn direct_transfer_debits_credits_and_notifies_both_parties() {
    let chain = Chain::new();
    let trace = chain
        .run(&Programs::default(), &[transfer(ALICE, BOB, sys("0.00000100 SYS"), Permission::code(ALICE))])
        .unwrap();

    assert_eq!(chain.balance(ALICE), 100 * 100_000_000 - 100);
    assert_eq!(chain.balance(BOB), 100);
    assert_eq!(trace.traces[0].receivers(), vec![BANK_ID, ALICE, BOB]);
    assert_eq!(trace.receipts.len(), 1);
    assert_eq!(trace.trx_id.len(), 64);
}

#[test]
fn transfer_to_self_is_a_native_assertion() {
    let chain = Chain::new();
    let err = chain
        .run(&Programs::default(), &[transfer(ALICE, ALICE, sys("1.00000000 SYS"), Permission::code(ALICE))])
        .unwrap_err();
    assert!(matches!(err.root_cause(), EngineError::NativeAssert(msg) if msg == "cannot transfer to self"));
    assert_eq!(chain.balance(ALICE), 100 * 100_000_000);
}

#[test]
fn deployed_contract_pays_through_the_bank_and_wallets_hear_about_it() {
    let chain = Chain::new();
    chain.deploy(EXCHANGE, EXCHANGE_CODE);
    chain.deploy(BOB, WALLET_CODE);

    let heard = Rc::new(RefCell::new(Vec::new()));
    let log = heard.clone();
    let programs = Programs::default().with(EXCHANGE_CODE, exchange).with(WALLET_CODE, move |ctx| {
        log.borrow_mut().push((ctx.contract(), ctx.action(), ctx.depth()));
        Ok(())
    });

    chain.run(&programs, &[transfer(ALICE, EXCHANGE, sys("5.00000000 SYS"), Permission::code(ALICE))]).unwrap();
    let trace = chain.run(&programs, &[pay(BOB, sys("2.00000000 SYS"), vec![Permission::code(ALICE)])]).unwrap();

    assert_eq!(chain.balance(EXCHANGE), 3 * 100_000_000);
    assert_eq!(chain.balance(BOB), 2 * 100_000_000);
    assert_eq!(*heard.borrow(), vec![(BANK_ID, TRANSFER, 1)]);
    assert_eq!(trace.traces[0].receivers(), vec![EXCHANGE, BANK_ID, EXCHANGE, BOB]);
    assert_eq!(trace.traces[0].console, "paying 2.00000000 SYS to 10-2\n");
}

#[test]
fn contract_cannot_spend_a_callers_forwarded_authority() {
    let chain = Chain::new();
    chain.deploy(EXCHANGE, EXCHANGE_CODE);
    let programs = Programs::default().with(EXCHANGE_CODE, |ctx| {
        if ctx.receiver() != EXCHANGE {
            return Ok(());
        }
        // the inbound message carries alice's permission, the bank still refuses it
        let forwarded = ctx.authorization()[0];
        ctx.execute_inline(transfer(ALICE, EXCHANGE, sys("1.00000000 SYS"), forwarded))
    });

    let err = chain.run(&programs, &[pay(BOB, sys("1.00000000 SYS"), vec![Permission::code(ALICE)])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(matches!(err.root_cause(), EngineError::MissingInlineAuth { account, .. } if *account == ALICE));
    assert_eq!(chain.balance(ALICE), 100 * 100_000_000);
}

#[test]
fn one_call_past_the_depth_limit_aborts_before_touching_state() {
    thread::Builder::new()
        .stack_size(256 << 20)
        .spawn(|| {
            let chain = Chain::new();
            chain.deploy(EXCHANGE, EXCHANGE_CODE);
            let programs = Programs::default().with(EXCHANGE_CODE, |ctx| {
                if ctx.depth() == 250 {
                    // the bank call must never be queued
                    return ctx.execute_inline(transfer(EXCHANGE, BOB, sys("1.00000000 SYS"), Permission::code(EXCHANGE)));
                }
                ctx.execute_inline(pay(BOB, sys("1.00000000 SYS"), vec![Permission::code(EXCHANGE)]))
            });

            let err = chain.run(&programs, &[pay(BOB, sys("1.00000000 SYS"), vec![])]).unwrap_err();
            assert!(matches!(err.root_cause(), EngineError::InlineDepthExceeded { max: 250 }));
            assert_eq!(err.kind(), ErrorKind::ResourceLimit);
            assert_eq!(chain.balance(BOB), 0);
        })
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn self_referencing_alias_cannot_be_deployed() {
    let chain = Chain::new();
    let data = (EXCHANGE, EXCHANGE_CODE.to_vec(), r#"{"types":[{"new_type_name":"a","type":"a"}]}"#, "").packed();
    let trx = InlineTransaction::new(SETCODE_ID, SETCODE, vec![Permission::code(EXCHANGE)], data);

    let err = chain.run(&Programs::default(), &[trx]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(chain.handles.contracts.get(&EXCHANGE).unwrap().is_none());
}

#[test]
fn governance_votes_and_mints_through_inline_calls() {
    let mut chain = Chain::new();
    chain.deploy(GOVERNANCE, GOVERNANCE_CODE);
    chain.height = 5;

    let minted = Rc::new(RefCell::new(Vec::new()));
    let log = minted.clone();
    let programs = Programs::default().with(GOVERNANCE_CODE, move |ctx| {
        if ctx.receiver() != GOVERNANCE {
            return Ok(());
        }
        let me = vec![Permission::code(GOVERNANCE)];
        match ctx.action() {
            a if a == Name::from_static("elect") => {
                ctx.execute_inline(InlineTransaction::with_args(VOTING_ID, VOTE, me.clone(), &(BOB, 7i64, "")))?;
                ctx.execute_inline(InlineTransaction::with_args(VOTING_ID, MINT_REWARDS, me, &(BOB, "block 5")))
            }
            a if a == ON_MINT => {
                ctx.require_auth(VOTING_ID)?;
                let (to, quantity, memo): (Regid, Asset, String) = crate::codec::unpack(ctx.data())?;
                log.borrow_mut().push((to, quantity.amount, memo));
                Ok(())
            }
            _ => Ok(()),
        }
    });

    let elect = InlineTransaction::new(GOVERNANCE, Name::from_static("elect"), vec![], vec![]);
    let trace = chain.run(&programs, &[elect]).unwrap();

    let reward = 5 * chain.config.voting.reward_per_block;
    assert_eq!(chain.balance(BOB), reward as u64);
    assert_eq!(*minted.borrow(), vec![(BOB, reward, "block 5".to_string())]);
    assert!(chain.handles.delegates.contains(BOB, 7));
    assert_eq!(chain.handles.delegates.get_active(11).unwrap(), vec![BOB]);
    assert_eq!(trace.traces[0].receivers(), vec![GOVERNANCE, VOTING_ID, VOTING_ID, GOVERNANCE]);
}

#[test]
fn failed_dispatch_reports_where_and_what_was_printed() {
    let chain = Chain::new();
    chain.deploy(EXCHANGE, EXCHANGE_CODE);
    let programs = Programs::default().with(EXCHANGE_CODE, |ctx| {
        ctx.console_append("checking caller\n");
        ctx.require_auth(BOB)
    });

    let err = chain.run(&programs, &[pay(BOB, sys("1.00000000 SYS"), vec![])]).unwrap_err();
    match &err {
        EngineError::Dispatch { contract, receiver, console, .. } => {
            assert_eq!((*contract, *receiver), (EXCHANGE, EXCHANGE));
            assert_eq!(console, "checking caller\n");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(err.to_string().starts_with("[(20-1,pay)->20-1]"));
}
