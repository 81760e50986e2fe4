//! Fuzz tests for every decoder and for asset arithmetic.
//!
//! Random inputs must produce an error or a value, never a panic, and any
//! bytes that decode must encode back unchanged.

use rand::Rng;

use crate::abi::{AbiDef, AbiLimits, AbiSerializer};
use crate::codec::{self, Pack};
use crate::config::EngineConfig;
use crate::native::{bank, NativeRegistry, BANK_ID};
use crate::runtime::{InlineTransaction, NoBytecodeExecutor, Permission, TransactionController};
use crate::state::{Account, Database};
use crate::types::{Asset, Regid, MAX_AMOUNT};

fn random_bytes(rng: &mut impl Rng, max_len: usize) -> Vec<u8> {
    let len = rng.gen_range(0..=max_len);
    (0..len).map(|_| rng.gen()).collect()
}

/// Any input that decodes must encode back to the very same bytes.
fn assert_round_trip(abi: &AbiSerializer, ty: &str, bytes: &[u8]) {
    if let Ok(value) = abi.binary_to_json(ty, bytes) {
        let back = abi
            .json_to_binary(ty, &value)
            .unwrap_or_else(|e| panic!("{ty} decoded to {value} but does not encode: {e}"));
        assert_eq!(back, bytes, "{ty} round trip changed the bytes of {value}");
    }
}

fn random_transfer(rng: &mut impl Rng) -> Vec<u8> {
    let symbol = EngineConfig::default().system_symbol;
    let quantity = Asset::new(rng.gen_range(-MAX_AMOUNT..=MAX_AMOUNT), symbol).unwrap();
    let memo: String = (0..rng.gen_range(0..40)).map(|_| rng.gen::<char>()).collect();
    (Regid::from_raw(rng.gen()), Regid::from_raw(rng.gen()), quantity, memo).packed()
}

#[test]
fn fuzz_abi_binary_to_json() {
    let mut rng = rand::thread_rng();
    let abi = AbiSerializer::new(&AbiDef::from_packed(&bank::abi()).unwrap(), AbiLimits::default()).unwrap();

    for _ in 0..2000 {
        let bogus = random_bytes(&mut rng, 96);
        for ty in ["transfer", "asset[]", "string?", "bool[]", "varuint32[]"] {
            assert_round_trip(&abi, ty, &bogus);
        }

        let valid = random_transfer(&mut rng);
        assert!(abi.binary_to_json("transfer", &valid).is_ok());
        assert_round_trip(&abi, "transfer", &valid);

        let mut flipped = valid.clone();
        let at = rng.gen_range(0..flipped.len());
        flipped[at] ^= rng.gen_range(1..=255u8);
        assert_round_trip(&abi, "transfer", &flipped);
    }
}

#[test]
fn fuzz_packed_abi_documents() {
    let mut rng = rand::thread_rng();
    let valid = bank::abi();

    for _ in 0..1000 {
        let bogus = random_bytes(&mut rng, 128);
        if let Ok(def) = AbiDef::from_packed(&bogus) {
            let _ = AbiSerializer::new(&def, AbiLimits::default());
        }

        // single byte flips of a real document
        let mut flipped = valid.clone();
        let at = rng.gen_range(0..flipped.len());
        flipped[at] ^= rng.gen_range(1..=255u8);
        if let Ok(def) = AbiDef::from_packed(&flipped) {
            let _ = AbiSerializer::new(&def, AbiLimits::default());
        }
    }
}

#[test]
fn fuzz_inline_transaction_parsing() {
    let mut rng = rand::thread_rng();
    for _ in 0..2000 {
        let bogus = random_bytes(&mut rng, 64);
        let _ = codec::unpack::<InlineTransaction>(&bogus);
        let _ = codec::unpack::<Vec<Asset>>(&bogus);
    }
}

#[test]
fn fuzz_bank_action_data() {
    let mut rng = rand::thread_rng();
    let registry = NativeRegistry::with_builtin_modules();
    let config = EngineConfig::default();
    let alice = Regid::new(10, 1);

    for _ in 0..500 {
        let (db, _) = Database::in_memory();
        db.accounts.set(alice, Account::new(alice)).unwrap();
        let trx = InlineTransaction::new(
            BANK_ID,
            bank::TRANSFER,
            vec![Permission::code(alice)],
            random_bytes(&mut rng, 48),
        );
        let res = TransactionController::new(&registry, &NoBytecodeExecutor, &db, &config, 1).execute(&[trx]);
        assert!(res.is_err());
    }
}

#[test]
fn fuzz_asset_add_then_sub_is_identity() {
    let mut rng = rand::thread_rng();
    let symbol = EngineConfig::default().system_symbol;

    for _ in 0..5000 {
        let a = Asset::new(rng.gen_range(-MAX_AMOUNT..=MAX_AMOUNT), symbol).unwrap();
        let b = Asset::new(rng.gen_range(-MAX_AMOUNT..=MAX_AMOUNT), symbol).unwrap();
        if let Ok(sum) = a.checked_add(b) {
            assert_eq!(sum.checked_sub(b).unwrap(), a);
        }
    }
}
