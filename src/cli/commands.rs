use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::abi::{AbiDef, AbiSerializer};
use crate::cli::genesis::Genesis;
use crate::config::EngineConfig;
use crate::native::NativeRegistry;
use crate::runtime::{InlineTransaction, NoBytecodeExecutor, TransactionController, TransactionTrace};
use crate::state::Account;
use crate::types::Regid;
use crate::utils::logging::init_logging;

/// Stack for `exec`: every inline level nests a few frames.
const EXEC_STACK_SIZE: usize = 256 * 1024 * 1024;

/// CLI for the contract engine.
#[derive(Parser)]
#[clap(name = "contract-engine", version)]
pub struct Cli {
    /// Engine config (TOML); defaults apply when omitted
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// log filter used when RUST_LOG is unset
    #[clap(long, global = true, default_value = "info")]
    pub log_level: String,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// ABI document tools
    Abi {
        #[clap(subcommand)]
        cmd: AbiCmd,
    },
    /// Print the ABI published by a native module
    NativeAbi {
        /// module regid, e.g. 0-800
        regid: Regid,
    },
    /// Run a transaction against in-memory state
    Exec {
        /// genesis state (JSON)
        #[clap(long)]
        genesis: PathBuf,

        /// one inline transaction or a list of them (JSON)
        #[clap(long)]
        tx: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum AbiCmd {
    /// Load and validate an ABI document
    Validate { file: PathBuf },
    /// Encode a JSON value as hex
    JsonToBin {
        #[clap(long)]
        abi: PathBuf,
        #[clap(long = "type")]
        ty: String,
        #[clap(long)]
        json: String,
    },
    /// Decode hex into JSON
    BinToJson {
        #[clap(long)]
        abi: PathBuf,
        #[clap(long = "type")]
        ty: String,
        #[clap(long)]
        hex: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TxFile {
    Many(Vec<InlineTransaction>),
    One(InlineTransaction),
}

#[derive(Serialize)]
struct ExecOutput {
    trace: TransactionTrace,
    accounts: Vec<Account>,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.cmd {
        Cmd::Abi { cmd } => run_abi(cmd, &config),
        Cmd::NativeAbi { regid } => {
            let registry = NativeRegistry::with_builtin_modules();
            let packed = registry.abi(regid).ok_or_else(|| anyhow!("{regid} is not a native module"))?;
            println!("{}", AbiDef::from_packed(&packed)?.to_json()?);
            Ok(())
        }
        Cmd::Exec { genesis, tx } => {
            let genesis = Genesis::load(genesis)?;
            let trxs = load_transactions(&tx)?;
            info!(transactions = trxs.len(), height = genesis.height, "executing");
            let output = thread::Builder::new()
                .name("exec".into())
                .stack_size(EXEC_STACK_SIZE)
                .spawn(move || exec(&genesis, &trxs, &config))?
                .join()
                .map_err(|_| anyhow!("execution thread panicked"))??;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

fn run_abi(cmd: AbiCmd, config: &EngineConfig) -> Result<()> {
    match cmd {
        AbiCmd::Validate { file } => {
            let abi = load_abi(&file, config)?;
            println!("{}: ok ({})", file.display(), abi.version());
        }
        AbiCmd::JsonToBin { abi, ty, json } => {
            let abi = load_abi(&abi, config)?;
            let value: Value = serde_json::from_str(&json).context("parsing --json")?;
            println!("{}", hex::encode(abi.json_to_binary(&ty, &value)?));
        }
        AbiCmd::BinToJson { abi, ty, hex: text } => {
            let abi = load_abi(&abi, config)?;
            let bytes = hex::decode(text.trim_start_matches("0x")).context("parsing --hex")?;
            println!("{}", abi.binary_to_json(&ty, &bytes)?);
        }
    }
    Ok(())
}

fn load_abi(path: &Path, config: &EngineConfig) -> Result<AbiSerializer> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    AbiSerializer::from_json(&text, config.limits.abi_limits())
        .with_context(|| format!("loading ABI {}", path.display()))
}

fn load_transactions(path: &Path) -> Result<Vec<InlineTransaction>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let trxs = match serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))? {
        TxFile::Many(trxs) => trxs,
        TxFile::One(trx) => vec![trx],
    };
    if trxs.is_empty() {
        bail!("{} holds no transactions", path.display());
    }
    Ok(trxs)
}

fn exec(genesis: &Genesis, trxs: &[InlineTransaction], config: &EngineConfig) -> Result<ExecOutput> {
    let (db, handles) = genesis.build()?;
    let registry = NativeRegistry::with_builtin_modules();
    let trace = TransactionController::new(&registry, &NoBytecodeExecutor, &db, config, genesis.height)
        .execute(trxs)?;
    Ok(ExecOutput { trace, accounts: handles.accounts.all() })
}
