//! Engine configuration loaded from TOML.
//!
//! Every field is defaulted, so an empty document yields the stock limits.
//! The value is handed to the controller by reference; nothing here is
//! process-global.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::abi::AbiLimits;
use crate::types::{Regid, Symbol};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_inline_transaction_depth: u32,
    pub max_recipients_size: usize,
    pub max_abi_array_size: usize,
    pub max_serialization_time_ms: u64,
    pub max_inline_transaction_bytes: usize,
    pub max_inline_transactions_size: usize,
    pub max_transaction_duration_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_inline_transaction_depth: 250,
            max_recipients_size: 16,
            max_abi_array_size: 8192,
            max_serialization_time_ms: 25,
            max_inline_transaction_bytes: 4096,
            max_inline_transactions_size: 1024,
            max_transaction_duration_ms: 2000,
        }
    }
}

impl LimitsConfig {
    pub fn abi_limits(&self) -> AbiLimits {
        AbiLimits {
            max_array_size: self.max_abi_array_size,
            max_serialization_time: Duration::from_millis(self.max_serialization_time_ms),
        }
    }

    pub fn max_transaction_duration(&self) -> Duration {
        Duration::from_millis(self.max_transaction_duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    pub store_fuel_per_byte: u64,
    pub notice_fuel_per_recipient: u64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        FuelConfig { store_fuel_per_byte: 10, notice_fuel_per_recipient: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    /// The only account whose authority `vote` and `mintrewards` accept.
    pub governance_contract: Regid,
    /// Smallest units of the system symbol minted per block.
    pub reward_per_block: i64,
    pub reward_start_height: u64,
    pub active_producers: usize,
}

impl Default for VotingConfig {
    fn default() -> Self {
        VotingConfig {
            governance_contract: Regid::new(0, 1000),
            reward_per_block: 100_000_000,
            reward_start_height: 0,
            active_producers: 11,
        }
    }
}

// "8,SYS"
const DEFAULT_SYSTEM_SYMBOL: Symbol =
    Symbol::from_raw(((b'S' as u64 | (b'Y' as u64) << 8 | (b'S' as u64) << 16) << 8) | 8);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: LimitsConfig,
    pub fuel: FuelConfig,
    pub voting: VotingConfig,
    /// Log captured contract console output after each dispatch.
    pub contracts_console: bool,
    pub system_symbol: Symbol,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            limits: LimitsConfig::default(),
            fuel: FuelConfig::default(),
            voting: VotingConfig::default(),
            contracts_console: false,
            system_symbol: DEFAULT_SYSTEM_SYMBOL,
        }
    }
}

impl EngineConfig {
    /// Load engine config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.limits.max_recipients_size > 0, "max_recipients_size must be positive");
        ensure!(self.limits.max_inline_transaction_depth > 0, "max_inline_transaction_depth must be positive");
        ensure!(self.system_symbol.is_valid(), "invalid system symbol {}", self.system_symbol);
        ensure!(self.voting.reward_per_block >= 0, "reward_per_block must not be negative");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.limits.max_inline_transaction_depth, 250);
        assert_eq!(cfg.system_symbol.to_string(), "8,SYS");
        assert_eq!(cfg.limits.abi_limits().max_serialization_time, Duration::from_millis(25));
    }

    #[test]
    fn sections_override_individual_fields() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            contracts_console = true
            system_symbol = "4,WICC"

            [limits]
            max_recipients_size = 4

            [voting]
            governance_contract = "0-950"
            "#,
        )
        .unwrap();
        assert!(cfg.contracts_console);
        assert_eq!(cfg.limits.max_recipients_size, 4);
        assert_eq!(cfg.limits.max_abi_array_size, 8192);
        assert_eq!(cfg.voting.governance_contract, Regid::new(0, 950));
        assert_eq!(cfg.system_symbol.precision(), 4);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EngineConfig::from_toml_str("[limits]\nmax_recipients_size = 0").is_err());
        assert!(EngineConfig::from_toml_str("system_symbol = \"20,SYS\"").is_err());
    }
}
