//! Domain primitives: account ids, names, symbols and fixed-point assets.
//!
//! Pure value types. Every constructor that can observe an invalid input
//! returns `PrimitiveError` instead of producing an out-of-range value.

pub mod asset;
pub mod name;
pub mod regid;
pub mod symbol;

pub use asset::{Asset, MAX_AMOUNT};
pub use name::Name;
pub use regid::Regid;
pub use symbol::{Symbol, SymbolCode, MAX_PRECISION};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("invalid regid '{0}', expected 'height-index'")]
    InvalidRegid(String),

    #[error("invalid name '{0}': {1}")]
    InvalidName(String, &'static str),

    #[error("invalid symbol '{0}': {1}")]
    InvalidSymbol(String, String),

    #[error("invalid asset '{0}': {1}")]
    InvalidAsset(String, String),

    #[error("{0}")]
    Overflow(&'static str),

    #[error("attempt to {0} assets with different symbols")]
    SymbolMismatch(&'static str),

    #[error("divide by zero")]
    DivideByZero,
}

/// Serialize through the canonical string form (`Display` / `FromStr`).
macro_rules! impl_string_serde {
    ($t:ty) => {
        impl serde::Serialize for $t {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $t {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(d)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_string_serde;
