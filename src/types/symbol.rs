//! Token symbols. A `SymbolCode` holds up to seven characters with the first
//! character in the lowest byte; a `Symbol` adds the decimal precision in the
//! low byte of `(code << 8) | precision`.

use std::fmt;
use std::str::FromStr;

use crate::codec::{CodecError, DataStream, Pack, Unpack};

use super::{impl_string_serde, PrimitiveError};

pub const MAX_PRECISION: u8 = 18;
pub const MAX_CODE_LEN: usize = 7;

fn valid_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'@' | b'.' | b'#')
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SymbolCode(u64);

impl SymbolCode {
    pub const fn from_raw(value: u64) -> Self {
        SymbolCode(value)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Non-empty, in-alphabet bytes up to the first zero and zeros after it.
    pub fn is_valid(self) -> bool {
        let bytes = self.0.to_le_bytes();
        if bytes[MAX_CODE_LEN] != 0 || !valid_char(bytes[0]) {
            return false;
        }
        let mut ended = false;
        for &b in &bytes[1..MAX_CODE_LEN] {
            if ended {
                if b != 0 {
                    return false;
                }
            } else if b == 0 {
                ended = true;
            } else if !valid_char(b) {
                return false;
            }
        }
        true
    }

    pub fn len(self) -> usize {
        self.0.to_le_bytes().iter().take_while(|b| **b != 0).count()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromStr for SymbolCode {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_CODE_LEN {
            return Err(PrimitiveError::InvalidSymbol(
                s.to_string(),
                "code must be 1 to 7 characters".into(),
            ));
        }
        let mut value = 0u64;
        for &c in bytes.iter().rev() {
            if !valid_char(c) {
                return Err(PrimitiveError::InvalidSymbol(
                    s.to_string(),
                    format!("invalid character '{}'", c as char),
                ));
            }
            value = (value << 8) | u64::from(c);
        }
        Ok(SymbolCode(value))
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self
            .0
            .to_le_bytes()
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| *b as char)
            .collect();
        f.write_str(&text)
    }
}

impl fmt::Debug for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolCode({self})")
    }
}

impl_string_serde!(SymbolCode);

impl Pack for SymbolCode {
    fn pack(&self, out: &mut Vec<u8>) {
        self.0.pack(out)
    }
}

impl Unpack for SymbolCode {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        u64::unpack(ds).map(SymbolCode)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Symbol(u64);

impl Symbol {
    pub fn new(code: SymbolCode, precision: u8) -> Result<Self, PrimitiveError> {
        let sym = Symbol((code.raw() << 8) | u64::from(precision));
        if precision > MAX_PRECISION {
            return Err(PrimitiveError::InvalidSymbol(
                sym.to_string(),
                format!("precision must not exceed {MAX_PRECISION}"),
            ));
        }
        if !code.is_valid() {
            return Err(PrimitiveError::InvalidSymbol(sym.to_string(), "invalid code".into()));
        }
        Ok(sym)
    }

    pub const fn from_raw(value: u64) -> Self {
        Symbol(value)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn code(self) -> SymbolCode {
        SymbolCode(self.0 >> 8)
    }

    pub const fn precision(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn is_valid(self) -> bool {
        self.precision() <= MAX_PRECISION && self.code().is_valid()
    }

    /// `10^precision`; callers must check `is_valid` first.
    pub fn precision_in_10(self) -> i64 {
        10i64.pow(u32::from(self.precision().min(MAX_PRECISION)))
    }
}

impl FromStr for Symbol {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s.trim().split_once(',').ok_or_else(|| {
            PrimitiveError::InvalidSymbol(s.to_string(), "expected 'precision,CODE'".into())
        })?;
        let precision: u8 = precision.trim().parse().map_err(|_| {
            PrimitiveError::InvalidSymbol(s.to_string(), "precision is not a number".into())
        })?;
        Symbol::new(code.trim().parse()?, precision)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

impl_string_serde!(Symbol);

impl Pack for Symbol {
    fn pack(&self, out: &mut Vec<u8>) {
        self.0.pack(out)
    }
}

impl Unpack for Symbol {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        u64::unpack(ds).map(Symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_first_char_is_lowest_byte() {
        let code: SymbolCode = "WICC".parse().unwrap();
        assert_eq!(code.raw() & 0xff, u64::from(b'W'));
        assert_eq!(code.to_string(), "WICC");
        assert_eq!(code.len(), 4);
        assert!(code.is_valid());
    }

    #[test]
    fn code_validity() {
        assert!("".parse::<SymbolCode>().is_err());
        assert!("TOOLONGX".parse::<SymbolCode>().is_err());
        assert!("A B".parse::<SymbolCode>().is_err());
        assert!("a@.#_9".parse::<SymbolCode>().is_ok());
        // gap after the first zero byte
        assert!(!SymbolCode::from_raw(u64::from(b'A') | (u64::from(b'B') << 16)).is_valid());
        assert!(!SymbolCode::from_raw(0).is_valid());
    }

    #[test]
    fn symbol_string_form() {
        let sym: Symbol = "8,WICC".parse().unwrap();
        assert_eq!(sym.precision(), 8);
        assert_eq!(sym.code().to_string(), "WICC");
        assert_eq!(sym.to_string(), "8,WICC");
        assert_eq!(sym.precision_in_10(), 100_000_000);
        assert!("19,WICC".parse::<Symbol>().is_err());
        assert!("WICC".parse::<Symbol>().is_err());
    }
}
