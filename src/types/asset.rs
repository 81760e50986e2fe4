//! Fixed-point token amounts.
//!
//! `amount` is an integer count of the smallest unit; the symbol's precision
//! says how many of those make one whole token. Every arithmetic operation is
//! checked and fails rather than wrapping or leaving the valid range.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::codec::{CodecError, DataStream, Pack, Unpack};

use super::{impl_string_serde, PrimitiveError, Symbol, SymbolCode, MAX_PRECISION};

/// 9 * 10^10 whole tokens at precision 8.
pub const MAX_AMOUNT: i64 = 900 * 100_000_000 * 100_000_000;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Result<Self, PrimitiveError> {
        let asset = Asset { amount, symbol };
        if !symbol.is_valid() {
            return Err(PrimitiveError::InvalidAsset(asset.to_string(), "invalid symbol".into()));
        }
        if !asset.is_amount_within_range() {
            return Err(PrimitiveError::Overflow("asset amount out of range"));
        }
        Ok(asset)
    }

    pub fn is_amount_within_range(&self) -> bool {
        (-MAX_AMOUNT..=MAX_AMOUNT).contains(&self.amount)
    }

    pub fn is_valid(&self) -> bool {
        self.is_amount_within_range() && self.symbol.is_valid()
    }

    fn checked(self, amount: Option<i64>, what: &'static str) -> Result<Asset, PrimitiveError> {
        match amount {
            Some(amount) if (-MAX_AMOUNT..=MAX_AMOUNT).contains(&amount) => {
                Ok(Asset { amount, symbol: self.symbol })
            }
            _ => Err(PrimitiveError::Overflow(what)),
        }
    }

    pub fn checked_neg(self) -> Result<Asset, PrimitiveError> {
        self.checked(self.amount.checked_neg(), "negation overflow")
    }

    pub fn checked_add(self, rhs: Asset) -> Result<Asset, PrimitiveError> {
        if self.symbol != rhs.symbol {
            return Err(PrimitiveError::SymbolMismatch("add"));
        }
        self.checked(self.amount.checked_add(rhs.amount), "addition overflow")
    }

    pub fn checked_sub(self, rhs: Asset) -> Result<Asset, PrimitiveError> {
        if self.symbol != rhs.symbol {
            return Err(PrimitiveError::SymbolMismatch("subtract"));
        }
        self.checked(self.amount.checked_sub(rhs.amount), "subtraction overflow")
    }

    pub fn checked_mul(self, factor: i64) -> Result<Asset, PrimitiveError> {
        self.checked(self.amount.checked_mul(factor), "multiplication overflow")
    }

    pub fn checked_div(self, divisor: i64) -> Result<Asset, PrimitiveError> {
        if divisor == 0 {
            return Err(PrimitiveError::DivideByZero);
        }
        self.checked(self.amount.checked_div(divisor), "signed division overflow")
    }

    /// Integer ratio of two amounts with the same symbol.
    pub fn ratio(self, rhs: Asset) -> Result<i64, PrimitiveError> {
        if self.symbol != rhs.symbol {
            return Err(PrimitiveError::SymbolMismatch("divide"));
        }
        if rhs.amount == 0 {
            return Err(PrimitiveError::DivideByZero);
        }
        self.amount
            .checked_div(rhs.amount)
            .ok_or(PrimitiveError::Overflow("signed division overflow"))
    }

    pub fn try_cmp(&self, rhs: &Asset) -> Result<Ordering, PrimitiveError> {
        if self.symbol != rhs.symbol {
            return Err(PrimitiveError::SymbolMismatch("compare"));
        }
        Ok(self.amount.cmp(&rhs.amount))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = usize::from(self.symbol.precision().min(MAX_PRECISION));
        let unit = 10u64.pow(precision as u32);
        let abs = self.amount.unsigned_abs();
        let sign = if self.amount < 0 { "-" } else { "" };
        if precision == 0 {
            write!(f, "{sign}{abs} {}", self.symbol.code())
        } else {
            write!(
                f,
                "{sign}{}.{:0width$} {}",
                abs / unit,
                abs % unit,
                self.symbol.code(),
                width = precision
            )
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({self})")
    }
}

impl FromStr for Asset {
    type Err = PrimitiveError;

    /// `"[-]int[.frac] CODE"`; the precision is the number of fraction digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| PrimitiveError::InvalidAsset(s.to_string(), why.to_string());

        let (amount_str, code_str) = s.trim().split_once(' ').ok_or_else(|| invalid("missing symbol"))?;
        let (negative, digits) = match amount_str.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount_str),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((_, "")) => return Err(invalid("missing decimal fraction after decimal point")),
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("malformed integer part"));
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("malformed fraction"));
        }
        if frac_part.len() > usize::from(MAX_PRECISION) {
            return Err(invalid("precision exceeds 18"));
        }

        let code: SymbolCode = code_str.trim().parse()?;
        let symbol = Symbol::new(code, frac_part.len() as u8)?;

        let unit = i128::from(symbol.precision_in_10());
        let whole: i128 = int_part.parse().map_err(|_| invalid("integer part out of range"))?;
        let frac: i128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid("fraction out of range"))?
        };
        let magnitude = whole
            .checked_mul(unit)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| invalid("amount out of range"))?;
        let amount = if negative { -magnitude } else { magnitude };
        if amount.abs() > i128::from(MAX_AMOUNT) {
            return Err(invalid("amount out of range"));
        }
        Ok(Asset { amount: amount as i64, symbol })
    }
}

impl_string_serde!(Asset);

impl Pack for Asset {
    fn pack(&self, out: &mut Vec<u8>) {
        self.amount.pack(out);
        self.symbol.pack(out);
    }
}

impl Unpack for Asset {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        let amount = i64::unpack(ds)?;
        let symbol = Symbol::unpack(ds)?;
        Ok(Asset { amount, symbol })
    }
}
