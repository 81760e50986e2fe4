//! 64-bit base-32 names used for actions, permissions and table names.
//!
//! Alphabet `_12345abcdefghijklmnopqrstuvwxyz` with `_` = 0. Characters 1-12
//! take five bits each from the high end; a 13th character takes the low four
//! bits and is therefore limited to `_` through `j`.

use std::fmt;
use std::str::FromStr;

use crate::codec::{CodecError, DataStream, Pack, Unpack};

use super::{impl_string_serde, PrimitiveError};

const CHARMAP: &[u8; 32] = b"_12345abcdefghijklmnopqrstuvwxyz";
pub const MAX_NAME_LEN: usize = 13;

const fn char_value(c: u8) -> Option<u64> {
    match c {
        b'_' => Some(0),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(u64);

impl Name {
    pub const fn from_raw(value: u64) -> Self {
        Name(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Compile-time conversion for well-known names. Characters outside the
    /// alphabet encode as `_`; only use with literals known to be valid.
    pub const fn from_static(s: &str) -> Self {
        let bytes = s.as_bytes();
        let mut value = 0u64;
        let mut i = 0;
        while i < bytes.len() && i < 12 {
            let v = match char_value(bytes[i]) {
                Some(v) => v,
                None => 0,
            };
            value |= (v & 0x1f) << (64 - 5 * (i + 1));
            i += 1;
        }
        if bytes.len() == MAX_NAME_LEN {
            let v = match char_value(bytes[12]) {
                Some(v) => v,
                None => 0,
            };
            value |= v & 0x0f;
        }
        Name(value)
    }
}

impl FromStr for Name {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_NAME_LEN {
            return Err(PrimitiveError::InvalidName(s.to_string(), "longer than 13 characters"));
        }
        let mut value = 0u64;
        for (i, &c) in bytes.iter().enumerate() {
            let v = char_value(c)
                .ok_or_else(|| PrimitiveError::InvalidName(s.to_string(), "character outside [_1-5a-z]"))?;
            if i < 12 {
                value |= v << (64 - 5 * (i + 1));
            } else {
                if v > 0x0f {
                    return Err(PrimitiveError::InvalidName(
                        s.to_string(),
                        "13th character must be in [_1-5a-j]",
                    ));
                }
                value |= v;
            }
        }
        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MASK: u64 = 0xf800_0000_0000_0000;
        let mut out = String::with_capacity(MAX_NAME_LEN);
        let mut v = self.0;
        for i in 0..MAX_NAME_LEN {
            if v == 0 {
                break;
            }
            let shift = if i == 12 { 60 } else { 59 };
            out.push(CHARMAP[((v & MASK) >> shift) as usize] as char);
            v <<= 5;
        }
        f.write_str(&out)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl_string_serde!(Name);

impl Pack for Name {
    fn pack(&self, out: &mut Vec<u8>) {
        self.0.pack(out)
    }
}

impl Unpack for Name {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        u64::unpack(ds).map(Name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string() {
        for s in ["transfer", "wasmio_code", "a", "zzzzzzzzzzzzj", "setcode", "a1b2c3"] {
            let n: Name = s.parse().unwrap();
            assert_eq!(n.to_string(), s);
            assert_eq!(Name::from_static(s), n);
        }
    }

    #[test]
    fn empty_name_is_zero() {
        let n: Name = "".parse().unwrap();
        assert!(n.is_empty());
        assert_eq!(n.to_string(), "");
    }

    #[test]
    fn rejects_bad_input() {
        assert!("Transfer".parse::<Name>().is_err());
        assert!("a6".parse::<Name>().is_err());
        assert!("aaaaaaaaaaaaaa".parse::<Name>().is_err());
        assert!("aaaaaaaaaaaak".parse::<Name>().is_err());
    }

    #[test]
    fn first_character_uses_high_bits() {
        let n: Name = "b".parse().unwrap();
        assert_eq!(n.value(), 7u64 << 59);
    }
}
