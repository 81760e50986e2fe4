//! Registration id: `(height << 20) | index`, written `"height-index"`.

use std::fmt;
use std::str::FromStr;

use crate::codec::{CodecError, DataStream, Pack, Unpack};

use super::{impl_string_serde, PrimitiveError};

const INDEX_BITS: u32 = 20;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;
pub const MAX_HEIGHT: u64 = (1 << 44) - 1;

/// Compact account / contract identifier, ordered by its packed value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Regid(u64);

impl Regid {
    /// Index bits beyond 20 are dropped; use `try_new` for checked input.
    pub const fn new(height: u64, index: u32) -> Self {
        Regid((height << INDEX_BITS) | (index as u64 & INDEX_MASK))
    }

    pub fn try_new(height: u64, index: u64) -> Result<Self, PrimitiveError> {
        if height > MAX_HEIGHT || index > INDEX_MASK {
            return Err(PrimitiveError::InvalidRegid(format!("{height}-{index}")));
        }
        Ok(Regid((height << INDEX_BITS) | index))
    }

    pub const fn from_raw(value: u64) -> Self {
        Regid(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn height(self) -> u64 {
        self.0 >> INDEX_BITS
    }

    pub const fn index(self) -> u32 {
        (self.0 & INDEX_MASK) as u32
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Regid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.height(), self.index())
    }
}

impl fmt::Debug for Regid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regid({self})")
    }
}

impl FromStr for Regid {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrimitiveError::InvalidRegid(s.to_string());
        let (height, index) = s.trim().split_once('-').ok_or_else(invalid)?;
        let height: u64 = height.parse().map_err(|_| invalid())?;
        let index: u64 = index.parse().map_err(|_| invalid())?;
        Regid::try_new(height, index).map_err(|_| invalid())
    }
}

impl From<Regid> for u64 {
    fn from(r: Regid) -> u64 {
        r.0
    }
}

impl_string_serde!(Regid);

impl Pack for Regid {
    fn pack(&self, out: &mut Vec<u8>) {
        self.0.pack(out)
    }
}

impl Unpack for Regid {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        u64::unpack(ds).map(Regid)
    }
}
