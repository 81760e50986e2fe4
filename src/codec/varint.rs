//! LEB128 variable-length integers (`varuint32` / `varint32` in ABIs).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::datastream::{write_varint32, write_varuint32, CodecError, DataStream, Pack, Unpack};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnsignedInt(pub u32);

/// Zigzag-encoded signed varint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedInt(pub i32);

impl Pack for UnsignedInt {
    fn pack(&self, out: &mut Vec<u8>) {
        write_varuint32(out, self.0);
    }
}

impl Unpack for UnsignedInt {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        ds.read_varuint32().map(UnsignedInt)
    }
}

impl Pack for SignedInt {
    fn pack(&self, out: &mut Vec<u8>) {
        write_varint32(out, self.0);
    }
}

impl Unpack for SignedInt {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        ds.read_varint32().map(SignedInt)
    }
}

impl fmt::Display for UnsignedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for SignedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
