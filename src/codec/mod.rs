//! Canonical binary codec used on the wire and in contract storage.

pub mod datastream;
pub mod varint;

pub use datastream::{unpack, write_varint32, write_varuint32, CodecError, DataStream, Pack, Unpack};
pub use varint::{SignedInt, UnsignedInt};
