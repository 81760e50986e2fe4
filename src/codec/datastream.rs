//! Binary stream primitives shared by every on-wire type.
//!
//! Layout rules (bit-exact with what contracts produce):
//! - fixed-width integers and floats are little-endian
//! - counts and length prefixes are LEB128 varints
//! - optionals are a one-byte presence flag followed by the payload
//! - no padding anywhere

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of stream: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("varint does not fit in {0} bits")]
    VarintOverflow(u32),

    #[error("invalid utf-8 in string")]
    InvalidUtf8,

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// Read cursor over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct DataStream<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DataStream<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::UnexpectedEof { needed: n, remaining: self.remaining() });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let src = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(src);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_varuint32(&mut self) -> Result<u32, CodecError> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let b = self.read_u8()?;
            value |= u64::from(b & 0x7f) << shift;
            if b & 0x80 == 0 {
                // shortest form only: no trailing zero group
                if b == 0 && shift > 0 {
                    return Err(CodecError::InvalidValue("non-canonical varint".into()));
                }
                break;
            }
            shift += 7;
            if shift >= 35 {
                return Err(CodecError::VarintOverflow(32));
            }
        }
        u32::try_from(value).map_err(|_| CodecError::VarintOverflow(32))
    }

    pub fn read_varint32(&mut self) -> Result<i32, CodecError> {
        let raw = self.read_varuint32()?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    /// Consume the stream, failing if anything is left unread.
    pub fn finish(self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

pub fn write_varuint32(out: &mut Vec<u8>, mut v: u32) {
    loop {
        let mut b = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            b |= 0x80;
        }
        out.push(b);
        if v == 0 {
            break;
        }
    }
}

pub fn write_varint32(out: &mut Vec<u8>, v: i32) {
    write_varuint32(out, ((v << 1) ^ (v >> 31)) as u32);
}

/// Types with a canonical binary form.
pub trait Pack {
    fn pack(&self, out: &mut Vec<u8>);

    fn packed(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.pack(&mut out);
        out
    }

    fn packed_size(&self) -> usize {
        self.packed().len()
    }
}

pub trait Unpack: Sized {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError>;
}

/// Decode a complete value; trailing bytes are an error.
pub fn unpack<T: Unpack>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut ds = DataStream::new(bytes);
    let value = T::unpack(&mut ds)?;
    ds.finish()?;
    Ok(value)
}

macro_rules! impl_fixed_width {
    ($($t:ty),*) => {$(
        impl Pack for $t {
            fn pack(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }

        impl Unpack for $t {
            fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
                Ok(<$t>::from_le_bytes(ds.read_array()?))
            }
        }
    )*};
}

impl_fixed_width!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, f32, f64);

impl Pack for bool {
    fn pack(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

impl Unpack for bool {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        match ds.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(CodecError::InvalidValue(format!("bool byte {b}"))),
        }
    }
}

impl Pack for str {
    fn pack(&self, out: &mut Vec<u8>) {
        write_varuint32(out, self.len() as u32);
        out.extend_from_slice(self.as_bytes());
    }
}

impl Pack for String {
    fn pack(&self, out: &mut Vec<u8>) {
        self.as_str().pack(out)
    }
}

impl Unpack for String {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        let len = ds.read_varuint32()? as usize;
        let raw = ds.read_bytes(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl<T: Pack> Pack for [T] {
    fn pack(&self, out: &mut Vec<u8>) {
        write_varuint32(out, self.len() as u32);
        for item in self {
            item.pack(out);
        }
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack(&self, out: &mut Vec<u8>) {
        self.as_slice().pack(out)
    }
}

impl<T: Unpack> Unpack for Vec<T> {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        let count = ds.read_varuint32()? as usize;
        // every element takes at least one byte
        if count > ds.remaining() {
            return Err(CodecError::UnexpectedEof { needed: count, remaining: ds.remaining() });
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::unpack(ds)?);
        }
        Ok(items)
    }
}

impl<T: Pack> Pack for Option<T> {
    fn pack(&self, out: &mut Vec<u8>) {
        match self {
            Some(v) => {
                out.push(1);
                v.pack(out);
            }
            None => out.push(0),
        }
    }
}

impl<T: Unpack> Unpack for Option<T> {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        match ds.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(T::unpack(ds)?)),
            b => Err(CodecError::InvalidValue(format!("optional flag {b}"))),
        }
    }
}

impl<const N: usize> Pack for [u8; N] {
    fn pack(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl<const N: usize> Unpack for [u8; N] {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        ds.read_array()
    }
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack(&self, out: &mut Vec<u8>) {
        (**self).pack(out)
    }
}

macro_rules! impl_tuple {
    ($($idx:tt $name:ident),+) => {
        impl<$($name: Pack),+> Pack for ($($name,)+) {
            fn pack(&self, out: &mut Vec<u8>) {
                $(self.$idx.pack(out);)+
            }
        }

        impl<$($name: Unpack),+> Unpack for ($($name,)+) {
            fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
                Ok(($($name::unpack(ds)?,)+))
            }
        }
    };
}

impl_tuple!(0 A);
impl_tuple!(0 A, 1 B);
impl_tuple!(0 A, 1 B, 2 C);
impl_tuple!(0 A, 1 B, 2 C, 3 D);
impl_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
