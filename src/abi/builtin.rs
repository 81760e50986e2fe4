//! Built-in ABI types and their binary <-> JSON conversions.

use std::str::FromStr;

use serde_json::{Number, Value};

use crate::codec::{write_varint32, write_varuint32, DataStream, Pack, Unpack};
use crate::types;

macro_rules! builtins {
    ($($variant:ident => $($name:literal)|+),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Builtin {
            $($variant),*
        }

        impl Builtin {
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($($name)|+ => Some(Builtin::$variant),)*
                    _ => None,
                }
            }

            pub const NAMES: &'static [&'static str] = &[$($($name),+),*];
        }
    };
}

builtins! {
    Bool => "bool",
    Int8 => "int8",
    Uint8 => "uint8",
    Int16 => "int16",
    Uint16 => "uint16",
    Int32 => "int32",
    Uint32 => "uint32",
    Int64 => "int64",
    Uint64 => "uint64",
    Int128 => "int128",
    Uint128 => "uint128",
    VarInt32 => "varint32" | "signed_int",
    VarUint32 => "varuint32" | "unsigned_int",
    Float32 => "float32",
    Float64 => "float64",
    TimePointSec => "time_point_sec",
    Name => "name" | "action_name" | "table_name",
    Regid => "regid",
    Bytes => "bytes",
    Str => "string",
    Checksum160 => "checksum160",
    Checksum256 => "checksum256" | "hash256",
    Checksum512 => "checksum512",
    Symbol => "symbol",
    SymbolCode => "symbol_code",
    Asset => "asset",
}

pub fn is_builtin(name: &str) -> bool {
    Builtin::from_name(name).is_some()
}

fn read<T: Unpack>(ds: &mut DataStream<'_>) -> Result<T, String> {
    T::unpack(ds).map_err(|e| e.to_string())
}

fn float(v: f64) -> Result<Value, String> {
    Number::from_f64(v).map(Value::Number).ok_or_else(|| format!("non-finite float {v}"))
}

fn int<T>(value: &Value) -> Result<T, String>
where
    T: TryFrom<u64> + TryFrom<i64> + FromStr,
{
    let out_of_range = || format!("integer {value} out of range");
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                <T as TryFrom<u64>>::try_from(u).map_err(|_| out_of_range())
            } else if let Some(i) = n.as_i64() {
                <T as TryFrom<i64>>::try_from(i).map_err(|_| out_of_range())
            } else {
                Err(format!("expected integer, got {n}"))
            }
        }
        Value::String(s) => s.parse().map_err(|_| format!("invalid integer '{s}'")),
        other => Err(format!("expected integer, got {other}")),
    }
}

fn text(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| format!("expected string, got {value}"))
}

fn parse<T>(value: &Value) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text(value)?.parse().map_err(|e: T::Err| e.to_string())
}

fn number(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("invalid number {n}")),
        Value::String(s) => s.parse().map_err(|_| format!("invalid number '{s}'")),
        other => Err(format!("expected number, got {other}")),
    }
}

fn fixed<const N: usize>(value: &Value, out: &mut Vec<u8>) -> Result<(), String> {
    let raw = hex::decode(text(value)?).map_err(|e| e.to_string())?;
    if raw.len() != N {
        return Err(format!("expected {N} bytes, got {}", raw.len()));
    }
    out.extend_from_slice(&raw);
    Ok(())
}

impl Builtin {
    pub fn decode(self, ds: &mut DataStream<'_>) -> Result<Value, String> {
        Ok(match self {
            Builtin::Bool => Value::Bool(read(ds)?),
            Builtin::Int8 => read::<i8>(ds)?.into(),
            Builtin::Uint8 => read::<u8>(ds)?.into(),
            Builtin::Int16 => read::<i16>(ds)?.into(),
            Builtin::Uint16 => read::<u16>(ds)?.into(),
            Builtin::Int32 => read::<i32>(ds)?.into(),
            Builtin::Uint32 | Builtin::TimePointSec => read::<u32>(ds)?.into(),
            Builtin::Int64 => read::<i64>(ds)?.into(),
            Builtin::Uint64 => read::<u64>(ds)?.into(),
            Builtin::Int128 => Value::String(read::<i128>(ds)?.to_string()),
            Builtin::Uint128 => Value::String(read::<u128>(ds)?.to_string()),
            Builtin::VarInt32 => ds.read_varint32().map_err(|e| e.to_string())?.into(),
            Builtin::VarUint32 => ds.read_varuint32().map_err(|e| e.to_string())?.into(),
            Builtin::Float32 => float(f64::from(read::<f32>(ds)?))?,
            Builtin::Float64 => float(read::<f64>(ds)?)?,
            Builtin::Name => Value::String(read::<types::Name>(ds)?.to_string()),
            Builtin::Regid => Value::String(read::<types::Regid>(ds)?.to_string()),
            Builtin::Bytes => Value::String(hex::encode(read::<Vec<u8>>(ds)?)),
            Builtin::Str => Value::String(read(ds)?),
            Builtin::Checksum160 => Value::String(hex::encode(read::<[u8; 20]>(ds)?)),
            Builtin::Checksum256 => Value::String(hex::encode(read::<[u8; 32]>(ds)?)),
            Builtin::Checksum512 => Value::String(hex::encode(read::<[u8; 64]>(ds)?)),
            Builtin::Symbol => {
                let sym = read::<types::Symbol>(ds)?;
                if !sym.is_valid() {
                    return Err(format!("invalid symbol raw value {}", sym.raw()));
                }
                Value::String(sym.to_string())
            }
            Builtin::SymbolCode => {
                let code = read::<types::SymbolCode>(ds)?;
                if !code.is_valid() {
                    return Err(format!("invalid symbol code raw value {}", code.raw()));
                }
                Value::String(code.to_string())
            }
            Builtin::Asset => {
                let asset = read::<types::Asset>(ds)?;
                if !asset.is_valid() {
                    return Err(format!(
                        "invalid asset (amount {}, symbol raw {})",
                        asset.amount,
                        asset.symbol.raw()
                    ));
                }
                Value::String(asset.to_string())
            }
        })
    }

    pub fn encode(self, value: &Value, out: &mut Vec<u8>) -> Result<(), String> {
        match self {
            Builtin::Bool => value
                .as_bool()
                .ok_or_else(|| format!("expected boolean, got {value}"))?
                .pack(out),
            Builtin::Int8 => int::<i8>(value)?.pack(out),
            Builtin::Uint8 => int::<u8>(value)?.pack(out),
            Builtin::Int16 => int::<i16>(value)?.pack(out),
            Builtin::Uint16 => int::<u16>(value)?.pack(out),
            Builtin::Int32 => int::<i32>(value)?.pack(out),
            Builtin::Uint32 | Builtin::TimePointSec => int::<u32>(value)?.pack(out),
            Builtin::Int64 => int::<i64>(value)?.pack(out),
            Builtin::Uint64 => int::<u64>(value)?.pack(out),
            Builtin::Int128 => int::<i128>(value)?.pack(out),
            Builtin::Uint128 => int::<u128>(value)?.pack(out),
            Builtin::VarInt32 => write_varint32(out, int::<i32>(value)?),
            Builtin::VarUint32 => write_varuint32(out, int::<u32>(value)?),
            Builtin::Float32 => (number(value)? as f32).pack(out),
            Builtin::Float64 => number(value)?.pack(out),
            Builtin::Name => parse::<types::Name>(value)?.pack(out),
            Builtin::Regid => match value {
                Value::Number(_) => types::Regid::from_raw(int::<u64>(value)?).pack(out),
                _ => parse::<types::Regid>(value)?.pack(out),
            },
            Builtin::Bytes => hex::decode(text(value)?).map_err(|e| e.to_string())?.pack(out),
            Builtin::Str => text(value)?.pack(out),
            Builtin::Checksum160 => fixed::<20>(value, out)?,
            Builtin::Checksum256 => fixed::<32>(value, out)?,
            Builtin::Checksum512 => fixed::<64>(value, out)?,
            Builtin::Symbol => parse::<types::Symbol>(value)?.pack(out),
            Builtin::SymbolCode => parse::<types::SymbolCode>(value)?.pack(out),
            Builtin::Asset => parse::<types::Asset>(value)?.pack(out),
        }
        Ok(())
    }
}
