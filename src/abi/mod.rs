//! Contract ABI: the schema document, its validation, and the schema-driven
//! conversion of action data between the binary wire form and JSON.

pub mod builtin;
pub mod def;
pub mod serializer;
pub mod traverse;

pub use builtin::Builtin;
pub use def::{AbiDef, ActionDef, ClauseDef, FieldDef, StructDef, TableDef, TypeDef};
pub use serializer::{AbiLimits, AbiSerializer};
pub use traverse::TraverseContext;

use thiserror::Error;

use crate::types::Name;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("duplicate {namespace} definition '{name}'")]
    DuplicateDefinition { namespace: &'static str, name: String },

    #[error("circular definition detected in type '{0}'")]
    CircularDefinition(String),

    #[error("unsupported abi version '{0}'")]
    UnsupportedVersion(String),

    #[error("invalid type '{ty}' in {context}")]
    InvalidType { ty: String, context: String },

    #[error("array size {size} exceeds maximum {max}")]
    ArraySizeExceeded { size: usize, max: usize },

    #[error("serialization time limit of {limit_us}us exceeded")]
    DeadlineExceeded { limit_us: u64 },

    #[error("unable to unpack '{path}': {reason}")]
    Unpack { path: String, reason: String },

    #[error("unable to pack '{path}': {reason}")]
    Pack { path: String, reason: String },

    #[error("unknown action '{0}'")]
    UnknownAction(Name),

    #[error("malformed abi: {0}")]
    Malformed(String),
}
