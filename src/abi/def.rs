//! The ABI document: named types, structs, actions, tables and clauses.
//!
//! Two encodings: JSON (what developers write and what `setcode` receives)
//! and the packed binary form native modules publish.

use serde::{Deserialize, Serialize};

use crate::codec::{CodecError, DataStream, Pack, Unpack};
use crate::types::Name;

use super::AbiError;

pub const DEFAULT_ABI_VERSION: &str = "wasm::abi/1.0";
pub const ABI_VERSION_PREFIX: &str = "wasm::abi/1.";

fn default_version() -> String {
    DEFAULT_ABI_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl FieldDef {
    pub fn new(name: &str, ty: &str) -> Self {
        FieldDef { name: name.to_string(), ty: ty.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: Name,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableDef {
    pub name: Name,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub key_names: Vec<String>,
    #[serde(default)]
    pub key_types: Vec<String>,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClauseDef {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiDef {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub ricardian_clauses: Vec<ClauseDef>,
}

impl Default for AbiDef {
    fn default() -> Self {
        AbiDef {
            version: default_version(),
            types: Vec::new(),
            structs: Vec::new(),
            actions: Vec::new(),
            tables: Vec::new(),
            ricardian_clauses: Vec::new(),
        }
    }
}

impl AbiDef {
    pub fn from_json(text: &str) -> Result<Self, AbiError> {
        serde_json::from_str(text).map_err(|e| AbiError::Malformed(e.to_string()))
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, AbiError> {
        serde_json::from_slice(bytes).map_err(|e| AbiError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, AbiError> {
        serde_json::to_string(self).map_err(|e| AbiError::Malformed(e.to_string()))
    }

    pub fn from_packed(bytes: &[u8]) -> Result<Self, AbiError> {
        crate::codec::unpack(bytes).map_err(|e| AbiError::Malformed(e.to_string()))
    }

    pub fn is_supported_version(&self) -> bool {
        self.version.starts_with(ABI_VERSION_PREFIX)
    }

    /// Builder helper for native modules.
    pub fn add_struct(&mut self, name: &str, base: &str, fields: &[(&str, &str)]) -> &mut Self {
        self.structs.push(StructDef {
            name: name.to_string(),
            base: base.to_string(),
            fields: fields.iter().map(|(n, t)| FieldDef::new(n, t)).collect(),
        });
        self
    }

    pub fn add_action(&mut self, name: Name, ty: &str) -> &mut Self {
        self.actions.push(ActionDef { name, ty: ty.to_string(), ricardian_contract: String::new() });
        self
    }
}

impl Pack for TypeDef {
    fn pack(&self, out: &mut Vec<u8>) {
        self.new_type_name.pack(out);
        self.ty.pack(out);
    }
}

impl Unpack for TypeDef {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(TypeDef { new_type_name: String::unpack(ds)?, ty: String::unpack(ds)? })
    }
}

impl Pack for FieldDef {
    fn pack(&self, out: &mut Vec<u8>) {
        self.name.pack(out);
        self.ty.pack(out);
    }
}

impl Unpack for FieldDef {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(FieldDef { name: String::unpack(ds)?, ty: String::unpack(ds)? })
    }
}

impl Pack for StructDef {
    fn pack(&self, out: &mut Vec<u8>) {
        self.name.pack(out);
        self.base.pack(out);
        self.fields.pack(out);
    }
}

impl Unpack for StructDef {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(StructDef {
            name: String::unpack(ds)?,
            base: String::unpack(ds)?,
            fields: Vec::unpack(ds)?,
        })
    }
}

impl Pack for ActionDef {
    fn pack(&self, out: &mut Vec<u8>) {
        self.name.pack(out);
        self.ty.pack(out);
        self.ricardian_contract.pack(out);
    }
}

impl Unpack for ActionDef {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(ActionDef {
            name: Name::unpack(ds)?,
            ty: String::unpack(ds)?,
            ricardian_contract: String::unpack(ds)?,
        })
    }
}

impl Pack for TableDef {
    fn pack(&self, out: &mut Vec<u8>) {
        self.name.pack(out);
        self.index_type.pack(out);
        self.key_names.pack(out);
        self.key_types.pack(out);
        self.ty.pack(out);
    }
}

impl Unpack for TableDef {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(TableDef {
            name: Name::unpack(ds)?,
            index_type: String::unpack(ds)?,
            key_names: Vec::unpack(ds)?,
            key_types: Vec::unpack(ds)?,
            ty: String::unpack(ds)?,
        })
    }
}

impl Pack for ClauseDef {
    fn pack(&self, out: &mut Vec<u8>) {
        self.id.pack(out);
        self.body.pack(out);
    }
}

impl Unpack for ClauseDef {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(ClauseDef { id: String::unpack(ds)?, body: String::unpack(ds)? })
    }
}

impl Pack for AbiDef {
    fn pack(&self, out: &mut Vec<u8>) {
        self.version.pack(out);
        self.types.pack(out);
        self.structs.pack(out);
        self.actions.pack(out);
        self.tables.pack(out);
        self.ricardian_clauses.pack(out);
    }
}

impl Unpack for AbiDef {
    fn unpack(ds: &mut DataStream<'_>) -> Result<Self, CodecError> {
        Ok(AbiDef {
            version: String::unpack(ds)?,
            types: Vec::unpack(ds)?,
            structs: Vec::unpack(ds)?,
            actions: Vec::unpack(ds)?,
            tables: Vec::unpack(ds)?,
            ricardian_clauses: Vec::unpack(ds)?,
        })
    }
}
