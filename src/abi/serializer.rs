//! A validated ABI and the schema-driven codec built on it.
//!
//! Every walk over the schema (validation, alias resolution, encode, decode)
//! is an explicit work-list loop that polls a `TraverseContext`, so neither
//! deeply nested nor cyclic input can exhaust the call stack or run past the
//! configured time budget.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::codec::{write_varuint32, DataStream};
use crate::types::Name;

use super::builtin::{is_builtin, Builtin};
use super::def::{AbiDef, FieldDef, StructDef};
use super::{AbiError, TraverseContext};

pub const DEFAULT_MAX_ARRAY_SIZE: usize = 8192;
pub const DEFAULT_MAX_SERIALIZATION_TIME: Duration = Duration::from_millis(25);

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiLimits {
    pub max_array_size: usize,
    pub max_serialization_time: Duration,
}

impl Default for AbiLimits {
    fn default() -> Self {
        AbiLimits {
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
            max_serialization_time: DEFAULT_MAX_SERIALIZATION_TIME,
        }
    }
}

enum Shape<'a> {
    Builtin(Builtin),
    Array(&'a str),
    Optional(&'a str),
    Struct(&'a StructDef),
}

/// Strip one `$`, `[]` or `?` suffix.
fn strip_one(ty: &str) -> Option<&str> {
    ty.strip_suffix('$')
        .or_else(|| ty.strip_suffix("[]"))
        .or_else(|| ty.strip_suffix('?'))
}

fn fundamental(mut ty: &str) -> &str {
    while let Some(inner) = strip_one(ty) {
        ty = inner;
    }
    ty
}

fn is_optional(ty: &str) -> bool {
    ty.trim_end_matches('$').ends_with('?')
}

fn unpack_err(path: &str) -> impl Fn(crate::codec::CodecError) -> AbiError + '_ {
    move |e| AbiError::Unpack { path: path.to_string(), reason: e.to_string() }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

enum DecodeFrame<'a> {
    Array { elem: &'a str, len: usize, items: Vec<Value>, path: String },
    Struct { fields: Vec<&'a FieldDef>, next: usize, obj: Map<String, Value>, path: String },
}

impl<'a> DecodeFrame<'a> {
    /// Store a finished child; returns the next child to decode, if any.
    fn accept(&mut self, value: Value) -> Option<(&'a str, String)> {
        match self {
            DecodeFrame::Array { elem, len, items, path } => {
                items.push(value);
                (items.len() < *len).then(|| (*elem, format!("{path}[{}]", items.len())))
            }
            DecodeFrame::Struct { fields, next, obj, path } => {
                obj.insert(fields[*next].name.clone(), value);
                *next += 1;
                fields.get(*next).copied().map(|f| (f.ty.as_str(), format!("{path}.{}", f.name)))
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            DecodeFrame::Array { items, .. } => Value::Array(items),
            DecodeFrame::Struct { obj, .. } => Value::Object(obj),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbiSerializer {
    version: String,
    typedefs: HashMap<String, String>,
    structs: HashMap<String, StructDef>,
    actions: HashMap<Name, String>,
    tables: HashMap<Name, String>,
    limits: AbiLimits,
}

impl AbiSerializer {
    /// Index and validate `abi`. Fails on duplicate names, unknown types,
    /// any kind of cycle, an unsupported version, or an exhausted budget.
    pub fn new(abi: &AbiDef, limits: AbiLimits) -> Result<Self, AbiError> {
        let ctx = TraverseContext::new(limits.max_serialization_time);
        if !abi.is_supported_version() {
            return Err(AbiError::UnsupportedVersion(abi.version.clone()));
        }

        let mut ser = AbiSerializer {
            version: abi.version.clone(),
            typedefs: HashMap::new(),
            structs: HashMap::new(),
            actions: HashMap::new(),
            tables: HashMap::new(),
            limits,
        };

        for s in &abi.structs {
            ctx.check()?;
            if ser.structs.insert(s.name.clone(), s.clone()).is_some() {
                return Err(AbiError::DuplicateDefinition { namespace: "struct", name: s.name.clone() });
            }
        }
        for t in &abi.types {
            ctx.check()?;
            let name = &t.new_type_name;
            if is_builtin(name)
                || ser.structs.contains_key(name)
                || ser.typedefs.insert(name.clone(), t.ty.clone()).is_some()
            {
                return Err(AbiError::DuplicateDefinition { namespace: "type", name: name.clone() });
            }
        }
        for a in &abi.actions {
            ctx.check()?;
            if ser.actions.insert(a.name, a.ty.clone()).is_some() {
                return Err(AbiError::DuplicateDefinition { namespace: "action", name: a.name.to_string() });
            }
        }
        for t in &abi.tables {
            ctx.check()?;
            if ser.tables.insert(t.name, t.ty.clone()).is_some() {
                return Err(AbiError::DuplicateDefinition { namespace: "table", name: t.name.to_string() });
            }
        }

        ser.validate(&ctx)?;
        debug!(
            version = %ser.version,
            structs = ser.structs.len(),
            actions = ser.actions.len(),
            "abi validated"
        );
        Ok(ser)
    }

    pub fn from_json(text: &str, limits: AbiLimits) -> Result<Self, AbiError> {
        Self::new(&AbiDef::from_json(text)?, limits)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn limits(&self) -> AbiLimits {
        self.limits
    }

    pub fn action_type(&self, action: Name) -> Option<&str> {
        self.actions.get(&action).map(String::as_str)
    }

    pub fn table_type(&self, table: Name) -> Option<&str> {
        self.tables.get(&table).map(String::as_str)
    }

    fn context(&self) -> TraverseContext {
        TraverseContext::new(self.limits.max_serialization_time)
    }

    /// Follow aliases until a builtin, struct or suffixed type is reached.
    pub fn resolve_type<'a>(&'a self, ty: &'a str) -> &'a str {
        let mut current = ty;
        // alias cycles are rejected at load, so the chain is at most this long
        for _ in 0..=self.typedefs.len() {
            match self.typedefs.get(current) {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }

    /// Whether a missing field of type `ty` may be encoded as null.
    fn field_is_optional(&self, ty: &str) -> bool {
        let ty = ty.trim_end_matches('$');
        is_optional(ty) || is_optional(self.resolve_type(ty))
    }

    pub fn is_type(&self, ty: &str) -> Result<bool, AbiError> {
        self.is_type_within(ty, &self.context())
    }

    fn is_type_within(&self, ty: &str, ctx: &TraverseContext) -> Result<bool, AbiError> {
        let mut current = ty;
        loop {
            ctx.check()?;
            if let Some(inner) = strip_one(current) {
                current = inner;
                continue;
            }
            if is_builtin(current) || self.structs.contains_key(current) {
                return Ok(true);
            }
            match self.typedefs.get(current) {
                Some(target) => current = target,
                None => return Ok(false),
            }
        }
    }

    fn struct_named<'a>(&'a self, name: &'a str, ctx: &TraverseContext) -> Result<Option<&'a StructDef>, AbiError> {
        let mut current = name;
        loop {
            ctx.check()?;
            if let Some(s) = self.structs.get(current) {
                return Ok(Some(s));
            }
            match self.typedefs.get(current) {
                Some(target) => current = target,
                None => return Ok(None),
            }
        }
    }

    fn validate(&self, ctx: &TraverseContext) -> Result<(), AbiError> {
        // alias cycles first: everything below resolves aliases
        for name in self.typedefs.keys() {
            let mut seen = HashSet::new();
            let mut current = name.as_str();
            seen.insert(current);
            while let Some(target) = self.typedefs.get(current) {
                ctx.check()?;
                let next = fundamental(target);
                if !seen.insert(next) {
                    return Err(AbiError::CircularDefinition(name.clone()));
                }
                current = next;
            }
        }

        for s in self.structs.values() {
            let mut seen = HashSet::new();
            seen.insert(s.name.as_str());
            let mut current = s;
            while !current.base.is_empty() {
                ctx.check()?;
                let base = self.struct_named(&current.base, ctx)?.ok_or_else(|| AbiError::InvalidType {
                    ty: current.base.clone(),
                    context: format!("base of struct '{}'", current.name),
                })?;
                if !seen.insert(base.name.as_str()) {
                    return Err(AbiError::CircularDefinition(s.name.clone()));
                }
                current = base;
            }
        }

        // base and own fields share one JSON object
        for s in self.structs.values() {
            let mut names = HashSet::new();
            for f in self.struct_fields(s, ctx)? {
                if !names.insert(f.name.as_str()) {
                    return Err(AbiError::DuplicateDefinition {
                        namespace: "field",
                        name: format!("{}.{}", s.name, f.name),
                    });
                }
            }
        }

        for s in self.structs.values() {
            for f in &s.fields {
                if !self.is_type_within(&f.ty, ctx)? {
                    return Err(AbiError::InvalidType {
                        ty: f.ty.clone(),
                        context: format!("field '{}' of struct '{}'", f.name, s.name),
                    });
                }
            }
        }
        for (name, target) in &self.typedefs {
            if !self.is_type_within(target, ctx)? {
                return Err(AbiError::InvalidType { ty: target.clone(), context: format!("type '{name}'") });
            }
        }
        for (name, ty) in &self.actions {
            if !self.is_type_within(ty, ctx)? {
                return Err(AbiError::InvalidType { ty: ty.clone(), context: format!("action '{name}'") });
            }
        }
        for (name, ty) in &self.tables {
            if !self.is_type_within(ty, ctx)? {
                return Err(AbiError::InvalidType { ty: ty.clone(), context: format!("table '{name}'") });
            }
        }

        self.check_containment(ctx)
    }

    /// Struct that a value of `ty` embeds, looking through arrays, optionals
    /// and aliases.
    fn contained_struct<'a>(&'a self, ty: &'a str, ctx: &TraverseContext) -> Result<Option<&'a str>, AbiError> {
        let mut current = ty;
        loop {
            ctx.check()?;
            if let Some(inner) = strip_one(current) {
                current = inner;
                continue;
            }
            if let Some(s) = self.structs.get(current) {
                return Ok(Some(s.name.as_str()));
            }
            match self.typedefs.get(current) {
                Some(target) => current = target,
                None => return Ok(None),
            }
        }
    }

    fn struct_edges<'a>(&'a self, name: &str, ctx: &TraverseContext) -> Result<Vec<&'a str>, AbiError> {
        let Some(s) = self.structs.get(name) else {
            return Ok(Vec::new());
        };
        let mut edges = Vec::with_capacity(s.fields.len() + 1);
        if !s.base.is_empty() {
            if let Some(base) = self.contained_struct(&s.base, ctx)? {
                edges.push(base);
            }
        }
        for f in &s.fields {
            if let Some(target) = self.contained_struct(&f.ty, ctx)? {
                edges.push(target);
            }
        }
        Ok(edges)
    }

    /// Depth-first search over base and field edges; reaching a struct that
    /// is still on the path means it contains itself.
    fn check_containment(&self, ctx: &TraverseContext) -> Result<(), AbiError> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for root in self.structs.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            marks.insert(root.as_str(), Mark::Visiting);
            let mut stack = vec![(root.as_str(), self.struct_edges(root, ctx)?)];
            loop {
                ctx.check()?;
                let Some((node, edges)) = stack.last_mut() else { break };
                let node = *node;
                match edges.pop() {
                    Some(next) => match marks.get(next) {
                        Some(Mark::Visiting) => return Err(AbiError::CircularDefinition(next.to_string())),
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(next, Mark::Visiting);
                            let next_edges = self.struct_edges(next, ctx)?;
                            stack.push((next, next_edges));
                        }
                    },
                    None => {
                        marks.insert(node, Mark::Done);
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }

    fn shape<'a>(&'a self, ty: &'a str, path: &str, ctx: &TraverseContext) -> Result<Shape<'a>, AbiError> {
        let mut current = ty;
        loop {
            ctx.check()?;
            if let Some(inner) = current.strip_suffix('$') {
                current = inner;
                continue;
            }
            if let Some(inner) = current.strip_suffix("[]") {
                return Ok(Shape::Array(inner));
            }
            if let Some(inner) = current.strip_suffix('?') {
                return Ok(Shape::Optional(inner));
            }
            if let Some(b) = Builtin::from_name(current) {
                return Ok(Shape::Builtin(b));
            }
            if let Some(s) = self.structs.get(current) {
                return Ok(Shape::Struct(s));
            }
            match self.typedefs.get(current) {
                Some(target) => current = target,
                None => {
                    return Err(AbiError::InvalidType { ty: ty.to_string(), context: path.to_string() })
                }
            }
        }
    }

    /// Fields of `s` with base-struct fields first.
    fn struct_fields<'a>(&'a self, s: &'a StructDef, ctx: &TraverseContext) -> Result<Vec<&'a FieldDef>, AbiError> {
        let mut chain = vec![s];
        let mut current = s;
        while !current.base.is_empty() {
            ctx.check()?;
            let base = self.struct_named(&current.base, ctx)?.ok_or_else(|| AbiError::InvalidType {
                ty: current.base.clone(),
                context: format!("base of struct '{}'", current.name),
            })?;
            chain.push(base);
            current = base;
        }
        Ok(chain.iter().rev().flat_map(|s| s.fields.iter()).collect())
    }

    pub fn binary_to_json(&self, ty: &str, bytes: &[u8]) -> Result<Value, AbiError> {
        let ctx = self.context();
        let mut ds = DataStream::new(bytes);
        let value = self.decode(ty, &mut ds, &ctx)?;
        if ds.remaining() > 0 {
            return Err(AbiError::Unpack {
                path: ty.to_string(),
                reason: format!("{} trailing bytes", ds.remaining()),
            });
        }
        Ok(value)
    }

    pub fn json_to_binary(&self, ty: &str, value: &Value) -> Result<Vec<u8>, AbiError> {
        let ctx = self.context();
        let mut out = Vec::new();
        self.encode(ty, value, &mut out, &ctx)?;
        Ok(out)
    }

    pub fn action_data_to_json(&self, action: Name, data: &[u8]) -> Result<Value, AbiError> {
        let ty = self.action_type(action).ok_or(AbiError::UnknownAction(action))?;
        self.binary_to_json(ty, data)
    }

    pub fn json_to_action_data(&self, action: Name, value: &Value) -> Result<Vec<u8>, AbiError> {
        let ty = self.action_type(action).ok_or(AbiError::UnknownAction(action))?;
        self.json_to_binary(ty, value)
    }

    fn decode<'a>(&'a self, ty: &'a str, ds: &mut DataStream<'_>, ctx: &TraverseContext) -> Result<Value, AbiError> {
        let mut stack: Vec<DecodeFrame<'a>> = Vec::new();
        let mut pending: (&'a str, String) = (ty, ty.to_string());

        'outer: loop {
            ctx.check()?;
            let (t, path) = pending;
            let mut value = match self.shape(t, &path, ctx)? {
                Shape::Builtin(b) => b.decode(ds).map_err(|reason| AbiError::Unpack { path: path.clone(), reason })?,
                Shape::Optional(inner) => {
                    let flag = ds.read_u8().map_err(unpack_err(&path))?;
                    match flag {
                        0 => Value::Null,
                        1 => {
                            pending = (inner, path);
                            continue;
                        }
                        _ => {
                            return Err(AbiError::Unpack { path, reason: format!("invalid optional flag {flag}") })
                        }
                    }
                }
                Shape::Array(inner) => {
                    let len = ds.read_varuint32().map_err(unpack_err(&path))? as usize;
                    if len > self.limits.max_array_size {
                        return Err(AbiError::ArraySizeExceeded { size: len, max: self.limits.max_array_size });
                    }
                    if len == 0 {
                        Value::Array(Vec::new())
                    } else {
                        pending = (inner, format!("{path}[0]"));
                        let items = Vec::with_capacity(len.min(ds.remaining()));
                        stack.push(DecodeFrame::Array { elem: inner, len, items, path });
                        continue;
                    }
                }
                Shape::Struct(s) => {
                    let fields = self.struct_fields(s, ctx)?;
                    match fields.first().copied() {
                        None => Value::Object(Map::new()),
                        Some(first) => {
                            pending = (first.ty.as_str(), format!("{path}.{}", first.name));
                            stack.push(DecodeFrame::Struct { fields, next: 0, obj: Map::new(), path });
                            continue;
                        }
                    }
                }
            };

            while let Some(mut frame) = stack.pop() {
                match frame.accept(value) {
                    Some(child) => {
                        stack.push(frame);
                        pending = child;
                        continue 'outer;
                    }
                    None => value = frame.finish(),
                }
            }
            return Ok(value);
        }
    }

    fn encode<'a, 'v>(
        &'a self,
        ty: &'a str,
        value: &'v Value,
        out: &mut Vec<u8>,
        ctx: &TraverseContext,
    ) -> Result<(), AbiError> {
        let mut work: Vec<(&'a str, &'v Value, String)> = vec![(ty, value, ty.to_string())];

        while let Some((t, v, path)) = work.pop() {
            ctx.check()?;
            match self.shape(t, &path, ctx)? {
                Shape::Builtin(b) => b.encode(v, out).map_err(|reason| AbiError::Pack { path, reason })?,
                Shape::Optional(inner) => {
                    if v.is_null() {
                        out.push(0);
                    } else {
                        out.push(1);
                        work.push((inner, v, path));
                    }
                }
                Shape::Array(inner) => {
                    let items = v.as_array().ok_or_else(|| AbiError::Pack {
                        path: path.clone(),
                        reason: format!("expected array, got {v}"),
                    })?;
                    if items.len() > self.limits.max_array_size {
                        return Err(AbiError::ArraySizeExceeded {
                            size: items.len(),
                            max: self.limits.max_array_size,
                        });
                    }
                    write_varuint32(out, items.len() as u32);
                    for (i, item) in items.iter().enumerate().rev() {
                        work.push((inner, item, format!("{path}[{i}]")));
                    }
                }
                Shape::Struct(s) => {
                    let fields = self.struct_fields(s, ctx)?;
                    match v {
                        Value::Object(obj) => {
                            if let Some(extra) = obj.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                                return Err(AbiError::Pack { path, reason: format!("unknown field '{extra}'") });
                            }
                            for f in fields.iter().copied().rev() {
                                let field_path = format!("{path}.{}", f.name);
                                match obj.get(&f.name) {
                                    Some(fv) => work.push((f.ty.as_str(), fv, field_path)),
                                    None if self.field_is_optional(&f.ty) => {
                                        work.push((f.ty.as_str(), &NULL, field_path))
                                    }
                                    None => {
                                        return Err(AbiError::Pack {
                                            path: field_path,
                                            reason: "missing required field".into(),
                                        })
                                    }
                                }
                            }
                        }
                        Value::Array(items) if s.base.is_empty() => {
                            if items.len() != fields.len() {
                                return Err(AbiError::Pack {
                                    path,
                                    reason: format!("expected {} positional fields, got {}", fields.len(), items.len()),
                                });
                            }
                            for (f, item) in fields.iter().copied().zip(items).rev() {
                                work.push((f.ty.as_str(), item, format!("{path}.{}", f.name)));
                            }
                        }
                        other => {
                            return Err(AbiError::Pack { path, reason: format!("expected object, got {other}") })
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::TypeDef;
    use serde_json::json;

    const TRANSFER_ABI: &str = r#"{
        "version": "wasm::abi/1.0",
        "types": [{"new_type_name": "account", "type": "regid"}],
        "structs": [
            {"name": "base_msg", "base": "", "fields": [{"name": "memo", "type": "string"}]},
            {"name": "transfer", "base": "base_msg", "fields": [
                {"name": "from", "type": "account"},
                {"name": "to", "type": "account"},
                {"name": "quantity", "type": "asset"},
                {"name": "tags", "type": "name[]"},
                {"name": "note", "type": "string?"}
            ]},
            {"name": "pair", "base": "", "fields": [
                {"name": "a", "type": "uint8"},
                {"name": "b", "type": "varuint32"}
            ]}
        ],
        "actions": [{"name": "transfer", "type": "transfer"}]
    }"#;

    fn load(text: &str) -> Result<AbiSerializer, AbiError> {
        AbiSerializer::from_json(text, AbiLimits::default())
    }

    fn transfer_json() -> Value {
        json!({
            "memo": "hi",
            "from": "0-1",
            "to": "0-2",
            "quantity": "1.00000000 WICC",
            "tags": ["a", "b"],
            "note": null
        })
    }

    #[test]
    fn self_aliasing_type_is_rejected() {
        let err = load(r#"{"types":[{"new_type_name":"a","type":"a"}]}"#).unwrap_err();
        assert!(matches!(
            err,
            AbiError::CircularDefinition(_) | AbiError::DuplicateDefinition { .. }
        ));
    }

    #[test]
    fn alias_cycle_through_suffix_is_rejected() {
        let err = load(
            r#"{"types":[{"new_type_name":"a","type":"b[]"},{"new_type_name":"b","type":"a?"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AbiError::CircularDefinition(_)));
    }

    #[test]
    fn duplicates_are_rejected_per_namespace() {
        let err = load(r#"{"structs":[{"name":"s","fields":[]},{"name":"s","fields":[]}]}"#).unwrap_err();
        assert_eq!(err, AbiError::DuplicateDefinition { namespace: "struct", name: "s".into() });

        let err = load(r#"{"types":[{"new_type_name":"uint8","type":"uint16"}]}"#).unwrap_err();
        assert_eq!(err, AbiError::DuplicateDefinition { namespace: "type", name: "uint8".into() });

        let err = load(
            r#"{"structs":[{"name":"s","fields":[]}],
                "actions":[{"name":"go","type":"s"},{"name":"go","type":"s"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err, AbiError::DuplicateDefinition { namespace: "action", name: "go".into() });
    }

    #[test]
    fn inheritance_cycle_is_rejected() {
        let err = load(
            r#"{"structs":[{"name":"a","base":"b","fields":[]},{"name":"b","base":"a","fields":[]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AbiError::CircularDefinition(_)));
    }

    #[test]
    fn self_containment_is_rejected() {
        for abi in [
            r#"{"structs":[{"name":"node","fields":[{"name":"next","type":"node?"}]}]}"#,
            r#"{"structs":[{"name":"list","fields":[{"name":"items","type":"list[]"}]}]}"#,
            r#"{"types":[{"new_type_name":"nodes","type":"node[]"}],
                "structs":[{"name":"node","fields":[{"name":"children","type":"nodes"}]}]}"#,
            r#"{"structs":[{"name":"a","fields":[{"name":"b","type":"b"}]},
                           {"name":"b","fields":[{"name":"a","type":"a[]?"}]}]}"#,
        ] {
            assert!(matches!(load(abi), Err(AbiError::CircularDefinition(_))), "{abi}");
        }
    }

    #[test]
    fn unknown_types_and_versions_are_rejected() {
        let err = load(r#"{"structs":[{"name":"s","fields":[{"name":"x","type":"uint256"}]}]}"#).unwrap_err();
        assert!(matches!(err, AbiError::InvalidType { .. }));

        let err = load(r#"{"version":"eosio::abi/1.1"}"#).unwrap_err();
        assert_eq!(err, AbiError::UnsupportedVersion("eosio::abi/1.1".into()));
    }

    #[test]
    fn exhausted_budget_fails_with_deadline_error() {
        let limits = AbiLimits { max_serialization_time: Duration::ZERO, ..AbiLimits::default() };
        let err = AbiSerializer::from_json(TRANSFER_ABI, limits).unwrap_err();
        assert!(matches!(err, AbiError::DeadlineExceeded { .. }));
    }

    /// `t0 -> uint8`, `t{i} -> t{i-1}`.
    fn alias_chain(len: usize) -> AbiDef {
        let mut abi = AbiDef::default();
        for i in 0..len {
            abi.types.push(TypeDef {
                new_type_name: format!("t{i}"),
                ty: if i == 0 { "uint8".into() } else { format!("t{}", i - 1) },
            });
        }
        abi
    }

    fn generous() -> AbiLimits {
        AbiLimits { max_serialization_time: Duration::from_secs(60), ..AbiLimits::default() }
    }

    #[test]
    fn long_alias_chain_loads_without_recursion() {
        let ser = AbiSerializer::new(&alias_chain(1000), generous()).unwrap();
        assert_eq!(ser.resolve_type("t999"), "uint8");
        assert_eq!(ser.json_to_binary("t999", &json!(9)).unwrap(), vec![9]);
    }

    #[test]
    fn deep_acyclic_schema_runs_out_of_load_budget() {
        let err = AbiSerializer::new(&alias_chain(20_000), AbiLimits::default()).unwrap_err();
        assert!(matches!(err, AbiError::DeadlineExceeded { .. }), "{err}");
    }

    #[test]
    fn nested_empty_arrays_run_out_of_decode_budget() {
        let ser = load(r#"{"structs":[{"name":"e","fields":[]}]}"#).unwrap();
        // a few KB of counts describing 8192 * 8192 empty structs
        let mut bytes = Vec::new();
        write_varuint32(&mut bytes, 8192);
        for _ in 0..8192 {
            write_varuint32(&mut bytes, 8192);
        }
        let err = ser.binary_to_json("e[][]", &bytes).unwrap_err();
        assert!(matches!(err, AbiError::DeadlineExceeded { .. }), "{err}");

        // the same shape at a small size is fine
        assert_eq!(ser.binary_to_json("e[][]", &[1, 2]).unwrap(), json!([[{}, {}]]));
    }

    #[test]
    fn alias_heavy_array_runs_out_of_encode_budget() {
        let mut ser = AbiSerializer::new(&alias_chain(1000), generous()).unwrap();
        ser.limits = AbiLimits::default();
        let items = Value::Array(vec![json!(7); 8192]);
        let err = ser.json_to_binary("t999[]", &items).unwrap_err();
        assert!(matches!(err, AbiError::DeadlineExceeded { .. }), "{err}");
        assert_eq!(ser.json_to_binary("t999[]", &json!([7])).unwrap(), vec![1, 7]);
    }

    #[test]
    fn field_name_repeated_from_base_is_rejected() {
        let err = load(
            r#"{"structs":[{"name":"b","fields":[{"name":"x","type":"uint8"}]},
                           {"name":"d","base":"b","fields":[{"name":"x","type":"uint8"}]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err, AbiError::DuplicateDefinition { namespace: "field", name: "d.x".into() });

        let err = load(
            r#"{"structs":[{"name":"s","fields":[{"name":"x","type":"uint8"},{"name":"x","type":"string"}]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err, AbiError::DuplicateDefinition { namespace: "field", name: "s.x".into() });
    }

    #[test]
    fn missing_field_behind_optional_alias_encodes_as_null() {
        let ser = load(
            r#"{"types":[{"new_type_name":"maybe","type":"uint8?"}],
                "structs":[{"name":"s","fields":[{"name":"a","type":"uint8"},{"name":"m","type":"maybe"}]}]}"#,
        )
        .unwrap();
        let bytes = ser.json_to_binary("s", &json!({"a": 1})).unwrap();
        assert_eq!(bytes, vec![1, 0]);
        assert_eq!(ser.binary_to_json("s", &bytes).unwrap(), json!({"a": 1, "m": null}));
    }

    #[test]
    fn struct_round_trip_puts_base_fields_first() {
        let ser = load(TRANSFER_ABI).unwrap();
        let bytes = ser.json_to_action_data(Name::from_static("transfer"), &transfer_json()).unwrap();
        assert_eq!(&bytes[..3], &[2, b'h', b'i']);
        assert_eq!(*bytes.last().unwrap(), 0);

        let back = ser.action_data_to_json(Name::from_static("transfer"), &bytes).unwrap();
        assert_eq!(back, transfer_json());
        assert_eq!(ser.json_to_binary("transfer", &back).unwrap(), bytes);
    }

    #[test]
    fn missing_and_unknown_fields() {
        let ser = load(TRANSFER_ABI).unwrap();

        let mut value = transfer_json();
        value.as_object_mut().unwrap().remove("quantity");
        match ser.json_to_binary("transfer", &value).unwrap_err() {
            AbiError::Pack { path, .. } => assert_eq!(path, "transfer.quantity"),
            other => panic!("unexpected error {other}"),
        }

        let mut value = transfer_json();
        value.as_object_mut().unwrap().insert("bogus".into(), json!(1));
        assert!(matches!(ser.json_to_binary("transfer", &value), Err(AbiError::Pack { .. })));

        let mut value = transfer_json();
        value.as_object_mut().unwrap().remove("note");
        assert!(ser.json_to_binary("transfer", &value).is_ok());
    }

    #[test]
    fn positional_input_for_base_free_structs() {
        let ser = load(TRANSFER_ABI).unwrap();
        let positional = ser.json_to_binary("pair", &json!([1, 300])).unwrap();
        let named = ser.json_to_binary("pair", &json!({"a": 1, "b": 300})).unwrap();
        assert_eq!(positional, named);
        assert_eq!(named, vec![1, 0xac, 0x02]);
        assert!(ser.json_to_binary("transfer", &json!(["hi"])).is_err());
    }

    #[test]
    fn array_limit_checked_before_allocation() {
        let ser = load(TRANSFER_ABI).unwrap();
        let mut bytes = Vec::new();
        write_varuint32(&mut bytes, 8193);
        let err = ser.binary_to_json("uint8[]", &bytes).unwrap_err();
        assert_eq!(err, AbiError::ArraySizeExceeded { size: 8193, max: 8192 });

        let small = AbiSerializer::from_json(
            TRANSFER_ABI,
            AbiLimits { max_array_size: 2, ..AbiLimits::default() },
        )
        .unwrap();
        assert!(matches!(
            small.json_to_binary("uint8[]", &json!([1, 2, 3])),
            Err(AbiError::ArraySizeExceeded { size: 3, max: 2 })
        ));
    }

    #[test]
    fn trailing_bytes_and_truncation_fail() {
        let ser = load(TRANSFER_ABI).unwrap();
        assert!(matches!(ser.binary_to_json("uint8", &[1, 2]), Err(AbiError::Unpack { .. })));
        match ser.binary_to_json("pair", &[1]).unwrap_err() {
            AbiError::Unpack { path, .. } => assert_eq!(path, "pair.b"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn unknown_action_is_reported() {
        let ser = load(TRANSFER_ABI).unwrap();
        assert_eq!(
            ser.action_data_to_json(Name::from_static("nope"), &[]),
            Err(AbiError::UnknownAction(Name::from_static("nope")))
        );
    }
}
