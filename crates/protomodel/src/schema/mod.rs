// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `.proto` schema export.
//!
//! Output layout:
//!
//! ```text
//! syntax = "proto3";
//! package Demo;                              (when one namespace is shared)
//! import "google/protobuf/timestamp.proto";  (only the imports in use)
//!
//! message Point {
//!    int32 x = 1;
//!    int32 y = 2;
//! }
//! ```
//!
//! Blocks are sorted by schema name, so the same descriptor set always
//! produces the same text.

mod type_names;

use crate::config::{IMPORT_BCL, IMPORT_DURATION, IMPORT_PROTOGEN, IMPORT_TIMESTAMP};
use crate::error::{Error, Result};
use crate::introspect::{EnumShape, FieldShape, TypeShape};
use crate::meta::{CollectionProvider, MetaKind, MetaType, ValueMember};
use crate::model::{Cascade, FindOptions, ModelCore};
use crate::types::{CompatibilityLevel, DataFormat, ProtoSyntax, ScalarKind, TypeKey};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use type_names::{scalar_display_name, scalar_type_name};

const INDENT: &str = "   ";

const FIELD_OPT_AS_REF: &str = "(.protobuf_net.fieldopt).asRef = true";
const FIELD_OPT_DYNAMIC: &str = "(.protobuf_net.fieldopt).dynamicType = true";

/// What to export and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Export this type and its dependencies; `None` exports the whole model.
    pub root: Option<TypeKey>,
    pub syntax: ProtoSyntax,
    /// Overrides the inferred package.
    pub package: Option<String>,
}

impl SchemaOptions {
    pub fn new(syntax: ProtoSyntax) -> Self {
        Self {
            syntax,
            ..Self::default()
        }
    }

    pub fn root(mut self, key: impl Into<TypeKey>) -> Self {
        self.root = Some(key.into());
        self
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }
}

/// Imports a schema needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub(crate) struct ImportFlags(pub u8);

impl ImportFlags {
    /// `protobuf-net/bcl.proto`
    pub const BCL: Self = Self(0x01);

    /// `google/protobuf/timestamp.proto`
    pub const TIMESTAMP: Self = Self(0x02);

    /// `google/protobuf/duration.proto`
    pub const DURATION: Self = Self(0x04);

    /// `protobuf-net/protogen.proto` (field options)
    pub const PROTOGEN: Self = Self(0x08);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }
}

const IMPORT_ORDER: [(ImportFlags, &str); 4] = [
    (ImportFlags::BCL, IMPORT_BCL),
    (ImportFlags::TIMESTAMP, IMPORT_TIMESTAMP),
    (ImportFlags::DURATION, IMPORT_DURATION),
    (ImportFlags::PROTOGEN, IMPORT_PROTOGEN),
];

/// Resolved type of a field.
struct FieldType {
    name: String,
    /// Enum the name stands in for, when the enum cannot be a protobuf enum.
    declared_as: Option<String>,
}

impl FieldType {
    fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_as: None,
        }
    }
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

/// Shared namespace of every non-platform type, or `None` on conflict.
fn infer_package(involved: &[Arc<MetaType>]) -> Option<String> {
    let mut package: Option<&str> = None;
    for meta in involved {
        let key = meta.key();
        if key.is_system() {
            continue;
        }
        let Some(ns) = key.namespace() else {
            continue;
        };
        match package {
            None => package = Some(ns),
            Some(current) if current == ns => {}
            Some(current) => {
                log::debug!(
                    "[SchemaEmitter] namespaces {} and {} differ; no package",
                    current,
                    ns
                );
                return None;
            }
        }
    }
    package.map(str::to_string)
}

fn quote_default(type_name: &str, literal: &str) -> String {
    if type_name == "string" && !literal.starts_with('"') {
        format!("\"{}\"", literal.replace('"', "\\\""))
    } else {
        literal.to_string()
    }
}

struct Emitter<'m> {
    core: &'m ModelCore,
    syntax: ProtoSyntax,
    imports: ImportFlags,
    /// Schema names by registry slot.
    names: HashMap<usize, String>,
    /// Valid enums referenced by fields but never registered.
    loose_enums: BTreeMap<String, EnumShape>,
}

impl<'m> Emitter<'m> {
    fn new(core: &'m ModelCore, syntax: ProtoSyntax) -> Self {
        Self {
            core,
            syntax,
            imports: ImportFlags::empty(),
            names: HashMap::new(),
            loose_enums: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Naming
    // ------------------------------------------------------------------

    fn name_of(&mut self, meta: &MetaType) -> String {
        if let Some(name) = self.names.get(&meta.index()) {
            return name.clone();
        }
        let mut stack = HashSet::new();
        let name = self.compute_name(meta, &mut stack);
        self.names.insert(meta.index(), name.clone());
        name
    }

    /// `Name_Arg1_Arg2` for generic descriptors. `stack` holds the slots
    /// being named, so a type that is its own (indirect) argument stops at
    /// its bare name.
    fn compute_name(&self, meta: &MetaType, stack: &mut HashSet<usize>) -> String {
        let mut name = meta
            .name()
            .or_else(|| meta.enum_shape().and_then(|shape| shape.name))
            .unwrap_or_else(|| meta.key().short_name().to_string());
        let args = meta.generic_args();
        if args.is_empty() || !stack.insert(meta.index()) {
            return name;
        }
        for arg in &args {
            name.push('_');
            name.push_str(&self.arg_name(arg, stack));
        }
        stack.remove(&meta.index());
        name
    }

    fn arg_name(&self, key: &TypeKey, stack: &mut HashSet<usize>) -> String {
        let effective = self.core.effective_key(key);
        if let Some(kind) = ScalarKind::from_key(&effective) {
            return scalar_display_name(kind).to_string();
        }
        match self.core.registry.get(&effective) {
            Some(meta) => self.compute_name(&meta, stack),
            None => effective.short_name().to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Field types
    // ------------------------------------------------------------------

    fn type_ref(
        &mut self,
        ty: &TypeKey,
        format: DataFormat,
        level: CompatibilityLevel,
    ) -> Result<FieldType> {
        let effective = self.core.effective_key(ty);
        if let Some(kind) = ScalarKind::from_key(&effective) {
            let (name, imports) = scalar_type_name(kind, format, level)?;
            self.imports.insert(imports);
            return Ok(FieldType::plain(name));
        }

        let meta = self.core.lookup(&effective)?;
        let enum_shape = match &meta {
            Some(m) if m.kind() == MetaKind::Enum => m.enum_shape(),
            Some(_) => None,
            None => match self.core.shape_of(&effective) {
                Some(TypeShape::Enum(shape)) => Some(shape),
                _ => None,
            },
        };
        if let Some(shape) = enum_shape {
            let name = match &meta {
                Some(m) => self.name_of(m),
                None => shape
                    .name
                    .clone()
                    .unwrap_or_else(|| effective.short_name().to_string()),
            };
            if shape.is_valid() {
                if meta.is_none() {
                    self.loose_enums.entry(name.clone()).or_insert(shape);
                }
                return Ok(FieldType::plain(name));
            }
            let (underlying, imports) =
                scalar_type_name(shape.underlying, DataFormat::Default, level)?;
            self.imports.insert(imports);
            return Ok(FieldType {
                name: underlying.to_string(),
                declared_as: Some(name),
            });
        }

        match meta {
            Some(meta) => {
                let target = self.core.canonical(meta)?;
                Ok(FieldType::plain(self.name_of(&target)))
            }
            None => {
                log::debug!(
                    "[SchemaEmitter] {} is not registered; referenced by name",
                    effective
                );
                Ok(FieldType::plain(effective.short_name()))
            }
        }
    }

    fn is_packable_item(&self, item: &TypeKey) -> bool {
        let effective = self.core.effective_key(item);
        if let Some(kind) = ScalarKind::from_key(&effective) {
            return kind.is_packable();
        }
        match self.core.registry.get(&effective) {
            Some(meta) => meta.kind() == MetaKind::Enum,
            None => matches!(self.core.shape_of(&effective), Some(TypeShape::Enum(_))),
        }
    }

    fn field_line(&mut self, member: &ValueMember, level: CompatibilityLevel) -> Result<String> {
        let level = member.compatibility_level().or(level);
        let effective = self.core.effective_key(member.ty());
        let mut options: Vec<String> = Vec::new();
        let mut comments: Vec<String> = Vec::new();

        let body = match self.core.collection_provider(&effective) {
            Some(CollectionProvider::Repeated { item }) => {
                let ty = self.type_ref(&item, member.format(), level)?;
                if self.is_packable_item(&item) {
                    match (self.syntax, member.is_packed()) {
                        (ProtoSyntax::Proto3, false) => options.push("packed = false".to_string()),
                        (ProtoSyntax::Proto2, true) => options.push("packed = true".to_string()),
                        _ => {}
                    }
                }
                if let Some(declared) = ty.declared_as {
                    comments.push(format!("declared as {}", declared));
                }
                format!("repeated {} {} = {}", ty.name, member.name(), member.number())
            }
            Some(provider @ CollectionProvider::Map { .. }) if provider.is_valid_map() => {
                let (Some(key), Some(value)) = (provider.key_type(), provider.value_type()) else {
                    return Err(Error::NotSupported(format!("malformed map {}", effective)));
                };
                let key = self.type_ref(key, member.map_key_format(), level)?;
                let value = self.type_ref(value, member.format(), level)?;
                if let Some(declared) = value.declared_as {
                    comments.push(format!("declared as {}", declared));
                }
                format!(
                    "map<{}, {}> {} = {}",
                    key.name,
                    value.name,
                    member.name(),
                    member.number()
                )
            }
            Some(CollectionProvider::Map { key, value, .. }) => {
                let pair = self.core.ensure_pair_shape(&key, &value);
                let ty = self.type_ref(&pair, DataFormat::Default, level)?;
                format!("repeated {} {} = {}", ty.name, member.name(), member.number())
            }
            None => {
                let ty = self.type_ref(&effective, member.format(), level)?;
                let label = match (self.syntax, member.is_required()) {
                    (ProtoSyntax::Proto2, true) => "required ",
                    (ProtoSyntax::Proto2, false) => "optional ",
                    (ProtoSyntax::Proto3, _) => "",
                };
                if self.syntax == ProtoSyntax::Proto2 {
                    if let Some(literal) = member.default_value() {
                        options.push(format!("default = {}", quote_default(&ty.name, literal)));
                    }
                }
                if member.format() == DataFormat::Group {
                    comments.push("group".to_string());
                }
                if let Some(declared) = ty.declared_as {
                    comments.push(format!("declared as {}", declared));
                }
                format!("{}{} {} = {}", label, ty.name, member.name(), member.number())
            }
        };

        if member.as_reference() {
            options.push(FIELD_OPT_AS_REF.to_string());
            self.imports.insert(ImportFlags::PROTOGEN);
        }
        if member.dynamic_type() {
            options.push(FIELD_OPT_DYNAMIC.to_string());
            self.imports.insert(ImportFlags::PROTOGEN);
        }

        let mut line = body;
        if !options.is_empty() {
            line.push_str(" [");
            line.push_str(&options.join(", "));
            line.push(']');
        }
        line.push(';');
        if !comments.is_empty() {
            line.push_str(" // ");
            line.push_str(&comments.join("; "));
        }
        Ok(line)
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    fn default_level(&self) -> CompatibilityLevel {
        self.core.options().default_compatibility_level
    }

    fn message_block(&mut self, name: &str, meta: &MetaType) -> Result<String> {
        let level = meta.compatibility_level().or(self.default_level());
        let mut out = format!("message {} {{\n", name);
        for member in meta.members() {
            let line = self.field_line(&member, level)?;
            push_line(&mut out, 1, &line);
        }

        let mut subtypes = meta.subtypes();
        if !subtypes.is_empty() {
            subtypes.sort_by_key(|sub| sub.number);
            push_line(&mut out, 1, "oneof subtype {");
            for sub in &subtypes {
                let ty = self.type_ref(&sub.ty, DataFormat::Default, level)?;
                push_line(
                    &mut out,
                    2,
                    &format!("{} {} = {};", ty.name, ty.name, sub.number),
                );
            }
            push_line(&mut out, 1, "}");
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// A collection exported as the root: one repeated field named `items`.
    fn collection_block(&mut self, name: &str, meta: &MetaType) -> Result<String> {
        let level = meta.compatibility_level().or(self.default_level());
        let items = ValueMember::from(FieldShape::new(1, "items", meta.key().clone()));
        let line = self.field_line(&items, level)?;
        let mut out = format!("message {} {{\n", name);
        push_line(&mut out, 1, &line);
        out.push_str("}\n");
        Ok(out)
    }

    fn enum_block(&self, name: &str, shape: &EnumShape) -> String {
        let mut variants: Vec<_> = shape.variants.iter().collect();
        if self.syntax == ProtoSyntax::Proto3 {
            // proto3 requires the first value to be zero.
            variants.sort_by_key(|v| v.value != 0);
        }
        let mut seen = HashSet::new();
        let aliased = !variants.iter().all(|v| seen.insert(v.value));

        let mut out = format!("enum {} {{\n", name);
        if aliased {
            push_line(&mut out, 1, "option allow_alias = true;");
        }
        if self.syntax == ProtoSyntax::Proto3 && !variants.iter().any(|v| v.value == 0) {
            push_line(&mut out, 1, "ZERO = 0;");
        }
        for variant in variants {
            push_line(&mut out, 1, &format!("{} = {};", variant.name, variant.value));
        }
        out.push_str("}\n");
        out
    }

    /// A built-in root: one field named `value`.
    fn scalar_block(&mut self, kind: ScalarKind) -> Result<String> {
        let (ty, imports) = scalar_type_name(kind, DataFormat::Default, self.default_level())?;
        self.imports.insert(imports);
        let label = match self.syntax {
            ProtoSyntax::Proto2 => "optional ",
            ProtoSyntax::Proto3 => "",
        };
        let mut out = format!("message {} {{\n", scalar_display_name(kind));
        push_line(&mut out, 1, &format!("{}{} value = 1;", label, ty));
        out.push_str("}\n");
        Ok(out)
    }

    fn emit(
        mut self,
        involved: Vec<Arc<MetaType>>,
        root: Option<usize>,
        package: Option<String>,
    ) -> Result<String> {
        let mut blocks: Vec<(String, usize, String)> = Vec::with_capacity(involved.len());
        for meta in &involved {
            let name = self.name_of(meta);
            if meta.is_external() {
                log::debug!("[SchemaEmitter] skipping {}: external serializer", meta.key());
                continue;
            }
            let block = match meta.kind() {
                MetaKind::Enum => match meta.enum_shape() {
                    Some(shape) if shape.is_valid() => self.enum_block(&name, &shape),
                    _ => continue,
                },
                MetaKind::Collection if root == Some(meta.index()) => {
                    self.collection_block(&name, meta)?
                }
                MetaKind::Collection => continue,
                MetaKind::Message => self.message_block(&name, meta)?,
            };
            blocks.push((name, meta.index(), block));
        }

        for (name, shape) in std::mem::take(&mut self.loose_enums) {
            if blocks.iter().any(|(existing, _, _)| *existing == name) {
                continue;
            }
            let block = self.enum_block(&name, &shape);
            blocks.push((name, usize::MAX, block));
        }

        blocks.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        log::debug!(
            "[SchemaEmitter] {} blocks, package {:?}",
            blocks.len(),
            package
        );
        Ok(self.finish(package.as_deref(), blocks.into_iter().map(|(_, _, b)| b)))
    }

    fn finish(&self, package: Option<&str>, blocks: impl Iterator<Item = String>) -> String {
        let mut out = format!("syntax = \"{}\";\n", self.syntax.as_str());
        if let Some(package) = package {
            out.push_str(&format!("package {};\n", package));
        }
        for (flag, path) in IMPORT_ORDER {
            if self.imports.contains(flag) {
                out.push_str(&format!("import \"{}\";\n", path));
            }
        }
        for block in blocks {
            out.push('\n');
            out.push_str(&block);
        }
        out
    }
}

impl ModelCore {
    /// Surrogate, else the top of the inheritance chain, else the
    /// descriptor itself.
    fn schema_root(&self, meta: Arc<MetaType>) -> Result<Arc<MetaType>> {
        if meta.surrogate().is_some() {
            return self.canonical(meta);
        }
        let root = self.root_of(meta.key());
        if root == *meta.key() {
            return Ok(meta);
        }
        Ok(self.lookup(&root)?.unwrap_or(meta))
    }

    /// Every registered type and everything it references.
    fn whole_model(&self) -> Result<Vec<Arc<MetaType>>> {
        let mut state = Cascade::default();
        let mut roots = HashSet::new();
        for meta in self.registry.snapshot().iter() {
            let root = self.schema_root(Arc::clone(meta))?;
            if roots.insert(root.index()) {
                self.cascade_into(root, &mut state, true, true)?;
            }
        }
        Ok(state.into_found())
    }

    pub(crate) fn get_schema(&self, options: &SchemaOptions) -> Result<String> {
        let mut emitter = Emitter::new(self, options.syntax);

        let (involved, root) = match &options.root {
            None => (self.whole_model()?, None),
            Some(key) => {
                let effective = self.effective_key(key);
                if let Some(kind) = ScalarKind::from_key(&effective) {
                    let block = emitter.scalar_block(kind)?;
                    return Ok(emitter.finish(None, std::iter::once(block)));
                }
                let find = if self.collection_provider(&effective).is_some() {
                    FindOptions::demand().force()
                } else {
                    FindOptions::demand()
                };
                let meta = self
                    .find_or_add(&effective, find)?
                    .ok_or_else(|| Error::UnexpectedType(effective.clone()))?;
                let meta = self.canonical(meta)?;
                let index = meta.index();
                (self.cascade(meta)?, Some(index))
            }
        };

        let package = match &options.package {
            Some(package) => Some(package.clone()),
            None => infer_package(&involved),
        };
        emitter.emit(involved, root, package)
    }
}
