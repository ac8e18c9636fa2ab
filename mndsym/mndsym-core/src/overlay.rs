//! Per-overlay namespaces and the type arena backing them.

use indexmap::IndexMap;

use crate::{
    decl::{FuncDecl, VarDecl},
    types::{EnumId, EnumType, RecordId, RecordKind, RecordType, Tag, Type, TypedefId},
};

/// Storage for the aggregates and typedefs of one overlay.
///
/// Entries are never removed; deduplication only drops handles from the
/// overlay's ordered lists, so every handle stays valid for the lifetime of
/// the arena.
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    records: Vec<RecordType>,
    enums: Vec<EnumType>,
    typedefs: Vec<VarDecl>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_record(&mut self, record: RecordType) -> RecordId {
        self.records.push(record);
        RecordId(self.records.len() - 1)
    }

    pub fn push_enum(&mut self, def: EnumType) -> EnumId {
        self.enums.push(def);
        EnumId(self.enums.len() - 1)
    }

    pub fn push_typedef(&mut self, decl: VarDecl) -> TypedefId {
        self.typedefs.push(decl);
        TypedefId(self.typedefs.len() - 1)
    }

    pub fn record(&self, id: RecordId) -> &RecordType {
        &self.records[id.0]
    }

    pub fn record_mut(&mut self, id: RecordId) -> &mut RecordType {
        &mut self.records[id.0]
    }

    pub fn enum_type(&self, id: EnumId) -> &EnumType {
        &self.enums[id.0]
    }

    pub fn enum_type_mut(&mut self, id: EnumId) -> &mut EnumType {
        &mut self.enums[id.0]
    }

    pub fn typedef(&self, id: TypedefId) -> &VarDecl {
        &self.typedefs[id.0]
    }

    pub fn typedef_mut(&mut self, id: TypedefId) -> &mut VarDecl {
        &mut self.typedefs[id.0]
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut RecordType> {
        self.records.iter_mut()
    }

    pub fn enums_mut(&mut self) -> impl Iterator<Item = &mut EnumType> {
        self.enums.iter_mut()
    }

    pub fn typedefs_mut(&mut self) -> impl Iterator<Item = &mut VarDecl> {
        self.typedefs.iter_mut()
    }

    /// The single typedef that names a struct or union by value, if any.
    ///
    /// A type with several aliases, or only a pointer alias, is referred to
    /// by its tag.
    pub fn value_alias(&self, id: RecordId) -> Option<&VarDecl> {
        let record = self.record(id);
        match record.aliases.as_slice() {
            [alias] => {
                let decl = self.typedef(*alias);
                matches!(decl.ty, Type::Struct(t) | Type::Union(t) if t == id).then_some(decl)
            }
            _ => None,
        }
    }

    /// The single typedef that names an enum by value, if any.
    pub fn enum_value_alias(&self, id: EnumId) -> Option<&VarDecl> {
        match self.enum_type(id).aliases.as_slice() {
            [alias] => {
                let decl = self.typedef(*alias);
                matches!(decl.ty, Type::Enum(t) if t == id).then_some(decl)
            }
            _ => None,
        }
    }

    /// Size of `ty` in bytes, when it can be derived from the type alone.
    ///
    /// Functions, `void`, enums, unsized arrays and aggregates whose size is
    /// not known yet yield `None`.
    pub fn size_of(&self, ty: &Type) -> Option<u32> {
        match ty {
            Type::Base(kind) => kind.size(),
            Type::Pointer(_) => Some(crate::types::POINTER_SIZE),
            Type::Array { elem, len } => {
                if *len == 0 {
                    return None;
                }
                self.size_of(elem).and_then(|size| size.checked_mul(*len))
            }
            Type::Function(_) | Type::Enum(_) => None,
            Type::Struct(id) | Type::Union(id) => {
                let size = self.record(*id).size;
                (size > 0).then_some(size)
            }
            Type::Typedef(id) => self.size_of(&self.typedef(*id).ty),
        }
    }
}

/// A symbol name bound to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub addr: u32,
    pub name: String,
}

/// An address mapped to a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub addr: u32,
    pub path: String,
    pub line: u32,
}

/// One overlay: the resident executable (id 0) or a relocatable region
/// sharing its address range with other overlays.
///
/// Every overlay has its own type namespace. The ordered lists keep decode
/// order; the name maps group entries sharing a tag or name.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub id: u32,
    /// Load address.
    pub addr: u32,
    /// Length in bytes.
    pub length: u32,

    pub types: TypeArena,
    pub structs: Vec<RecordId>,
    pub unions: Vec<RecordId>,
    pub enums: Vec<EnumId>,
    pub typedefs: Vec<TypedefId>,
    pub struct_tags: IndexMap<Tag, Vec<RecordId>>,
    pub union_tags: IndexMap<Tag, Vec<RecordId>>,
    pub enum_tags: IndexMap<Tag, Vec<EnumId>>,
    pub typedef_names: IndexMap<String, Vec<TypedefId>>,
    /// Predeclared `typedef int bool;` standing in for the null base type.
    pub null_typedef: Option<TypedefId>,

    pub vars: Vec<VarDecl>,
    pub funcs: Vec<FuncDecl>,
    /// Indices into [`Overlay::vars`] by name.
    pub var_names: IndexMap<String, Vec<usize>>,
    /// Indices into [`Overlay::funcs`] by name.
    pub func_names: IndexMap<String, Vec<usize>>,

    pub symbols: Vec<Symbol>,
    pub lines: Vec<Line>,
}

impl Overlay {
    pub fn new(id: u32, addr: u32, length: u32) -> Self {
        Self {
            id,
            addr,
            length,
            ..Self::default()
        }
    }

    pub fn records(&self, kind: RecordKind) -> &[RecordId] {
        match kind {
            RecordKind::Struct => &self.structs,
            RecordKind::Union => &self.unions,
        }
    }

    pub fn record_tags(&self, kind: RecordKind) -> &IndexMap<Tag, Vec<RecordId>> {
        match kind {
            RecordKind::Struct => &self.struct_tags,
            RecordKind::Union => &self.union_tags,
        }
    }

    pub fn record_lists_mut(
        &mut self,
        kind: RecordKind,
    ) -> (&mut Vec<RecordId>, &mut IndexMap<Tag, Vec<RecordId>>) {
        match kind {
            RecordKind::Struct => (&mut self.structs, &mut self.struct_tags),
            RecordKind::Union => (&mut self.unions, &mut self.union_tags),
        }
    }

    /// Register a new struct or union in the arena and the ordered lists.
    pub fn add_record(&mut self, record: RecordType) -> RecordId {
        let kind = record.kind;
        let tag = record.tag.clone();
        let id = self.types.push_record(record);
        let (list, tags) = self.record_lists_mut(kind);
        list.push(id);
        tags.entry(tag).or_default().push(id);
        id
    }

    pub fn add_enum(&mut self, def: EnumType) -> EnumId {
        let tag = def.tag.clone();
        let id = self.types.push_enum(def);
        self.enums.push(id);
        self.enum_tags.entry(tag).or_default().push(id);
        id
    }

    pub fn add_typedef(&mut self, decl: VarDecl) -> TypedefId {
        let name = decl.name.clone();
        let id = self.types.push_typedef(decl);
        self.typedefs.push(id);
        self.typedef_names.entry(name).or_default().push(id);
        id
    }

    pub fn add_var(&mut self, decl: VarDecl) -> usize {
        self.vars.push(decl);
        let index = self.vars.len() - 1;
        self.var_names
            .entry(self.vars[index].name.clone())
            .or_default()
            .push(index);
        index
    }

    pub fn add_func(&mut self, decl: FuncDecl) -> usize {
        let name = decl.name.clone();
        self.add_func_as(name, decl)
    }

    /// Register `decl` under `name`, which differs from `decl.name` when the
    /// function was renamed as soon as it was created.
    pub fn add_func_as(&mut self, name: impl Into<String>, decl: FuncDecl) -> usize {
        self.funcs.push(decl);
        let index = self.funcs.len() - 1;
        self.func_names.entry(name.into()).or_default().push(index);
        index
    }

    /// Rebuild the tag maps from the current tags of the listed aggregates.
    pub fn rebuild_tag_maps(&mut self) {
        for kind in [RecordKind::Struct, RecordKind::Union] {
            let mut tags: IndexMap<Tag, Vec<RecordId>> = IndexMap::new();
            for &id in self.records(kind) {
                tags.entry(self.types.record(id).tag.clone())
                    .or_default()
                    .push(id);
            }
            *self.record_lists_mut(kind).1 = tags;
        }
        let mut enum_tags: IndexMap<Tag, Vec<EnumId>> = IndexMap::new();
        for &id in &self.enums {
            enum_tags
                .entry(self.types.enum_type(id).tag.clone())
                .or_default()
                .push(id);
        }
        self.enum_tags = enum_tags;
    }

    /// Rebuild the variable and function name maps from current names.
    pub fn rebuild_name_maps(&mut self) {
        let mut var_names: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, var) in self.vars.iter().enumerate() {
            var_names.entry(var.name.clone()).or_default().push(index);
        }
        self.var_names = var_names;

        let mut func_names: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, func) in self.funcs.iter().enumerate() {
            func_names.entry(func.name.clone()).or_default().push(index);
        }
        self.func_names = func_names;
    }

    pub fn struct_types(&self) -> impl Iterator<Item = &RecordType> {
        self.structs.iter().map(|&id| self.types.record(id))
    }

    pub fn union_types(&self) -> impl Iterator<Item = &RecordType> {
        self.unions.iter().map(|&id| self.types.record(id))
    }

    pub fn enum_types(&self) -> impl Iterator<Item = &EnumType> {
        self.enums.iter().map(|&id| self.types.enum_type(id))
    }

    pub fn typedef_decls(&self) -> impl Iterator<Item = &VarDecl> {
        self.typedefs.iter().map(|&id| self.types.typedef(id))
    }
}
