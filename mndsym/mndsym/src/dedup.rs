//! Structural deduplication of aggregates and typedefs.
//!
//! The same header included by many translation units yields one copy of
//! each aggregate per unit. Copies that are structurally equal collapse onto
//! the first one seen; every reference is rewritten to the survivor and the
//! copies are dropped from the overlay's lists.

use std::collections::HashMap;

use mndsym_core::{
    EnumId, EnumType, Overlay, RecordId, RecordKind, RecordType, Tag, Type, TypedefId, VarDecl,
};
use tracing::debug;

/// Number of entries removed per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub structs: usize,
    pub unions: usize,
    pub enums: usize,
    pub typedefs: usize,
}

/// Merge structurally equal structs, unions, enums and typedefs of one
/// overlay, in that order. Running it twice changes nothing.
pub fn dedup_overlay(overlay: &mut Overlay) -> DedupStats {
    let stats = DedupStats {
        structs: dedup_records(overlay, RecordKind::Struct),
        unions: dedup_records(overlay, RecordKind::Union),
        enums: dedup_enums(overlay),
        typedefs: dedup_typedefs(overlay),
    };
    debug!(
        "overlay {}: removed {} structs, {} unions, {} enums, {} typedefs",
        overlay.id, stats.structs, stats.unions, stats.enums, stats.typedefs
    );
    stats
}

/// Equal tags, or both compiler-synthesized.
fn tags_compatible(a: &Tag, b: &Tag) -> bool {
    a == b || (a.is_anonymous() && b.is_anonymous())
}

/// Structural equality of two structs or unions.
///
/// Fields compare by name, offset, size, bitfield flag and the shallow
/// category of their type, so two pointer fields are equal whatever they
/// point at. Base kinds are the exception and compare exactly: an `int`
/// field never matches an `unsigned int` field, nor `char` an
/// `unsigned char`. Typedef aliases are not compared.
pub fn records_equal(a: &RecordType, b: &RecordType) -> bool {
    a.kind == b.kind
        && tags_compatible(&a.tag, &b.tag)
        && a.size == b.size
        && a.fields.len() == b.fields.len()
        && a.fields.iter().zip(&b.fields).all(|(x, y)| {
            x.name == y.name
                && x.offset == y.offset
                && x.size == y.size
                && x.bitfield == y.bitfield
                && x.ty.category() == y.ty.category()
        })
}

pub fn enums_equal(a: &EnumType, b: &EnumType) -> bool {
    tags_compatible(&a.tag, &b.tag) && a.members == b.members
}

pub fn typedefs_equal(a: &VarDecl, b: &VarDecl) -> bool {
    a.addr == b.addr
        && a.size == b.size
        && a.class == b.class
        && a.name == b.name
        && a.ty.category() == b.ty.category()
}

/// Duplicate handle to the handle that replaces it.
#[derive(Debug, Default)]
struct TypeRemap {
    records: HashMap<RecordId, RecordId>,
    enums: HashMap<EnumId, EnumId>,
    typedefs: HashMap<TypedefId, TypedefId>,
}

impl TypeRemap {
    fn is_empty(&self) -> bool {
        self.records.is_empty() && self.enums.is_empty() && self.typedefs.is_empty()
    }

    fn apply(&self, ty: &mut Type) {
        ty.for_each_mut(&mut |slot: &mut Type| self.apply_slot(slot));
    }

    fn apply_aliases(&self, aliases: &mut Vec<TypedefId>) {
        let mut seen = Vec::with_capacity(aliases.len());
        for alias in aliases.drain(..) {
            let alias = self.typedefs.get(&alias).copied().unwrap_or(alias);
            if !seen.contains(&alias) {
                seen.push(alias);
            }
        }
        *aliases = seen;
    }

    /// Rewrite every type reference of the overlay.
    fn rewrite(&self, overlay: &mut Overlay) {
        if self.is_empty() {
            return;
        }
        for record in overlay.types.records_mut() {
            for field in &mut record.fields {
                self.apply(&mut field.ty);
            }
            self.apply_aliases(&mut record.aliases);
        }
        for def in overlay.types.enums_mut() {
            self.apply_aliases(&mut def.aliases);
        }
        for decl in overlay.types.typedefs_mut() {
            self.apply(&mut decl.ty);
        }
        for var in &mut overlay.vars {
            self.apply(&mut var.ty);
        }
        for func in &mut overlay.funcs {
            func.signature.for_each_mut(&mut |ty: &mut Type| self.apply_slot(ty));
            for block in &mut func.blocks {
                for local in &mut block.locals {
                    self.apply(&mut local.ty);
                }
            }
        }
    }

    fn apply_slot(&self, slot: &mut Type) {
        match slot {
            Type::Struct(id) | Type::Union(id) => {
                if let Some(&to) = self.records.get(id) {
                    *id = to;
                }
            }
            Type::Enum(id) => {
                if let Some(&to) = self.enums.get(id) {
                    *id = to;
                }
            }
            Type::Typedef(id) => {
                if let Some(&to) = self.typedefs.get(id) {
                    *id = to;
                }
            }
            _ => {}
        }
    }
}

fn dedup_records(overlay: &mut Overlay, kind: RecordKind) -> usize {
    let list = overlay.records(kind).to_vec();
    let mut remap = TypeRemap::default();

    for (i, &keep) in list.iter().enumerate() {
        if remap.records.contains_key(&keep) {
            continue;
        }
        for &dup in &list[i + 1..] {
            if remap.records.contains_key(&dup)
                || !records_equal(overlay.types.record(keep), overlay.types.record(dup))
            {
                continue;
            }
            let dup_record = overlay.types.record(dup);
            let (value_uses, pointer_uses) = (dup_record.value_uses, dup_record.pointer_uses);
            let merged = merge_aliases(
                overlay,
                &overlay.types.record(keep).aliases,
                &dup_record.aliases,
            );
            let record = overlay.types.record_mut(keep);
            record.aliases.extend(merged);
            record.value_uses |= value_uses;
            record.pointer_uses |= pointer_uses;
            remap.records.insert(dup, keep);
        }
    }

    remap.rewrite(overlay);
    let (list, tags) = overlay.record_lists_mut(kind);
    list.retain(|id| !remap.records.contains_key(id));
    for ids in tags.values_mut() {
        ids.retain(|id| !remap.records.contains_key(id));
    }
    tags.retain(|_, ids| !ids.is_empty());
    remap.records.len()
}

fn dedup_enums(overlay: &mut Overlay) -> usize {
    let list = overlay.enums.clone();
    let mut remap = TypeRemap::default();

    for (i, &keep) in list.iter().enumerate() {
        if remap.enums.contains_key(&keep) {
            continue;
        }
        for &dup in &list[i + 1..] {
            if remap.enums.contains_key(&dup)
                || !enums_equal(overlay.types.enum_type(keep), overlay.types.enum_type(dup))
            {
                continue;
            }
            let merged = merge_aliases(
                overlay,
                &overlay.types.enum_type(keep).aliases,
                &overlay.types.enum_type(dup).aliases,
            );
            overlay.types.enum_type_mut(keep).aliases.extend(merged);
            remap.enums.insert(dup, keep);
        }
    }

    remap.rewrite(overlay);
    overlay.enums.retain(|id| !remap.enums.contains_key(id));
    for ids in overlay.enum_tags.values_mut() {
        ids.retain(|id| !remap.enums.contains_key(id));
    }
    overlay.enum_tags.retain(|_, ids| !ids.is_empty());
    remap.enums.len()
}

fn dedup_typedefs(overlay: &mut Overlay) -> usize {
    let mut remap = TypeRemap::default();

    for ids in overlay.typedef_names.values() {
        for (i, &keep) in ids.iter().enumerate() {
            if remap.typedefs.contains_key(&keep) {
                continue;
            }
            for &dup in &ids[i + 1..] {
                if remap.typedefs.contains_key(&dup)
                    || !typedefs_equal(overlay.types.typedef(keep), overlay.types.typedef(dup))
                {
                    continue;
                }
                remap.typedefs.insert(dup, keep);
            }
        }
    }

    remap.rewrite(overlay);
    overlay.typedefs.retain(|id| !remap.typedefs.contains_key(id));
    for ids in overlay.typedef_names.values_mut() {
        ids.retain(|id| !remap.typedefs.contains_key(id));
    }
    overlay.typedef_names.retain(|_, ids| !ids.is_empty());
    remap.typedefs.len()
}

/// Aliases of a duplicate that the survivor does not already carry.
fn merge_aliases(overlay: &Overlay, keep: &[TypedefId], dup: &[TypedefId]) -> Vec<TypedefId> {
    let types = &overlay.types;
    let mut merged: Vec<TypedefId> = Vec::new();
    for &alias in dup {
        let decl = types.typedef(alias);
        let present = keep
            .iter()
            .chain(&merged)
            .any(|&have| typedefs_equal(types.typedef(have), decl));
        if !present {
            merged.push(alias);
        }
    }
    merged
}
