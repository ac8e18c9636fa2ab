//! Type references and forward-reference resolution.
//!
//! Aggregates are identified by `(tag, size)` within an overlay. A reference
//! to an aggregate that has not been defined yet creates a placeholder,
//! which the defining member run later fills in.

use mndsym_core::{
    BaseKind, EnumId, EnumType, InconsistencyError, Overlay, RecordId, RecordKind, RecordType,
    StorageClass, Tag, Type, TypedefId, VarDecl,
};
use mndsym_tags::{BaseCode, Modifier, Record, TypeCode};
use tracing::warn;

use crate::typecode::{apply_modifiers, is_pointer_use, scalar_kind};

/// Where in the record stream something happened, for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Site {
    pub offset: usize,
    pub index: usize,
}

impl Site {
    pub(crate) fn of(record: &Record, index: usize) -> Self {
        Self {
            offset: record.offset,
            index,
        }
    }

    pub(crate) fn error(
        self,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> InconsistencyError {
        InconsistencyError::new(self.offset, self.index, name, detail)
    }
}

/// Replace every byte outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Tag of an aggregate as written in the stream.
pub(crate) fn parse_tag(raw: &str) -> Tag {
    Tag::from_sanitized(&sanitize_name(raw))
}

/// A type word plus the array dimensions and tag a `Def2` carries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TypeRef<'r> {
    pub code: TypeCode,
    pub dims: &'r [u32],
    pub tag: &'r str,
    /// Size recorded on the referencing definition.
    pub size: u32,
}

/// Build the C type of a reference, resolving aggregates in `overlay`.
pub(crate) fn resolve_type(
    overlay: &mut Overlay,
    r: TypeRef<'_>,
    site: Site,
) -> Result<Type, InconsistencyError> {
    let mods = r.code.mods();
    let base = match r.code.base() {
        BaseCode::Null => Type::Typedef(null_typedef(overlay)),
        BaseCode::Struct => {
            RecordKind::Struct.type_of(find_record(overlay, RecordKind::Struct, r, &mods, site)?)
        }
        BaseCode::Union => {
            RecordKind::Union.type_of(find_record(overlay, RecordKind::Union, r, &mods, site)?)
        }
        BaseCode::Enum => Type::Enum(find_enum(overlay, parse_tag(r.tag))),
        base => match scalar_kind(base) {
            Some(kind) => Type::Base(kind),
            None => {
                return Err(site.error(
                    r.tag,
                    format!("base type {} cannot be referenced", base.mnemonic()),
                ));
            }
        },
    };
    Ok(apply_modifiers(base, &mods, r.dims))
}

/// Size of the aggregate itself, derived from the size recorded on a
/// reference to it. `0` means "whichever was defined last".
fn referenced_size(r: TypeRef<'_>, mods: &[Modifier], site: Site) -> Result<u32, InconsistencyError> {
    let pointer_array = mods.len() > 1
        && mods.first() == Some(&Modifier::Array)
        && mods.last() == Some(&Modifier::Pointer);
    if pointer_array || mods.contains(&Modifier::Function) {
        return Ok(0);
    }
    if r.size == 0 || r.dims.is_empty() {
        return Ok(r.size);
    }
    let count = r
        .dims
        .iter()
        .try_fold(1u32, |acc, &dim| acc.checked_mul(dim))
        .filter(|&count| count > 0)
        .ok_or_else(|| site.error(r.tag, format!("invalid array dimensions {:?}", r.dims)))?;
    if r.size % count != 0 {
        return Err(site.error(
            r.tag,
            format!(
                "array size {} is not a multiple of {count} elements",
                r.size
            ),
        ));
    }
    Ok(r.size / count)
}

/// Find the struct or union a reference points at, creating a placeholder
/// when the tag is unknown. Records how the aggregate was reached.
pub(crate) fn find_record(
    overlay: &mut Overlay,
    kind: RecordKind,
    r: TypeRef<'_>,
    mods: &[Modifier],
    site: Site,
) -> Result<RecordId, InconsistencyError> {
    let tag = parse_tag(r.tag);
    let size = referenced_size(r, mods, site)?;

    let found = match overlay.record_tags(kind).get(&tag) {
        Some(ids) if !ids.is_empty() => {
            let hit = if size == 0 {
                ids.last().copied()
            } else {
                ids.iter()
                    .rev()
                    .copied()
                    .find(|&id| overlay.types.record(id).size == size)
            };
            let Some(id) = hit else {
                return Err(site.error(
                    tag.to_string(),
                    format!("no {} of size {size} with this tag", kind.keyword()),
                ));
            };
            id
        }
        _ => {
            warn!(
                "unable to locate {} {tag} size {size}, created empty",
                kind.keyword()
            );
            overlay.add_record(RecordType::new(kind, tag, size))
        }
    };

    let record = overlay.types.record_mut(found);
    if is_pointer_use(mods) {
        record.pointer_uses = true;
    } else {
        record.value_uses = true;
    }
    Ok(found)
}

/// The aggregate a defining member run fills in: the most recent entry of
/// that tag with no fields yet and a matching (or still unknown) size, or a
/// new one.
pub(crate) fn find_empty_record(
    overlay: &mut Overlay,
    kind: RecordKind,
    tag: Tag,
    size: u32,
) -> RecordId {
    let types = &overlay.types;
    let hit = overlay.record_tags(kind).get(&tag).and_then(|ids| {
        ids.iter().rev().copied().find(|&id| {
            let record = types.record(id);
            record.fields.is_empty() && (record.size == size || record.size == 0)
        })
    });
    match hit {
        Some(id) => {
            overlay.types.record_mut(id).size = size;
            id
        }
        None => overlay.add_record(RecordType::new(kind, tag, size)),
    }
}

/// The enum a reference points at, by tag only.
pub(crate) fn find_enum(overlay: &mut Overlay, tag: Tag) -> EnumId {
    if let Some(&id) = overlay.enum_tags.get(&tag).and_then(|ids| ids.last()) {
        return id;
    }
    warn!("unable to locate enum {tag}, created empty");
    overlay.add_enum(EnumType::new(tag))
}

/// The enum a defining member run fills in.
pub(crate) fn find_empty_enum(overlay: &mut Overlay, tag: Tag) -> EnumId {
    let types = &overlay.types;
    let hit = overlay.enum_tags.get(&tag).and_then(|ids| {
        ids.iter()
            .rev()
            .copied()
            .find(|&id| types.enum_type(id).members.is_empty())
    });
    hit.unwrap_or_else(|| overlay.add_enum(EnumType::new(tag)))
}

/// The overlay's `typedef int bool;`, standing in for the null base type.
pub(crate) fn null_typedef(overlay: &mut Overlay) -> TypedefId {
    if let Some(id) = overlay.null_typedef {
        return id;
    }
    let id = overlay.types.push_typedef(VarDecl {
        addr: 0,
        size: 0,
        class: Some(StorageClass::Typedef),
        ty: Type::Base(BaseKind::Int),
        name: "bool".to_string(),
    });
    overlay.null_typedef = Some(id);
    id
}

/// Size a definition of type `ty` should be recorded with: pointers are
/// always word sized.
pub(crate) fn normalized_size(ty: &Type, recorded: u32) -> u32 {
    if ty.is_pointer() {
        mndsym_core::POINTER_SIZE
    } else {
        recorded
    }
}

/// Check a recorded size against the size computed from the type, when
/// both are known.
pub(crate) fn validate_size(
    overlay: &Overlay,
    ty: &Type,
    recorded: u32,
    name: &str,
    site: Site,
) -> Result<(), InconsistencyError> {
    if recorded == 0 {
        return Ok(());
    }
    match overlay.types.size_of(ty) {
        Some(computed) if computed != recorded => Err(site.error(
            name,
            format!("recorded size {recorded} does not match type size {computed}"),
        )),
        _ => Ok(()),
    }
}
