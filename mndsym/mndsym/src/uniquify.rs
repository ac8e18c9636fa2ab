//! Renaming of colliding global names and tags.
//!
//! After dedup, names that are still bound to more than one declaration are
//! genuinely different entities. They get a suffix derived from their
//! address (variables and functions) or their position in the collision
//! (tags) so every emitted C name is unique within its overlay.

use std::collections::HashSet;

use mndsym_core::{Overlay, RecordKind, StorageClass, Tag};
use tracing::debug;

/// `{base}_addr_{addr:08X}`, extended with `_1`, `_2`, ... until it is not
/// in `taken`. The returned name is added to `taken`.
pub(crate) fn unique_name(base: &str, addr: u32, taken: &mut HashSet<String>) -> String {
    let candidate = format!("{base}_addr_{addr:08X}");
    let mut name = candidate.clone();
    let mut n = 0;
    while taken.contains(&name) {
        n += 1;
        name = format!("{candidate}_{n}");
    }
    taken.insert(name.clone());
    name
}

/// Make global variable names, function names and aggregate tags unique
/// within the overlay, then rebuild its name and tag maps.
pub fn uniquify_overlay(overlay: &mut Overlay) {
    let vars = uniquify_vars(overlay);
    let funcs = uniquify_funcs(overlay);
    let tags = uniquify_tags(overlay);
    overlay.rebuild_name_maps();
    overlay.rebuild_tag_maps();
    debug!(
        "overlay {}: renamed {vars} variables, {funcs} functions, {tags} tags",
        overlay.id
    );
}

fn uniquify_vars(overlay: &mut Overlay) -> usize {
    let is_extern = |class: Option<StorageClass>| class == Some(StorageClass::Extern);
    let mut taken: HashSet<String> = overlay.var_names.keys().cloned().collect();
    let mut renamed = 0;
    for indices in overlay.var_names.values() {
        let defined: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| !is_extern(overlay.vars[i].class))
            .collect();
        if defined.len() < 2 {
            continue;
        }
        for i in defined {
            let var = &mut overlay.vars[i];
            var.name = unique_name(&var.name, var.addr, &mut taken);
            renamed += 1;
        }
    }
    renamed
}

fn uniquify_funcs(overlay: &mut Overlay) -> usize {
    let mut taken: HashSet<String> = overlay
        .func_names
        .keys()
        .cloned()
        .chain(overlay.funcs.iter().map(|f| f.name.clone()))
        .collect();
    let mut renamed = 0;
    for (name, indices) in &overlay.func_names {
        if indices.len() < 2 {
            continue;
        }
        for &i in indices {
            let func = &mut overlay.funcs[i];
            // Placeholders renamed by the builder already carry an address.
            if func.name != *name {
                continue;
            }
            func.name = unique_name(name, func.addr, &mut taken);
            renamed += 1;
        }
    }
    renamed
}

fn uniquify_tags(overlay: &mut Overlay) -> usize {
    let mut taken: HashSet<String> = overlay
        .struct_tags
        .keys()
        .chain(overlay.union_tags.keys())
        .chain(overlay.enum_tags.keys())
        .map(Tag::to_string)
        .collect();
    let mut renamed = 0;

    for kind in [RecordKind::Struct, RecordKind::Union] {
        let letter = kind.letter();
        let collisions: Vec<_> = overlay
            .record_tags(kind)
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(tag, ids)| (tag.clone(), ids.clone()))
            .collect();
        for (tag, ids) in collisions {
            for (index, id) in ids.into_iter().enumerate() {
                overlay.types.record_mut(id).tag = fresh_tag(&tag, letter, index, &mut taken);
                renamed += 1;
            }
        }
    }

    let collisions: Vec<_> = overlay
        .enum_tags
        .iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(tag, ids)| (tag.clone(), ids.clone()))
        .collect();
    for (tag, ids) in collisions {
        for (index, id) in ids.into_iter().enumerate() {
            overlay.types.enum_type_mut(id).tag = fresh_tag(&tag, 'e', index, &mut taken);
            renamed += 1;
        }
    }
    renamed
}

/// `tag` wrapped as duplicate `index`, re-wrapped while the rendered name is
/// still taken.
fn fresh_tag(tag: &Tag, letter: char, index: usize, taken: &mut HashSet<String>) -> Tag {
    let mut fresh = tag.duplicate(letter, index);
    while taken.contains(&fresh.to_string()) {
        fresh = fresh.duplicate(letter, index);
    }
    taken.insert(fresh.to_string());
    fresh
}
