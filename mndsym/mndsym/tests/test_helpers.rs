//! Shared helpers for building record streams in tests.
#![allow(dead_code)]

use mndsym::{
    Builder, ReadOptions,
    core::{InconsistencyError, Overlay, RecordType, Tag},
    tags::{Class, Def, FuncStart, Modifier, Record, RecordBody, TypeCode},
};

pub const T_NULL: u16 = 0;
pub const T_VOID: u16 = 1;
pub const T_CHAR: u16 = 2;
pub const T_SHORT: u16 = 3;
pub const T_INT: u16 = 4;
pub const T_STRUCT: u16 = 8;
pub const T_UNION: u16 = 9;
pub const T_ENUM: u16 = 10;
pub const T_UCHAR: u16 = 12;
pub const T_UINT: u16 = 14;

pub fn ty(base: u16, mods: &[Modifier]) -> TypeCode {
    TypeCode::compose(base, mods)
}

pub fn rec(value: u32, body: RecordBody) -> Record {
    Record {
        offset: 0,
        value,
        body,
    }
}

/// Assign plausible byte offsets in stream order.
pub fn stream(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| Record {
            offset: 8 + 16 * i,
            ..record
        })
        .collect()
}

pub fn def(class: Class, value: u32, code: TypeCode, size: u32, name: &str) -> Record {
    rec(
        value,
        RecordBody::Def(Def {
            class,
            ty: code,
            size,
            dims: Vec::new(),
            tag: String::new(),
            name: name.to_string(),
        }),
    )
}

pub fn def2(
    class: Class,
    value: u32,
    code: TypeCode,
    size: u32,
    dims: &[u32],
    tag: &str,
    name: &str,
) -> Record {
    rec(
        value,
        RecordBody::Def2(Def {
            class,
            ty: code,
            size,
            dims: dims.to_vec(),
            tag: tag.to_string(),
            name: name.to_string(),
        }),
    )
}

/// `struct tag { members }` as a tag record, the members and end-of-struct.
pub fn struct_def(tag: &str, size: u32, members: Vec<Record>) -> Vec<Record> {
    aggregate_def(Class::StructTag, T_STRUCT, tag, size, members)
}

pub fn union_def(tag: &str, size: u32, members: Vec<Record>) -> Vec<Record> {
    aggregate_def(Class::UnionTag, T_UNION, tag, size, members)
}

fn aggregate_def(
    class: Class,
    base: u16,
    tag: &str,
    size: u32,
    members: Vec<Record>,
) -> Vec<Record> {
    let mut records = vec![def2(class, 0, ty(base, &[]), size, &[], "", tag)];
    records.extend(members);
    records.push(def2(Class::EndOfStruct, size, ty(T_NULL, &[]), size, &[], "", ".eos"));
    records
}

pub fn member(offset: u32, code: TypeCode, size: u32, name: &str) -> Record {
    def2(Class::StructMember, offset, code, size, &[], "", name)
}

pub fn tagged_member(offset: u32, code: TypeCode, size: u32, tag: &str, name: &str) -> Record {
    def2(Class::StructMember, offset, code, size, &[], tag, name)
}

pub fn union_member(code: TypeCode, size: u32, name: &str) -> Record {
    def2(Class::UnionMember, 0, code, size, &[], "", name)
}

pub fn enum_def(tag: &str, members: &[(&str, i32)]) -> Vec<Record> {
    let mut records = vec![def2(Class::EnumTag, 0, ty(T_ENUM, &[]), 4, &[], "", tag)];
    for (name, value) in members {
        records.push(def2(
            Class::EnumMember,
            *value as u32,
            ty(T_INT, &[]),
            0,
            &[],
            "",
            name,
        ));
    }
    records.push(def2(Class::EndOfStruct, 0, ty(T_NULL, &[]), 4, &[], "", ".eos"));
    records
}

pub fn func_start(addr: u32, line: u32, path: &str, name: &str) -> Record {
    rec(
        addr,
        RecordBody::FuncStart(FuncStart {
            fp: 29,
            fsize: 24,
            ret_reg: 31,
            mask: 0,
            mask_offset: 0,
            line,
            path: path.to_string(),
            name: name.to_string(),
        }),
    )
}

pub fn func_end(addr: u32, line: u32) -> Record {
    rec(addr, RecordBody::FuncEnd { line })
}

pub fn block_start(addr: u32, line: u32) -> Record {
    rec(addr, RecordBody::BlockStart { line })
}

pub fn block_end(addr: u32, line: u32) -> Record {
    rec(addr, RecordBody::BlockEnd { line })
}

pub fn build(records: Vec<Record>) -> Result<Vec<Overlay>, InconsistencyError> {
    Builder::build(&stream(records), &ReadOptions::default())
}

pub fn build_one(records: Vec<Record>) -> Overlay {
    let mut overlays = build(records).unwrap();
    assert_eq!(overlays.len(), 1);
    overlays.remove(0)
}

pub fn struct_named<'o>(overlay: &'o Overlay, tag: &str) -> Vec<&'o RecordType> {
    let tag = Tag::Named(tag.to_string());
    overlay.struct_types().filter(|r| r.tag == tag).collect()
}
