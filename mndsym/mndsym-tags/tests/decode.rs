use mndsym_tags::{
    BaseCode, Class, Def, FuncStart, Modifier, RecordBody, SymHeader, TagKind, TypeCode, decode,
};

// ── helpers ─────────────────────────────────────────────────────────────────

/// Little-endian writer for hand-made symbol files.
struct Sym(Vec<u8>);

impl Sym {
    fn new() -> Self {
        let mut bytes = b"MND".to_vec();
        bytes.push(1);
        bytes.extend_from_slice(&0u32.to_le_bytes());
        Sym(bytes)
    }

    fn record(mut self, value: u32, kind: u8) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self.0.push(kind);
        self
    }

    fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn str(mut self, s: &str) -> Self {
        self.0.push(s.len() as u8);
        self.0.extend_from_slice(s.as_bytes());
        self
    }

    fn def(self, value: u32, class: u16, ty: u16, size: u32, name: &str) -> Self {
        self.record(value, 0x94).u16(class).u16(ty).u32(size).str(name)
    }

    fn bytes(self) -> Vec<u8> {
        self.0
    }
}

fn single(sym: Sym) -> RecordBody {
    let file = decode(&sym.bytes()).unwrap();
    assert_eq!(file.records.len(), 1);
    file.records.into_iter().next().unwrap().body
}

// ── header ──────────────────────────────────────────────────────────────────

#[test]
fn header_only_file_has_no_records() {
    let mut bytes = b"MND".to_vec();
    bytes.push(1);
    bytes.extend_from_slice(&7u32.to_le_bytes());

    let file = decode(&bytes).unwrap();
    assert_eq!(
        file.header,
        SymHeader {
            version: 1,
            target_unit: 7
        }
    );
    assert!(file.records.is_empty());
}

#[test]
fn bad_signature_is_rejected() {
    let err = decode(b"ELF\x01\0\0\0\0").unwrap_err();
    assert_eq!(err.offset, 0);
    assert!(err.detail.contains("signature"), "{err}");
}

#[test]
fn short_header_is_rejected() {
    let err = decode(b"MND\x01").unwrap_err();
    assert_eq!(err.offset, 0);
    assert!(err.detail.contains("header"), "{err}");
}

// ── records ─────────────────────────────────────────────────────────────────

#[test]
fn symbol_names() {
    let file = decode(
        &Sym::new()
            .record(0x8001_0000, 0x01)
            .str("main")
            .record(0x8001_0040, 0x02)
            .str("_start")
            .bytes(),
    )
    .unwrap();

    assert_eq!(file.records[0].value, 0x8001_0000);
    assert_eq!(file.records[0].body, RecordBody::Name1("main".into()));
    assert_eq!(file.records[1].body, RecordBody::Name2("_start".into()));
    assert_eq!(file.records[0].offset, 8);
    assert_eq!(file.records[1].offset, 8 + 4 + 1 + 1 + 4);
}

#[test]
fn line_records() {
    let file = decode(
        &Sym::new()
            .record(0x100, 0x88)
            .u32(12)
            .str("main.c")
            .record(0x104, 0x80)
            .record(0x108, 0x82)
            .u8(3)
            .record(0x10C, 0x84)
            .u16(300)
            .record(0x110, 0x86)
            .u32(40)
            .record(0x114, 0x8A)
            .bytes(),
    )
    .unwrap();

    let bodies: Vec<_> = file.records.into_iter().map(|r| r.body).collect();
    assert_eq!(
        bodies,
        vec![
            RecordBody::SetLineWithPath {
                line: 12,
                path: "main.c".into()
            },
            RecordBody::IncLine,
            RecordBody::IncLineByte(3),
            RecordBody::IncLineWord(300),
            RecordBody::SetLine(40),
            RecordBody::EndLine,
        ]
    );
    assert!(bodies.iter().all(RecordBody::is_line));
}

#[test]
fn function_records() {
    let file = decode(
        &Sym::new()
            .record(0x8001_0000, 0x8C)
            .u16(29)
            .u32(24)
            .u16(31)
            .u32(0x8000_0000)
            .u32((-4i32) as u32)
            .u32(10)
            .str("main.c")
            .str("main")
            .record(0x8001_0004, 0x90)
            .u32(1)
            .record(0x8001_0010, 0x92)
            .u32(3)
            .record(0x8001_0014, 0x8E)
            .u32(12)
            .bytes(),
    )
    .unwrap();

    assert_eq!(
        file.records[0].body,
        RecordBody::FuncStart(FuncStart {
            fp: 29,
            fsize: 24,
            ret_reg: 31,
            mask: 0x8000_0000,
            mask_offset: -4,
            line: 10,
            path: "main.c".into(),
            name: "main".into(),
        })
    );
    assert_eq!(file.records[1].body, RecordBody::BlockStart { line: 1 });
    assert_eq!(file.records[2].body, RecordBody::BlockEnd { line: 3 });
    assert_eq!(file.records[3].body, RecordBody::FuncEnd { line: 12 });
}

#[test]
fn def_record() {
    let body = single(Sym::new().def(0x8001_0000, 2, 0x0024, 0, "main"));
    let RecordBody::Def(def) = body else {
        panic!("expected Def, got {body:?}");
    };
    assert_eq!(def.class, Class::External);
    assert_eq!(def.ty.base(), BaseCode::Int);
    assert_eq!(def.ty.mods(), vec![Modifier::Function]);
    assert!(def.dims.is_empty());
    assert!(def.tag.is_empty());
    assert_eq!(def.name, "main");
}

#[test]
fn def2_record_with_dimensions() {
    let body = single(
        Sym::new()
            .record(0, 0x96)
            .u16(8)
            .u16(0x00F8)
            .u32(48)
            .u16(2)
            .u32(2)
            .u32(3)
            .str("point")
            .str("grid"),
    );
    assert_eq!(
        body,
        RecordBody::Def2(Def {
            class: Class::StructMember,
            ty: TypeCode(0x00F8),
            size: 48,
            dims: vec![2, 3],
            tag: "point".into(),
            name: "grid".into(),
        })
    );
}

#[test]
fn overlay_records() {
    let file = decode(
        &Sym::new()
            .record(0x8010_0000, 0x98)
            .u32(0x2000)
            .u32(5)
            .record(5, 0x9A)
            .bytes(),
    )
    .unwrap();
    assert_eq!(
        file.records[0].body,
        RecordBody::Overlay {
            length: 0x2000,
            id: 5
        }
    );
    assert_eq!(file.records[1].value, 5);
    assert_eq!(file.records[1].kind(), TagKind::SetOverlay);
}

#[test]
fn unknown_storage_class_is_kept() {
    let body = single(Sym::new().def(0, 77, 0x0004, 4, "x"));
    let RecordBody::Def(def) = body else {
        panic!("expected Def");
    };
    assert_eq!(def.class, Class::Other(77));
    assert_eq!(def.class.code(), 77);
}

#[test]
fn non_utf8_names_decode_lossily() {
    let body = single(Sym::new().record(0, 0x01).u8(2).u8(b'a').u8(0xFF));
    let RecordBody::Name1(name) = body else {
        panic!("expected Name1");
    };
    assert!(name.starts_with('a'));
}

// ── errors ──────────────────────────────────────────────────────────────────

#[test]
fn unknown_kind_reports_position() {
    let err = decode(
        &Sym::new()
            .record(0, 0x01)
            .str("a")
            .record(0, 0x42)
            .bytes(),
    )
    .unwrap_err();

    assert_eq!(err.index, 1);
    assert_eq!(err.offset, 8 + 4 + 1 + 2);
    assert!(err.detail.contains("0x42"), "{err}");
}

#[test]
fn truncated_record_is_an_error() {
    let mut bytes = Sym::new().def(0, 2, 4, 4, "counter").bytes();
    bytes.truncate(bytes.len() - 3);

    let err = decode(&bytes).unwrap_err();
    assert_eq!(err.index, 0);
    assert_eq!(err.offset, 8);
}

#[test]
fn truncated_record_header_is_an_error() {
    let mut bytes = Sym::new().bytes();
    bytes.extend_from_slice(&[0, 0]);

    let err = decode(&bytes).unwrap_err();
    assert!(err.detail.contains("record value"), "{err}");
}

// ── type words ──────────────────────────────────────────────────────────────

#[test]
fn type_word_modifiers_outermost_first() {
    // char *argv[]: array of pointer to char
    let code = TypeCode(0x0072);
    assert_eq!(code.base(), BaseCode::Char);
    assert_eq!(code.mods(), vec![Modifier::Array, Modifier::Pointer]);
    assert_eq!(code.to_string(), "ARY PTR CHAR");
}

#[test]
fn compose_builds_the_same_word() {
    let mods = [Modifier::Pointer, Modifier::Function, Modifier::Array];
    let code = TypeCode::compose(8, &mods);
    assert_eq!(code.base(), BaseCode::Struct);
    assert_eq!(code.mods(), mods.to_vec());
    assert_eq!(TypeCode::compose(4, &[]), TypeCode(4));
}

#[test]
fn modifiers_stop_at_first_empty_slot() {
    // a pointer bit pattern above an empty slot is ignored
    let code = TypeCode(0x0104);
    assert_eq!(code.base(), BaseCode::Int);
    assert!(code.mods().is_empty());
}
