use mndsym_core::{
    BaseKind, Block, DefinitionWriter, EnumMember, EnumType, Field, FuncDecl, FunctionType,
    Overlay, RecordId, RecordKind, RecordType, StorageClass, Tag, Type, VarDecl,
};

// ── helpers ─────────────────────────────────────────────────────────────────

fn int() -> Type {
    Type::Base(BaseKind::Int)
}

fn field(name: &str, offset: u32, ty: Type) -> Field {
    Field {
        offset,
        size: 4,
        bitfield: false,
        name: name.to_string(),
        ty,
    }
}

fn add_struct(overlay: &mut Overlay, tag: Tag, size: u32, fields: Vec<Field>) -> RecordId {
    let mut record = RecordType::new(RecordKind::Struct, tag, size);
    record.fields = fields;
    record.value_uses = true;
    overlay.add_record(record)
}

fn typedef(ty: Type, name: &str) -> VarDecl {
    VarDecl {
        addr: 0,
        size: 0,
        class: Some(StorageClass::Typedef),
        ty,
        name: name.to_string(),
    }
}

fn add_alias(overlay: &mut Overlay, id: RecordId, ty: Type, name: &str) {
    let alias = overlay.add_typedef(typedef(ty, name));
    overlay.types.record_mut(id).aliases.push(alias);
}

fn var(class: StorageClass, addr: u32, ty: Type, name: &str) -> VarDecl {
    VarDecl {
        addr,
        size: 4,
        class: Some(class),
        ty,
        name: name.to_string(),
    }
}

fn types_of(overlay: &Overlay) -> String {
    let mut out = String::new();
    DefinitionWriter::new(overlay).write_types(&mut out).unwrap();
    out
}

fn vec_fields() -> Vec<Field> {
    vec![field("x", 0, int()), field("y", 4, int())]
}

// ── aggregates ──────────────────────────────────────────────────────────────

#[test]
fn named_struct_with_value_typedef() {
    let mut overlay = Overlay::new(0, 0, 0);
    let id = add_struct(&mut overlay, Tag::Named("vec".into()), 8, vec_fields());
    add_alias(&mut overlay, id, Type::Struct(id), "Vec");

    assert_eq!(
        types_of(&overlay),
        "// size: 0x8\n\
         typedef struct vec {\n\
         \tint x; // offset: 0x0000\n\
         \tint y; // offset: 0x0004\n\
         } Vec;\n\n"
    );
}

#[test]
fn anonymous_struct_with_value_typedef_omits_tag() {
    let mut overlay = Overlay::new(0, 0, 0);
    let id = add_struct(&mut overlay, Tag::Anonymous(4), 8, vec_fields());
    add_alias(&mut overlay, id, Type::Struct(id), "Vec");

    let out = types_of(&overlay);
    assert!(out.starts_with("// size: 0x8\ntypedef struct {\n"), "{out}");
    assert!(out.ends_with("} Vec;\n\n"), "{out}");
}

#[test]
fn pointer_typedef_closes_with_star() {
    let mut overlay = Overlay::new(0, 0, 0);
    let id = add_struct(&mut overlay, Tag::Named("node".into()), 8, vec_fields());
    add_alias(&mut overlay, id, Type::pointer_to(Type::Struct(id)), "NodePtr");

    let out = types_of(&overlay);
    assert!(out.contains("typedef struct node {\n"), "{out}");
    assert!(out.contains("} *NodePtr;\n"), "{out}");
    assert_eq!(out.matches("NodePtr").count(), 1, "{out}");
}

#[test]
fn empty_aggregate_is_commented_out() {
    let mut overlay = Overlay::new(0, 0, 0);
    add_struct(&mut overlay, Tag::Named("fwd".into()), 0, Vec::new());

    assert_eq!(
        types_of(&overlay),
        "/*\n// size: 0x0\nstruct fwd {\n};\n*/\n\n"
    );
}

#[test]
fn embedded_struct_is_written_before_its_parent() {
    let mut overlay = Overlay::new(0, 0, 0);
    let outer = add_struct(&mut overlay, Tag::Named("outer".into()), 16, Vec::new());
    let inner = add_struct(&mut overlay, Tag::Named("inner".into()), 8, vec_fields());
    overlay.types.record_mut(outer).fields = vec![
        field("a", 0, Type::array_of(Type::Struct(inner), 2)),
    ];

    let out = types_of(&overlay);
    let inner_at = out.find("struct inner {").unwrap();
    let outer_at = out.find("struct outer {").unwrap();
    assert!(inner_at < outer_at, "{out}");
    assert_eq!(out.matches("struct inner {").count(), 1, "{out}");
    assert!(out.contains("\tstruct inner a[2]; // offset: 0x0000\n"), "{out}");
}

#[test]
fn inlined_body_is_not_written_on_its_own() {
    let mut overlay = Overlay::new(0, 0, 0);
    let anon = add_struct(&mut overlay, Tag::Anonymous(1), 4, vec![field("a", 0, int())]);
    add_struct(
        &mut overlay,
        Tag::Named("holder".into()),
        4,
        vec![field("u", 0, Type::Struct(anon))],
    );

    let out = types_of(&overlay);
    assert_eq!(
        out,
        "// size: 0x4\n\
         struct holder {\n\
         \tstruct {\n\
         \t\tint a; // offset: 0x0000\n\
         \t} u; // offset: 0x0000\n\
         };\n\n"
    );
}

#[test]
fn bitfields_print_width() {
    let mut overlay = Overlay::new(0, 0, 0);
    let flags = Field {
        offset: 0,
        size: 3,
        bitfield: true,
        name: "mode".into(),
        ty: Type::Base(BaseKind::UInt),
    };
    add_struct(&mut overlay, Tag::Named("ctl".into()), 4, vec![flags]);

    assert!(types_of(&overlay).contains("\tunsigned int mode:3; // offset: 0x0000\n"));
}

// ── enums and typedefs ──────────────────────────────────────────────────────

#[test]
fn enum_members_sorted_and_aligned() {
    let mut overlay = Overlay::new(0, 0, 0);
    let mut color = EnumType::new(Tag::Named("color".into()));
    for (name, value) in [("RED", 2), ("GREEN", 0), ("BLUE_LONG", 1)] {
        color.members.push(EnumMember {
            value,
            name: name.into(),
        });
    }
    overlay.add_enum(color);

    assert_eq!(
        types_of(&overlay),
        "enum color {\n\
         \tGREEN     = 0,\n\
         \tBLUE_LONG = 1,\n\
         \tRED       = 2,\n\
         };\n\n"
    );
}

#[test]
fn enum_with_value_typedef() {
    let mut overlay = Overlay::new(0, 0, 0);
    let mut mode = EnumType::new(Tag::Anonymous(7));
    mode.members.push(EnumMember {
        value: -1,
        name: "NONE".into(),
    });
    let id = overlay.add_enum(mode);
    let alias = overlay.add_typedef(typedef(Type::Enum(id), "Mode"));
    overlay.types.enum_type_mut(id).aliases.push(alias);

    assert_eq!(
        types_of(&overlay),
        "typedef enum {\n\tNONE = -1,\n} Mode;\n\n"
    );
}

#[test]
fn null_typedef_comes_first_and_plain_typedefs_last() {
    let mut overlay = Overlay::new(0, 0, 0);
    overlay.add_typedef(typedef(Type::Base(BaseKind::UChar), "u8"));
    let bool_ = overlay.types.push_typedef(typedef(int(), "bool"));
    overlay.null_typedef = Some(bool_);
    add_struct(&mut overlay, Tag::Named("s".into()), 4, vec![field("a", 0, int())]);

    let out = types_of(&overlay);
    assert!(out.starts_with("typedef int bool;\n\n"), "{out}");
    assert!(out.ends_with("typedef unsigned char u8;\n"), "{out}");
}

// ── declarations ────────────────────────────────────────────────────────────

#[test]
fn variable_comments_by_storage_class() {
    let overlay = Overlay::new(0, 0, 0);
    let writer = DefinitionWriter::new(&overlay);

    let mut out = String::new();
    writer
        .write_var(&mut out, &var(StorageClass::Extern, 0x8001_0000, int(), "g"), 0)
        .unwrap();
    writer
        .write_var(&mut out, &var(StorageClass::Register, 4, int(), "r"), 0)
        .unwrap();
    writer
        .write_var(&mut out, &var(StorageClass::Auto, (-8i32) as u32, int(), "l"), 1)
        .unwrap();

    assert_eq!(
        out,
        "// address: 0x80010000\n\
         // size: 0x4\n\
         extern int g;\n\
         // register: $a0\n\
         // size: 0x4\n\
         register int r;\n\
         \t// address: -8\n\
         \t// size: 0x4\n\
         \tauto int l;\n"
    );
}

#[test]
fn prototype_without_blocks_ends_with_semicolon() {
    let mut overlay = Overlay::new(0, 0, 0);
    overlay.add_func(FuncDecl::new("init", 0x8001_0100, 0, FunctionType::new(int())));

    let mut out = String::new();
    DefinitionWriter::new(&overlay)
        .write_declarations(&mut out)
        .unwrap();
    assert_eq!(
        out,
        "// path: \n\
         // address: 0x80010100\n\
         // line start: 0\n\
         // line end:   0\n\
         int init();\n\n"
    );
}

#[test]
fn function_blocks_nest_by_depth() {
    let mut overlay = Overlay::new(0, 0, 0);
    let mut func = FuncDecl::new("main", 0x8001_0000, 0x20, FunctionType::new(int()));
    func.path = "main.c".into();
    func.line_start = 10;
    func.line_end = 20;
    func.blocks = vec![
        Block {
            line_start: 1,
            line_end: 10,
            locals: vec![var(StorageClass::Auto, (-4i32) as u32, int(), "i")],
            depth: 0,
            closed: true,
        },
        Block {
            line_start: 3,
            line_end: 5,
            locals: Vec::new(),
            depth: 1,
            closed: true,
        },
    ];
    overlay.add_func(func);

    let mut out = String::new();
    let writer = DefinitionWriter::new(&overlay);
    writer.write_func(&mut out, &overlay.funcs[0]).unwrap();
    assert_eq!(
        out,
        "// path: main.c\n\
         // address: 0x80010000\n\
         // size: 0x20\n\
         // line start: 10\n\
         // line end:   20\n\
         int main()\n\
         { //line: 1\n\
         \t// address: -4\n\
         \t// size: 0x4\n\
         \tauto int i;\n\
         \t{ //line: 3\n\
         \t} //line: 5\n\
         } //line: 10\n"
    );
}

#[test]
fn sibling_blocks_close_before_the_next_opens() {
    let mut overlay = Overlay::new(0, 0, 0);
    let mut func = FuncDecl::new("f", 0, 0, FunctionType::new(Type::Base(BaseKind::Void)));
    let block = |line_start, line_end, depth| Block {
        line_start,
        line_end,
        depth,
        closed: true,
        ..Block::default()
    };
    func.blocks = vec![block(1, 9, 0), block(2, 3, 1), block(4, 5, 1)];
    overlay.add_func(func);

    let mut out = String::new();
    DefinitionWriter::new(&overlay)
        .write_func(&mut out, &overlay.funcs[0])
        .unwrap();
    assert!(
        out.ends_with(
            "void f()\n\
             { //line: 1\n\
             \t{ //line: 2\n\
             \t} //line: 3\n\
             \t{ //line: 4\n\
             \t} //line: 5\n\
             } //line: 9\n"
        ),
        "{out}"
    );
}
