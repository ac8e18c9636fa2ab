//! Whole-definition printing for an overlay.
//!
//! Aggregate bodies are written once each, with the bodies they contain by
//! value written before them so the output reads top to bottom.

use std::{
    collections::HashSet,
    fmt::{self, Write},
};

use crate::{
    decl::{Block, FuncDecl, StorageClass, VarDecl},
    declarator::{Declarator, indent},
    overlay::Overlay,
    types::{EnumId, Field, RecordId, Type, TypedefId},
};

/// Writes C definitions of one overlay's types and declarations.
pub struct DefinitionWriter<'a> {
    overlay: &'a Overlay,
    declarator: Declarator<'a>,
    emitted_records: HashSet<RecordId>,
    emitted_enums: HashSet<EnumId>,
    /// Typedefs already printed as the closing name of an aggregate body.
    consumed_typedefs: HashSet<TypedefId>,
}

impl<'a> DefinitionWriter<'a> {
    pub fn new(overlay: &'a Overlay) -> Self {
        Self {
            overlay,
            declarator: Declarator::new(&overlay.types),
            emitted_records: HashSet::new(),
            emitted_enums: HashSet::new(),
            consumed_typedefs: HashSet::new(),
        }
    }

    /// Every type definition of the overlay: the null-base typedef, enums,
    /// structs, unions, then typedefs not already printed with their
    /// aggregate.
    pub fn write_types(&mut self, out: &mut impl Write) -> fmt::Result {
        let overlay = self.overlay;
        if let Some(id) = overlay.null_typedef {
            self.write_typedef(out, id)?;
            writeln!(out)?;
        }
        for &id in &overlay.enums {
            self.write_enum(out, id)?;
        }
        // Bodies that are normally inlined come last, so only those never
        // used by a parent show up on their own.
        for inlined in [false, true] {
            for &id in overlay.structs.iter().chain(&overlay.unions) {
                if self.declarator.is_inlined(id) == inlined {
                    self.write_record(out, id)?;
                }
            }
        }
        for &id in &overlay.typedefs {
            self.write_typedef(out, id)?;
        }
        Ok(())
    }

    /// A struct or union body, preceded by the bodies it embeds by value.
    /// Does nothing when the body has already been written.
    pub fn write_record(&mut self, out: &mut impl Write, id: RecordId) -> fmt::Result {
        if !self.emitted_records.insert(id) {
            return Ok(());
        }
        let overlay = self.overlay;
        let types = &overlay.types;
        let record = types.record(id);
        self.write_dependencies(out, &record.fields)?;

        let alias = match record.aliases.as_slice() {
            [alias] => {
                self.consumed_typedefs.insert(*alias);
                Some(types.typedef(*alias))
            }
            _ => None,
        };
        let keyword = record.kind.keyword();
        let header = match alias {
            Some(alias) if record.tag.is_anonymous() && !alias.ty.is_pointer() => {
                format!("typedef {keyword} {{")
            }
            Some(_) => format!("typedef {keyword} {} {{", record.tag),
            None => format!("{keyword} {} {{", record.tag),
        };
        let close = match alias {
            Some(alias) if alias.ty.is_pointer() => format!("}} *{};", alias.name),
            Some(alias) => format!("}} {};", alias.name),
            None => "};".to_string(),
        };

        let mut body = String::new();
        writeln!(body, "// size: 0x{:X}", record.size)?;
        writeln!(body, "{header}")?;
        for field in &record.fields {
            writeln!(
                body,
                "{}{}",
                indent(1),
                self.declarator.field_line(field, 1)
            )?;
        }
        writeln!(body, "{close}")?;

        if record.fields.is_empty() {
            write!(out, "/*\n{body}*/\n\n")
        } else {
            write!(out, "{body}\n")
        }
    }

    fn write_dependencies(&mut self, out: &mut impl Write, fields: &[Field]) -> fmt::Result {
        for field in fields {
            let mut ty = &field.ty;
            while let Type::Array { elem, .. } = ty {
                ty = elem;
            }
            match ty {
                Type::Struct(id) | Type::Union(id) if self.declarator.is_inlined(*id) => {
                    if self.emitted_records.insert(*id) {
                        let overlay = self.overlay;
                        let nested = &overlay.types.record(*id).fields;
                        self.write_dependencies(out, nested)?;
                    }
                }
                Type::Struct(id) | Type::Union(id) => self.write_record(out, *id)?,
                Type::Enum(id) => self.write_enum(out, *id)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// An enum body with members sorted by value and aligned.
    pub fn write_enum(&mut self, out: &mut impl Write, id: EnumId) -> fmt::Result {
        if !self.emitted_enums.insert(id) {
            return Ok(());
        }
        let overlay = self.overlay;
        let types = &overlay.types;
        let def = types.enum_type(id);
        let alias = match def.aliases.as_slice() {
            [alias] => {
                self.consumed_typedefs.insert(*alias);
                Some(types.typedef(*alias))
            }
            _ => None,
        };
        match alias {
            Some(alias) if def.tag.is_anonymous() && !alias.ty.is_pointer() => {
                writeln!(out, "typedef enum {{")?
            }
            Some(_) => writeln!(out, "typedef enum {} {{", def.tag)?,
            None => writeln!(out, "enum {} {{", def.tag)?,
        }
        let members = def.sorted_members();
        let width = members.iter().map(|m| m.name.len()).max().unwrap_or(0);
        for member in members {
            writeln!(
                out,
                "{}{:<width$} = {},",
                indent(1),
                member.name,
                member.value
            )?;
        }
        match alias {
            Some(alias) if alias.ty.is_pointer() => writeln!(out, "}} *{};", alias.name)?,
            Some(alias) => writeln!(out, "}} {};", alias.name)?,
            None => writeln!(out, "}};")?,
        }
        writeln!(out)
    }

    /// `typedef <declarator>;` unless the typedef was already printed as the
    /// name of an aggregate body.
    pub fn write_typedef(&mut self, out: &mut impl Write, id: TypedefId) -> fmt::Result {
        if self.consumed_typedefs.contains(&id) {
            return Ok(());
        }
        let decl = self.overlay.types.typedef(id);
        writeln!(out, "typedef {};", self.declarator.declare(&decl.ty, &decl.name))
    }

    /// Global variables, then functions with their bodies.
    pub fn write_declarations(&self, out: &mut impl Write) -> fmt::Result {
        for var in &self.overlay.vars {
            self.write_var(out, var, 0)?;
            writeln!(out)?;
        }
        for func in &self.overlay.funcs {
            self.write_func(out, func)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// A variable, parameter or local preceded by its location comments.
    pub fn write_var(&self, out: &mut impl Write, var: &VarDecl, depth: usize) -> fmt::Result {
        let pad = indent(depth);
        match var.class {
            Some(StorageClass::Register) => {
                writeln!(out, "{pad}// register: {}", register_name(var.addr))?
            }
            _ if var.addr == 0 => {}
            _ if (0x8000_0001..0x9000_0000).contains(&var.addr) => {
                writeln!(out, "{pad}// address: 0x{:08X}", var.addr)?
            }
            // Frame offsets are stored as two's complement.
            _ => writeln!(out, "{pad}// address: {}", var.addr as i32)?,
        }
        if var.size > 0 {
            writeln!(out, "{pad}// size: 0x{:X}", var.size)?;
        }
        let decl = self.declarator.declare_indented(&var.ty, &var.name, depth);
        match var.class {
            Some(class) => writeln!(out, "{pad}{} {decl};", class.keyword()),
            None => writeln!(out, "{pad}{decl};"),
        }
    }

    /// A function prototype, or its definition with nested block scopes when
    /// blocks were recorded.
    pub fn write_func(&self, out: &mut impl Write, func: &FuncDecl) -> fmt::Result {
        writeln!(out, "// path: {}", func.path)?;
        if func.addr > 0 {
            writeln!(out, "// address: 0x{:08X}", func.addr)?;
        }
        if func.size > 0 {
            writeln!(out, "// size: 0x{:X}", func.size)?;
        }
        writeln!(out, "// line start: {}", func.line_start)?;
        writeln!(out, "// line end:   {}", func.line_end)?;
        let signature = self.declarator.declare_function(&func.signature, &func.name);
        if func.blocks.is_empty() {
            return writeln!(out, "{signature};");
        }
        writeln!(out, "{signature}")?;
        self.write_blocks(out, &func.blocks)
    }

    fn write_blocks(&self, out: &mut impl Write, blocks: &[Block]) -> fmt::Result {
        // Blocks still open, innermost last.
        let mut open: Vec<&Block> = Vec::new();
        for block in blocks {
            while let Some(last) = open.pop_if(|last| last.depth >= block.depth) {
                writeln!(out, "{}}} //line: {}", indent(last.depth), last.line_end)?;
            }
            writeln!(out, "{}{{ //line: {}", indent(block.depth), block.line_start)?;
            for local in &block.locals {
                self.write_var(out, local, block.depth + 1)?;
            }
            open.push(block);
        }
        while let Some(last) = open.pop() {
            writeln!(out, "{}}} //line: {}", indent(last.depth), last.line_end)?;
        }
        Ok(())
    }
}

const REGISTERS: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// MIPS register mnemonic, or `$<n>` outside the general purpose set.
fn register_name(reg: u32) -> String {
    usize::try_from(reg)
        .ok()
        .and_then(|index| REGISTERS.get(index))
        .map_or_else(|| format!("${reg}"), |name| name.to_string())
}
