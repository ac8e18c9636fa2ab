//! C declarator synthesis.
//!
//! A declarator is built inside out: the name sits in the middle, pointer
//! stars go to its left, array brackets and parameter lists to its right, and
//! the base specifier is prepended last. Pointers to arrays or functions need
//! parentheses to bind before the suffix.

use crate::{
    overlay::TypeArena,
    types::{EnumId, Field, FunctionType, RecordId, Type},
};

const INDENT: &str = "\t";

/// Indentation for the given nesting depth.
pub fn indent(depth: usize) -> String {
    INDENT.repeat(depth)
}

/// Renders [`Type`]s as C declarations against one overlay's arena.
#[derive(Debug, Clone, Copy)]
pub struct Declarator<'a> {
    types: &'a TypeArena,
}

impl<'a> Declarator<'a> {
    pub fn new(types: &'a TypeArena) -> Self {
        Self { types }
    }

    /// `ty name`, e.g. `char *argv[]`. An empty `name` gives an abstract
    /// declarator such as `int *`.
    pub fn declare(&self, ty: &Type, name: &str) -> String {
        self.declare_indented(ty, name, 0)
    }

    /// Like [`Declarator::declare`], for a declaration appearing at nesting
    /// `depth`. Only matters for inlined aggregate bodies.
    pub fn declare_indented(&self, ty: &Type, name: &str, depth: usize) -> String {
        self.render(ty, name.to_string(), depth, &mut Vec::new())
    }

    /// `ret name(params)`.
    pub fn declare_function(&self, func: &FunctionType, name: &str) -> String {
        let mut stack = Vec::new();
        let decl = format!("{name}({})", self.params(func, 0, &mut stack));
        self.render(&func.ret, decl, 0, &mut stack)
    }

    /// One struct or union member line without indentation, e.g.
    /// `int flags:3; // offset: 0x0004`.
    pub fn field_line(&self, field: &Field, depth: usize) -> String {
        self.field_line_inner(field, depth, &mut Vec::new())
    }

    /// Whether the aggregate is written out in place wherever it is used.
    ///
    /// Applies to compiler-tagged structs and unions that have no typedef
    /// and are used by value at least once.
    pub fn is_inlined(&self, id: RecordId) -> bool {
        let record = self.types.record(id);
        record.tag.is_anonymous() && record.aliases.is_empty() && !record.reference_only()
    }

    /// The specifier naming an aggregate or typedef, without inlining.
    pub fn record_name(&self, id: RecordId) -> String {
        if let Some(alias) = self.types.value_alias(id) {
            return alias.name.clone();
        }
        let record = self.types.record(id);
        format!("{} {}", record.kind.keyword(), record.tag)
    }

    pub fn enum_name(&self, id: EnumId) -> String {
        match self.types.enum_value_alias(id) {
            Some(alias) => alias.name.clone(),
            None => format!("enum {}", self.types.enum_type(id).tag),
        }
    }

    fn render(&self, ty: &Type, decl: String, depth: usize, stack: &mut Vec<RecordId>) -> String {
        match ty {
            Type::Pointer(inner) => {
                let decl = match inner.as_ref() {
                    Type::Function(_) | Type::Array { .. } => format!("(*{decl})"),
                    _ => format!("*{decl}"),
                };
                self.render(inner, decl, depth, stack)
            }
            Type::Array { elem, len } => {
                let decl = if *len == 0 {
                    format!("{decl}[]")
                } else {
                    format!("{decl}[{len}]")
                };
                self.render(elem, decl, depth, stack)
            }
            Type::Function(func) => {
                let decl = format!("{decl}({})", self.params(func, depth, stack));
                self.render(&func.ret, decl, depth, stack)
            }
            _ => {
                let base = self.specifier(ty, depth, stack);
                if decl.is_empty() {
                    base
                } else {
                    format!("{base} {decl}")
                }
            }
        }
    }

    fn params(&self, func: &FunctionType, depth: usize, stack: &mut Vec<RecordId>) -> String {
        let mut params: Vec<String> = func
            .params
            .iter()
            .map(|p| self.render(&p.ty, p.name.clone(), depth, stack))
            .collect();
        if func.variadic {
            params.push("...".to_string());
        }
        params.join(", ")
    }

    fn specifier(&self, ty: &Type, depth: usize, stack: &mut Vec<RecordId>) -> String {
        match ty {
            Type::Base(kind) => kind.c_name().to_string(),
            Type::Typedef(id) => self.types.typedef(*id).name.clone(),
            Type::Enum(id) => self.enum_name(*id),
            Type::Struct(id) | Type::Union(id) => {
                if self.is_inlined(*id) && !stack.contains(id) {
                    stack.push(*id);
                    let body = self.inline_body(*id, depth, stack);
                    stack.pop();
                    body
                } else {
                    self.record_name(*id)
                }
            }
            Type::Pointer(_) | Type::Array { .. } | Type::Function(_) => {
                self.render(ty, String::new(), depth, stack)
            }
        }
    }

    fn inline_body(&self, id: RecordId, depth: usize, stack: &mut Vec<RecordId>) -> String {
        let record = self.types.record(id);
        let mut out = format!("{} {{\n", record.kind.keyword());
        for field in &record.fields {
            out.push_str(&indent(depth + 1));
            out.push_str(&self.field_line_inner(field, depth + 1, stack));
            out.push('\n');
        }
        out.push_str(&indent(depth));
        out.push('}');
        out
    }

    fn field_line_inner(&self, field: &Field, depth: usize, stack: &mut Vec<RecordId>) -> String {
        let decl = self.render(&field.ty, field.name.clone(), depth, stack);
        if field.bitfield {
            format!("{decl}:{}; // offset: 0x{:04X}", field.size, field.offset)
        } else {
            format!("{decl}; // offset: 0x{:04X}", field.offset)
        }
    }
}
