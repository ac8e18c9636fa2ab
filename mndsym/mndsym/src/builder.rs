//! Declaration and type building.
//!
//! A single walk over the record stream populates one [`Overlay`] per
//! overlay id. Struct, union and enum member runs, function bodies and line
//! runs are consumed as a whole by the record that opens them.

use std::collections::HashSet;

use indexmap::IndexMap;
use mndsym_core::{
    BaseKind, Block, EnumMember, Field, FuncDecl, FunctionType, InconsistencyError, Line, Overlay,
    RecordKind, StorageClass, Symbol, Type, VarDecl,
};
use mndsym_tags::{BaseCode, Class, Def, FuncStart, Record, RecordBody};
use tracing::{debug, info, warn};

use crate::{
    dedup::typedefs_equal,
    lines::LineDecoder,
    options::ReadOptions,
    resolver::{
        Site, TypeRef, find_empty_enum, find_empty_record, normalized_size, parse_tag,
        resolve_type, sanitize_name, validate_size,
    },
    uniquify::unique_name,
};

/// Builds per-overlay declarations from a decoded record stream.
pub struct Builder<'o> {
    options: &'o ReadOptions,
    /// Overlay 0 first, then in order of their `Overlay` records.
    overlays: Vec<Overlay>,
    /// Overlay id to position in `overlays`.
    ids: IndexMap<u32, usize>,
    current: usize,
    lines: LineDecoder,
}

impl<'o> Builder<'o> {
    pub fn new(options: &'o ReadOptions) -> Self {
        let mut ids = IndexMap::new();
        ids.insert(0, 0);
        Self {
            options,
            overlays: vec![Overlay::new(0, 0, 0)],
            ids,
            current: 0,
            lines: LineDecoder::new(),
        }
    }

    /// Build the overlays described by `records`.
    pub fn build(
        records: &[Record],
        options: &ReadOptions,
    ) -> Result<Vec<Overlay>, InconsistencyError> {
        let mut builder = Builder::new(options);
        builder.walk(records)?;
        Ok(builder.finish())
    }

    /// Process every record in order.
    pub fn walk(&mut self, records: &[Record]) -> Result<(), InconsistencyError> {
        if self.options.verbose {
            info!("parsing {} symbol records", records.len());
        }
        let mut index = 0;
        while index < records.len() {
            index += self.step(records, index)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<Overlay> {
        if self.options.verbose {
            for overlay in &self.overlays {
                info!(
                    "overlay {}: {} functions, {} variables, {} structs, {} unions, {} enums, {} typedefs",
                    overlay.id,
                    overlay.funcs.len(),
                    overlay.vars.len(),
                    overlay.structs.len(),
                    overlay.unions.len(),
                    overlay.enums.len(),
                    overlay.typedefs.len()
                );
            }
        }
        self.overlays
    }

    fn overlay(&mut self) -> &mut Overlay {
        &mut self.overlays[self.current]
    }

    /// Handle the record at `index`; returns how many records it consumed.
    fn step(&mut self, records: &[Record], index: usize) -> Result<usize, InconsistencyError> {
        let record = &records[index];
        let site = Site::of(record, index);
        match &record.body {
            RecordBody::Name1(name) | RecordBody::Name2(name) => {
                self.overlay().symbols.push(Symbol {
                    addr: record.value,
                    name: name.clone(),
                });
                Ok(1)
            }
            body if body.is_line() => {
                let overlay = &mut self.overlays[self.current];
                self.lines.decode_run(records, index, &mut overlay.lines)
            }
            RecordBody::FuncStart(func) => self.function(records, index, func),
            RecordBody::FuncEnd { .. }
            | RecordBody::BlockStart { .. }
            | RecordBody::BlockEnd { .. } => {
                Err(site.error("", "function body record outside a function"))
            }
            RecordBody::Def(def) | RecordBody::Def2(def) => self.definition(records, index, def),
            RecordBody::Overlay { length, id } => {
                if self.ids.contains_key(id) {
                    return Err(site.error("", format!("overlay {id} defined twice")));
                }
                self.ids.insert(*id, self.overlays.len());
                self.overlays.push(Overlay::new(*id, record.value, *length));
                Ok(1)
            }
            RecordBody::SetOverlay => {
                let Some(&position) = self.ids.get(&record.value) else {
                    return Err(site.error(
                        "",
                        format!("unable to locate overlay with id {:x}", record.value),
                    ));
                };
                self.current = position;
                debug!("switched to overlay {}", record.value);
                Ok(1)
            }
            // Line records are all matched above.
            _ => Ok(1),
        }
    }

    /// A top-level definition.
    fn definition(
        &mut self,
        records: &[Record],
        index: usize,
        def: &Def,
    ) -> Result<usize, InconsistencyError> {
        let record = &records[index];
        let site = Site::of(record, index);
        match def.class {
            Class::External | Class::Static => {
                self.global(record.value, def, site)?;
                Ok(1)
            }
            Class::StructTag => self.record_run(records, index, def, RecordKind::Struct),
            Class::UnionTag => self.record_run(records, index, def, RecordKind::Union),
            Class::EnumTag => self.enum_run(records, index, def),
            Class::Typedef => {
                self.typedef(record.value, def, site)?;
                Ok(1)
            }
            Class::File => {
                if self.options.verbose {
                    info!("{}", def.name);
                }
                Ok(1)
            }
            Class::Auto
            | Class::Register
            | Class::RegisterParam
            | Class::Argument
            | Class::Label => Err(site.error(
                sanitize_name(&def.name),
                format!("local storage class {} outside a function", def.class),
            )),
            class => Err(site.error(
                sanitize_name(&def.name),
                format!("unexpected storage class {class} at top level"),
            )),
        }
    }

    fn type_of(&mut self, def: &Def, site: Site) -> Result<Type, InconsistencyError> {
        let r = TypeRef {
            code: def.ty,
            dims: &def.dims,
            tag: &def.tag,
            size: def.size,
        };
        resolve_type(self.overlay(), r, site)
    }

    fn global(&mut self, addr: u32, def: &Def, site: Site) -> Result<(), InconsistencyError> {
        let name = sanitize_name(&def.name);
        let ty = self.type_of(def, site)?;
        let size = normalized_size(&ty, def.size);
        let overlay = self.overlay();
        validate_size(overlay, &ty, size, &name, site)?;

        match ty {
            Type::Function(signature) => {
                overlay.add_func(FuncDecl::new(name, addr, size, signature));
            }
            ty => {
                let class = if def.class == Class::Static {
                    StorageClass::Static
                } else {
                    StorageClass::Extern
                };
                overlay.add_var(VarDecl {
                    addr,
                    size,
                    class: Some(class),
                    ty,
                    name,
                });
            }
        }
        Ok(())
    }

    fn typedef(&mut self, addr: u32, def: &Def, site: Site) -> Result<(), InconsistencyError> {
        let name = sanitize_name(&def.name);
        let ty = self.type_of(def, site)?;
        let size = normalized_size(&ty, def.size);
        let overlay = self.overlay();
        validate_size(overlay, &ty, size, &name, site)?;

        let decl = VarDecl {
            addr,
            size,
            class: Some(StorageClass::Typedef),
            ty,
            name,
        };

        let target = match &decl.ty {
            Type::Pointer(inner) => inner.as_ref(),
            ty => ty,
        };
        let aliases = match target {
            Type::Struct(id) | Type::Union(id) => Some(&overlay.types.record(*id).aliases),
            Type::Enum(id) => Some(&overlay.types.enum_type(*id).aliases),
            _ => None,
        };
        let mut attach = aliases.is_some();
        if let Some(aliases) = aliases {
            for &alias in aliases {
                let existing = overlay.types.typedef(alias);
                if existing.name != decl.name {
                    continue;
                }
                if !typedefs_equal(existing, &decl) {
                    return Err(site.error(
                        decl.name.clone(),
                        "typedef redefined with a different type",
                    ));
                }
                attach = false;
            }
        }

        let target = target.clone();
        let id = overlay.add_typedef(decl);
        if attach {
            match target {
                Type::Struct(record) | Type::Union(record) => {
                    overlay.types.record_mut(record).aliases.push(id)
                }
                Type::Enum(def) => overlay.types.enum_type_mut(def).aliases.push(id),
                _ => {}
            }
        }
        Ok(())
    }

    /// A struct or union tag followed by its members up to end-of-struct.
    fn record_run(
        &mut self,
        records: &[Record],
        index: usize,
        def: &Def,
        kind: RecordKind,
    ) -> Result<usize, InconsistencyError> {
        let site = Site::of(&records[index], index);
        let expected = match kind {
            RecordKind::Struct => BaseCode::Struct,
            RecordKind::Union => BaseCode::Union,
        };
        if def.ty.base() != expected {
            return Err(site.error(
                sanitize_name(&def.name),
                format!(
                    "{} tag with base type {}",
                    kind.keyword(),
                    def.ty.base().mnemonic()
                ),
            ));
        }
        let tag = parse_tag(&def.name);
        let id = find_empty_record(self.overlay(), kind, tag.clone(), def.size);

        for (member_index, member) in records.iter().enumerate().skip(index + 1) {
            let member_site = Site::of(member, member_index);
            let (RecordBody::Def(m) | RecordBody::Def2(m)) = &member.body else {
                return Err(member_site.error(
                    tag.to_string(),
                    format!("unexpected {:?} record inside {}", member.kind(), kind.keyword()),
                ));
            };
            let bitfield = match (kind, m.class) {
                (_, Class::EndOfStruct) => return Ok(member_index - index + 1),
                (RecordKind::Struct, Class::StructMember) => false,
                (RecordKind::Struct, Class::Bitfield) => true,
                (RecordKind::Union, Class::UnionMember) => false,
                (_, class) => {
                    return Err(member_site.error(
                        tag.to_string(),
                        format!("unexpected member class {class} inside {}", kind.keyword()),
                    ));
                }
            };

            let name = sanitize_name(&m.name);
            let ty = self.type_of(m, member_site)?;
            let size = if bitfield {
                m.size
            } else {
                normalized_size(&ty, m.size)
            };
            let overlay = self.overlay();
            if !bitfield {
                validate_size(overlay, &ty, size, &name, member_site)?;
            }
            overlay.types.record_mut(id).fields.push(Field {
                offset: member.value,
                size,
                bitfield,
                name,
                ty,
            });
        }
        Err(site.error(
            tag.to_string(),
            format!("{} definition not terminated", kind.keyword()),
        ))
    }

    /// An enum tag followed by its members up to end-of-struct.
    fn enum_run(
        &mut self,
        records: &[Record],
        index: usize,
        def: &Def,
    ) -> Result<usize, InconsistencyError> {
        let site = Site::of(&records[index], index);
        if def.ty.base() != BaseCode::Enum {
            return Err(site.error(
                sanitize_name(&def.name),
                format!("enum tag with base type {}", def.ty.base().mnemonic()),
            ));
        }
        let tag = parse_tag(&def.name);
        let id = find_empty_enum(self.overlay(), tag.clone());

        for (member_index, member) in records.iter().enumerate().skip(index + 1) {
            let member_site = Site::of(member, member_index);
            match &member.body {
                RecordBody::Def(m) | RecordBody::Def2(m) if m.class == Class::EnumMember => {
                    self.overlay()
                        .types
                        .enum_type_mut(id)
                        .members
                        .push(EnumMember {
                            value: member.value as i32,
                            name: sanitize_name(&m.name),
                        });
                }
                RecordBody::Def(m) | RecordBody::Def2(m) if m.class == Class::EndOfStruct => {
                    return Ok(member_index - index + 1);
                }
                _ => {
                    return Err(member_site.error(
                        tag.to_string(),
                        format!("unexpected {:?} record inside enum", member.kind()),
                    ));
                }
            }
        }
        Err(site.error(tag.to_string(), "enum definition not terminated"))
    }

    /// A function body from its start record up to the matching end record.
    fn function(
        &mut self,
        records: &[Record],
        index: usize,
        start: &FuncStart,
    ) -> Result<usize, InconsistencyError> {
        let record = &records[index];
        let site = Site::of(record, index);
        let addr = record.value;
        let func = self.locate_function(&sanitize_name(&start.name), addr);

        if self.overlay().funcs[func].has_body() {
            warn!(
                "function {} at 0x{addr:08X} already has a body, skipping duplicate",
                self.overlay().funcs[func].name
            );
            return records[index + 1..]
                .iter()
                .position(|r| matches!(r.body, RecordBody::FuncEnd { .. }))
                .map(|end| end + 2)
                .ok_or_else(|| site.error(start.name.clone(), "function body not terminated"));
        }

        let overlay = self.overlay();
        let decl = &mut overlay.funcs[func];
        decl.path = start.path.clone();
        decl.line_start = start.line;
        overlay.lines.push(Line {
            addr,
            path: start.path.clone(),
            line: start.line,
        });

        // Indices into the function's blocks, innermost last.
        let mut open: Vec<usize> = Vec::new();
        for (body_index, body) in records.iter().enumerate().skip(index + 1) {
            let body_site = Site::of(body, body_index);
            let block_line = |line: u32| start.line.saturating_add(line).saturating_sub(1);
            match &body.body {
                RecordBody::FuncEnd { line } => {
                    self.overlay().funcs[func].line_end = *line;
                    return Ok(body_index - index + 1);
                }
                RecordBody::BlockStart { line } => {
                    let overlay = self.overlay();
                    let blocks = &mut overlay.funcs[func].blocks;
                    blocks.push(Block {
                        line_start: *line,
                        depth: open.len(),
                        ..Block::default()
                    });
                    open.push(blocks.len() - 1);
                    overlay.lines.push(Line {
                        addr: body.value,
                        path: start.path.clone(),
                        line: block_line(*line),
                    });
                }
                RecordBody::BlockEnd { line } => {
                    let Some(block) = open.pop() else {
                        return Err(
                            body_site.error(start.name.clone(), "block end without block start")
                        );
                    };
                    let overlay = self.overlay();
                    let block = &mut overlay.funcs[func].blocks[block];
                    block.line_end = *line;
                    block.closed = true;
                    overlay.lines.push(Line {
                        addr: body.value,
                        path: start.path.clone(),
                        line: block_line(*line),
                    });
                }
                RecordBody::Def(def) | RecordBody::Def2(def) => {
                    let local = self.local(body.value, def, body_site)?;
                    let decl = &mut self.overlay().funcs[func];
                    match open.last() {
                        Some(&block) => {
                            decl.blocks[block].add_local(local);
                        }
                        None => {
                            decl.signature.add_param(local);
                        }
                    }
                }
                _ => {
                    return Err(body_site.error(
                        start.name.clone(),
                        format!("unexpected {:?} record inside function", body.kind()),
                    ));
                }
            }
        }
        Err(site.error(start.name.clone(), "function body not terminated"))
    }

    /// Position of the function declared as `name` at `addr`, or of a new
    /// `void name()` placeholder when there is none.
    fn locate_function(&mut self, name: &str, addr: u32) -> usize {
        let overlay = self.overlay();
        let existing = overlay.func_names.get(name);
        if let Some(&found) = existing
            .into_iter()
            .flatten()
            .find(|&&i| overlay.funcs[i].addr == addr)
        {
            return found;
        }

        warn!("unable to locate function {name}, created void");
        let clashes = existing.is_some_and(|list| !list.is_empty());
        let decl_name = if clashes {
            let mut taken: HashSet<String> = overlay
                .func_names
                .keys()
                .cloned()
                .chain(overlay.funcs.iter().map(|f| f.name.clone()))
                .collect();
            unique_name(name, addr, &mut taken)
        } else {
            name.to_string()
        };
        // Stays under the stream name so a repeated span finds it again.
        overlay.add_func_as(
            name,
            FuncDecl::new(
                decl_name,
                addr,
                0,
                FunctionType::new(Type::Base(BaseKind::Void)),
            ),
        )
    }

    /// A parameter, local or label inside a function body.
    fn local(&mut self, addr: u32, def: &Def, site: Site) -> Result<VarDecl, InconsistencyError> {
        let name = sanitize_name(&def.name);
        let class = match def.class {
            Class::Auto => Some(StorageClass::Auto),
            Class::Static => Some(StorageClass::Static),
            Class::Register | Class::RegisterParam => Some(StorageClass::Register),
            Class::Typedef => Some(StorageClass::Typedef),
            Class::Argument | Class::Label => None,
            class => {
                return Err(site.error(
                    name,
                    format!("unexpected storage class {class} inside a function"),
                ));
            }
        };
        let ty = self.type_of(def, site)?;
        let size = normalized_size(&ty, def.size);
        validate_size(self.overlay(), &ty, size, &name, site)?;
        Ok(VarDecl {
            addr,
            size,
            class,
            ty,
            name,
        })
    }
}
