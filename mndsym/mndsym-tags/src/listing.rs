//! DUMPSYM-style textual listing of a decoded file.

use std::fmt::{self, Display, Formatter};

use crate::{
    decoder::SymFile,
    record::{Def, Record, RecordBody},
};

impl Display for SymFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Header : MND version {}", self.header.version)?;
        writeln!(f, "Target unit {}", self.header.target_unit)?;
        let mut line = None;
        for record in &self.records {
            write_record(f, record, &mut line)?;
        }
        Ok(())
    }
}

/// One record; `line` is the running source line, unknown until a set.
fn write_record(f: &mut Formatter<'_>, record: &Record, line: &mut Option<u32>) -> fmt::Result {
    write!(
        f,
        "{:06x}: ${:08x} {:x} ",
        record.offset,
        record.value,
        record.kind().code()
    )?;
    match &record.body {
        RecordBody::Name1(name) | RecordBody::Name2(name) => writeln!(f, "{name}"),
        RecordBody::IncLine => {
            *line = line.map(|l| l.wrapping_add(1));
            match line {
                Some(l) => writeln!(f, "Inc SLD linenum (to {l})"),
                None => writeln!(f, "Inc SLD linenum (+1)"),
            }
        }
        RecordBody::IncLineByte(inc) => write_increment(f, line, u32::from(*inc)),
        RecordBody::IncLineWord(inc) => write_increment(f, line, u32::from(*inc)),
        RecordBody::SetLine(l) => {
            *line = Some(*l);
            writeln!(f, "Set SLD linenum to {l}")
        }
        RecordBody::SetLineWithPath { line: l, path } => {
            *line = Some(*l);
            writeln!(f, "Set SLD linenum to {l} (file {path})")
        }
        RecordBody::EndLine => {
            *line = None;
            writeln!(f, "End SLD info")
        }
        RecordBody::FuncStart(func) => {
            writeln!(f, "Function start :")?;
            writeln!(f, "\tfp = {}", func.fp)?;
            writeln!(f, "\tfsize = {}", func.fsize)?;
            writeln!(f, "\tretreg = {}", func.ret_reg)?;
            writeln!(f, "\tmask = ${:08x}", func.mask)?;
            writeln!(f, "\tmaskoffs = {}", func.mask_offset)?;
            writeln!(f, "\tline = {}", func.line)?;
            writeln!(f, "\tfile = {}", func.path)?;
            writeln!(f, "\tname = {}", func.name)
        }
        RecordBody::FuncEnd { line: l } => writeln!(f, "Function end   line {l}"),
        RecordBody::BlockStart { line: l } => writeln!(f, "Block start  line = {l}"),
        RecordBody::BlockEnd { line: l } => writeln!(f, "Block end  line = {l}"),
        RecordBody::Def(def) => {
            write_def(f, "Def", def)?;
            writeln!(f, " name {}", def.name)
        }
        RecordBody::Def2(def) => {
            write_def(f, "Def2", def)?;
            write!(f, " dims {}", def.dims.len())?;
            for dim in &def.dims {
                write!(f, " {dim}")?;
            }
            writeln!(f, " tag {} name {}", def.tag, def.name)
        }
        RecordBody::Overlay { length, id } => {
            writeln!(f, "overlay length ${length:08x} id ${id:x}")
        }
        RecordBody::SetOverlay => writeln!(f, "set overlay"),
    }
}

fn write_increment(f: &mut Formatter<'_>, line: &mut Option<u32>, inc: u32) -> fmt::Result {
    *line = line.map(|l| l.wrapping_add(inc));
    match line {
        Some(l) => writeln!(f, "Inc SLD linenum by {inc} (to {l})"),
        None => writeln!(f, "Inc SLD linenum by {inc}"),
    }
}

fn write_def(f: &mut Formatter<'_>, label: &str, def: &Def) -> fmt::Result {
    write!(
        f,
        "{label} class {} type {} size {}",
        def.class, def.ty, def.size
    )
}
