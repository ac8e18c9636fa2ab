use std::{fmt::Write, path::PathBuf};

use anyhow::Result;
use clap::Args;
use mndsym::core::DefinitionWriter;

use super::{emit, read_table};

#[derive(Args)]
pub struct TypesArgs {
    /// Path to the symbol file
    input: PathBuf,

    /// Only print the overlay with this id
    #[arg(long)]
    overlay: Option<u32>,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl TypesArgs {
    pub fn run(self, verbose: bool) -> Result<()> {
        let table = read_table(&self.input, verbose)?;
        let mut text = String::new();
        for overlay in &table.overlays {
            if self.overlay.is_some_and(|id| id != overlay.id) {
                continue;
            }
            writeln!(text, "// overlay {}", overlay.id)?;
            DefinitionWriter::new(overlay).write_types(&mut text)?;
        }
        emit(self.output, &text)
    }
}
