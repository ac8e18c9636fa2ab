use std::{fmt::Write, path::PathBuf};

use anyhow::Result;
use clap::Args;

use super::{emit, read_table};

#[derive(Args)]
pub struct LinesArgs {
    /// Path to the symbol file
    input: PathBuf,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl LinesArgs {
    pub fn run(self, verbose: bool) -> Result<()> {
        let table = read_table(&self.input, verbose)?;
        let mut text = String::new();
        for overlay in &table.overlays {
            writeln!(text, "// overlay {}", overlay.id)?;
            for line in &overlay.lines {
                writeln!(text, "0x{:08X} {}:{}", line.addr, line.path, line.line)?;
            }
        }
        emit(self.output, &text)
    }
}
