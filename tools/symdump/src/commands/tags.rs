use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mndsym::SymReader;

use super::emit;

#[derive(Args)]
pub struct TagsArgs {
    /// Path to the symbol file
    input: PathBuf,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl TagsArgs {
    pub fn run(self, verbose: bool) -> Result<()> {
        let reader = SymReader::builder().verbose(verbose).build();
        let file = reader.decode_file(&self.input)?;
        emit(self.output, &file.to_string())
    }
}
