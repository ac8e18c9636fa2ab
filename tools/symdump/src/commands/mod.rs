pub mod decls;
pub mod lines;
pub mod symbols;
pub mod tags;
pub mod types;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use mndsym::{SymReader, SymbolTable};

/// Read and fully process a symbol file.
fn read_table(input: &Path, verbose: bool) -> Result<SymbolTable> {
    let reader = SymReader::builder().verbose(verbose).build();
    Ok(reader.read_file(input)?)
}

/// Write `text` to `output`, or to stdout if not given.
fn emit(output: Option<PathBuf>, text: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}
