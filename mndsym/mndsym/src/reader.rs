//! Symbol file reader: decode, build, dedup and uniquify.

use std::{fs, path::Path};

use memmap2::Mmap;
use mndsym_core::{Overlay, SymError};
use mndsym_tags::{SymFile, SymHeader, decode};
use tracing::info;

use crate::{
    builder::Builder, dedup::dedup_overlay, error::SymReaderError, options::ReadOptions,
    uniquify::uniquify_overlay,
};

/// The finished model of one symbol file.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    pub header: SymHeader,
    /// Overlay 0 (the resident executable) first, then in definition order.
    pub overlays: Vec<Overlay>,
}

impl SymbolTable {
    pub fn overlay(&self, id: u32) -> Option<&Overlay> {
        self.overlays.iter().find(|overlay| overlay.id == id)
    }
}

/// Reads MND/SYM files into a [`SymbolTable`].
#[derive(Debug, Clone, Default)]
pub struct SymReader {
    options: ReadOptions,
}

/// Builder for configuring [`SymReader`].
#[derive(Debug, Clone, Default)]
pub struct SymReaderBuilder {
    options: ReadOptions,
}

impl SymReader {
    /// Create a builder for [`SymReader`].
    pub fn builder() -> SymReaderBuilder {
        SymReaderBuilder::default()
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    fn mmap_file(&self, path: &Path) -> Result<Mmap, SymReaderError> {
        let file = fs::File::open(path)?;
        Ok(unsafe { Mmap::map(&file) }?)
    }

    /// Decode the record stream of a file without building anything.
    pub fn decode_file(&self, path: impl AsRef<Path>) -> Result<SymFile, SymReaderError> {
        let mmap = self.mmap_file(path.as_ref())?;
        Ok(decode(&mmap)?)
    }

    /// Read a symbol file into its finished model.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<SymbolTable, SymReaderError> {
        let path = path.as_ref();
        if self.options.verbose {
            info!("reading {}", path.display());
        }
        let mmap = self.mmap_file(path)?;
        Ok(self.read_bytes(&mmap)?)
    }

    /// Read an in-memory symbol file into its finished model.
    pub fn read_bytes(&self, data: &[u8]) -> Result<SymbolTable, SymError> {
        let file = decode(data)?;
        self.process(file)
    }

    /// Build, dedup and uniquify an already decoded file.
    pub fn process(&self, file: SymFile) -> Result<SymbolTable, SymError> {
        if self.options.verbose {
            info!(
                "MND version {}, target unit {}, {} records",
                file.header.version,
                file.header.target_unit,
                file.records.len()
            );
        }
        let mut overlays = Builder::build(&file.records, &self.options)?;
        for overlay in &mut overlays {
            let stats = dedup_overlay(overlay);
            if self.options.verbose {
                info!(
                    "overlay {}: merged {} structs, {} unions, {} enums, {} typedefs",
                    overlay.id, stats.structs, stats.unions, stats.enums, stats.typedefs
                );
            }
            uniquify_overlay(overlay);
        }
        Ok(SymbolTable {
            header: file.header,
            overlays,
        })
    }
}

impl SymReaderBuilder {
    /// Narrate progress at `info` level (default: off).
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    /// Build the reader.
    pub fn build(self) -> SymReader {
        SymReader::with_options(self.options)
    }
}
