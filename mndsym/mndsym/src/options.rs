//! Pipeline configuration.

/// Options controlling how a symbol file is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Narrate progress at `info` level. Never changes the resulting model.
    pub verbose: bool,
}
