// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! # wavedump
//! Records the state of a running circuit simulation as a Value Change Dump (VCD).
//!
//! The simulator describes its signals through [`DebugItems`], the [`VcdWriter`] declares them
//! once and then, on every call to [`VcdWriter::sample`], appends only the values that changed
//! since the previous sample. The writer never performs any I/O, the caller decides when to
//! move the accumulated text into a file or socket.

mod debug_items;
mod hierarchy;
pub mod ident;
mod writer;

/// Cargo.toml version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    /// Separates the components of a hierarchical name.
    pub separator: char,
    /// Sort batch declarations by their hierarchical path before emitting them.
    /// When `false`, the caller must enumerate items so that every scope is visited contiguously.
    pub sort_by_hierarchy: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            separator: ' ',
            sort_by_hierarchy: false,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum VcdWriteError {
    #[error("[vcd] cannot {0} after `$enddefinitions` was emitted")]
    DefinitionsSealed(&'static str),
    #[error("[vcd] cannot {0} before `$enddefinitions` was emitted")]
    DefinitionsOpen(&'static str),
    #[error("[vcd] unsupported timescale factor {0}, valid are: 1, 10, 100")]
    InvalidTimescaleFactor(u32),
    #[error("[vcd] unsupported timescale unit `{0}`, valid are: s, ms, us, ns, ps, fs")]
    InvalidTimescaleUnit(String),
    #[error("[vcd] scalar value change requested for a {0}-bit variable")]
    NotScalar(u32),
    #[error("[vcd] variable `{0}` has zero width")]
    ZeroWidth(String),
    #[error("[vcd] memory `{0}` has zero depth")]
    ZeroDepth(String),
    #[error("[vcd] storage of `{name}` holds {actual} chunks, but {expected} are required")]
    StorageTooSmall {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("[vcd] ran out of variable identities")]
    TooManyVariables,
    #[error("[vcd] hierarchical name `{0}` does not contain a variable name")]
    EmptyName(String),
}

pub type Result<T> = std::result::Result<T, VcdWriteError>;

pub use debug_items::{
    all_items, chunks_for, without_memories, Chunk, DebugItem, DebugItemKind, DebugItems,
    CHUNK_BITS,
};
pub use hierarchy::{split_hierarchy, Timescale, TimescaleUnit, VarType};
pub use ident::VarId;
pub use writer::{Phase, VcdWriter};
