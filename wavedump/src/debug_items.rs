// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
//! # Debug Items
//! The interface through which a simulator exposes its signals. Every item points at the
//! live storage of a signal. The simulator keeps ownership of that storage and updates it
//! through the shared `Cell`s, while the [`crate::VcdWriter`] only reads from it.

use crate::hierarchy::split_hierarchy;
use std::cell::Cell;
use std::collections::BTreeMap;

/// Values are stored as a little-endian sequence of chunks: bit `i` lives in chunk
/// `i / CHUNK_BITS` at position `i % CHUNK_BITS`.
pub type Chunk = u32;
pub const CHUNK_BITS: u32 = Chunk::BITS;

/// Number of chunks needed to store `width` bits.
#[inline]
pub fn chunks_for(width: u32) -> usize {
    width.div_ceil(CHUNK_BITS) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum DebugItemKind {
    /// A combinational value.
    Value,
    /// A stateful value, e.g., the output of a register.
    Wire,
    /// An array of `depth` elements that are each `width` bits wide.
    Memory,
}

#[derive(Debug, Clone, Copy)]
pub struct DebugItem<'a> {
    pub kind: DebugItemKind,
    pub width: u32,
    /// Number of elements. Always 1 for values and wires.
    pub depth: u32,
    pub curr: &'a [Cell<Chunk>],
}

impl<'a> DebugItem<'a> {
    pub fn value(curr: &'a [Cell<Chunk>], width: u32) -> Self {
        Self {
            kind: DebugItemKind::Value,
            width,
            depth: 1,
            curr,
        }
    }

    pub fn wire(curr: &'a [Cell<Chunk>], width: u32) -> Self {
        Self {
            kind: DebugItemKind::Wire,
            width,
            depth: 1,
            curr,
        }
    }

    pub fn memory(curr: &'a [Cell<Chunk>], width: u32, depth: u32) -> Self {
        Self {
            kind: DebugItemKind::Memory,
            width,
            depth,
            curr,
        }
    }

    /// Chunks occupied by a single element.
    #[inline]
    pub fn stride(&self) -> usize {
        chunks_for(self.width)
    }

    /// Live storage of element `index`. Values and wires only have element 0.
    pub fn element(&self, index: u32) -> Option<&'a [Cell<Chunk>]> {
        if index >= self.depth {
            return None;
        }
        let start = self.stride() * index as usize;
        self.curr.get(start..start + self.stride())
    }
}

/// Debug items indexed by their hierarchical name.
///
/// Names are normalized on insertion: empty components are dropped and the remaining ones are
/// joined by a single separator. Iteration is in lexicographic order of the normalized name,
/// which visits every scope contiguously, as required by [`crate::VcdWriter`].
#[derive(Debug, Clone)]
pub struct DebugItems<'a> {
    separator: char,
    table: BTreeMap<String, DebugItem<'a>>,
}

impl Default for DebugItems<'_> {
    fn default() -> Self {
        Self::with_separator(' ')
    }
}

impl<'a> DebugItems<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this when the writer is configured with a different [`crate::WriterOptions::separator`].
    pub fn with_separator(separator: char) -> Self {
        Self {
            separator,
            table: BTreeMap::new(),
        }
    }

    /// Registers `item` under `name`. Returns the item that was previously registered under
    /// the same normalized name, if any.
    pub fn add(&mut self, name: &str, item: DebugItem<'a>) -> Option<DebugItem<'a>> {
        let mut buf = [0; 4];
        let separator: &str = self.separator.encode_utf8(&mut buf);
        let normalized = split_hierarchy(name, self.separator).join(separator);
        self.table.insert(normalized, item)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DebugItem<'a>)> {
        self.table.iter().map(|(name, item)| (name.as_str(), item))
    }
}

/// Accepts every item.
pub fn all_items(_name: &str, _item: &DebugItem) -> bool {
    true
}

/// Accepts values and wires, but skips memories, which can be very large.
pub fn without_memories(_name: &str, item: &DebugItem) -> bool {
    matches!(item.kind, DebugItemKind::Value | DebugItemKind::Wire)
}
