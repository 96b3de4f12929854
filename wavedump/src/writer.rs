// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::debug_items::{all_items, chunks_for, without_memories, Chunk, CHUNK_BITS};
use crate::hierarchy::{split_hierarchy, ScopeStack, Timescale, TimescaleUnit, VarType};
use crate::ident::{write_id, VarId};
use crate::{DebugItem, DebugItemKind, DebugItems, Result, VcdWriteError, WriterOptions};
use std::cell::Cell;

/// A VCD trace consists of a header with all declarations followed by the value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Timescale and variables may be declared.
    Definition,
    /// `$enddefinitions` was emitted, only timestamps and value changes may follow.
    Sampling,
}

#[derive(Debug)]
struct Variable<'a> {
    id: VarId,
    width: u32,
    curr: &'a [Cell<Chunk>],
    /// offset of the previously emitted value in the cache
    prev_off: usize,
    /// masks out unused bits of the most significant chunk
    top_mask: Chunk,
}

impl Variable<'_> {
    #[inline]
    fn chunks(&self) -> usize {
        self.curr.len()
    }

    /// Copies the current value into the cache. Returns true iff any bit changed.
    #[inline]
    fn update_cache(&self, cache: &mut [Chunk]) -> bool {
        let prev = &mut cache[self.prev_off..self.prev_off + self.chunks()];
        let last = prev.len() - 1;
        let mut changed = false;
        for (ii, (prev, curr)) in prev.iter_mut().zip(self.curr.iter()).enumerate() {
            let value = if ii == last {
                curr.get() & self.top_mask
            } else {
                curr.get()
            };
            if *prev != value {
                *prev = value;
                changed = true;
            }
        }
        changed
    }
}

fn top_mask(width: u32) -> Chunk {
    match width % CHUNK_BITS {
        0 => Chunk::MAX,
        bits => (1 << bits) - 1,
    }
}

/// Item that passed all checks and is ready to be declared.
struct Declaration<'a> {
    components: Vec<String>,
    item: DebugItem<'a>,
    /// number of variables this item expands into
    elements: usize,
}

/// Makes sure that `count` more variables can get an identity after `declared` ones.
fn check_capacity(declared: usize, count: usize) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    declared
        .checked_add(count - 1)
        .and_then(VarId::from_index)
        .map(|_| ())
        .ok_or(VcdWriteError::TooManyVariables)
}

/// Incrementally encodes simulation values into VCD text.
///
/// The writer borrows the live storage of every declared signal for `'a`. The simulator keeps
/// updating that storage through the `Cell`s in between calls to [`VcdWriter::sample`].
///
/// ```
/// use std::cell::Cell;
/// use wavedump::{DebugItem, TimescaleUnit, Timescale, VcdWriter};
///
/// let clk = [Cell::new(0)];
/// let mut vcd = VcdWriter::new();
/// vcd.timescale(Timescale::new(1, TimescaleUnit::NanoSeconds)).unwrap();
/// vcd.add("top clk", &DebugItem::value(&clk, 1)).unwrap();
/// vcd.sample(0).unwrap();
/// clk[0].set(1);
/// vcd.sample(1).unwrap();
/// assert!(vcd.buffer().ends_with("#1\n1!\n"));
/// ```
#[derive(Debug)]
pub struct VcdWriter<'a> {
    options: WriterOptions,
    phase: Phase,
    scopes: ScopeStack,
    variables: Vec<Variable<'a>>,
    cache: Vec<Chunk>,
    buffer: String,
}

impl Default for VcdWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> VcdWriter<'a> {
    pub fn new() -> Self {
        Self::with_options(WriterOptions::default())
    }

    pub fn with_options(options: WriterOptions) -> Self {
        Self {
            options,
            phase: Phase::Definition,
            scopes: ScopeStack::default(),
            variables: Vec::new(),
            cache: Vec::new(),
            buffer: String::new(),
        }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_streaming(&self) -> bool {
        self.phase == Phase::Sampling
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// Identities of all declared variables in declaration order.
    pub fn var_ids(&self) -> impl Iterator<Item = VarId> + '_ {
        self.variables.iter().map(|v| v.id)
    }

    /// Everything that was emitted so far and has not been taken out yet.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Moves the accumulated text out of the writer, leaving an empty buffer behind.
    /// Use this to periodically flush the trace into a file.
    pub fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    pub fn timescale(&mut self, timescale: Timescale) -> Result<()> {
        self.require_definition("declare a timescale")?;
        timescale.check()?;
        self.buffer.push_str("$timescale ");
        self.buffer.push_str(&timescale.to_string());
        self.buffer.push_str(" $end\n");
        Ok(())
    }

    /// Same as [`VcdWriter::timescale`], but with the unit spelled out as in the VCD file,
    /// e.g., `"ns"`.
    pub fn timescale_str(&mut self, factor: u32, unit: &str) -> Result<()> {
        let unit: TimescaleUnit = unit.parse()?;
        self.timescale(Timescale::new(factor, unit))
    }

    /// Declares a single item. Memories are expanded into one variable per element.
    /// Returns the identities of all declared variables.
    pub fn add(&mut self, hier_name: &str, item: &DebugItem<'a>) -> Result<Vec<VarId>> {
        let decl = self.check(hier_name, item)?;
        check_capacity(self.variables.len(), decl.elements)?;
        self.declare(&decl)
    }

    /// Declares all items of the table.
    pub fn add_items(&mut self, items: &DebugItems<'a>) -> Result<()> {
        self.add_items_filtered(items, all_items)
    }

    /// Declares all values and wires, skipping memories.
    pub fn add_without_memories(&mut self, items: &DebugItems<'a>) -> Result<()> {
        self.add_items_filtered(items, without_memories)
    }

    /// Declares all items of the table that are accepted by `filter`.
    pub fn add_items_filtered(
        &mut self,
        items: &DebugItems<'a>,
        filter: impl Fn(&str, &DebugItem<'a>) -> bool,
    ) -> Result<()> {
        self.add_iter(
            items
                .iter()
                .filter(|(name, item)| filter(*name, *item))
                .map(|(name, item)| (name, *item)),
        )
    }

    /// Declares items in the order in which they are enumerated. Unless
    /// [`WriterOptions::sort_by_hierarchy`] is set, all items of a scope need to be enumerated
    /// contiguously. Either all items are declared or, if any of them is invalid, none is.
    pub fn add_iter<N: AsRef<str>>(
        &mut self,
        items: impl IntoIterator<Item = (N, DebugItem<'a>)>,
    ) -> Result<()> {
        let mut accepted = items
            .into_iter()
            .map(|(name, item)| self.check(name.as_ref(), &item))
            .collect::<Result<Vec<_>>>()?;
        check_capacity(
            self.variables.len(),
            accepted.iter().map(|decl| decl.elements).sum(),
        )?;

        if self.options.sort_by_hierarchy
            && !accepted
                .windows(2)
                .all(|w| w[0].components <= w[1].components)
        {
            log::debug!(
                "reordering {} items to visit every scope contiguously",
                accepted.len()
            );
            accepted.sort_by(|a, b| a.components.cmp(&b.components));
        }

        for decl in accepted.iter() {
            self.declare(decl)?;
        }
        Ok(())
    }

    /// Records all values at `timestamp`. The first call ends the definition phase and dumps
    /// every variable, later calls only emit variables that changed since the last call.
    pub fn sample(&mut self, timestamp: u64) -> Result<()> {
        let first_sample = self.phase == Phase::Definition;
        if first_sample {
            self.scopes.close_all(&mut self.buffer);
            self.emit_enddefinitions()?;
        }
        self.emit_time(timestamp)?;
        let mut changes = 0usize;
        for index in 0..self.variables.len() {
            let changed = self.variables[index].update_cache(&mut self.cache);
            if changed || first_sample {
                if self.variables[index].width == 1 {
                    self.emit_scalar(index)?;
                } else {
                    self.emit_vector(index)?;
                }
                changes += 1;
            }
        }
        log::trace!("#{timestamp}: {changes} of {} changed", self.variables.len());
        Ok(())
    }

    fn require_definition(&self, action: &'static str) -> Result<()> {
        match self.phase {
            Phase::Definition => Ok(()),
            Phase::Sampling => Err(VcdWriteError::DefinitionsSealed(action)),
        }
    }

    fn require_streaming(&self, action: &'static str) -> Result<()> {
        match self.phase {
            Phase::Sampling => Ok(()),
            Phase::Definition => Err(VcdWriteError::DefinitionsOpen(action)),
        }
    }

    /// Validates an item without changing any state.
    fn check(&self, hier_name: &str, item: &DebugItem<'a>) -> Result<Declaration<'a>> {
        self.require_definition("declare a variable")?;
        let components: Vec<String> = split_hierarchy(hier_name, self.options.separator)
            .into_iter()
            .map(String::from)
            .collect();
        if components.is_empty() {
            return Err(VcdWriteError::EmptyName(hier_name.to_string()));
        }
        if item.width == 0 {
            return Err(VcdWriteError::ZeroWidth(hier_name.to_string()));
        }
        let elements = match item.kind {
            DebugItemKind::Memory if item.depth == 0 => {
                return Err(VcdWriteError::ZeroDepth(hier_name.to_string()));
            }
            DebugItemKind::Memory => item.depth as usize,
            DebugItemKind::Value | DebugItemKind::Wire => 1,
        };
        let expected = item.stride() * elements;
        if item.curr.len() < expected {
            return Err(VcdWriteError::StorageTooSmall {
                name: hier_name.to_string(),
                expected,
                actual: item.curr.len(),
            });
        }
        Ok(Declaration {
            components,
            item: *item,
            elements,
        })
    }

    fn declare(&mut self, decl: &Declaration<'a>) -> Result<Vec<VarId>> {
        let (name, scope) = decl
            .components
            .split_last()
            .ok_or_else(|| VcdWriteError::EmptyName(String::new()))?;
        self.scopes.transition(scope, &mut self.buffer);

        let item = &decl.item;
        let element = |index: u32| {
            item.element(index)
                .ok_or_else(|| VcdWriteError::StorageTooSmall {
                    name: decl.components.join(" "),
                    expected: item.stride() * (index as usize + 1),
                    actual: item.curr.len(),
                })
        };
        match item.kind {
            DebugItemKind::Value => {
                let id = self.append_variable(item.width, element(0)?)?;
                self.emit_var(id, item.width, VarType::Wire, name)?;
                Ok(vec![id])
            }
            DebugItemKind::Wire => {
                let id = self.append_variable(item.width, element(0)?)?;
                self.emit_var(id, item.width, VarType::Reg, name)?;
                Ok(vec![id])
            }
            DebugItemKind::Memory => {
                log::debug!("expanding memory `{name}` into {} variables", item.depth);
                let mut ids = Vec::with_capacity(item.depth as usize);
                for index in 0..item.depth {
                    let nth_name = format!("{name}[{index}]");
                    let id = self.append_variable(item.width, element(index)?)?;
                    self.emit_var(id, item.width, VarType::Reg, &nth_name)?;
                    ids.push(id);
                }
                Ok(ids)
            }
        }
    }

    fn append_variable(&mut self, width: u32, curr: &'a [Cell<Chunk>]) -> Result<VarId> {
        debug_assert_eq!(curr.len(), chunks_for(width));
        let id = VarId::from_index(self.variables.len())
            .ok_or(VcdWriteError::TooManyVariables)?;
        let prev_off = self.cache.len();
        self.cache.extend(curr.iter().map(Cell::get));
        self.variables.push(Variable {
            id,
            width,
            curr,
            prev_off,
            top_mask: top_mask(width),
        });
        Ok(id)
    }

    fn emit_var(&mut self, id: VarId, width: u32, tpe: VarType, name: &str) -> Result<()> {
        self.require_definition("declare a variable")?;
        self.buffer.push_str("$var ");
        self.buffer.push_str(tpe.as_str());
        self.buffer.push(' ');
        self.buffer.push_str(&width.to_string());
        self.buffer.push(' ');
        write_id(&mut self.buffer, id.index());
        self.buffer.push(' ');
        self.buffer.push_str(name);
        self.buffer.push_str(" $end\n");
        Ok(())
    }

    fn emit_enddefinitions(&mut self) -> Result<()> {
        self.require_definition("end the definitions")?;
        self.buffer.push_str("$enddefinitions $end\n");
        self.phase = Phase::Sampling;
        log::debug!(
            "sealed VCD header with {} variables in {} cached chunks",
            self.variables.len(),
            self.cache.len()
        );
        Ok(())
    }

    fn emit_time(&mut self, timestamp: u64) -> Result<()> {
        self.require_streaming("emit a timestamp")?;
        self.buffer.push('#');
        self.buffer.push_str(&timestamp.to_string());
        self.buffer.push('\n');
        Ok(())
    }

    fn emit_scalar(&mut self, index: usize) -> Result<()> {
        self.require_streaming("emit a value change")?;
        let var = &self.variables[index];
        if var.width != 1 {
            return Err(VcdWriteError::NotScalar(var.width));
        }
        let bit = self.cache[var.prev_off] & 1;
        self.buffer.push(if bit == 1 { '1' } else { '0' });
        write_id(&mut self.buffer, var.id.index());
        self.buffer.push('\n');
        Ok(())
    }

    fn emit_vector(&mut self, index: usize) -> Result<()> {
        self.require_streaming("emit a value change")?;
        let var = &self.variables[index];
        let prev = &self.cache[var.prev_off..var.prev_off + var.chunks()];
        self.buffer.reserve(var.width as usize + 8);
        self.buffer.push('b');
        for bit in (0..var.width).rev() {
            let chunk = prev[(bit / CHUNK_BITS) as usize];
            let value = (chunk >> (bit % CHUNK_BITS)) & 1;
            self.buffer.push(if value == 1 { '1' } else { '0' });
        }
        self.buffer.push(' ');
        write_id(&mut self.buffer, var.id.index());
        self.buffer.push('\n');
        Ok(())
    }
}
