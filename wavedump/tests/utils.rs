// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

// not every test binary uses every helper
#![allow(dead_code)]

use std::cell::Cell;
use wavedump::{chunks_for, Chunk};

/// Simulator-owned storage for a single signal.
pub fn signal(width: u32, value: u64) -> Vec<Cell<Chunk>> {
    let out = vec![Cell::new(0); chunks_for(width)];
    set(&out, value);
    out
}

/// Storage for `depth` elements that are each `width` bits wide, all starting at zero.
pub fn memory(width: u32, depth: u32) -> Vec<Cell<Chunk>> {
    vec![Cell::new(0); chunks_for(width) * depth as usize]
}

/// Writes the low bits of `value` into `storage`.
pub fn set(storage: &[Cell<Chunk>], value: u64) {
    for (ii, chunk) in storage.iter().enumerate().take(2) {
        chunk.set((value >> (32 * ii)) as Chunk);
    }
}

/// Lines of the VCD body, i.e., everything after `$enddefinitions`.
pub fn body_lines(vcd: &str) -> Vec<&str> {
    vcd.lines()
        .skip_while(|line| *line != "$enddefinitions $end")
        .skip(1)
        .collect()
}
