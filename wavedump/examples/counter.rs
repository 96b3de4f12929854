// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use clap::Parser;
use std::cell::Cell;
use std::io::Write;
use wavedump::*;

#[derive(Parser, Debug)]
#[command(name = "counter")]
#[command(author = "Kevin Laeufer <laeufer@berkeley.edu>")]
#[command(version)]
#[command(about = "Simulates a small counter and dumps its signals into a VCD file.", long_about = None)]
struct Args {
    #[arg(value_name = "VCDFILE", index = 1)]
    filename: String,
    #[arg(long, default_value_t = 100)]
    cycles: u64,
    #[arg(long, help = "do not trace the contents of the memory")]
    skip_memories: bool,
    #[arg(long, help = "flush the trace to the file every N cycles", default_value_t = 16)]
    flush_every: u64,
}

const DEPTH: u32 = 4;

/// A counter that writes its value into a small memory.
struct Counter {
    clk: Vec<Cell<Chunk>>,
    en: Vec<Cell<Chunk>>,
    count: Vec<Cell<Chunk>>,
    mem: Vec<Cell<Chunk>>,
}

impl Counter {
    fn new() -> Self {
        Self {
            clk: vec![Cell::new(0)],
            en: vec![Cell::new(1)],
            count: vec![Cell::new(0)],
            mem: vec![Cell::new(0); DEPTH as usize],
        }
    }

    fn debug_items(&self) -> DebugItems<'_> {
        let mut items = DebugItems::new();
        items.add("counter clk", DebugItem::value(&self.clk, 1));
        items.add("counter en", DebugItem::value(&self.en, 1));
        items.add("counter count", DebugItem::wire(&self.count, 12));
        items.add("counter mem", DebugItem::memory(&self.mem, 12, DEPTH));
        items
    }

    fn step(&self, cycle: u64) {
        let rising = self.clk[0].get() == 0;
        self.clk[0].set(rising as Chunk);
        if rising && self.en[0].get() == 1 {
            let next = (self.count[0].get() + 1) & 0xfff;
            self.count[0].set(next);
            self.mem[(next % DEPTH) as usize].set(next);
        }
        // pause the counter for a while every 32 cycles
        self.en[0].set(((cycle / 32) % 4 != 3) as Chunk);
    }
}

fn main() {
    let args = Args::parse();
    let mut out = std::fs::File::create(&args.filename).expect("failed to create output file");

    let counter = Counter::new();
    let items = counter.debug_items();
    let mut vcd = VcdWriter::new();
    vcd.timescale(Timescale::new(10, TimescaleUnit::NanoSeconds))
        .expect("valid timescale");
    if args.skip_memories {
        vcd.add_without_memories(&items)
            .expect("failed to declare signals");
    } else {
        vcd.add_items(&items).expect("failed to declare signals");
    }

    for cycle in 0..args.cycles {
        vcd.sample(cycle).expect("failed to sample");
        counter.step(cycle);
        if args.flush_every > 0 && cycle % args.flush_every == 0 {
            out.write_all(vcd.take_buffer().as_bytes())
                .expect("failed to write");
        }
    }
    out.write_all(vcd.take_buffer().as_bytes())
        .expect("failed to write");
    println!(
        "Traced {} variables over {} cycles into {}.",
        vcd.num_vars(),
        args.cycles,
        args.filename
    );
}
