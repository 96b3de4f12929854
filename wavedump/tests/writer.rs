// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::utils::*;
use wavedump::*;

mod utils;

#[test]
fn test_counter_trace() {
    let clk = signal(1, 0);
    let cnt = signal(8, 0);
    let mut vcd = VcdWriter::new();
    vcd.timescale(Timescale::new(1, TimescaleUnit::NanoSeconds))
        .unwrap();
    vcd.add("top tb clk", &DebugItem::value(&clk, 1)).unwrap();
    vcd.add("top tb cnt", &DebugItem::wire(&cnt, 8)).unwrap();
    vcd.sample(0).unwrap();
    set(&cnt, 1);
    vcd.sample(1).unwrap();

    let expected = "$timescale 1 ns $end
$scope module top $end
$scope module tb $end
$var wire 1 ! clk $end
$var reg 8 \" cnt $end
$upscope $end
$upscope $end
$enddefinitions $end
#0
0!
b00000000 \"
#1
b00000001 \"
";
    assert_eq!(vcd.buffer(), expected);
}

#[test]
fn test_baseline_dump_contains_every_variable() {
    let values: Vec<_> = (0..10).map(|ii| signal(1 + ii * 7, 0)).collect();
    let mut vcd = VcdWriter::new();
    for (ii, value) in values.iter().enumerate() {
        let name = format!("top s{ii}");
        vcd.add(&name, &DebugItem::value(value, 1 + ii as u32 * 7))
            .unwrap();
    }
    vcd.sample(0).unwrap();
    let lines = body_lines(vcd.buffer());
    assert_eq!(lines[0], "#0");
    assert_eq!(lines.len(), 1 + values.len());

    // nothing changes, thus only the timestamp is emitted
    vcd.sample(1).unwrap();
    let lines = body_lines(vcd.buffer());
    assert_eq!(lines.len(), 2 + values.len());
    assert_eq!(*lines.last().unwrap(), "#1");
}

#[test]
fn test_single_bit_change_is_detected() {
    let wide = signal(64, 0);
    let mut vcd = VcdWriter::new();
    vcd.add("wide", &DebugItem::value(&wide, 64)).unwrap();
    vcd.sample(0).unwrap();
    for bit in [0u64, 31, 32, 63] {
        set(&wide, 1 << bit);
        let before = vcd.buffer().len();
        vcd.sample(bit + 1).unwrap();
        let new_lines: Vec<_> = vcd.buffer()[before..].lines().collect();
        assert_eq!(new_lines.len(), 2, "bit {bit}");
        let expected_bits = format!("{:064b}", 1u64 << bit);
        assert_eq!(new_lines[1], format!("b{expected_bits} !"));
    }
    // same value again
    vcd.sample(100).unwrap();
    assert!(vcd.buffer().ends_with("#100\n"));
}

#[test]
fn test_emission_follows_declaration_order() {
    let a = signal(1, 0);
    let b = signal(1, 0);
    let mut vcd = VcdWriter::new();
    vcd.add("a", &DebugItem::value(&a, 1)).unwrap();
    vcd.add("b", &DebugItem::value(&b, 1)).unwrap();
    vcd.sample(0).unwrap();
    set(&b, 1);
    set(&a, 1);
    vcd.sample(1).unwrap();
    assert!(vcd.buffer().ends_with("#1\n1!\n1\"\n"));
}

#[test]
fn test_memory_expansion() {
    let mem = memory(8, 3);
    let mut vcd = VcdWriter::new();
    let ids = vcd.add("top m", &DebugItem::memory(&mem, 8, 3)).unwrap();
    assert_eq!(ids.iter().map(|id| id.index()).collect::<Vec<_>>(), [0, 1, 2]);
    vcd.sample(0).unwrap();
    assert_eq!(
        vcd.buffer(),
        "$scope module top $end
$var reg 8 ! m[0] $end
$var reg 8 \" m[1] $end
$var reg 8 # m[2] $end
$upscope $end
$enddefinitions $end
#0
b00000000 !
b00000000 \"
b00000000 #
"
    );

    // elements are tracked independently
    mem[1].set(0xa5);
    vcd.sample(1).unwrap();
    assert!(vcd.buffer().ends_with("#1\nb10100101 \"\n"));
}

#[test]
fn test_wide_memory_elements_use_their_own_chunks() {
    let mem = memory(40, 2);
    let mut vcd = VcdWriter::new();
    vcd.add("m", &DebugItem::memory(&mem, 40, 2)).unwrap();
    vcd.sample(0).unwrap();
    // first chunk of the second element
    mem[2].set(1);
    vcd.sample(1).unwrap();
    let expected = format!("#1\nb{}1 \"\n", "0".repeat(39));
    assert!(vcd.buffer().ends_with(&expected), "{}", vcd.buffer());
}

#[test]
fn test_identities_are_dense() {
    let value = signal(1, 0);
    let mem = memory(1, 200);
    let mut vcd = VcdWriter::new();
    vcd.add("a", &DebugItem::value(&value, 1)).unwrap();
    vcd.add("m", &DebugItem::memory(&mem, 1, 200)).unwrap();
    vcd.add("z", &DebugItem::wire(&value, 1)).unwrap();
    let ids: Vec<_> = vcd.var_ids().map(|id| id.index()).collect();
    assert_eq!(ids, (0..202).collect::<Vec<_>>());
    // identity 94 is the first one that needs two characters
    assert!(vcd.buffer().contains("$var reg 1 !\" m[93] $end\n"));
    assert_eq!(ident::decode("!\""), Some(94));
}

#[test]
fn test_batch_declaration() {
    let clk = signal(1, 0);
    let pc = signal(16, 0x1234);
    let mem = memory(8, 2);
    let mut items = DebugItems::new();
    items.add("top cpu pc", DebugItem::wire(&pc, 16));
    items.add("top clk", DebugItem::value(&clk, 1));
    items.add("top cpu rf", DebugItem::memory(&mem, 8, 2));
    items.add("top alu out", DebugItem::value(&pc, 16));

    let mut with = VcdWriter::new();
    with.add_items(&items).unwrap();
    assert_eq!(
        with.buffer(),
        "$scope module top $end
$scope module alu $end
$var wire 16 ! out $end
$upscope $end
$var wire 1 \" clk $end
$scope module cpu $end
$var reg 16 # pc $end
$var reg 8 $ rf[0] $end
$var reg 8 % rf[1] $end
"
    );

    let mut without = VcdWriter::new();
    without.add_without_memories(&items).unwrap();
    assert_eq!(without.num_vars(), 3);
    assert!(!without.buffer().contains("rf["));

    let mut only_cpu = VcdWriter::new();
    only_cpu
        .add_items_filtered(&items, |name, _| name.starts_with("top cpu "))
        .unwrap();
    assert_eq!(only_cpu.num_vars(), 3);
}

#[test]
fn test_repeated_separators_keep_scopes_contiguous() {
    let value = signal(1, 0);
    let mut items = DebugItems::new();
    items.add("top a x", DebugItem::value(&value, 1));
    items.add("top  a y", DebugItem::value(&value, 1));
    items.add("top 0 z", DebugItem::value(&value, 1));
    let names: Vec<_> = items.iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["top 0 z", "top a x", "top a y"]);

    let mut vcd = VcdWriter::new();
    vcd.add_items(&items).unwrap();
    assert_eq!(vcd.buffer().matches("$scope module a $end").count(), 1);
    assert_eq!(vcd.buffer().matches("$upscope $end").count(), 1);
}

#[test]
fn test_items_with_custom_separator() {
    let value = signal(1, 0);
    let mut items = DebugItems::with_separator('.');
    items.add("top.a.x", DebugItem::value(&value, 1));
    items.add("top..a.y", DebugItem::value(&value, 1));
    items.add("top.0.z", DebugItem::value(&value, 1));
    let mut vcd = VcdWriter::with_options(WriterOptions {
        separator: '.',
        ..Default::default()
    });
    vcd.add_items(&items).unwrap();
    assert_eq!(vcd.buffer().matches("$scope module a $end").count(), 1);
    assert!(vcd.buffer().contains("$var wire 1 \" x $end\n$var wire 1 # y $end\n"));
}

#[test]
fn test_invalid_batch_declares_nothing() {
    let clk = signal(1, 0);
    let mut items = DebugItems::new();
    items.add("top a", DebugItem::value(&clk, 1));
    items.add("top b", DebugItem::value(&clk, 64));
    let mut vcd = VcdWriter::new();
    assert!(matches!(
        vcd.add_items(&items),
        Err(VcdWriteError::StorageTooSmall { .. })
    ));
    assert_eq!(vcd.num_vars(), 0);
    assert!(vcd.buffer().is_empty());
}

fn interleaved<'a>(value: &'a [std::cell::Cell<Chunk>]) -> Vec<(&'static str, DebugItem<'a>)> {
    vec![
        ("top a x", DebugItem::value(value, 1)),
        ("top b y", DebugItem::value(value, 1)),
        ("top a z", DebugItem::value(value, 1)),
    ]
}

#[test]
fn test_unordered_declarations_reopen_scopes() {
    // without sorting, the caller is responsible for the order
    let value = signal(1, 0);
    let mut vcd = VcdWriter::new();
    vcd.add_iter(interleaved(&value)).unwrap();
    assert_eq!(vcd.buffer().matches("$scope module a $end").count(), 2);
    assert_eq!(vcd.buffer().matches("$scope module top $end").count(), 1);
}

#[test]
fn test_sort_by_hierarchy() {
    let value = signal(1, 0);
    let options = WriterOptions {
        sort_by_hierarchy: true,
        ..Default::default()
    };
    let mut vcd = VcdWriter::with_options(options.clone());
    vcd.add_iter(interleaved(&value)).unwrap();
    assert_eq!(
        vcd.buffer(),
        "$scope module top $end
$scope module a $end
$var wire 1 ! x $end
$var wire 1 \" z $end
$upscope $end
$scope module b $end
$var wire 1 # y $end
"
    );
    assert_eq!(vcd.options(), &options);
}

#[test]
fn test_custom_separator() {
    let value = signal(1, 0);
    let mut vcd = VcdWriter::with_options(WriterOptions {
        separator: '.',
        ..Default::default()
    });
    vcd.add("top.dut.valid", &DebugItem::value(&value, 1))
        .unwrap();
    vcd.sample(0).unwrap();
    assert!(vcd
        .buffer()
        .starts_with("$scope module top $end\n$scope module dut $end\n$var wire 1 ! valid $end\n"));
}

#[test]
fn test_sample_without_variables() {
    let mut vcd = VcdWriter::new();
    vcd.timescale_str(10, "us").unwrap();
    vcd.sample(0).unwrap();
    vcd.sample(10).unwrap();
    assert_eq!(
        vcd.buffer(),
        "$timescale 10 us $end\n$enddefinitions $end\n#0\n#10\n"
    );
}

#[test]
fn test_take_buffer() {
    let clk = signal(1, 0);
    let mut vcd = VcdWriter::new();
    vcd.add("clk", &DebugItem::value(&clk, 1)).unwrap();
    vcd.sample(0).unwrap();
    let header = vcd.take_buffer();
    assert!(header.ends_with("#0\n0!\n"));
    assert!(vcd.buffer().is_empty());

    set(&clk, 1);
    vcd.sample(1).unwrap();
    assert_eq!(vcd.buffer(), "#1\n1!\n");
    // identities and phase survive a flush
    assert!(vcd.is_streaming());
    assert_eq!(vcd.phase(), Phase::Sampling);
}
