//! Time series capture demo
//!
//! Drives the coprocessor the way a host core would: with encoded custom-0
//! instruction words and a register file. Each generation is stored to a
//! register, snapshotted to the scratchpad and written out over DMA.
//! Run with: `cargo run --example time_series`

use carsim::automaton::RULE_110;
use carsim::{
    disassemble, Coprocessor, FlatMemory, Instruction, MemoryBus, RegisterFile, Registers,
};
use tracing_subscriber::EnvFilter;

const GENERATIONS: u64 = 16;
const DMA_BASE: u64 = 0x1000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Rule 110 time series ===\n");

    let mut cop = Coprocessor::new(FlatMemory::default());
    let mut regs = Registers::new();

    // x5 = seed, x6 = rule, x7 = steps per generation, x9 = DMA length
    regs.write(5, 0x8000_0000_0000_0000);
    regs.write(6, RULE_110 as u64);
    regs.write(7, 1);
    regs.write(9, 8);

    let setup = [Instruction::load(5).encode(), Instruction::set(6).encode()];
    cop.run_program(&setup, &mut regs);

    let body = [
        Instruction::step(6, 7),
        Instruction::store(10),
        Instruction::count(11),
        Instruction::sp_store(12),
        Instruction::dma_store(13, 9),
    ];
    let body: Vec<u32> = body.iter().map(Instruction::encode).collect();

    println!("Loop body:");
    for line in disassemble(&body) {
        println!("    {}", line);
    }
    println!();

    for generation in 0..GENERATIONS {
        regs.write(12, generation); // scratchpad slot
        regs.write(13, DMA_BASE + generation * 8); // DMA address

        for exec in cop.run_program(&body, &mut regs) {
            if !exec.is_ok() {
                eprintln!("generation {}: {}", generation, exec.status);
            }
        }
        println!(
            "{:3} {:#018x} ({:2} live)",
            generation + 1,
            regs.read(10),
            regs.read(11)
        );
    }

    // The DMA copies and the scratchpad bank hold the same series.
    let memory = cop.memory();
    for generation in 0..GENERATIONS {
        let addr = DMA_BASE + generation * 8;
        let from_dma = (0..8).fold(0u64, |acc, k| acc | (memory.read(addr + k) as u64) << (8 * k));
        assert_eq!(from_dma, cop.state().scratchpad()[generation as usize]);
    }

    println!(
        "\n{} generations captured, {} still undoable",
        GENERATIONS,
        cop.state().history().len()
    );
}
