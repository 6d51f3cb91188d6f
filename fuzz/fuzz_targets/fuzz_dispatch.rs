//! Fuzz target for the instruction dispatcher.
//!
//! Runs an arbitrary sequence of selectors and operands against a coprocessor,
//! checking each step against the reference model and that failures never
//! mutate state.

#![no_main]

use arbitrary::Arbitrary;
use carsim::reference::ca_step_sw;
use carsim::{Coprocessor, FlatMemory, Operation, Status};
use libfuzzer_sys::fuzz_target;

/// Step counts above this are clamped to keep each input fast.
const MAX_STEPS: u64 = 256;

/// One dispatched operation
#[derive(Debug, Arbitrary)]
struct FuzzOp {
    funct3: u8,
    funct7: u8,
    operand1: u64,
    operand2: u64,
}

/// Complete fuzz input
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Initial DMA-visible memory
    memory: [u8; 64],
    ops: Vec<FuzzOp>,
}

fuzz_target!(|input: FuzzInput| {
    // Limit program length
    if input.ops.len() > 1024 {
        return;
    }

    let mut memory = FlatMemory::new(64);
    memory.load_bytes(0, &input.memory);
    let mut cop = Coprocessor::new(memory);

    for op in &input.ops {
        let funct3 = op.funct3 & 0x7;
        let funct7 = op.funct7 & 0x7F;
        let (mut a, mut b) = (op.operand1, op.operand2);

        match Operation::from_selector(funct3, funct7) {
            Some(Operation::Step) if (b as i64) >= 0 => b %= MAX_STEPS,
            Some(Operation::Life) if (a as i64) >= 0 => a %= MAX_STEPS,
            _ => {}
        }

        let before = cop.state().clone();
        let exec = cop.execute_selector(funct3, funct7, a, b);

        if exec.status != Status::Ok {
            assert_eq!(cop.state(), &before, "failed op mutated state");
            assert_eq!(exec.value, None);
            continue;
        }

        if let Some(operation) = exec.operation {
            if !operation.mutates_car() {
                assert_eq!(cop.state().car(), before.car(), "{} changed the CAR", operation);
            }
        }
        if exec.operation == Some(Operation::Step) {
            let expected = ca_step_sw(before.car(), before.rule(), b as u32);
            assert_eq!(cop.state().car(), expected, "step diverged from reference");
        }
        assert!(cop.state().history().len() <= cop.state().history().capacity());
    }
});
