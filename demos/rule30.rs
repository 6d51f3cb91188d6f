//! Rule 30 demo
//!
//! Seeds a single live cell, runs rule 30 for 32 generations and prints each
//! row, checking every generation against the reference model.
//! Run with: `cargo run --example rule30`
//!
//! Set `RUST_LOG=carsim=debug` to see CAR updates as they happen.

use carsim::automaton::RULE_30;
use carsim::reference::ca_step_sw;
use carsim::{Coprocessor, FlatMemory, Operation};
use tracing_subscriber::EnvFilter;

const GENERATIONS: u32 = 32;

fn render(car: u64) -> String {
    (0..64)
        .rev()
        .map(|i| if (car >> i) & 1 == 1 { '#' } else { '.' })
        .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Rule 30 on a 64-cell ring ===\n");

    let mut cop = Coprocessor::new(FlatMemory::default());
    let seed = 1u64 << 32;
    cop.execute(Operation::Load, seed, 0);
    cop.execute(Operation::Set, RULE_30 as u64, 0);

    for generation in 0..=GENERATIONS {
        let car = cop.state().car();
        assert_eq!(car, ca_step_sw(seed, RULE_30, generation));
        println!("{:3} {} ({:2} live)", generation, render(car), car.count_ones());

        cop.execute(Operation::Step, 0, 1);
    }

    println!("\n{} operations executed", cop.instructions_executed());
}
