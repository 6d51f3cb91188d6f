//! State store tests
//!
//! Verifies the undo history, scratchpad bank and DMA engine through the
//! public `CaState` API.

use carsim::automaton::RULE_30;
use carsim::{CaError, CaState, CoprocessorConfig, FlatMemory, MemoryBus, RuleHalf};

fn rule30_state(car: u64) -> CaState {
    let mut state = CaState::new();
    state.set(RULE_30 as u64, RuleHalf::Low).unwrap();
    state.load(car).unwrap();
    state
}

// ========== Undo ==========

#[test]
fn test_step_then_undo_restores_car() {
    let mut state = rule30_state(0xDEAD_BEEF);
    state.step(5).unwrap();
    assert_ne!(state.car(), 0xDEAD_BEEF);

    state.undo().unwrap();
    assert_eq!(state.car(), 0xDEAD_BEEF);
}

#[test]
fn test_undo_walks_back_past_load_to_power_on_car() {
    let mut state = CaState::new();
    state.set(RULE_30 as u64, RuleHalf::Low).unwrap();
    state.load(0xABCD).unwrap();
    state.step(3).unwrap();

    state.undo().unwrap();
    assert_eq!(state.car(), 0xABCD);

    // The load pushed the power-on CAR.
    state.undo().unwrap();
    assert_eq!(state.car(), 0);

    assert_eq!(state.undo(), Err(CaError::EmptyHistory));
    assert_eq!(state.car(), 0);
}

#[test]
fn test_undo_on_fresh_state_is_empty_history() {
    let mut state = CaState::new();
    assert_eq!(state.undo(), Err(CaError::EmptyHistory));
    assert_eq!(state.car(), 0);
}

#[test]
fn test_undo_unwinds_each_mutation_in_turn() {
    let mem = FlatMemory::new(16);
    let mut state = rule30_state(0x1);
    let mut seen = vec![state.car()];

    state.step(1).unwrap();
    seen.push(state.car());
    state.life_step(2).unwrap();
    seen.push(state.car());
    state.dma_load(&mem, 0, 8).unwrap();
    seen.push(state.car());
    state.scratchpad_load(0).unwrap();

    while let Some(expected) = seen.pop() {
        state.undo().unwrap();
        assert_eq!(state.car(), expected);
    }
}

#[test]
fn test_history_keeps_most_recent_entries() {
    let mut state = CaState::new();
    assert_eq!(state.history().capacity(), 8);

    for value in 1..=10u64 {
        state.load(value).unwrap();
    }
    assert_eq!(state.history().len(), 8);

    // Entries 0 and 1 were evicted; undo walks 9 down to 2.
    for expected in (2..=9u64).rev() {
        state.undo().unwrap();
        assert_eq!(state.car(), expected);
    }
    assert_eq!(state.undo(), Err(CaError::EmptyHistory));
    assert_eq!(state.car(), 2);
}

#[test]
fn test_zero_steps_still_records_history() {
    let mut state = rule30_state(0x77);
    let depth = state.history().len();

    state.step(0).unwrap();
    assert_eq!(state.car(), 0x77);
    assert_eq!(state.history().len(), depth + 1);
}

#[test]
fn test_non_mutating_operations_leave_history_alone() {
    let mut mem = FlatMemory::new(16);
    let mut state = rule30_state(0xF0);
    let depth = state.history().len();

    state.store();
    state.get(RuleHalf::Low);
    state.get(RuleHalf::Upper);
    state.set(0x12, RuleHalf::Low).unwrap();
    state.set(0x34, RuleHalf::Upper).unwrap();
    state.find(1).unwrap();
    state.count();
    state.dma_store(&mut mem, 0, 8).unwrap();
    state.scratchpad_store(1).unwrap();

    assert_eq!(state.history().len(), depth);
}

// ========== Scratchpad ==========

#[test]
fn test_scratchpad_round_trip() {
    let mut state = CaState::new();
    state.load(0xCAFE_F00D).unwrap();
    state.scratchpad_store(17).unwrap();
    state.load(0).unwrap();

    state.scratchpad_load(17).unwrap();
    assert_eq!(state.car(), 0xCAFE_F00D);
}

#[test]
fn test_scratchpad_slots_are_independent() {
    let mut state = CaState::new();
    for i in 0..4u64 {
        state.load(i * 0x1111).unwrap();
        state.scratchpad_store(i).unwrap();
    }
    for i in (0..4u64).rev() {
        state.scratchpad_load(i).unwrap();
        assert_eq!(state.car(), i * 0x1111);
    }
}

#[test]
fn test_configured_scratchpad_bounds() {
    let config = CoprocessorConfig::new(2, 4);
    let mut state = CaState::with_config(config).unwrap();

    assert!(state.scratchpad_store(1).is_ok());
    assert!(matches!(
        state.scratchpad_store(2),
        Err(CaError::OutOfRange { limit: 2, .. })
    ));
    assert!(matches!(
        state.scratchpad_load(u64::MAX),
        Err(CaError::OutOfRange { .. })
    ));
}

// ========== DMA ==========

#[test]
fn test_dma_round_trip_every_length() {
    let pattern = 0x8877_6655_4433_2211u64;

    for length in 1..=8u64 {
        let mut mem = FlatMemory::new(64);
        let mut state = CaState::new();
        state.load(pattern).unwrap();
        state.dma_store(&mut mem, 16, length).unwrap();
        state.load(0).unwrap();
        state.dma_load(&mem, 16, length).unwrap();

        let mask = if length == 8 {
            u64::MAX
        } else {
            (1u64 << (8 * length)) - 1
        };
        assert_eq!(state.car(), pattern & mask, "length {}", length);
    }
}

#[test]
fn test_dma_store_then_load_restores_car() {
    let car = 0x8877_6655_4433_2211u64;

    for length in 1..=8u64 {
        let mut mem = FlatMemory::new(64);
        let mut state = CaState::new();
        state.load(car).unwrap();

        state.dma_store(&mut mem, 24, length).unwrap();
        state.dma_load(&mem, 24, length).unwrap();
        assert_eq!(state.car(), car, "length {}", length);

        // The load is still one undoable mutation.
        state.undo().unwrap();
        assert_eq!(state.car(), car);
    }
}

#[test]
fn test_dma_store_is_little_endian() {
    let mut mem = FlatMemory::new(16);
    let mut state = CaState::new();
    state.load(0x0102_0304_0506_0708).unwrap();
    state.dma_store(&mut mem, 8, 8).unwrap();

    assert_eq!(&mem.as_bytes()[8..16], &[8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn test_dma_length_nine_is_out_of_range() {
    let mut mem = FlatMemory::new(64);
    let mut state = CaState::new();
    state.load(0x55).unwrap();
    let before = state.clone();

    assert_eq!(
        state.dma_load(&mem, 0, 9),
        Err(CaError::OutOfRange {
            operand: "dma length",
            value: 9,
            limit: 8
        })
    );
    assert!(state.dma_store(&mut mem, 0, 9).is_err());
    assert_eq!(state, before);
    assert!(mem.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn test_dma_within_aligned_window() {
    let mut mem = FlatMemory::new(16);
    mem.load_bytes(5, &[0xAB, 0xCD, 0xEF]);

    let mut state = CaState::new();
    state.dma_load(&mem, 5, 3).unwrap();
    assert_eq!(state.car(), 0x00EF_CDAB);
}

/// Bus that refuses every transfer.
struct BusyBus(FlatMemory);

impl MemoryBus for BusyBus {
    fn read(&self, addr: u64) -> u8 {
        self.0.read(addr)
    }

    fn write(&mut self, addr: u64, value: u8) {
        self.0.write(addr, value)
    }

    fn size(&self) -> u64 {
        self.0.size()
    }

    fn busy(&self) -> bool {
        true
    }
}

#[test]
fn test_busy_bus_rejects_dma() {
    let mut bus = BusyBus(FlatMemory::new(16));
    let mut state = CaState::new();
    state.load(0x99).unwrap();
    let before = state.clone();

    assert_eq!(state.dma_load(&bus, 0, 8), Err(CaError::BusBusy));
    assert_eq!(state.dma_store(&mut bus, 0, 8), Err(CaError::BusBusy));
    assert_eq!(state, before);
    assert!(bus.0.as_bytes().iter().all(|&b| b == 0));
}

// ========== Count / Find ==========

#[test]
fn test_count_extremes() {
    let mut state = CaState::new();
    assert_eq!(state.count(), 0);
    state.load(u64::MAX).unwrap();
    assert_eq!(state.count(), 64);
}

#[test]
fn test_find_lowest_matching_cell() {
    let mut state = CaState::new();
    assert_eq!(state.find(1), Ok(None));
    assert_eq!(state.find(0), Ok(Some(0)));

    state.load(1 << 63).unwrap();
    assert_eq!(state.find(1), Ok(Some(63)));

    state.load(0b1010_0000).unwrap();
    assert_eq!(state.find(1), Ok(Some(5)));
}
