//! # Coprocessor State Store
//!
//! This module contains `CaState`, the architectural state of the coprocessor and
//! the primitive operations every instruction is built from.
//!
//! ## State
//!
//! - **CAR**: the 64-bit automaton state
//! - **Rule**: the 8-bit rule table used by `step`
//! - **Scratchpad**: a fixed bank of 64-bit CAR snapshots
//! - **Undo history**: a bounded ring of prior CAR values
//!
//! ## Mutation Policy
//!
//! Every operation that changes the CAR first pushes the old CAR onto the undo
//! history. `undo` is the only operation that pops. Operations validate all of
//! their operands before touching anything, so a failed operation leaves CAR,
//! rule, scratchpad and history exactly as they were.

use crate::automaton::{self, CELL_COUNT};
use crate::config::{ConfigError, CoprocessorConfig};
use crate::history::UndoHistory;
use crate::{CaError, MemoryBus};

/// Width of a DMA window: one CAR worth of bytes.
pub const CAR_BYTES: u64 = 8;

/// Which view of the rule register a get/set addresses.
///
/// The rule is 8 bits wide in this version, so both views read and write the
/// same table. They are kept as separate paths so a wider rule can give the
/// upper view its own storage without changing the instruction interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleHalf {
    /// `ca_get` / `ca_set`.
    Low,
    /// `ca_get_u` / `ca_set_u`.
    Upper,
}

/// Architectural state of one coprocessor instance.
///
/// # Examples
///
/// ```
/// use carsim::{CaState, RuleHalf};
/// use carsim::automaton::RULE_30;
///
/// let mut state = CaState::new();
/// state.load(0x1).unwrap();
/// state.set(RULE_30 as u64, RuleHalf::Low).unwrap();
/// state.step(1).unwrap();
///
/// assert_eq!(state.car(), 0x8000_0000_0000_0003);
/// assert_eq!(state.count(), 3);
///
/// state.undo().unwrap();
/// assert_eq!(state.car(), 0x1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaState {
    /// CA Register
    pub(crate) car: u64,

    /// Active rule table
    pub(crate) rule: u8,

    /// Snapshot bank, fixed length
    pub(crate) scratchpad: Vec<u64>,

    /// Prior CAR values
    pub(crate) history: UndoHistory,

    config: CoprocessorConfig,
}

impl CaState {
    /// Creates a zeroed state with the default configuration.
    pub fn new() -> Self {
        Self::build(CoprocessorConfig::default())
    }

    /// Creates a zeroed state after validating `config`.
    pub fn with_config(config: CoprocessorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CoprocessorConfig) -> Self {
        Self {
            car: 0,
            rule: 0,
            scratchpad: vec![0; config.scratchpad_slots],
            history: UndoHistory::new(config.history_depth),
            config,
        }
    }

    /// Returns CAR, rule, scratchpad and history to their power-on values.
    pub fn reset(&mut self) {
        *self = Self::build(self.config);
    }

    // ========== Accessors ==========

    /// Returns the current CAR value.
    pub fn car(&self) -> u64 {
        self.car
    }

    /// Returns the current rule table.
    pub fn rule(&self) -> u8 {
        self.rule
    }

    pub fn scratchpad(&self) -> &[u64] {
        &self.scratchpad
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn config(&self) -> &CoprocessorConfig {
        &self.config
    }

    /// Pushes the current CAR and installs `next`.
    fn commit(&mut self, next: u64) {
        self.history.push(self.car);
        tracing::debug!(from = self.car, to = next, "CAR updated");
        self.car = next;
    }

    // ========== Register Transfers ==========

    /// Overwrites the CAR with `value`.
    pub fn load(&mut self, value: u64) -> Result<(), CaError> {
        self.commit(value);
        Ok(())
    }

    /// Returns the CAR unchanged.
    pub fn store(&self) -> u64 {
        self.car
    }

    /// Reads the rule through the selected view, zero-extended.
    pub fn get(&self, half: RuleHalf) -> u64 {
        match half {
            RuleHalf::Low => self.rule as u64,
            RuleHalf::Upper => self.rule_upper() as u64,
        }
    }

    /// Writes the low 8 bits of `value` to the rule through the selected view.
    pub fn set(&mut self, value: u64, half: RuleHalf) -> Result<(), CaError> {
        let table = (value & 0xFF) as u8;
        match half {
            RuleHalf::Low => self.rule = table,
            RuleHalf::Upper => self.set_rule_upper(table),
        }
        Ok(())
    }

    // The upper view aliases the 8-bit rule until the rule register widens.
    fn rule_upper(&self) -> u8 {
        self.rule
    }

    fn set_rule_upper(&mut self, table: u8) {
        self.rule = table;
    }

    // ========== Automaton ==========

    /// Steps the CAR `steps` times under the current rule.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `steps` is negative; nothing is pushed in that case.
    pub fn step(&mut self, steps: i64) -> Result<(), CaError> {
        let next = automaton::step_n(self.car, self.rule, steps)?;
        self.commit(next);
        Ok(())
    }

    /// Steps the CAR `steps` times under [`LIFE_RULE`](automaton::LIFE_RULE).
    ///
    /// The rule register is neither read nor written.
    pub fn life_step(&mut self, steps: i64) -> Result<(), CaError> {
        let next = automaton::life_step_n(self.car, steps)?;
        self.commit(next);
        Ok(())
    }

    /// Returns the lowest cell index whose value equals `pattern`.
    ///
    /// `pattern` is a single bit. `Ok(None)` means no cell matched.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `pattern` is neither 0 nor 1.
    pub fn find(&self, pattern: u64) -> Result<Option<u32>, CaError> {
        if pattern > 1 {
            return Err(CaError::InvalidArgument {
                operand: "pattern",
                value: pattern as i64,
            });
        }

        let want = pattern == 1;
        Ok((0..CELL_COUNT).find(|&i| automaton::cell(self.car, i) == want))
    }

    /// Population count of the CAR, in `0..=64`.
    pub fn count(&self) -> u32 {
        self.car.count_ones()
    }

    /// Restores the most recent history entry into the CAR.
    ///
    /// # Errors
    ///
    /// `EmptyHistory` if there is nothing to undo; the CAR is left as is.
    pub fn undo(&mut self) -> Result<(), CaError> {
        let previous = self.history.pop().ok_or(CaError::EmptyHistory)?;
        tracing::debug!(from = self.car, to = previous, "CAR restored from history");
        self.car = previous;
        Ok(())
    }

    // ========== DMA ==========

    /// Copies `length` bytes at `address` into the low bytes of the CAR.
    ///
    /// Byte `k` lands in CAR bits `8k..8k + 8`. CAR bytes at and above `length`
    /// keep their values.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `length` is not in `1..=8`, the window crosses an 8-byte
    ///   boundary, or it extends past the end of the bus
    /// - `BusBusy` if the bus refuses the transfer
    pub fn dma_load<M: MemoryBus + ?Sized>(
        &mut self,
        bus: &M,
        address: u64,
        length: u64,
    ) -> Result<(), CaError> {
        check_dma_window(bus, address, length)?;

        let mut next = self.car;
        for k in 0..length {
            let shift = 8 * k;
            next &= !(0xFFu64 << shift);
            next |= (bus.read(address + k) as u64) << shift;
        }

        self.commit(next);
        Ok(())
    }

    /// Copies the low `length` bytes of the CAR to memory at `address`.
    ///
    /// The CAR is not modified. Errors as for [`dma_load`](Self::dma_load).
    pub fn dma_store<M: MemoryBus + ?Sized>(
        &self,
        bus: &mut M,
        address: u64,
        length: u64,
    ) -> Result<(), CaError> {
        check_dma_window(bus, address, length)?;

        for k in 0..length {
            bus.write(address + k, (self.car >> (8 * k)) as u8);
        }
        Ok(())
    }

    // ========== Scratchpad ==========

    /// Replaces the CAR with scratchpad slot `index`.
    pub fn scratchpad_load(&mut self, index: u64) -> Result<(), CaError> {
        let slot = self.slot(index)?;
        let value = self.scratchpad[slot];
        self.commit(value);
        Ok(())
    }

    /// Copies the CAR into scratchpad slot `index`.
    pub fn scratchpad_store(&mut self, index: u64) -> Result<(), CaError> {
        let slot = self.slot(index)?;
        self.scratchpad[slot] = self.car;
        Ok(())
    }

    fn slot(&self, index: u64) -> Result<usize, CaError> {
        let limit = self.scratchpad.len() as u64;
        if index >= limit {
            return Err(CaError::OutOfRange {
                operand: "scratchpad index",
                value: index,
                limit,
            });
        }
        Ok(index as usize)
    }
}

impl Default for CaState {
    fn default() -> Self {
        Self::new()
    }
}

fn check_dma_window<M: MemoryBus + ?Sized>(bus: &M, address: u64, length: u64) -> Result<(), CaError> {
    if length == 0 || length > CAR_BYTES {
        return Err(CaError::OutOfRange {
            operand: "dma length",
            value: length,
            limit: CAR_BYTES,
        });
    }
    if address % CAR_BYTES + length > CAR_BYTES {
        return Err(CaError::OutOfRange {
            operand: "dma address",
            value: address,
            limit: CAR_BYTES,
        });
    }
    let end = address.checked_add(length);
    if end.map_or(true, |end| end > bus.size()) {
        return Err(CaError::OutOfRange {
            operand: "dma address",
            value: address,
            limit: bus.size(),
        });
    }
    if bus.busy() {
        return Err(CaError::BusBusy);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::RULE_30;
    use crate::FlatMemory;

    #[test]
    fn test_initial_state() {
        let state = CaState::new();
        assert_eq!(state.car(), 0);
        assert_eq!(state.rule(), 0);
        assert_eq!(state.scratchpad().len(), 256);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = CoprocessorConfig::default().with_history_depth(0);
        assert_eq!(CaState::with_config(config), Err(ConfigError::EmptyHistory));
    }

    #[test]
    fn test_load_pushes_history() {
        let mut state = CaState::new();
        state.load(0xAA).unwrap();
        state.load(0xBB).unwrap();
        assert_eq!(state.history().iter().collect::<Vec<_>>(), vec![0x00, 0xAA]);
    }

    #[test]
    fn test_set_truncates_to_rule_width() {
        let mut state = CaState::new();
        state.set(0x1_2345, RuleHalf::Low).unwrap();
        assert_eq!(state.rule(), 0x45);
        assert_eq!(state.get(RuleHalf::Low), 0x45);
        assert_eq!(state.get(RuleHalf::Upper), 0x45);
    }

    #[test]
    fn test_set_does_not_touch_car_or_history() {
        let mut state = CaState::new();
        state.set(RULE_30 as u64, RuleHalf::Upper).unwrap();
        assert_eq!(state.rule(), RULE_30);
        assert_eq!(state.car(), 0);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_negative_step_leaves_state() {
        let mut state = CaState::new();
        state.load(0x55).unwrap();
        let before = state.clone();

        assert!(matches!(state.step(-1), Err(CaError::InvalidArgument { .. })));
        assert!(matches!(state.life_step(-7), Err(CaError::InvalidArgument { .. })));
        assert_eq!(state, before);
    }

    #[test]
    fn test_find_rejects_wide_pattern() {
        let state = CaState::new();
        assert_eq!(
            state.find(2),
            Err(CaError::InvalidArgument {
                operand: "pattern",
                value: 2
            })
        );
    }

    #[test]
    fn test_find_zero_bit() {
        let mut state = CaState::new();
        state.load(0b0111).unwrap();
        assert_eq!(state.find(0), Ok(Some(3)));
        state.load(u64::MAX).unwrap();
        assert_eq!(state.find(0), Ok(None));
    }

    #[test]
    fn test_dma_load_preserves_upper_bytes() {
        let mut mem = FlatMemory::new(64);
        mem.load_bytes(8, &[0x11, 0x22]);

        let mut state = CaState::new();
        state.load(0xFFFF_FFFF_FFFF_FFFF).unwrap();
        state.dma_load(&mem, 8, 2).unwrap();

        assert_eq!(state.car(), 0xFFFF_FFFF_FFFF_2211);
        assert_eq!(state.history().peek(), Some(u64::MAX));
    }

    #[test]
    fn test_dma_rejects_boundary_crossing() {
        let mut mem = FlatMemory::new(64);
        let mut state = CaState::new();

        assert!(matches!(
            state.dma_load(&mem, 6, 4),
            Err(CaError::OutOfRange { operand: "dma address", .. })
        ));
        assert!(matches!(
            state.dma_store(&mut mem, 60, 8),
            Err(CaError::OutOfRange { operand: "dma address", .. })
        ));
        assert!(matches!(
            state.dma_store(&mut mem, 0, 0),
            Err(CaError::OutOfRange { operand: "dma length", .. })
        ));
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_dma_rejects_past_end_of_bus() {
        let mem = FlatMemory::new(12);
        let mut state = CaState::new();
        assert!(matches!(
            state.dma_load(&mem, 8, 8),
            Err(CaError::OutOfRange { limit: 12, .. })
        ));
        assert!(matches!(
            state.dma_load(&mem, u64::MAX - 3, 2),
            Err(CaError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_scratchpad_store_does_not_push() {
        let mut state = CaState::new();
        state.load(0x1234).unwrap();
        let depth = state.history().len();

        state.scratchpad_store(255).unwrap();
        assert_eq!(state.scratchpad()[255], 0x1234);
        assert_eq!(state.history().len(), depth);
    }

    #[test]
    fn test_scratchpad_index_out_of_range() {
        let mut state = CaState::new();
        assert_eq!(
            state.scratchpad_load(256),
            Err(CaError::OutOfRange {
                operand: "scratchpad index",
                value: 256,
                limit: 256
            })
        );
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_reset_keeps_config() {
        let config = CoprocessorConfig::new(4, 2);
        let mut state = CaState::with_config(config).unwrap();
        state.load(9).unwrap();
        state.scratchpad_store(3).unwrap();
        state.reset();

        assert_eq!(state.car(), 0);
        assert_eq!(state.scratchpad(), &[0, 0, 0, 0]);
        assert_eq!(state.history().capacity(), 2);
    }
}
