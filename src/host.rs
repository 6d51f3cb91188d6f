//! # Host Register Interface
//!
//! The coprocessor does not model the host pipeline. It only needs to read two
//! source operand values and write at most one destination value per
//! instruction, and `RegisterFile` is that contract.

/// Number of integer registers in the host register file.
pub const REGISTER_COUNT: usize = 32;

/// Host integer register file as seen by the coprocessor.
///
/// # Design
///
/// - `read(&self)`: operand fetch, no side effects
/// - `write(&mut self)`: destination write-back; writes to x0 are discarded
pub trait RegisterFile {
    /// Returns the value of register `index` (0..32).
    fn read(&self, index: u8) -> u64;

    /// Writes `value` to register `index` (0..32).
    fn write(&mut self, index: u8, value: u64);
}

/// Plain 32-entry register file with x0 hardwired to zero.
///
/// # Examples
///
/// ```
/// use carsim::{RegisterFile, Registers};
///
/// let mut regs = Registers::new();
/// regs.write(5, 30);
/// regs.write(0, 99);
///
/// assert_eq!(regs.read(5), 30);
/// assert_eq!(regs.read(0), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    x: [u64; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegisterFile for Registers {
    fn read(&self, index: u8) -> u64 {
        self.x[index as usize % REGISTER_COUNT]
    }

    fn write(&mut self, index: u8, value: u64) {
        let index = index as usize % REGISTER_COUNT;
        if index != 0 {
            self.x[index] = value;
        }
    }
}
