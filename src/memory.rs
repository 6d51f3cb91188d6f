//! # Memory Bus Abstraction
//!
//! This module provides the `MemoryBus` trait that decouples the coprocessor's
//! DMA engine from a specific external memory. The coprocessor only ever moves
//! whole CAR-sized windows (at most 8 bytes) through the bus.
//!
//! ## Design Principles
//!
//! - Reads and writes inside `0..size()` always succeed
//! - Range checking happens in the DMA engine, before any byte moves, so a
//!   rejected transfer never partially mutates memory or the CAR
//! - A bus may report itself busy; the DMA engine then refuses the transfer

use crate::CaError;

/// Byte-addressable external memory seen by the DMA engine.
///
/// # Design
///
/// - `read(&self)`: Immutable reference allows shared reads
/// - `write(&mut self)`: Mutable reference makes side effects explicit
/// - `size()`: Addresses `0..size()` are mapped; callers never touch others
///
/// # Examples
///
/// ```
/// use carsim::{MemoryBus, FlatMemory};
///
/// let mut mem = FlatMemory::new(0x1000);
///
/// mem.write(0x234, 0x42);
/// assert_eq!(mem.read(0x234), 0x42);
/// assert_eq!(mem.size(), 0x1000);
/// ```
///
/// ## Implementing Custom Memory
///
/// ```
/// use carsim::MemoryBus;
///
/// /// Memory whose upper half is read-only.
/// struct RomRamMemory {
///     ram: [u8; 64],
///     rom: [u8; 64],
/// }
///
/// impl MemoryBus for RomRamMemory {
///     fn read(&self, addr: u64) -> u8 {
///         if addr < 64 {
///             self.ram[addr as usize]
///         } else {
///             self.rom[(addr - 64) as usize]
///         }
///     }
///
///     fn write(&mut self, addr: u64, value: u8) {
///         if addr < 64 {
///             self.ram[addr as usize] = value;
///         }
///     }
///
///     fn size(&self) -> u64 {
///         128
///     }
/// }
/// ```
pub trait MemoryBus {
    /// Reads the byte at `addr`.
    ///
    /// Only called with `addr < self.size()`.
    fn read(&self, addr: u64) -> u8;

    /// Writes `value` to `addr`.
    ///
    /// Only called with `addr < self.size()`. Implementations may ignore writes
    /// to read-only regions.
    fn write(&mut self, addr: u64, value: u8);

    /// Number of mapped bytes, starting at address 0.
    fn size(&self) -> u64;

    /// Returns `true` while the bus cannot accept a transfer.
    ///
    /// Plain memories are never busy. Bus models with outstanding transactions
    /// override this, and the DMA engine reports `BusBusy` instead of
    /// transferring.
    fn busy(&self) -> bool {
        false
    }
}

/// Simple flat RAM of a fixed size.
///
/// All addresses in `0..size` are writable and initialized to zero.
///
/// # Examples
///
/// ```
/// use carsim::{Coprocessor, FlatMemory, Operation, Status};
///
/// let mut memory = FlatMemory::new(0x100);
/// memory.load_bytes(0x10, &[0xEF, 0xBE, 0xAD, 0xDE]);
///
/// let mut cop = Coprocessor::new(memory);
/// let exec = cop.execute(Operation::DmaLoad, 0x10, 4);
///
/// assert_eq!(exec.status, Status::Ok);
/// assert_eq!(cop.state().car(), 0xDEAD_BEEF);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMemory {
    data: Vec<u8>,
}

impl FlatMemory {
    /// Creates a memory of `size` zeroed bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Copies `bytes` into memory starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + bytes.len()` exceeds the memory size.
    pub fn load_bytes(&mut self, offset: usize, bytes: &[u8]) {
        if let Err(err) = self.try_load_bytes(offset, bytes) {
            panic!("load_bytes out of bounds: {}", err);
        }
    }

    /// Copies `bytes` into memory starting at `offset`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the copy would run past the end of memory, including
    /// when `offset + bytes.len()` overflows. Memory is unchanged in that case.
    pub fn try_load_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), CaError> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(CaError::OutOfRange {
                operand: "memory offset",
                value: offset as u64,
                limit: self.data.len() as u64,
            })?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Returns the full contents of memory.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for FlatMemory {
    /// 64 KB of zeroed memory.
    fn default() -> Self {
        Self::new(0x1_0000)
    }
}

impl MemoryBus for FlatMemory {
    fn read(&self, addr: u64) -> u8 {
        self.data[addr as usize]
    }

    fn write(&mut self, addr: u64, value: u8) {
        self.data[addr as usize] = value;
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_memory_read_write() {
        let mut mem = FlatMemory::new(0x100);

        assert_eq!(mem.read(0x00), 0x00);
        assert_eq!(mem.read(0xFF), 0x00);

        mem.write(0x42, 0x99);
        assert_eq!(mem.read(0x42), 0x99);

        // Neighbors untouched
        assert_eq!(mem.read(0x41), 0x00);
        assert_eq!(mem.read(0x43), 0x00);
    }

    #[test]
    fn test_load_bytes() {
        let mut mem = FlatMemory::new(16);
        mem.load_bytes(4, &[1, 2, 3]);
        assert_eq!(&mem.as_bytes()[3..8], &[0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_try_load_bytes_rejects_overflowing_offset() {
        let mut mem = FlatMemory::new(16);
        assert!(matches!(
            mem.try_load_bytes(usize::MAX, &[1, 2]),
            Err(CaError::OutOfRange { operand: "memory offset", limit: 16, .. })
        ));
        assert!(mem.try_load_bytes(15, &[1, 2]).is_err());
        assert!(mem.as_bytes().iter().all(|&b| b == 0));

        assert_eq!(mem.try_load_bytes(14, &[1, 2]), Ok(()));
        assert_eq!(&mem.as_bytes()[14..], &[1, 2]);
    }

    #[test]
    #[should_panic(expected = "load_bytes out of bounds")]
    fn test_load_bytes_panics_past_end() {
        FlatMemory::new(4).load_bytes(usize::MAX, &[0]);
    }

    #[test]
    fn test_default_size_and_not_busy() {
        let mem = FlatMemory::default();
        assert_eq!(mem.size(), 0x1_0000);
        assert!(!mem.busy());
    }
}
