//! # Operation Table
//!
//! This module contains the coprocessor's selector space: the 15 operations of
//! the custom-0 instruction family, each identified by a `(funct3, funct7)` pair.
//! The table is the single source of truth for mnemonics, selectors, operand
//! sources and whether an operation produces an architectural result.
//!
//! | Mnemonic | funct3 | funct7 |
//! |---|---|---|
//! | `ca_load` | 0 | 0 |
//! | `ca_dma_load` | 0 | 1 |
//! | `ca_store` | 1 | 0 |
//! | `ca_dma_store` | 1 | 1 |
//! | `ca_get` | 2 | 0 |
//! | `ca_get_u` | 2 | 1 |
//! | `ca_sp_load` | 2 | 4 |
//! | `ca_set` | 3 | 0 |
//! | `ca_set_u` | 3 | 2 |
//! | `ca_sp_store` | 3 | 4 |
//! | `ca_step` | 4 | 0 |
//! | `ca_find` | 5 | 0 |
//! | `ca_count` | 6 | 0 |
//! | `ca_life` | 7 | 0 |
//! | `ca_undo` | 7 | 1 |

use crate::operands::OperandSource;
use crate::operands::OperandSource::{None as NoOperand, Rs1, Rs2};
use std::fmt;

/// One coprocessor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Load,
    DmaLoad,
    Store,
    DmaStore,
    Get,
    GetUpper,
    ScratchpadLoad,
    Set,
    SetUpper,
    ScratchpadStore,
    Step,
    Find,
    Count,
    Life,
    Undo,
}

/// Static description of one operation.
///
/// # Examples
///
/// ```
/// use carsim::{Operation, OperandSource};
///
/// let meta = Operation::Life.metadata();
/// assert_eq!(meta.mnemonic, "ca_life");
/// assert_eq!((meta.funct3, meta.funct7), (7, 0));
/// assert_eq!(meta.operand1, OperandSource::Rs2);
/// assert!(!meta.writes_rd);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationMetadata {
    /// The operation this entry describes.
    pub operation: Operation,

    /// Assembler mnemonic (e.g., "ca_step").
    pub mnemonic: &'static str,

    /// Major function code (instruction bits 14:12).
    pub funct3: u8,

    /// Minor function code (instruction bits 31:25).
    pub funct7: u8,

    /// Where operand 1 comes from.
    pub operand1: OperandSource,

    /// Where operand 2 comes from.
    pub operand2: OperandSource,

    /// Whether the operation writes a value to rd.
    ///
    /// Status is never written to rd; only operations that produce a data value
    /// (store, get, find, count) set this.
    pub writes_rd: bool,
}

const fn entry(
    operation: Operation,
    mnemonic: &'static str,
    funct3: u8,
    funct7: u8,
    operand1: OperandSource,
    operand2: OperandSource,
    writes_rd: bool,
) -> OperationMetadata {
    OperationMetadata {
        operation,
        mnemonic,
        funct3,
        funct7,
        operand1,
        operand2,
        writes_rd,
    }
}

/// Every operation of the instruction family, ordered by selector.
pub const OPERATION_TABLE: [OperationMetadata; 15] = [
    entry(Operation::Load, "ca_load", 0, 0, Rs1, NoOperand, false),
    entry(Operation::DmaLoad, "ca_dma_load", 0, 1, Rs1, Rs2, false),
    entry(Operation::Store, "ca_store", 1, 0, NoOperand, NoOperand, true),
    entry(Operation::DmaStore, "ca_dma_store", 1, 1, Rs1, Rs2, false),
    entry(Operation::Get, "ca_get", 2, 0, NoOperand, NoOperand, true),
    entry(Operation::GetUpper, "ca_get_u", 2, 1, NoOperand, NoOperand, true),
    entry(Operation::ScratchpadLoad, "ca_sp_load", 2, 4, Rs1, NoOperand, false),
    entry(Operation::Set, "ca_set", 3, 0, Rs1, NoOperand, false),
    entry(Operation::SetUpper, "ca_set_u", 3, 2, Rs1, NoOperand, false),
    entry(Operation::ScratchpadStore, "ca_sp_store", 3, 4, Rs1, NoOperand, false),
    entry(Operation::Step, "ca_step", 4, 0, Rs1, Rs2, false),
    entry(Operation::Find, "ca_find", 5, 0, Rs1, NoOperand, true),
    entry(Operation::Count, "ca_count", 6, 0, NoOperand, NoOperand, true),
    entry(Operation::Life, "ca_life", 7, 0, Rs2, NoOperand, false),
    entry(Operation::Undo, "ca_undo", 7, 1, NoOperand, NoOperand, false),
];

impl Operation {
    /// All operations, in table order.
    pub const ALL: [Operation; 15] = [
        Operation::Load,
        Operation::DmaLoad,
        Operation::Store,
        Operation::DmaStore,
        Operation::Get,
        Operation::GetUpper,
        Operation::ScratchpadLoad,
        Operation::Set,
        Operation::SetUpper,
        Operation::ScratchpadStore,
        Operation::Step,
        Operation::Find,
        Operation::Count,
        Operation::Life,
        Operation::Undo,
    ];

    /// Looks up the operation for a selector pair.
    ///
    /// Returns `None` for selectors outside the documented space.
    ///
    /// # Examples
    ///
    /// ```
    /// use carsim::Operation;
    ///
    /// assert_eq!(Operation::from_selector(7, 1), Some(Operation::Undo));
    /// assert_eq!(Operation::from_selector(6, 3), None);
    /// ```
    pub fn from_selector(funct3: u8, funct7: u8) -> Option<Operation> {
        OPERATION_TABLE
            .iter()
            .find(|m| m.funct3 == funct3 && m.funct7 == funct7)
            .map(|m| m.operation)
    }

    /// Looks up an operation by mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Operation> {
        OPERATION_TABLE
            .iter()
            .find(|m| m.mnemonic == mnemonic)
            .map(|m| m.operation)
    }

    /// Returns this operation's table entry.
    pub fn metadata(self) -> &'static OperationMetadata {
        &OPERATION_TABLE[self as usize]
    }

    /// Returns the `(funct3, funct7)` selector.
    pub fn selector(self) -> (u8, u8) {
        let meta = self.metadata();
        (meta.funct3, meta.funct7)
    }

    pub fn mnemonic(self) -> &'static str {
        self.metadata().mnemonic
    }

    /// Returns `true` if the operation may change the CAR.
    pub fn mutates_car(self) -> bool {
        matches!(
            self,
            Operation::Load
                | Operation::DmaLoad
                | Operation::ScratchpadLoad
                | Operation::Step
                | Operation::Life
                | Operation::Undo
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
