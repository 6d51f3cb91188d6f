//! # CA Coprocessor Model
//!
//! An architectural model of a cellular-automaton coprocessor: one 64-bit CA
//! Register (CAR) stepped under an 8-bit rule table, driven by a custom
//! instruction family on the RISC-V custom-0 opcode.
//!
//! This crate provides the rule engine, the coprocessor's state store
//! (CAR, rule, scratchpad, undo history), a table-driven instruction dispatcher,
//! a `MemoryBus` abstraction for DMA, and a CPU-side reference model every
//! coprocessor result can be checked against.
//!
//! ## Quick Start
//!
//! ```rust
//! use carsim::{Coprocessor, FlatMemory, Operation, Status};
//! use carsim::reference::ca_step_sw;
//!
//! let mut cop = Coprocessor::new(FlatMemory::default());
//!
//! // Seed a single cell, select rule 30 and run ten generations
//! cop.execute(Operation::Load, 0x1, 0);
//! cop.execute(Operation::Set, 30, 0);
//! cop.execute(Operation::Step, 0, 10);
//!
//! let car = cop.execute(Operation::Store, 0, 0).value;
//! assert_eq!(car, Some(ca_step_sw(0x1, 30, 10)));
//!
//! // Roll the ten generations back
//! assert_eq!(cop.execute(Operation::Undo, 0, 0).status, Status::Ok);
//! assert_eq!(cop.state().car(), 0x1);
//! ```
//!
//! ## Architecture
//!
//! - **Pure rule engine**: stepping is a function of `(state, rule)` only
//! - **Explicit state**: every coprocessor is an owned value; there is no global
//!   state, so independent instances can run side by side
//! - **No partial mutation**: operations validate before they write, and every
//!   CAR change is shadowed by the undo history
//! - **Status is telemetry**: outcome codes are visible to the model and tests
//!   but are never written into a host register
//! - **Table-driven decode**: all selector metadata lives in one table
//!
//! ## Modules
//!
//! - `automaton` - Rule engine and rule constants
//! - `reference` - CPU-side golden model
//! - `state` - CAR, rule, scratchpad and undo history
//! - `coprocessor` - Instruction dispatcher
//! - `opcodes` - Operation table
//! - `encoding` - Instruction word encode/decode/disassembly
//! - `memory` - MemoryBus trait and FlatMemory
//! - `host` - Host register file interface
//! - `savestate` - Binary state snapshots
//! - `config` - Scratchpad and history sizing

pub mod automaton;
pub mod config;
pub mod coprocessor;
pub mod encoding;
pub mod history;
pub mod host;
pub mod memory;
pub mod opcodes;
pub mod operands;
pub mod reference;
pub mod savestate;
pub mod state;

// WebAssembly bindings (only compiled with the wasm feature)
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export public API
pub use config::{ConfigError, CoprocessorConfig};
pub use coprocessor::{Coprocessor, Execution, NOT_FOUND};
pub use encoding::{decode, disassemble, encode, DecodeError, Instruction};
pub use history::UndoHistory;
pub use host::{RegisterFile, Registers};
pub use memory::{FlatMemory, MemoryBus};
pub use opcodes::{Operation, OperationMetadata, OPERATION_TABLE};
pub use operands::OperandSource;
pub use savestate::{SaveState, SaveStateError};
pub use state::{CaState, RuleHalf};

#[cfg(feature = "wasm")]
pub use wasm::CaCoprocessor;

/// Errors reported by coprocessor operations.
///
/// None of these is fatal: the failing operation leaves CAR, rule, scratchpad
/// and undo history exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaError {
    /// An operand is outside its domain (negative step count, multi-bit pattern).
    #[error("invalid {operand}: {value}")]
    InvalidArgument { operand: &'static str, value: i64 },

    /// A scratchpad index or DMA window lies outside its bounds.
    #[error("{operand} {value:#x} out of range (limit {limit:#x})")]
    OutOfRange {
        operand: &'static str,
        value: u64,
        limit: u64,
    },

    /// `undo` with nothing to restore.
    #[error("undo history is empty")]
    EmptyHistory,

    /// The `(funct3, funct7)` selector names no operation.
    #[error("unsupported operation: funct3={funct3} funct7={funct7:#04x}")]
    UnsupportedOperation { funct3: u8, funct7: u8 },

    /// The memory bus refused a DMA transfer.
    #[error("memory bus busy")]
    BusBusy,
}

/// Outcome code of a coprocessor operation.
///
/// Status is model-internal telemetry. It is observable through
/// [`Execution::status`] and [`Coprocessor::last_status`] but is never written
/// into a host register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Ok,
    InvalidArgument,
    OutOfRange,
    EmptyHistory,
    UnsupportedOperation,
    BusBusy,
}

impl Status {
    /// Numeric code, as a hardware status line would carry it.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<&CaError> for Status {
    fn from(err: &CaError) -> Self {
        match err {
            CaError::InvalidArgument { .. } => Status::InvalidArgument,
            CaError::OutOfRange { .. } => Status::OutOfRange,
            CaError::EmptyHistory => Status::EmptyHistory,
            CaError::UnsupportedOperation { .. } => Status::UnsupportedOperation,
            CaError::BusBusy => Status::BusBusy,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Status::Ok => "ok",
            Status::InvalidArgument => "invalid argument",
            Status::OutOfRange => "out of range",
            Status::EmptyHistory => "empty history",
            Status::UnsupportedOperation => "unsupported operation",
            Status::BusBusy => "bus busy",
        };
        f.write_str(name)
    }
}
