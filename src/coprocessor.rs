//! # Instruction Dispatcher
//!
//! This module contains the `Coprocessor` struct: one `CaState` plus the memory
//! bus its DMA engine talks to, and the dispatch logic that maps each operation
//! onto exactly one state-store call.
//!
//! ## Execution Model
//!
//! The coprocessor executes instructions via:
//! - `execute()`: an operation and its two operand values
//! - `execute_selector()`: a raw `(funct3, funct7)` pair and two operand values
//! - `execute_instruction()` / `execute_word()`: an R-type instruction against a
//!   host register file
//! - `run_program()`: a sequence of instruction words
//!
//! Every execution yields an `Execution`: the optional result value and the
//! status. Status is model telemetry; it is never written to a host register.

use crate::encoding::{decode, Instruction};
use crate::host::RegisterFile;
use crate::operands::OperandSource;
use crate::state::RuleHalf;
use crate::{CaError, CaState, ConfigError, CoprocessorConfig, MemoryBus, Operation, Status};

/// Result value of `ca_find` when no cell matches (-1 as a signed register).
pub const NOT_FOUND: u64 = u64::MAX;

/// Outcome of one dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// The operation that ran, or `None` if the selector was not recognized.
    pub operation: Option<Operation>,

    /// Architectural result destined for rd, if the operation produces one.
    pub value: Option<u64>,

    /// Model-internal outcome code.
    pub status: Status,
}

impl Execution {
    /// Returns `true` if the operation completed without error.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// CA coprocessor: architectural state, DMA bus and dispatcher.
///
/// Generic over the memory implementation via the `MemoryBus` trait. Each
/// instance owns its state, so independent coprocessors never interfere.
///
/// # Type Parameters
///
/// * `M` - Memory bus implementation used by the DMA engine
///
/// # Examples
///
/// ```
/// use carsim::{Coprocessor, FlatMemory, Operation, Status};
///
/// let mut cop = Coprocessor::new(FlatMemory::new(0x100));
///
/// cop.execute(Operation::Load, 0x1, 0);
/// cop.execute(Operation::Set, 30, 0);
/// cop.execute(Operation::Step, 0, 1);
///
/// let exec = cop.execute(Operation::Store, 0, 0);
/// assert_eq!(exec.value, Some(0x8000_0000_0000_0003));
/// assert_eq!(exec.status, Status::Ok);
/// ```
#[derive(Debug, Clone)]
pub struct Coprocessor<M: MemoryBus> {
    state: CaState,
    memory: M,
    last_status: Status,
    executed: u64,
}

impl<M: MemoryBus> Coprocessor<M> {
    /// Creates a coprocessor with the default configuration.
    pub fn new(memory: M) -> Self {
        Self::from_state(CaState::new(), memory)
    }

    /// Creates a coprocessor after validating `config`.
    pub fn with_config(memory: M, config: CoprocessorConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_state(CaState::with_config(config)?, memory))
    }

    /// Wraps an existing state.
    pub fn from_state(state: CaState, memory: M) -> Self {
        Self {
            state,
            memory,
            last_status: Status::Ok,
            executed: 0,
        }
    }

    /// Returns the state to power-on values. Memory is left untouched.
    pub fn reset(&mut self) {
        self.state.reset();
        self.last_status = Status::Ok;
        self.executed = 0;
    }

    // ========== Accessors ==========

    pub fn state(&self) -> &CaState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CaState {
        &mut self.state
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Consumes the coprocessor, returning its state and memory.
    pub fn into_parts(self) -> (CaState, M) {
        (self.state, self.memory)
    }

    /// Status of the most recent operation.
    pub fn last_status(&self) -> Status {
        self.last_status
    }

    /// Number of operations dispatched since creation or reset, failures included.
    pub fn instructions_executed(&self) -> u64 {
        self.executed
    }

    // ========== Dispatch ==========

    /// Runs `operation` with the given operand values.
    ///
    /// Operand meaning per operation:
    ///
    /// | Operation | Operand 1 | Operand 2 | Value |
    /// |---|---|---|---|
    /// | `Load` | source | - | none |
    /// | `Store` | - | - | CAR |
    /// | `Get`, `GetUpper` | - | - | rule |
    /// | `Set`, `SetUpper` | source | - | none |
    /// | `Step` | rule override (ignored) | steps | none |
    /// | `Find` | pattern bit | - | index or [`NOT_FOUND`] |
    /// | `Count` | - | - | population count |
    /// | `Life` | steps | - | none |
    /// | `Undo` | - | - | none |
    /// | `DmaLoad`, `DmaStore` | address | length | none |
    /// | `ScratchpadLoad`, `ScratchpadStore` | index | - | none |
    ///
    /// Step counts are signed: operand bits are read as two's complement.
    pub fn execute(&mut self, operation: Operation, operand1: u64, operand2: u64) -> Execution {
        tracing::trace!(op = %operation, operand1, operand2, "dispatch");

        let outcome = self.dispatch(operation, operand1, operand2);
        let (value, status) = match outcome {
            Ok(value) => (value, Status::Ok),
            Err(err) => {
                tracing::warn!(op = %operation, %err, "coprocessor operation failed");
                (None, Status::from(&err))
            }
        };

        self.finish(Some(operation), value, status)
    }

    /// Resolves a raw selector and runs the matching operation.
    ///
    /// An unknown selector yields `UnsupportedOperation` and changes nothing.
    pub fn execute_selector(
        &mut self,
        funct3: u8,
        funct7: u8,
        operand1: u64,
        operand2: u64,
    ) -> Execution {
        match Operation::from_selector(funct3, funct7) {
            Some(operation) => self.execute(operation, operand1, operand2),
            None => {
                let err = CaError::UnsupportedOperation { funct3, funct7 };
                tracing::warn!(%err, "coprocessor operation failed");
                self.finish(None, None, Status::from(&err))
            }
        }
    }

    /// Executes a decoded instruction against a host register file.
    ///
    /// Operand values are read from the register fields named by the
    /// operation's operand sources. The result, if any, is written to `rd`;
    /// status never is.
    ///
    /// # Examples
    ///
    /// ```
    /// use carsim::{Coprocessor, FlatMemory, Instruction, RegisterFile, Registers};
    ///
    /// let mut cop = Coprocessor::new(FlatMemory::new(0x100));
    /// let mut regs = Registers::new();
    /// regs.write(5, 0xF0);
    ///
    /// cop.execute_instruction(&Instruction::load(5), &mut regs);
    /// cop.execute_instruction(&Instruction::count(6), &mut regs);
    ///
    /// assert_eq!(regs.read(6), 4);
    /// ```
    pub fn execute_instruction<R: RegisterFile + ?Sized>(
        &mut self,
        instruction: &Instruction,
        regs: &mut R,
    ) -> Execution {
        let meta = instruction.operation.metadata();
        let fetch = |source: OperandSource| match source {
            OperandSource::None => 0,
            OperandSource::Rs1 => regs.read(instruction.rs1),
            OperandSource::Rs2 => regs.read(instruction.rs2),
        };
        let operand1 = fetch(meta.operand1);
        let operand2 = fetch(meta.operand2);

        let exec = self.execute(instruction.operation, operand1, operand2);

        if meta.writes_rd {
            if let Some(value) = exec.value {
                regs.write(instruction.rd, value);
            }
        }
        exec
    }

    /// Decodes and executes one 32-bit instruction word.
    ///
    /// Words that do not decode to a coprocessor instruction yield
    /// `UnsupportedOperation`.
    pub fn execute_word<R: RegisterFile + ?Sized>(&mut self, word: u32, regs: &mut R) -> Execution {
        match decode(word) {
            Ok(instruction) => self.execute_instruction(&instruction, regs),
            Err(err) => {
                tracing::warn!(word, %err, "undecodable instruction");
                self.finish(None, None, Status::UnsupportedOperation)
            }
        }
    }

    /// Executes `words` in order, one `Execution` per word.
    ///
    /// Failures do not stop the program; each instruction sees the state left
    /// by the previous one.
    pub fn run_program<R: RegisterFile + ?Sized>(
        &mut self,
        words: &[u32],
        regs: &mut R,
    ) -> Vec<Execution> {
        words
            .iter()
            .map(|&word| self.execute_word(word, regs))
            .collect()
    }

    fn finish(&mut self, operation: Option<Operation>, value: Option<u64>, status: Status) -> Execution {
        self.last_status = status;
        self.executed += 1;
        Execution {
            operation,
            value,
            status,
        }
    }

    fn dispatch(
        &mut self,
        operation: Operation,
        operand1: u64,
        operand2: u64,
    ) -> Result<Option<u64>, CaError> {
        let state = &mut self.state;
        match operation {
            Operation::Load => state.load(operand1).map(|()| None),
            Operation::Store => Ok(Some(state.store())),
            Operation::Get => Ok(Some(state.get(RuleHalf::Low))),
            Operation::GetUpper => Ok(Some(state.get(RuleHalf::Upper))),
            Operation::Set => state.set(operand1, RuleHalf::Low).map(|()| None),
            Operation::SetUpper => state.set(operand1, RuleHalf::Upper).map(|()| None),
            // The rule is register-resident; operand 1 is accepted and ignored.
            Operation::Step => state.step(operand2 as i64).map(|()| None),
            Operation::Find => state
                .find(operand1)
                .map(|hit| Some(hit.map_or(NOT_FOUND, u64::from))),
            Operation::Count => Ok(Some(state.count() as u64)),
            Operation::Life => state.life_step(operand1 as i64).map(|()| None),
            Operation::Undo => state.undo().map(|()| None),
            Operation::DmaLoad => state.dma_load(&self.memory, operand1, operand2).map(|()| None),
            Operation::DmaStore => state
                .dma_store(&mut self.memory, operand1, operand2)
                .map(|()| None),
            Operation::ScratchpadLoad => state.scratchpad_load(operand1).map(|()| None),
            Operation::ScratchpadStore => state.scratchpad_store(operand1).map(|()| None),
        }
    }
}
