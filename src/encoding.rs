//! # Instruction Word Codec
//!
//! Converts between 32-bit R-type instruction words and [`Instruction`] values.
//!
//! ## Layout
//!
//! ```text
//!  31      25 24  20 19  15 14  12 11   7 6      0
//! +----------+------+------+------+------+--------+
//! |  funct7  | rs2  | rs1  |funct3|  rd  | opcode |
//! +----------+------+------+------+------+--------+
//! ```
//!
//! All coprocessor instructions share the custom-0 opcode `0x0B`. Register
//! fields an operation does not use are canonically zero; in particular `rd` is
//! always `x0` for operations without a result, so `ca_load` can never name an
//! architectural destination.

use crate::host::REGISTER_COUNT;
use crate::operands::OperandSource;
use crate::Operation;
use std::fmt;

/// Major opcode of the coprocessor instruction family (custom-0).
pub const CUSTOM0_OPCODE: u8 = 0x0B;

/// One coprocessor instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub operation: Operation,

    /// Destination register; zero unless the operation writes a result.
    pub rd: u8,

    pub rs1: u8,

    pub rs2: u8,
}

/// Errors produced while decoding or building instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("opcode {0:#04x} is not the coprocessor opcode 0x0b")]
    WrongOpcode(u8),

    #[error("no coprocessor operation for funct3={funct3} funct7={funct7:#04x}")]
    UnknownSelector { funct3: u8, funct7: u8 },

    #[error("register x{0} does not exist")]
    RegisterOutOfRange(u8),
}

impl Instruction {
    /// Builds an instruction, canonicalizing unused register fields to zero.
    ///
    /// # Errors
    ///
    /// `RegisterOutOfRange` if any register index is 32 or more.
    pub fn new(operation: Operation, rd: u8, rs1: u8, rs2: u8) -> Result<Self, DecodeError> {
        for reg in [rd, rs1, rs2] {
            if reg as usize >= REGISTER_COUNT {
                return Err(DecodeError::RegisterOutOfRange(reg));
            }
        }
        Ok(Self::canonical(operation, rd, rs1, rs2))
    }

    fn canonical(operation: Operation, rd: u8, rs1: u8, rs2: u8) -> Self {
        let meta = operation.metadata();
        let uses = |field: OperandSource| meta.operand1 == field || meta.operand2 == field;

        Self {
            operation,
            rd: if meta.writes_rd { rd } else { 0 },
            rs1: if uses(OperandSource::Rs1) { rs1 } else { 0 },
            rs2: if uses(OperandSource::Rs2) { rs2 } else { 0 },
        }
    }

    fn checked(operation: Operation, rd: u8, rs1: u8, rs2: u8) -> Self {
        match Self::new(operation, rd, rs1, rs2) {
            Ok(instruction) => instruction,
            Err(err) => panic!("invalid {} instruction: {}", operation, err),
        }
    }

    // ========== Constructors ==========
    //
    // Each mirrors the operand list of the matching assembler macro. Use
    // `Instruction::new` for register indices that are not known to be valid.

    /// `ca_load rs1`. The destination is always x0.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn load(rs1: u8) -> Self {
        Self::checked(Operation::Load, 0, rs1, 0)
    }

    /// `ca_store rd`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn store(rd: u8) -> Self {
        Self::checked(Operation::Store, rd, 0, 0)
    }

    /// `ca_get rd`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn get(rd: u8) -> Self {
        Self::checked(Operation::Get, rd, 0, 0)
    }

    /// `ca_get_u rd`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn get_upper(rd: u8) -> Self {
        Self::checked(Operation::GetUpper, rd, 0, 0)
    }

    /// `ca_set rs1`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn set(rs1: u8) -> Self {
        Self::checked(Operation::Set, 0, rs1, 0)
    }

    /// `ca_set_u rs1`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn set_upper(rs1: u8) -> Self {
        Self::checked(Operation::SetUpper, 0, rs1, 0)
    }

    /// `ca_step rule_reg, steps_reg`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn step(rule_reg: u8, steps_reg: u8) -> Self {
        Self::checked(Operation::Step, 0, rule_reg, steps_reg)
    }

    /// `ca_find rd, pattern_reg`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn find(rd: u8, pattern_reg: u8) -> Self {
        Self::checked(Operation::Find, rd, pattern_reg, 0)
    }

    /// `ca_count rd`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn count(rd: u8) -> Self {
        Self::checked(Operation::Count, rd, 0, 0)
    }

    /// `ca_life steps_reg`. The step count register sits in the rs2 field.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn life(steps_reg: u8) -> Self {
        Self::checked(Operation::Life, 0, 0, steps_reg)
    }

    /// `ca_undo`.
    pub fn undo() -> Self {
        Self::checked(Operation::Undo, 0, 0, 0)
    }

    /// `ca_dma_load addr_reg, length_reg`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn dma_load(addr_reg: u8, length_reg: u8) -> Self {
        Self::checked(Operation::DmaLoad, 0, addr_reg, length_reg)
    }

    /// `ca_dma_store addr_reg, length_reg`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn dma_store(addr_reg: u8, length_reg: u8) -> Self {
        Self::checked(Operation::DmaStore, 0, addr_reg, length_reg)
    }

    /// `ca_sp_load index_reg`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn sp_load(index_reg: u8) -> Self {
        Self::checked(Operation::ScratchpadLoad, 0, index_reg, 0)
    }

    /// `ca_sp_store index_reg`.
    ///
    /// # Panics
    ///
    /// Panics if a register index is 32 or more.
    pub fn sp_store(index_reg: u8) -> Self {
        Self::checked(Operation::ScratchpadStore, 0, index_reg, 0)
    }

    /// Encodes this instruction as a 32-bit word.
    pub fn encode(&self) -> u32 {
        encode(self)
    }
}

/// Encodes `instruction` as a 32-bit R-type word.
///
/// # Examples
///
/// ```
/// use carsim::{encode, Instruction};
///
/// // .insn r 0x0B, 7, 1, x0, x0, x0
/// assert_eq!(encode(&Instruction::undo()), 0x0200_700B);
/// ```
pub fn encode(instruction: &Instruction) -> u32 {
    let (funct3, funct7) = instruction.operation.selector();
    let canonical = Instruction::canonical(
        instruction.operation,
        instruction.rd & 0x1F,
        instruction.rs1 & 0x1F,
        instruction.rs2 & 0x1F,
    );

    (funct7 as u32) << 25
        | (canonical.rs2 as u32) << 20
        | (canonical.rs1 as u32) << 15
        | (funct3 as u32) << 12
        | (canonical.rd as u32) << 7
        | CUSTOM0_OPCODE as u32
}

/// Decodes a 32-bit word into a coprocessor instruction.
///
/// Unused register fields are dropped, so `encode(decode(w))` is the canonical
/// form of `w`.
///
/// # Examples
///
/// ```
/// use carsim::{decode, Instruction, Operation};
///
/// let word = Instruction::step(5, 6).encode();
/// let instr = decode(word).unwrap();
/// assert_eq!(instr.operation, Operation::Step);
/// assert_eq!((instr.rs1, instr.rs2), (5, 6));
/// ```
pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let opcode = (word & 0x7F) as u8;
    if opcode != CUSTOM0_OPCODE {
        return Err(DecodeError::WrongOpcode(opcode));
    }

    let rd = ((word >> 7) & 0x1F) as u8;
    let funct3 = ((word >> 12) & 0x07) as u8;
    let rs1 = ((word >> 15) & 0x1F) as u8;
    let rs2 = ((word >> 20) & 0x1F) as u8;
    let funct7 = ((word >> 25) & 0x7F) as u8;

    let operation = Operation::from_selector(funct3, funct7)
        .ok_or(DecodeError::UnknownSelector { funct3, funct7 })?;

    Ok(Instruction::canonical(operation, rd, rs1, rs2))
}

/// Disassembles a sequence of words, one line per word.
///
/// Words that are not coprocessor instructions are rendered as `.word`
/// directives.
pub fn disassemble(words: &[u32]) -> Vec<String> {
    words
        .iter()
        .map(|&word| match decode(word) {
            Ok(instruction) => instruction.to_string(),
            Err(_) => format!(".word {:#010x}", word),
        })
        .collect()
}

impl fmt::Display for Instruction {
    /// Assembler syntax, operands in macro order (e.g. `ca_find x10, x11`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.operation.metadata();

        let mut operands = Vec::with_capacity(3);
        if meta.writes_rd {
            operands.push(self.rd);
        }
        for source in [meta.operand1, meta.operand2] {
            match source {
                OperandSource::None => {}
                OperandSource::Rs1 => operands.push(self.rs1),
                OperandSource::Rs2 => operands.push(self.rs2),
            }
        }

        f.write_str(meta.mnemonic)?;
        for (i, reg) in operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}x{}", sep, reg)?;
        }
        Ok(())
    }
}
