//! WASM API for the CA coprocessor.
//!
//! Provides JavaScript-callable interfaces for instruction execution, state
//! inspection, save states and disassembly. 64-bit values cross the boundary as
//! `BigInt`.

use crate::{
    disassemble, Coprocessor, CoprocessorConfig, Execution, FlatMemory, MemoryBus, Operation,
    Registers, SaveState,
};
use wasm_bindgen::prelude::*;

/// Bytes of DMA-visible memory behind each instance.
const MEMORY_SIZE: usize = 0x1_0000;

/// JavaScript-compatible error wrapper
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsError {
    message: String,
}

#[wasm_bindgen]
impl JsError {
    #[wasm_bindgen(constructor)]
    pub fn new(message: &str) -> JsError {
        JsError {
            message: message.to_string(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

/// Result of one executed operation
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    mnemonic: Option<String>,
    value: Option<u64>,
    status: String,
    status_code: u8,
}

impl From<Execution> for ExecutionResult {
    fn from(exec: Execution) -> Self {
        ExecutionResult {
            mnemonic: exec.operation.map(|op| op.mnemonic().to_string()),
            value: exec.value,
            status: exec.status.to_string(),
            status_code: exec.status.code(),
        }
    }
}

#[wasm_bindgen]
impl ExecutionResult {
    #[wasm_bindgen(getter)]
    pub fn mnemonic(&self) -> Option<String> {
        self.mnemonic.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn value(&self) -> Option<u64> {
        self.value
    }

    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        self.status.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn status_code(&self) -> u8 {
        self.status_code
    }

    #[wasm_bindgen(getter)]
    pub fn ok(&self) -> bool {
        self.status_code == 0
    }
}

/// Main coprocessor interface for JavaScript
#[wasm_bindgen]
pub struct CaCoprocessor {
    cop: Coprocessor<FlatMemory>,
    regs: Registers,
}

#[wasm_bindgen]
impl CaCoprocessor {
    /// Create a coprocessor with default scratchpad and history sizes
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        CaCoprocessor {
            cop: Coprocessor::new(FlatMemory::new(MEMORY_SIZE)),
            regs: Registers::new(),
        }
    }

    /// Create a coprocessor with explicit scratchpad and history sizes
    pub fn with_sizes(scratchpad_slots: u32, history_depth: u32) -> Result<CaCoprocessor, JsError> {
        let config = CoprocessorConfig::new(scratchpad_slots as usize, history_depth as usize);
        let cop = Coprocessor::with_config(FlatMemory::new(MEMORY_SIZE), config)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(CaCoprocessor {
            cop,
            regs: Registers::new(),
        })
    }

    /// Execute an operation by mnemonic (e.g. "ca_step")
    pub fn execute(
        &mut self,
        mnemonic: &str,
        operand1: u64,
        operand2: u64,
    ) -> Result<ExecutionResult, JsError> {
        let operation = Operation::from_mnemonic(mnemonic)
            .ok_or_else(|| JsError::new(&format!("unknown mnemonic: {}", mnemonic)))?;
        Ok(self.cop.execute(operation, operand1, operand2).into())
    }

    /// Execute a raw (funct3, funct7) selector
    pub fn execute_selector(
        &mut self,
        funct3: u8,
        funct7: u8,
        operand1: u64,
        operand2: u64,
    ) -> ExecutionResult {
        self.cop
            .execute_selector(funct3, funct7, operand1, operand2)
            .into()
    }

    /// Execute a 32-bit instruction word against the internal register file
    pub fn execute_word(&mut self, word: u32) -> ExecutionResult {
        self.cop.execute_word(word, &mut self.regs).into()
    }

    /// Reset the coprocessor state; memory and registers are kept
    pub fn reset(&mut self) {
        self.cop.reset();
    }

    // State getters
    #[wasm_bindgen(getter)]
    pub fn car(&self) -> u64 {
        self.cop.state().car()
    }

    #[wasm_bindgen(getter)]
    pub fn rule(&self) -> u8 {
        self.cop.state().rule()
    }

    #[wasm_bindgen(getter)]
    pub fn history_len(&self) -> u32 {
        self.cop.state().history().len() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn last_status(&self) -> String {
        self.cop.last_status().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn instructions_executed(&self) -> f64 {
        self.cop.instructions_executed() as f64 // Convert u64 to f64 for JavaScript
    }

    /// CAR as 64 cells, cell 0 first (for rendering a row)
    pub fn cells(&self) -> Vec<u8> {
        let car = self.cop.state().car();
        (0..64).map(|i| ((car >> i) & 1) as u8).collect()
    }

    /// Read a scratchpad slot
    pub fn scratchpad_slot(&self, index: u32) -> Option<u64> {
        self.cop.state().scratchpad().get(index as usize).copied()
    }

    // Register file access

    pub fn read_register(&self, index: u8) -> u64 {
        crate::RegisterFile::read(&self.regs, index)
    }

    pub fn write_register(&mut self, index: u8, value: u64) {
        crate::RegisterFile::write(&mut self.regs, index, value);
    }

    // Memory access methods

    /// Read a single byte from DMA memory
    pub fn read_memory(&self, addr: u32) -> u8 {
        let addr = addr as u64;
        if addr < self.cop.memory().size() {
            self.cop.memory().read(addr)
        } else {
            0
        }
    }

    /// Copy bytes into DMA memory
    pub fn load_memory(&mut self, bytes: &[u8], start_addr: u32) -> Result<(), JsError> {
        self.cop
            .memory_mut()
            .try_load_bytes(start_addr as usize, bytes)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    // Save states

    /// Serialize the coprocessor state
    pub fn save_state(&self) -> Vec<u8> {
        SaveState::capture(self.cop.state()).serialize()
    }

    /// Restore a state produced by `save_state`
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), JsError> {
        SaveState::deserialize(bytes)
            .and_then(|state| state.restore(self.cop.state_mut()))
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Disassemble instruction words, one string per word
    pub fn disassemble(&self, words: &[u32]) -> Vec<JsValue> {
        disassemble(words)
            .into_iter()
            .map(|line| JsValue::from_str(&line))
            .collect()
    }
}

impl Default for CaCoprocessor {
    fn default() -> Self {
        Self::new()
    }
}
