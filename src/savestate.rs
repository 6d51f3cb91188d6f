//! Save state serialization for complete coprocessor state capture.
//!
//! This module provides the `SaveState` struct and serialization routines to
//! capture and restore a `CaState`: CAR, rule, scratchpad and undo history.
//! Memory behind the DMA bus is not part of a save state.
//!
//! ## Binary Format
//!
//! All integers little-endian:
//! - 4 bytes: Magic number "CAS1"
//! - 4 bytes: Version (u32)
//! - 8 bytes: CAR
//! - 1 byte: Rule
//! - 4 bytes: Scratchpad slot count, then 8 bytes per slot
//! - 4 bytes: History depth (capacity), 4 bytes: entry count, then 8 bytes per
//!   entry, oldest first
//!
//! ## Usage
//!
//! ```rust
//! use carsim::{CaState, SaveState};
//!
//! let mut state = CaState::new();
//! state.load(0xFEED_FACE).unwrap();
//!
//! let bytes = SaveState::capture(&state).serialize();
//!
//! let mut restored = CaState::new();
//! SaveState::deserialize(&bytes).unwrap().restore(&mut restored).unwrap();
//! assert_eq!(restored, state);
//! ```

use crate::history::UndoHistory;
use crate::CaState;

/// Current save state format version.
pub const SAVESTATE_VERSION: u32 = 1;

/// Magic number for save states ("CAS1" in ASCII).
pub const SAVESTATE_MAGIC: [u8; 4] = [b'C', b'A', b'S', b'1'];

/// Size of the header (magic + version).
const HEADER_SIZE: usize = 4 + 4;

/// Failures while decoding or restoring a save state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveStateError {
    #[error("save state too small")]
    TooSmall,

    #[error("invalid save state magic number")]
    BadMagic,

    #[error("incompatible save state version: expected {expected}, got {found}")]
    Version { expected: u32, found: u32 },

    #[error("save state truncated at {0}")]
    Truncated(&'static str),

    #[error("{0} bytes of trailing data after save state")]
    TrailingData(usize),

    #[error("save state {what} holds {found} entries but the target has room for {capacity}")]
    CapacityMismatch {
        what: &'static str,
        found: usize,
        capacity: usize,
    },
}

/// Snapshot of one coprocessor's architectural state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveState {
    /// Format version for compatibility checking.
    pub version: u32,
    pub car: u64,
    pub rule: u8,
    pub scratchpad: Vec<u64>,
    /// History capacity at capture time.
    pub history_depth: u32,
    /// History entries, oldest first.
    pub history: Vec<u64>,
}

impl SaveState {
    /// Captures `state`.
    pub fn capture(state: &CaState) -> Self {
        Self {
            version: SAVESTATE_VERSION,
            car: state.car,
            rule: state.rule,
            scratchpad: state.scratchpad.clone(),
            history_depth: state.history.capacity() as u32,
            history: state.history.iter().collect(),
        }
    }

    /// Writes this snapshot into `state`.
    ///
    /// The target keeps its own configuration. The snapshot's scratchpad must
    /// match the target's slot count and its history must fit the target's
    /// depth; otherwise `state` is left unchanged.
    pub fn restore(&self, state: &mut CaState) -> Result<(), SaveStateError> {
        if self.version != SAVESTATE_VERSION {
            return Err(SaveStateError::Version {
                expected: SAVESTATE_VERSION,
                found: self.version,
            });
        }
        if self.scratchpad.len() != state.scratchpad.len() {
            return Err(SaveStateError::CapacityMismatch {
                what: "scratchpad",
                found: self.scratchpad.len(),
                capacity: state.scratchpad.len(),
            });
        }
        let depth = state.history.capacity();
        if self.history.len() > depth {
            return Err(SaveStateError::CapacityMismatch {
                what: "history",
                found: self.history.len(),
                capacity: depth,
            });
        }

        let mut history = UndoHistory::new(depth);
        for &entry in &self.history {
            history.push(entry);
        }

        state.car = self.car;
        state.rule = self.rule;
        state.scratchpad.copy_from_slice(&self.scratchpad);
        state.history = history;

        tracing::debug!(car = self.car, rule = self.rule, "save state restored");
        Ok(())
    }

    /// Serializes to the binary format described in the module docs.
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.serialized_size());

        data.extend_from_slice(&SAVESTATE_MAGIC);
        data.extend_from_slice(&self.version.to_le_bytes());

        data.extend_from_slice(&self.car.to_le_bytes());
        data.push(self.rule);

        data.extend_from_slice(&(self.scratchpad.len() as u32).to_le_bytes());
        for slot in &self.scratchpad {
            data.extend_from_slice(&slot.to_le_bytes());
        }

        data.extend_from_slice(&self.history_depth.to_le_bytes());
        data.extend_from_slice(&(self.history.len() as u32).to_le_bytes());
        for entry in &self.history {
            data.extend_from_slice(&entry.to_le_bytes());
        }

        data
    }

    /// Parses the binary format described in the module docs.
    pub fn deserialize(data: &[u8]) -> Result<Self, SaveStateError> {
        if data.len() < HEADER_SIZE {
            return Err(SaveStateError::TooSmall);
        }
        if data[0..4] != SAVESTATE_MAGIC {
            return Err(SaveStateError::BadMagic);
        }

        let mut reader = Reader { data, pos: 4 };

        let version = reader.u32("version")?;
        if version != SAVESTATE_VERSION {
            return Err(SaveStateError::Version {
                expected: SAVESTATE_VERSION,
                found: version,
            });
        }

        let car = reader.u64("CAR")?;
        let rule = reader.u8("rule")?;

        let slots = reader.u32("scratchpad length")? as usize;
        let scratchpad = reader.u64_vec(slots, "scratchpad")?;

        let history_depth = reader.u32("history depth")?;
        let entries = reader.u32("history length")? as usize;
        if entries > history_depth as usize {
            return Err(SaveStateError::CapacityMismatch {
                what: "history",
                found: entries,
                capacity: history_depth as usize,
            });
        }
        let history = reader.u64_vec(entries, "history")?;

        let trailing = data.len() - reader.pos;
        if trailing != 0 {
            return Err(SaveStateError::TrailingData(trailing));
        }

        Ok(Self {
            version,
            car,
            rule,
            scratchpad,
            history_depth,
            history,
        })
    }

    /// Exact size of `serialize()` output.
    pub fn serialized_size(&self) -> usize {
        HEADER_SIZE + 8 + 1 + 4 + 8 * self.scratchpad.len() + 4 + 4 + 8 * self.history.len()
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], SaveStateError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(SaveStateError::Truncated(what))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, SaveStateError> {
        Ok(self.take(1, what)?[0])
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, SaveStateError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4, what)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&mut self, what: &'static str) -> Result<u64, SaveStateError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn u64_vec(&mut self, count: usize, what: &'static str) -> Result<Vec<u64>, SaveStateError> {
        let len = count.checked_mul(8).ok_or(SaveStateError::Truncated(what))?;
        let bytes = self.take(len, what)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                u64::from_le_bytes(buf)
            })
            .collect())
    }
}
