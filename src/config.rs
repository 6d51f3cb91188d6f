//! Coprocessor configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scratchpad slots in the reference hardware (2 KB of 64-bit entries).
pub const DEFAULT_SCRATCHPAD_SLOTS: usize = 256;

/// Undo levels in the reference hardware.
pub const DEFAULT_HISTORY_DEPTH: usize = 8;

/// Sizes of the coprocessor's fixed-capacity storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoprocessorConfig {
    /// Number of 64-bit scratchpad slots.
    pub scratchpad_slots: usize,

    /// Maximum number of CAR values kept for undo.
    pub history_depth: usize,
}

impl CoprocessorConfig {
    /// Create a configuration with explicit sizes.
    pub fn new(scratchpad_slots: usize, history_depth: usize) -> Self {
        Self {
            scratchpad_slots,
            history_depth,
        }
    }

    /// Replace the scratchpad size.
    pub fn with_scratchpad_slots(mut self, slots: usize) -> Self {
        self.scratchpad_slots = slots;
        self
    }

    /// Replace the undo depth.
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scratchpad_slots == 0 {
            return Err(ConfigError::EmptyScratchpad);
        }
        if self.history_depth == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        Ok(())
    }
}

impl Default for CoprocessorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SCRATCHPAD_SLOTS, DEFAULT_HISTORY_DEPTH)
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("scratchpad must have at least one slot")]
    EmptyScratchpad,

    #[error("undo history depth must be at least one")]
    EmptyHistory,
}
