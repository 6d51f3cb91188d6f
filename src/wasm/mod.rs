//! WebAssembly bindings for the CA coprocessor model.
//!
//! This module provides JavaScript-callable interfaces to the coprocessor,
//! enabling browser-based exploration of rules, undo and scratchpad snapshots.

#[cfg(feature = "wasm")]
pub mod api;

#[cfg(feature = "wasm")]
pub use api::CaCoprocessor;
