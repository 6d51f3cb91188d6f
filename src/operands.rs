//! # Operand Sources
//!
//! Every coprocessor operation takes up to two operand values. This module
//! defines where, in an R-type instruction word, each operand value comes from.

/// Register field an operand value is read from.
///
/// # Examples
///
/// - `ca_load rs1`: operand 1 is `Rs1`, operand 2 is `None`
/// - `ca_life steps_reg`: the step count sits in the rs2 field, so operand 1 is
///   `Rs2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandSource {
    /// Operand unused; the dispatcher receives 0.
    None,

    /// Value of the register named by the rs1 field.
    Rs1,

    /// Value of the register named by the rs2 field.
    Rs2,
}
