//! # Reference Baseline
//!
//! CPU-side golden model of the coprocessor's stepping behavior. It walks the
//! ring one cell at a time with explicit neighbor indices and shares no code
//! with the word-parallel engine in [`automaton`](crate::automaton).

/// Returns `state` after `steps` synchronous steps under `rule`.
///
/// The left neighbor of cell 0 is cell 63 and the right neighbor of cell 63 is
/// cell 0. The step count is non-negative by type.
///
/// # Examples
///
/// ```
/// use carsim::reference::ca_step_sw;
///
/// assert_eq!(ca_step_sw(0x1, 30, 1), 0x8000_0000_0000_0003);
/// assert_eq!(ca_step_sw(0x1, 30, 0), 0x1);
/// ```
pub fn ca_step_sw(state: u64, rule: u8, steps: u32) -> u64 {
    let mut current = state;
    for _ in 0..steps {
        let mut next = 0u64;
        for i in 0..64u32 {
            let l = if i == 0 { 63 } else { i - 1 };
            let r = if i == 63 { 0 } else { i + 1 };

            let left = ((current >> l) & 1) as u8;
            let center = ((current >> i) & 1) as u8;
            let right = ((current >> r) & 1) as u8;

            let idx = (left << 2) | (center << 1) | right;
            let new_bit = ((rule >> idx) & 1) as u64;
            next |= new_bit << i;
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_30_single_cell() {
        assert_eq!(ca_step_sw(1, 30, 1), 0x8000_0000_0000_0003);
    }

    #[test]
    fn test_rule_90_two_steps() {
        // Rule 90 is left XOR right; a lone cell grows into a sparse triangle.
        assert_eq!(ca_step_sw(1 << 10, 90, 1), (1 << 9) | (1 << 11));
        assert_eq!(ca_step_sw(1 << 10, 90, 2), (1 << 8) | (1 << 12));
    }
}
