//! # Rule Engine
//!
//! Pure stepping functions for the 64-cell circular automaton held in the CAR.
//!
//! ## Cell Layout
//!
//! Bit `i` of the state is cell `i`. The cells form a ring: the left neighbor of
//! cell 0 is cell 63 and the right neighbor of cell 63 is cell 0.
//!
//! ## Rule Tables
//!
//! A rule is an 8-bit lookup table indexed by the neighborhood code
//! `(left << 2) | (center << 1) | right`. Bit `idx` of the rule is the next value
//! of the center cell. Every cell is computed from the same input state
//! (synchronous update).
//!
//! The engine evaluates all 64 cells at once: rotating the state by one position
//! lines every cell up with its left or right neighbor, and each of the eight
//! neighborhood codes becomes a mask built from the three aligned words.

use crate::CaError;

/// Number of cells in the automaton ring (the CAR width in bits).
pub const CELL_COUNT: u32 = 64;

/// Rule 30, the canonical chaotic rule used as the golden regression vector.
pub const RULE_30: u8 = 0b0001_1110;

/// Rule 110, the Turing-complete rule exercised by long-run tests.
pub const RULE_110: u8 = 0b0110_1110;

/// Reserved rule table for Life stepping.
///
/// Conway's thresholds folded onto a one-dimensional three-cell neighborhood:
///
/// | left center right | next |
/// |---|---|
/// | `0 1 1`, `1 1 0` | 1 (survives with one live neighbor) |
/// | `1 0 1` | 1 (born with two live neighbors) |
/// | everything else | 0 |
///
/// Life mode steps through [`step_n`] with this table; it owns no stepping
/// logic of its own.
pub const LIFE_RULE: u8 = 0b0110_1000;

/// Computes one synchronous step of the automaton.
///
/// # Examples
///
/// ```
/// use carsim::automaton::{step, RULE_30};
///
/// // A single live cell at bit 0 spreads to both ring neighbors under rule 30.
/// assert_eq!(step(0x1, RULE_30), 0x8000_0000_0000_0003);
/// ```
pub fn step(state: u64, rule: u8) -> u64 {
    // Bit i of `left` holds cell i-1, bit i of `right` holds cell i+1.
    let left = state.rotate_left(1);
    let right = state.rotate_right(1);

    let mut next = 0u64;
    for idx in 0..8u8 {
        if (rule >> idx) & 1 == 0 {
            continue;
        }

        let l = if idx & 0b100 != 0 { left } else { !left };
        let c = if idx & 0b010 != 0 { state } else { !state };
        let r = if idx & 0b001 != 0 { right } else { !right };
        next |= l & c & r;
    }

    next
}

/// Applies [`step`] exactly `steps` times.
///
/// `steps == 0` returns `state` unchanged. A negative step count is a domain
/// error and is reported as [`CaError::InvalidArgument`] rather than clamped.
///
/// Stepping stops early once the state reaches a fixed point, so rules such as
/// 0x00 and 0xFF finish immediately for any count. Counts are otherwise not
/// capped.
///
/// # Examples
///
/// ```
/// use carsim::automaton::{step_n, RULE_30};
/// use carsim::CaError;
///
/// assert_eq!(step_n(0xDEAD_BEEF, RULE_30, 0), Ok(0xDEAD_BEEF));
/// assert!(matches!(step_n(1, RULE_30, -1), Err(CaError::InvalidArgument { .. })));
/// ```
pub fn step_n(state: u64, rule: u8, steps: i64) -> Result<u64, CaError> {
    if steps < 0 {
        return Err(CaError::InvalidArgument {
            operand: "steps",
            value: steps,
        });
    }

    let mut current = state;
    for _ in 0..steps {
        let next = step(current, rule);
        if next == current {
            // Fixed point: every further step is the identity.
            break;
        }
        current = next;
    }
    Ok(current)
}

/// Steps the automaton `steps` times under [`LIFE_RULE`].
pub fn life_step_n(state: u64, steps: i64) -> Result<u64, CaError> {
    step_n(state, LIFE_RULE, steps)
}

/// Returns the value of a single cell, wrapping the index around the ring.
#[inline]
pub fn cell(state: u64, index: u32) -> bool {
    (state >> (index % CELL_COUNT)) & 1 != 0
}

/// Returns the 3-bit neighborhood code of `index`.
pub fn neighborhood(state: u64, index: u32) -> u8 {
    let index = index % CELL_COUNT;
    let l = cell(state, index + CELL_COUNT - 1) as u8;
    let c = cell(state, index) as u8;
    let r = cell(state, index + 1) as u8;
    (l << 2) | (c << 1) | r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_zero_clears_everything() {
        for state in [0u64, 1, u64::MAX, 0x1234_5678_9ABC_DEF0] {
            assert_eq!(step(state, 0x00), 0);
        }
    }

    #[test]
    fn test_rule_ff_sets_everything() {
        for state in [0u64, 1, u64::MAX, 0x1234_5678_9ABC_DEF0] {
            assert_eq!(step(state, 0xFF), u64::MAX);
        }
    }

    #[test]
    fn test_identity_rule_copies_center() {
        // 0b1100_1100 selects every neighborhood whose center bit is set.
        let state = 0xA5A5_0F0F_3C3C_FFFF;
        assert_eq!(step(state, 0b1100_1100), state);
    }

    #[test]
    fn test_neighborhood_wraps() {
        let state = 1u64 << 63;
        assert_eq!(neighborhood(state, 0), 0b100);
        assert_eq!(neighborhood(state, 63), 0b010);
        assert_eq!(neighborhood(state, 62), 0b001);
    }

    #[test]
    fn test_life_rule_table() {
        assert_eq!(LIFE_RULE, 104);
        // An isolated cell dies; a pair survives; a gap of one is filled.
        assert_eq!(step(0b0001_0000, LIFE_RULE), 0);
        assert_eq!(step(0b0001_1000, LIFE_RULE), 0b0001_1000);
        assert_eq!(step(0b0001_0100, LIFE_RULE), 0b0000_1000);
    }

    #[test]
    fn test_step_n_stops_at_fixed_point() {
        assert_eq!(step_n(0xDEAD_BEEF, 0x00, i64::MAX), Ok(0));
        assert_eq!(step_n(0xDEAD_BEEF, 0xFF, i64::MAX), Ok(u64::MAX));
        assert_eq!(step_n(0xDEAD_BEEF, 0b1100_1100, i64::MAX), Ok(0xDEAD_BEEF));
    }

    #[test]
    fn test_step_n_rejects_negative() {
        assert_eq!(
            step_n(5, RULE_30, -3),
            Err(CaError::InvalidArgument {
                operand: "steps",
                value: -3
            })
        );
    }
}
