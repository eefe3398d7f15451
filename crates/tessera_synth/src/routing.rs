//! Logical-to-physical routing permutations.
//!
//! The per-bit LUT array of a bitwise sketch is wrapped by two
//! permutations: one mapping logical input bits onto per-LUT physical
//! inputs, one mapping per-LUT outputs back into the logical result. Only
//! two strategies exist: the identity and the bit reversal.

use serde::{Deserialize, Serialize};
use tessera_ir::{Expr, IrError};

/// A permutation between logical bit positions and physical per-LUT
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permutation {
    /// Identity: logical bit `i` maps to physical position `i`.
    Bitwise,
    /// Reversal: logical bit `i` maps to physical position `width-1-i`,
    /// iterating bits MSB-first.
    BitwiseReverse,
}

impl Permutation {
    /// The physical position for logical bit `i` out of `width`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= width`.
    pub fn position(&self, i: u32, width: u32) -> u32 {
        assert!(i < width, "bit {i} out of range for width {width}");
        match self {
            Permutation::Bitwise => i,
            Permutation::BitwiseReverse => width - 1 - i,
        }
    }

    /// Assembles per-position single-bit expressions (`bits[i]` holds
    /// position `i`) into one value, applying this permutation on the way
    /// out.
    pub fn assemble(&self, bits: &[Expr]) -> Result<Expr, IrError> {
        let width = bits.len() as u32;
        let parts: Vec<Expr> = (0..width)
            .rev()
            .map(|i| bits[self.position(i, width) as usize].clone())
            .collect();
        Expr::concat(parts)
    }
}
