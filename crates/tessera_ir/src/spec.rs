//! The abstract-spec surface: bit-vector expressions to synthesize against.
//!
//! Specifications are written in a small bit-vector language separate from
//! the netlist IR: the netlist side deliberately has no arithmetic (adders
//! are what the mapper *produces*), while a spec says `a + b` directly.
//! Solver queries quantify over the spec's free variables and compare it
//! against a sketch of equal width.

use crate::error::IrError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_common::Bits;

/// A binary bit-vector operator. Both operands share the result width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Modular addition.
    Add,
    /// Modular subtraction.
    Sub,
    /// Modular multiplication.
    Mul,
    /// Logical left shift; the right operand is the amount.
    Shl,
    /// Logical right shift.
    Lshr,
    /// Arithmetic right shift.
    Ashr,
}

/// The node of a spec expression. See [`SpecExpr`] for constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpecKind {
    /// A literal bit-vector.
    Const(Bits),
    /// A named free variable.
    Var {
        /// The variable name.
        name: String,
        /// The variable width.
        width: u32,
    },
    /// Bitwise complement.
    Not(SpecExpr),
    /// A binary operation over same-width operands.
    Binary {
        /// The operator.
        op: SpecOp,
        /// Left operand.
        lhs: SpecExpr,
        /// Right operand.
        rhs: SpecExpr,
    },
    /// Equality, producing one bit.
    Eq {
        /// Left operand.
        lhs: SpecExpr,
        /// Right operand.
        rhs: SpecExpr,
    },
    /// A bit-range extract `[hi:lo]`.
    Extract {
        /// High bit of the range.
        hi: u32,
        /// Low bit of the range.
        lo: u32,
        /// The operand.
        expr: SpecExpr,
    },
    /// Concatenation, first part most significant.
    Concat(Vec<SpecExpr>),
    /// Zero extension.
    ZeroExtend {
        /// The operand.
        expr: SpecExpr,
        /// The target width.
        width: u32,
    },
    /// Sign extension.
    SignExtend {
        /// The operand.
        expr: SpecExpr,
        /// The target width.
        width: u32,
    },
}

/// An immutable abstract-spec expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecExpr(Arc<SpecKind>);

impl SpecExpr {
    fn node(kind: SpecKind) -> SpecExpr {
        SpecExpr(Arc::new(kind))
    }

    /// Returns the underlying node.
    pub fn kind(&self) -> &SpecKind {
        &self.0
    }

    /// Creates a literal.
    pub fn constant(value: Bits) -> SpecExpr {
        SpecExpr::node(SpecKind::Const(value))
    }

    /// Creates a literal from a `u64` and a width (truncating).
    pub fn constant_u64(value: u64, width: u32) -> SpecExpr {
        SpecExpr::constant(Bits::from_u64(value, width))
    }

    /// Creates a named free variable.
    pub fn var(name: impl Into<String>, width: u32) -> SpecExpr {
        SpecExpr::node(SpecKind::Var {
            name: name.into(),
            width,
        })
    }

    /// Creates a bitwise complement.
    pub fn not(expr: SpecExpr) -> SpecExpr {
        SpecExpr::node(SpecKind::Not(expr))
    }

    /// Creates a binary operation; operands must agree in width.
    pub fn binary(op: SpecOp, lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        if lhs.width() != rhs.width() {
            return Err(IrError::WidthMismatch {
                context: "spec binary operator",
                expected: lhs.width(),
                found: rhs.width(),
            });
        }
        Ok(SpecExpr::node(SpecKind::Binary { op, lhs, rhs }))
    }

    /// `lhs & rhs`.
    pub fn and(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::And, lhs, rhs)
    }

    /// `lhs | rhs`.
    pub fn or(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Or, lhs, rhs)
    }

    /// `lhs ^ rhs`.
    pub fn xor(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Xor, lhs, rhs)
    }

    /// `lhs + rhs` modulo the width.
    pub fn add(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Add, lhs, rhs)
    }

    /// `lhs - rhs` modulo the width.
    pub fn sub(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Sub, lhs, rhs)
    }

    /// `lhs * rhs` modulo the width.
    pub fn mul(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Mul, lhs, rhs)
    }

    /// `lhs << rhs`.
    pub fn shl(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Shl, lhs, rhs)
    }

    /// `lhs >> rhs`, zero filling.
    pub fn lshr(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Lshr, lhs, rhs)
    }

    /// `lhs >> rhs`, sign filling.
    pub fn ashr(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        SpecExpr::binary(SpecOp::Ashr, lhs, rhs)
    }

    /// `lhs == rhs` as one bit; operands must agree in width.
    pub fn eq(lhs: SpecExpr, rhs: SpecExpr) -> Result<SpecExpr, IrError> {
        if lhs.width() != rhs.width() {
            return Err(IrError::WidthMismatch {
                context: "spec eq",
                expected: lhs.width(),
                found: rhs.width(),
            });
        }
        Ok(SpecExpr::node(SpecKind::Eq { lhs, rhs }))
    }

    /// Extracts the bit range `[hi:lo]`.
    pub fn extract(hi: u32, lo: u32, expr: SpecExpr) -> Result<SpecExpr, IrError> {
        let width = expr.width();
        if hi < lo || hi >= width {
            return Err(IrError::InvalidExtract { hi, lo, width });
        }
        Ok(SpecExpr::node(SpecKind::Extract { hi, lo, expr }))
    }

    /// Concatenates parts, first part most significant.
    pub fn concat(parts: Vec<SpecExpr>) -> Result<SpecExpr, IrError> {
        if parts.is_empty() {
            return Err(IrError::EmptyConcat);
        }
        Ok(SpecExpr::node(SpecKind::Concat(parts)))
    }

    /// Zero-extends to `width` bits.
    pub fn zero_extend(expr: SpecExpr, width: u32) -> Result<SpecExpr, IrError> {
        let from = expr.width();
        if width < from {
            return Err(IrError::NarrowingExtend { from, to: width });
        }
        Ok(SpecExpr::node(SpecKind::ZeroExtend { expr, width }))
    }

    /// Sign-extends to `width` bits.
    pub fn sign_extend(expr: SpecExpr, width: u32) -> Result<SpecExpr, IrError> {
        let from = expr.width();
        if width < from {
            return Err(IrError::NarrowingExtend { from, to: width });
        }
        Ok(SpecExpr::node(SpecKind::SignExtend { expr, width }))
    }

    /// The expression's width. Every spec expression has one.
    pub fn width(&self) -> u32 {
        match self.kind() {
            SpecKind::Const(v) => v.width(),
            SpecKind::Var { width, .. } => *width,
            SpecKind::Not(e) => e.width(),
            SpecKind::Binary { lhs, .. } => lhs.width(),
            SpecKind::Eq { .. } => 1,
            SpecKind::Extract { hi, lo, .. } => hi - lo + 1,
            SpecKind::Concat(parts) => parts.iter().map(SpecExpr::width).sum(),
            SpecKind::ZeroExtend { width, .. } | SpecKind::SignExtend { width, .. } => *width,
        }
    }

    /// Collects the free variables, in first-visit order, deduplicated.
    pub fn free_vars(&self) -> Vec<(String, u32)> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        self.collect_vars(&mut seen, &mut out);
        out
    }

    fn collect_vars(
        &self,
        seen: &mut std::collections::HashSet<String>,
        out: &mut Vec<(String, u32)>,
    ) {
        match self.kind() {
            SpecKind::Const(_) => {}
            SpecKind::Var { name, width } => {
                if seen.insert(name.clone()) {
                    out.push((name.clone(), *width));
                }
            }
            SpecKind::Not(e) => e.collect_vars(seen, out),
            SpecKind::Binary { lhs, rhs, .. } | SpecKind::Eq { lhs, rhs } => {
                lhs.collect_vars(seen, out);
                rhs.collect_vars(seen, out);
            }
            SpecKind::Extract { expr, .. }
            | SpecKind::ZeroExtend { expr, .. }
            | SpecKind::SignExtend { expr, .. } => expr.collect_vars(seen, out),
            SpecKind::Concat(parts) => {
                for p in parts {
                    p.collect_vars(seen, out);
                }
            }
        }
    }
}
