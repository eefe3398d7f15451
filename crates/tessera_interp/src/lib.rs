//! Interpretation of completed netlist expressions.
//!
//! A completed sketch (holes filled in by a solver model) is just an IR
//! tree over module instances. This crate evaluates such trees:
//!
//! - **[`SemanticsTable`]** maps `(module name, filepath)` to a
//!   [`PrimitiveModel`], the behavioral model of one fabric primitive.
//!   Models expand an instance's outputs into pure IR over its input
//!   expressions; the same expansion serves interpretation and SMT
//!   emission.
//! - **[`interpret`]** evaluates a hole-free expression against an
//!   environment binding free variables to bit-vector values.
//!
//! Built-in models cover the primitives of the shipped architecture
//! descriptions: generic LUTs, the Lattice `CCU2C`, the Xilinx `CARRY8`,
//! and the SOFA `frac_lut4`.

#![warn(missing_docs)]

pub mod error;
pub mod interp;
pub mod semantics;

pub use error::InterpError;
pub use interp::{eval_spec, interpret, Value};
pub use semantics::{
    builtin_semantics, expand_instance, Carry8Model, Ccu2cModel, LutInputs, LutModel,
    PrimitiveModel, SemanticsTable,
};
