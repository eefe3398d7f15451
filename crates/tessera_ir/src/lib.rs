//! Netlist expression IR for the Tessera mapping engine.
//!
//! This crate defines the abstract netlist language shared by the sketch
//! generators, the interface synthesizer, the solver interface, and the
//! interpreter:
//!
//! - **[`Expr`]** provides immutable, cheaply shareable expression trees
//!   with eagerly width-checked constructors.
//! - **[`Session`]** owns the ambient allocator for fresh symbolic values
//!   ("holes"); every hole created during one synthesis session is recorded
//!   here, which is what distinguishes holes from user-declared free
//!   variables in solver queries.
//! - **[`Model`]** is a hole assignment, as returned by a solver, which can
//!   be substituted back into a sketch to complete it.
//! - **[`WireArena`]** holds placeholder wires with explicit unification
//!   for two-step construction of feedback paths.
//! - **[`SpecExpr`]** is the abstract-spec surface: the bit-vector
//!   expression language synthesis targets are written in, kept separate
//!   from the netlist IR.

#![warn(missing_docs)]

pub mod error;
pub mod expr;
pub mod port;
pub mod spec;
pub mod symbolic;
pub mod wire;

pub use error::IrError;
pub use expr::{Expr, ExprKind, ModuleInstance};
pub use port::{Param, Port, PortDirection};
pub use spec::{SpecExpr, SpecKind, SpecOp};
pub use symbolic::{Model, Session, SymbolId, SymbolSort};
pub use wire::{WireArena, WireId};
