//! Interface synthesis and sketch generation.
//!
//! This crate is the heart of the mapping engine. It turns abstract
//! interface requests and operation families into netlist sketches over a
//! target fabric:
//!
//! - **[`realize`]** is the recursive interface synthesizer. Given an
//!   architecture description and an interface identifier, it instantiates
//!   a direct implementation when one exists and otherwise composes one
//!   from what the fabric offers (smaller LUT from larger, larger LUT from
//!   smaller plus a mux, carry chains retiled or rebuilt from LUTs and
//!   muxes).
//! - The sketch generators [`bitwise`], [`bitwise_with_carry`],
//!   [`comparison`], [`multiply`], and [`shift`] emit parameterized
//!   netlist templates with symbolic holes for truth tables, selectors,
//!   and carry-ins.
//! - **[`InternalData`]** is the opaque token carrying the symbolic values
//!   bound to fabric-programmable state. Threading a token back into a
//!   later call reuses the same symbols, so a solver assigns one truth
//!   table no matter how many times a LUT is instantiated.
//! - **[`Solver`]** is the blocking interface to an external SMT solver,
//!   with [`emit_smtlib`] rendering the equivalence query.

#![warn(missing_docs)]

pub mod bitwise;
pub mod bitwise_carry;
pub mod compare;
pub mod error;
pub mod internal_data;
pub mod multiply;
pub mod realize;
pub mod routing;
pub mod shift;
pub mod sketch;
pub mod solver;

pub use bitwise::bitwise;
pub use bitwise_carry::bitwise_with_carry;
pub use compare::comparison;
pub use error::SynthError;
pub use internal_data::InternalData;
pub use multiply::multiply;
pub use realize::{realize, REALIZE_DEPTH_LIMIT};
pub use routing::Permutation;
pub use shift::shift;
pub use solver::{emit_smtlib, Solver, SolverOutcome, SynthesisQuery};
