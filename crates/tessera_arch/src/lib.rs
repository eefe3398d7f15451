//! FPGA interface catalog and architecture descriptions.
//!
//! This crate models target fabrics as plain data consulted by the
//! synthesizer:
//!
//! - **[`InterfaceId`] / [`InterfaceDef`]** form the abstract interface
//!   catalog (`LUT{n}`, `MUX2`, `carry{w}`) with structural identifiers and
//!   derived port signatures.
//! - **[`WireExpr`]** is the miniature wiring DSL used inside interface
//!   implementations: `(bv v w)`, `(bit i e)`, `(concat e ...)`, `name`.
//! - **[`ArchitectureDescription`]** is an ordered list of interface
//!   implementations, each binding one concrete primitive module with an
//!   internal-state schema and an output projection.
//! - **[`load_architecture`]** reads the YAML form, normalizes it into the
//!   immutable description, and validates it.

#![warn(missing_docs)]

pub mod description;
pub mod error;
pub mod interface;
pub mod loader;
pub mod wiring;

pub use description::{
    ArchitectureDescription, InterfaceImpl, ModuleTemplate, TemplateConn, TemplateParam,
    TemplatePort,
};
pub use error::ArchError;
pub use interface::{builtin_interfaces, InterfaceDef, InterfaceId, InterfaceKind, PortDef};
pub use loader::{load_architecture, load_architecture_from_str};
pub use wiring::{parse_wire_expr, WireExpr};
