//! The abstract interface catalog.
//!
//! Interfaces name what a fabric primitive *does* (`LUT{n}`, `MUX{n}`,
//! `carry{w}`) independently of how any particular architecture implements
//! it. Identifiers are structural: two identifiers are the same interface
//! exactly when their kind and parameter maps are equal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tessera_ir::PortDirection;

/// The kind of an abstract interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterfaceKind {
    /// A lookup table.
    Lut,
    /// A multiplexer.
    Mux,
    /// A carry chain tile.
    Carry,
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceKind::Lut => write!(f, "LUT"),
            InterfaceKind::Mux => write!(f, "MUX"),
            InterfaceKind::Carry => write!(f, "carry"),
        }
    }
}

/// A structural interface identifier: a kind plus a parameter map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceId {
    /// The interface kind.
    pub kind: InterfaceKind,
    /// Named integer parameters (`num_inputs`, `width`).
    pub params: BTreeMap<String, u64>,
}

impl InterfaceId {
    /// The identifier of a `k`-input lookup table.
    pub fn lut(k: u64) -> Self {
        Self {
            kind: InterfaceKind::Lut,
            params: BTreeMap::from([("num_inputs".to_string(), k)]),
        }
    }

    /// The identifier of an `n`-way multiplexer.
    pub fn mux(n: u64) -> Self {
        Self {
            kind: InterfaceKind::Mux,
            params: BTreeMap::from([("num_inputs".to_string(), n)]),
        }
    }

    /// The identifier of a `w`-wide carry chain tile.
    pub fn carry(w: u64) -> Self {
        Self {
            kind: InterfaceKind::Carry,
            params: BTreeMap::from([("width".to_string(), w)]),
        }
    }

    /// Looks up a named parameter.
    pub fn param(&self, name: &str) -> Option<u64> {
        self.params.get(name).copied()
    }

    /// For a LUT identifier, the number of inputs.
    pub fn lut_inputs(&self) -> Option<u64> {
        (self.kind == InterfaceKind::Lut)
            .then(|| self.param("num_inputs"))
            .flatten()
    }

    /// For a carry identifier, the tile width.
    pub fn carry_width(&self) -> Option<u64> {
        (self.kind == InterfaceKind::Carry)
            .then(|| self.param("width"))
            .flatten()
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.param("num_inputs"), self.param("width")) {
            (InterfaceKind::Lut, Some(n), _) => write!(f, "LUT{n}"),
            (InterfaceKind::Mux, Some(n), _) => write!(f, "MUX{n}"),
            (InterfaceKind::Carry, _, Some(w)) => write!(f, "carry{w}"),
            _ => {
                write!(f, "{}", self.kind)?;
                for (k, v) in &self.params {
                    write!(f, " {k}={v}")?;
                }
                Ok(())
            }
        }
    }
}

/// A port in an interface definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDef {
    /// The port name.
    pub name: String,
    /// The port width in bits.
    pub width: u32,
    /// The port direction.
    pub direction: PortDirection,
}

impl PortDef {
    fn input(name: &str, width: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            direction: PortDirection::Input,
        }
    }

    fn output(name: &str, width: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            direction: PortDirection::Output,
        }
    }
}

/// An interface definition: an identifier plus its port signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDef {
    /// The structural identifier.
    pub id: InterfaceId,
    /// The ordered port signature.
    pub ports: Vec<PortDef>,
}

impl InterfaceDef {
    /// The definition of a `k`-input LUT: inputs `I0..I{k-1}`, output `O`.
    pub fn lut(k: u64) -> Self {
        let mut ports: Vec<PortDef> = (0..k).map(|i| PortDef::input(&format!("I{i}"), 1)).collect();
        ports.push(PortDef::output("O", 1));
        Self {
            id: InterfaceId::lut(k),
            ports,
        }
    }

    /// The definition of a 2-way multiplexer: inputs `I0`, `I1`, selector
    /// `S`, output `O`.
    pub fn mux2() -> Self {
        Self {
            id: InterfaceId::mux(2),
            ports: vec![
                PortDef::input("I0", 1),
                PortDef::input("I1", 1),
                PortDef::input("S", 1),
                PortDef::output("O", 1),
            ],
        }
    }

    /// The definition of a `w`-wide carry tile: carry-in `CI`, data `DI`,
    /// sum-select `S`, carry-out `CO`, per-lane output `O`.
    pub fn carry(w: u64) -> Self {
        Self {
            id: InterfaceId::carry(w),
            ports: vec![
                PortDef::input("CI", 1),
                PortDef::input("DI", w as u32),
                PortDef::input("S", w as u32),
                PortDef::output("CO", 1),
                PortDef::output("O", w as u32),
            ],
        }
    }

    /// Derives the definition for any identifier in the catalog's families.
    pub fn for_id(id: &InterfaceId) -> Option<Self> {
        match id.kind {
            InterfaceKind::Lut => id.lut_inputs().map(Self::lut),
            InterfaceKind::Mux => (id.param("num_inputs") == Some(2)).then(Self::mux2),
            InterfaceKind::Carry => id.carry_width().map(Self::carry),
        }
    }

    /// Looks up a port by name.
    pub fn port(&self, name: &str) -> Option<&PortDef> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Iterates over the input ports in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &PortDef> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input)
    }

    /// Iterates over the output ports in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = &PortDef> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Output)
    }
}

/// The canonical fixed catalog: LUT2, LUT4, LUT6, MUX2, carry2, carry8.
///
/// Definitions for other parameter values (LUT3, carry5, ...) are derived
/// on demand by [`InterfaceDef::for_id`]; the catalog lists the signatures
/// fabrics commonly implement directly.
pub fn builtin_interfaces() -> Vec<InterfaceDef> {
    vec![
        InterfaceDef::lut(2),
        InterfaceDef::lut(4),
        InterfaceDef::lut(6),
        InterfaceDef::mux2(),
        InterfaceDef::carry(2),
        InterfaceDef::carry(8),
    ]
}
