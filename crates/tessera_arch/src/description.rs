//! The architecture description data model.
//!
//! An architecture description is an ordered list of interface
//! implementations, each binding one concrete primitive module. The
//! synthesizer consults the description as plain data; lookup is by
//! structural identifier equality, first match in declared order.

use crate::error::ArchError;
use crate::interface::{InterfaceDef, InterfaceId, InterfaceKind};
use crate::wiring::WireExpr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessera_ir::PortDirection;

/// The connection of one template port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateConn {
    /// An input port driven by a wiring-DSL expression.
    Wired(WireExpr),
    /// An output port; the name is the verbatim symbol output projections
    /// refer to.
    Named(String),
}

/// One port of a module binding template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePort {
    /// The primitive's port name (e.g. `A`, `CIN`).
    pub name: String,
    /// The port direction.
    pub direction: PortDirection,
    /// The port width in bits.
    pub width: u32,
    /// The connection: a wiring expression for inputs, a symbol name for
    /// outputs.
    pub conn: TemplateConn,
}

/// One parameter of a module binding template.
///
/// Parameter values are wiring-DSL expressions resolved against the
/// internal-state map (typically a bare symbol naming the truth-table
/// state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParam {
    /// The primitive's parameter name (e.g. `INIT`).
    pub name: String,
    /// The wiring expression producing the parameter value.
    pub wiring: WireExpr,
}

/// The single module binding of an interface implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleTemplate {
    /// The primitive module name (e.g. `LUT4`, `CCU2C`).
    pub module_name: String,
    /// Ordered template ports.
    pub ports: Vec<TemplatePort>,
    /// Ordered template parameters.
    pub params: Vec<TemplateParam>,
    /// The source file providing the primitive's definition.
    pub filepath: String,
}

/// One interface implementation: how this fabric realizes an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceImpl {
    /// The interface being implemented.
    pub id: InterfaceId,
    /// The module binding template.
    pub module: ModuleTemplate,
    /// The internal-state schema: fabric-programmable state names and
    /// widths (LUT truth tables and the like). Order is significant; it
    /// fixes the shape of internal-data tokens.
    pub internal_state: IndexMap<String, u32>,
    /// The output projection: interface output name to wiring expression.
    pub outputs: IndexMap<String, WireExpr>,
}

/// An architecture description: the fabric's implemented interfaces in
/// declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureDescription {
    /// The fabric name (e.g. `lattice_ecp5`).
    pub name: String,
    /// The implementations, in file order.
    pub implementations: Vec<InterfaceImpl>,
}

impl ArchitectureDescription {
    /// Finds the first implementation whose identifier structurally equals
    /// `id`.
    pub fn find(&self, id: &InterfaceId) -> Option<&InterfaceImpl> {
        self.implementations.iter().find(|imp| imp.id == *id)
    }

    /// The sizes of all implemented LUTs, in declared order.
    pub fn lut_sizes(&self) -> Vec<u64> {
        self.implementations
            .iter()
            .filter_map(|imp| imp.id.lut_inputs())
            .collect()
    }

    /// The first implemented LUT with strictly more than `k` inputs.
    pub fn first_lut_larger(&self, k: u64) -> Option<u64> {
        self.lut_sizes().into_iter().find(|&n| n > k)
    }

    /// The first implemented LUT with strictly fewer than `k` inputs.
    pub fn first_lut_smaller(&self, k: u64) -> Option<u64> {
        self.lut_sizes().into_iter().find(|&n| n < k)
    }

    /// The first implemented LUT with at least `k` inputs.
    pub fn first_lut_at_least(&self, k: u64) -> Option<u64> {
        self.lut_sizes().into_iter().find(|&n| n >= k)
    }

    /// The width of the first implemented carry tile, if any.
    pub fn first_carry_width(&self) -> Option<u64> {
        self.implementations
            .iter()
            .find_map(|imp| imp.id.carry_width())
    }

    /// Whether the fabric implements a 2-way multiplexer directly.
    pub fn has_mux2(&self) -> bool {
        self.find(&InterfaceId::mux(2)).is_some()
    }

    /// Validates every implementation against its interface definition.
    ///
    /// Checks that input-port wiring widths match the primitive port
    /// declarations and that output projections match the interface's
    /// output widths, resolving symbols against interface inputs, internal
    /// state, and the primitive's named outputs.
    pub fn validate(&self) -> Result<(), ArchError> {
        for imp in &self.implementations {
            imp.validate()?;
        }
        Ok(())
    }
}

impl InterfaceImpl {
    /// The interface definition this implementation must satisfy.
    pub fn interface_def(&self) -> Result<InterfaceDef, ArchError> {
        InterfaceDef::for_id(&self.id).ok_or_else(|| match self.id.kind {
            InterfaceKind::Lut => missing_param(&self.id, "num_inputs"),
            InterfaceKind::Mux => missing_param(&self.id, "num_inputs"),
            InterfaceKind::Carry => missing_param(&self.id, "width"),
        })
    }

    fn validate(&self) -> Result<(), ArchError> {
        let def = self.interface_def()?;

        // Symbols available to input wiring: interface inputs and internal
        // state.
        let input_width = |name: &str| -> Option<u32> {
            if let Some(p) = def.port(name) {
                if p.direction == PortDirection::Input {
                    return Some(p.width);
                }
            }
            self.internal_state.get(name).copied()
        };

        for port in &self.module.ports {
            match (&port.conn, port.direction) {
                (TemplateConn::Wired(wiring), PortDirection::Input) => {
                    let w = wiring.width(&input_width)?;
                    if w != port.width {
                        return Err(ArchError::WidthMismatch {
                            context: format!(
                                "port {} of {} implementing {}",
                                port.name, self.module.module_name, self.id
                            ),
                            expected: port.width,
                            found: w,
                        });
                    }
                }
                (TemplateConn::Named(_), PortDirection::Output) => {}
                _ => {
                    return Err(ArchError::UnknownDirection {
                        port: port.name.clone(),
                        direction: "mismatched connection kind".to_string(),
                    })
                }
            }
        }

        for param in &self.module.params {
            for sym in param.wiring.symbols() {
                if !self.internal_state.contains_key(sym) {
                    return Err(ArchError::UnresolvedSymbol(sym.to_string()));
                }
            }
        }

        // Symbols available to output projections: the primitive's named
        // outputs, interface inputs, and internal state.
        let output_width = |name: &str| -> Option<u32> {
            for port in &self.module.ports {
                if let TemplateConn::Named(out_name) = &port.conn {
                    if out_name == name {
                        return Some(port.width);
                    }
                }
            }
            input_width(name)
        };

        for out in def.outputs() {
            let wiring = self
                .outputs
                .get(&out.name)
                .ok_or_else(|| ArchError::UnresolvedSymbol(out.name.clone()))?;
            let w = wiring.width(&output_width)?;
            if w != out.width {
                return Err(ArchError::WidthMismatch {
                    context: format!("output {} of {}", out.name, self.id),
                    expected: out.width,
                    found: w,
                });
            }
        }
        Ok(())
    }
}

fn missing_param(id: &InterfaceId, param: &str) -> ArchError {
    ArchError::MissingParameter {
        interface: id.to_string(),
        param: param.to_string(),
    }
}
