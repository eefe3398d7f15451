//! Ports and parameters of hardware-module instances.

use crate::error::IrError;
use crate::expr::Expr;
use serde::{Deserialize, Serialize};

/// The direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// The port is driven by the surrounding netlist.
    Input,
    /// The port is driven by the module.
    Output,
}

/// A single port connection of a hardware-module instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// The port name as declared by the module.
    pub name: String,
    /// The expression driving an input port. Output ports carry no value;
    /// their name is what output projections refer to.
    pub value: Option<Expr>,
    /// The port direction.
    pub direction: PortDirection,
    /// The port width in bits.
    pub width: u32,
}

impl Port {
    /// Creates an input port driven by `value`.
    ///
    /// The value's width must equal the declared port width.
    pub fn input(name: impl Into<String>, value: Expr, width: u32) -> Result<Self, IrError> {
        match value.width() {
            Some(w) if w == width => Ok(Self {
                name: name.into(),
                value: Some(value),
                direction: PortDirection::Input,
                width,
            }),
            Some(w) => Err(IrError::WidthMismatch {
                context: "port connection",
                expected: width,
                found: w,
            }),
            None => Err(IrError::WidthlessOperand {
                context: "port connection",
            }),
        }
    }

    /// Creates an output port of the given width.
    pub fn output(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            value: None,
            direction: PortDirection::Output,
            width,
        }
    }
}

/// A compile-time parameter binding of a hardware-module instance.
///
/// The value expression must reduce to a constant by the time the netlist
/// is emitted or interpreted; sketches bind parameters to symbolic holes
/// that a solver model later makes concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// The parameter name as declared by the module.
    pub name: String,
    /// The parameter value expression.
    pub value: Expr,
}

impl Param {
    /// Creates a parameter binding.
    pub fn new(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::Bits;

    #[test]
    fn input_port_width_checked() {
        let v = Expr::constant(Bits::from_u64(1, 4));
        assert!(Port::input("DI", v.clone(), 4).is_ok());
        let err = Port::input("DI", v, 8).unwrap_err();
        assert!(matches!(err, IrError::WidthMismatch { .. }));
    }

    #[test]
    fn output_port_has_no_value() {
        let p = Port::output("Z", 1);
        assert_eq!(p.direction, PortDirection::Output);
        assert!(p.value.is_none());
    }

    #[test]
    fn widthless_input_rejected() {
        let map = Expr::map(vec![]).unwrap();
        let err = Port::input("A", map, 1).unwrap_err();
        assert!(matches!(err, IrError::WidthlessOperand { .. }));
    }
}
