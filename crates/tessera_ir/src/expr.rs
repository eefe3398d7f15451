//! Immutable, width-checked expression trees.
//!
//! [`Expr`] is a cheaply clonable handle to a shared node. All constructors
//! check widths eagerly and return [`IrError`] on mismatch, so an expression
//! that exists is structurally well-formed. Maps, lists, and module
//! instances are composite values without a scalar width; everything else
//! exposes its inferred width through [`Expr::width`].

use crate::error::IrError;
use crate::port::{Param, Port, PortDirection};
use crate::symbolic::{Model, SymbolId};
use crate::wire::WireId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_common::Bits;

/// A hardware-module instance: one concrete primitive in the netlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInstance {
    /// The module (primitive) name, e.g. `LUT4` or `CCU2C`.
    pub module_name: String,
    /// Ordered port connections.
    pub ports: Vec<Port>,
    /// Ordered parameter bindings.
    pub params: Vec<Param>,
    /// The source file providing the module's definition.
    pub filepath: String,
}

/// The node of an expression tree. See [`Expr`] for constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// A literal bit-vector.
    Const(Bits),
    /// A named free variable of a given width.
    Var {
        /// The variable name.
        name: String,
        /// The variable width.
        width: u32,
    },
    /// A bit-range extract `[hi:lo]`, both bounds inclusive.
    Extract {
        /// High bit of the range.
        hi: u32,
        /// Low bit of the range.
        lo: u32,
        /// The operand.
        expr: Expr,
    },
    /// A concatenation; the first part is the most significant.
    Concat(Vec<Expr>),
    /// Pairwise equality, producing one bit.
    Eq {
        /// Left operand.
        lhs: Expr,
        /// Right operand.
        rhs: Expr,
    },
    /// Bitwise AND of two same-width operands.
    And {
        /// Left operand.
        lhs: Expr,
        /// Right operand.
        rhs: Expr,
    },
    /// Bitwise OR of two same-width operands.
    Or {
        /// Left operand.
        lhs: Expr,
        /// Right operand.
        rhs: Expr,
    },
    /// A two-way multiplexer with a 1-bit selector.
    Mux {
        /// The selector; `1` picks `on_true`.
        sel: Expr,
        /// Value when the selector is 1.
        on_true: Expr,
        /// Value when the selector is 0.
        on_false: Expr,
    },
    /// A register with a reset value.
    Reg {
        /// The reset value; also fixes the register width.
        reset: Bits,
        /// The next-state input.
        d: Expr,
    },
    /// Zero extension to a wider width.
    ZeroExtend {
        /// The operand.
        expr: Expr,
        /// The target width.
        width: u32,
    },
    /// Extension to a wider width by replicating the most significant bit.
    DupExtend {
        /// The operand.
        expr: Expr,
        /// The target width.
        width: u32,
    },
    /// A hash-map literal from names to expressions (interface output
    /// bundles).
    Map(Vec<(String, Expr)>),
    /// A lookup into a map literal.
    MapGet {
        /// The map literal.
        map: Expr,
        /// The key to project.
        key: String,
    },
    /// A list literal.
    List(Vec<Expr>),
    /// A constant index into a list literal.
    ListGet {
        /// The list literal.
        list: Expr,
        /// The element index.
        index: usize,
    },
    /// A hardware-module instance.
    Instance(ModuleInstance),
    /// Projection of a named output port of a module instance.
    GetOutput {
        /// The instance expression.
        instance: Expr,
        /// The output port name.
        port: String,
        /// The port's declared width.
        width: u32,
    },
    /// A hole: a reference to a symbolic value allocated by a session.
    Symbol {
        /// The symbol id.
        id: SymbolId,
        /// The symbol's IR width (1 for booleans).
        width: u32,
    },
    /// A placeholder wire awaiting unification.
    Wire {
        /// The wire id within its arena.
        id: WireId,
        /// The declared wire width.
        width: u32,
    },
}

/// An immutable, shareable expression.
///
/// Cloning is cheap (an `Arc` bump); equality is structural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr(Arc<ExprKind>);

impl Expr {
    fn node(kind: ExprKind) -> Expr {
        Expr(Arc::new(kind))
    }

    /// Returns the underlying node.
    pub fn kind(&self) -> &ExprKind {
        &self.0
    }

    /// Creates a literal bit-vector expression.
    pub fn constant(value: Bits) -> Expr {
        Expr::node(ExprKind::Const(value))
    }

    /// Creates a literal from a `u64` and a width (truncating).
    pub fn constant_u64(value: u64, width: u32) -> Expr {
        Expr::constant(Bits::from_u64(value, width))
    }

    /// Creates a named free variable of the given width.
    pub fn var(name: impl Into<String>, width: u32) -> Expr {
        Expr::node(ExprKind::Var {
            name: name.into(),
            width,
        })
    }

    /// Creates a bit-range extract `[hi:lo]`.
    pub fn extract(hi: u32, lo: u32, expr: Expr) -> Result<Expr, IrError> {
        let width = expr.scalar_width("extract")?;
        if hi < lo || hi >= width {
            return Err(IrError::InvalidExtract { hi, lo, width });
        }
        Ok(Expr::node(ExprKind::Extract { hi, lo, expr }))
    }

    /// Extracts the single bit at `index`.
    pub fn bit(index: u32, expr: Expr) -> Result<Expr, IrError> {
        Expr::extract(index, index, expr)
    }

    /// Concatenates parts, first part most significant.
    pub fn concat(parts: Vec<Expr>) -> Result<Expr, IrError> {
        if parts.is_empty() {
            return Err(IrError::EmptyConcat);
        }
        for p in &parts {
            p.scalar_width("concat")?;
        }
        Ok(Expr::node(ExprKind::Concat(parts)))
    }

    /// Creates a 1-bit equality comparison.
    pub fn eq(lhs: Expr, rhs: Expr) -> Result<Expr, IrError> {
        Self::check_same_width("eq", &lhs, &rhs)?;
        Ok(Expr::node(ExprKind::Eq { lhs, rhs }))
    }

    /// Creates a bitwise AND.
    pub fn and(lhs: Expr, rhs: Expr) -> Result<Expr, IrError> {
        Self::check_same_width("and", &lhs, &rhs)?;
        Ok(Expr::node(ExprKind::And { lhs, rhs }))
    }

    /// Creates a bitwise OR.
    pub fn or(lhs: Expr, rhs: Expr) -> Result<Expr, IrError> {
        Self::check_same_width("or", &lhs, &rhs)?;
        Ok(Expr::node(ExprKind::Or { lhs, rhs }))
    }

    /// Creates a two-way multiplexer. The selector must be one bit wide and
    /// both arms must agree in width.
    pub fn mux(sel: Expr, on_true: Expr, on_false: Expr) -> Result<Expr, IrError> {
        let sel_width = sel.scalar_width("mux selector")?;
        if sel_width != 1 {
            return Err(IrError::WidthMismatch {
                context: "mux selector",
                expected: 1,
                found: sel_width,
            });
        }
        Self::check_same_width("mux", &on_true, &on_false)?;
        Ok(Expr::node(ExprKind::Mux {
            sel,
            on_true,
            on_false,
        }))
    }

    /// Creates a register with a reset value.
    pub fn reg(reset: Bits, d: Expr) -> Result<Expr, IrError> {
        let w = d.scalar_width("reg")?;
        if w != reset.width() {
            return Err(IrError::WidthMismatch {
                context: "reg",
                expected: reset.width(),
                found: w,
            });
        }
        Ok(Expr::node(ExprKind::Reg { reset, d }))
    }

    /// Zero-extends to `width` bits.
    pub fn zero_extend(expr: Expr, width: u32) -> Result<Expr, IrError> {
        let from = expr.scalar_width("zero-extend")?;
        if width < from {
            return Err(IrError::NarrowingExtend { from, to: width });
        }
        Ok(Expr::node(ExprKind::ZeroExtend { expr, width }))
    }

    /// Extends to `width` bits by replicating the most significant bit.
    pub fn dup_extend(expr: Expr, width: u32) -> Result<Expr, IrError> {
        let from = expr.scalar_width("dup-extend")?;
        if width < from {
            return Err(IrError::NarrowingExtend { from, to: width });
        }
        Ok(Expr::node(ExprKind::DupExtend { expr, width }))
    }

    /// Creates a hash-map literal.
    pub fn map(entries: Vec<(String, Expr)>) -> Result<Expr, IrError> {
        Ok(Expr::node(ExprKind::Map(entries)))
    }

    /// Looks up `key` in a map literal.
    pub fn map_get(map: Expr, key: impl Into<String>) -> Result<Expr, IrError> {
        let key = key.into();
        match map.kind() {
            ExprKind::Map(entries) => {
                if !entries.iter().any(|(k, _)| *k == key) {
                    return Err(IrError::MissingKey { key });
                }
            }
            _ => return Err(IrError::NotAMap),
        }
        Ok(Expr::node(ExprKind::MapGet { map, key }))
    }

    /// Creates a list literal.
    pub fn list(items: Vec<Expr>) -> Expr {
        Expr::node(ExprKind::List(items))
    }

    /// Indexes a list literal with a constant index.
    pub fn list_get(list: Expr, index: usize) -> Result<Expr, IrError> {
        match list.kind() {
            ExprKind::List(items) => {
                if index >= items.len() {
                    return Err(IrError::IndexOutOfRange {
                        index,
                        len: items.len(),
                    });
                }
            }
            _ => return Err(IrError::NotAList),
        }
        Ok(Expr::node(ExprKind::ListGet { list, index }))
    }

    /// Creates a hardware-module instance expression.
    pub fn instance(
        module_name: impl Into<String>,
        ports: Vec<Port>,
        params: Vec<Param>,
        filepath: impl Into<String>,
    ) -> Expr {
        Expr::node(ExprKind::Instance(ModuleInstance {
            module_name: module_name.into(),
            ports,
            params,
            filepath: filepath.into(),
        }))
    }

    /// Projects a named output port of a module-instance expression.
    pub fn get_output(instance: Expr, port: impl Into<String>) -> Result<Expr, IrError> {
        let port = port.into();
        let width = match instance.kind() {
            ExprKind::Instance(mi) => mi
                .ports
                .iter()
                .find(|p| p.name == port && p.direction == PortDirection::Output)
                .map(|p| p.width)
                .ok_or_else(|| IrError::UnknownOutputPort {
                    module: mi.module_name.clone(),
                    port: port.clone(),
                })?,
            _ => return Err(IrError::NotAnInstance),
        };
        Ok(Expr::node(ExprKind::GetOutput {
            instance,
            port,
            width,
        }))
    }

    /// Creates a hole expression referring to a symbolic value.
    pub fn symbol(id: SymbolId, width: u32) -> Expr {
        Expr::node(ExprKind::Symbol { id, width })
    }

    /// Creates a placeholder wire expression. Normally obtained through
    /// [`WireArena::expr`](crate::wire::WireArena::expr).
    pub fn wire(id: WireId, width: u32) -> Expr {
        Expr::node(ExprKind::Wire { id, width })
    }

    /// Returns the inferred width, or `None` for composite expressions
    /// (maps, lists, instances).
    pub fn width(&self) -> Option<u32> {
        match self.kind() {
            ExprKind::Const(v) => Some(v.width()),
            ExprKind::Var { width, .. } => Some(*width),
            ExprKind::Extract { hi, lo, .. } => Some(hi - lo + 1),
            ExprKind::Concat(parts) => parts.iter().map(|p| p.width()).sum(),
            ExprKind::Eq { .. } => Some(1),
            ExprKind::And { lhs, .. } | ExprKind::Or { lhs, .. } => lhs.width(),
            ExprKind::Mux { on_true, .. } => on_true.width(),
            ExprKind::Reg { reset, .. } => Some(reset.width()),
            ExprKind::ZeroExtend { width, .. } | ExprKind::DupExtend { width, .. } => Some(*width),
            ExprKind::Map(_) | ExprKind::List(_) | ExprKind::Instance(_) => None,
            ExprKind::MapGet { map, key } => match map.kind() {
                ExprKind::Map(entries) => entries
                    .iter()
                    .find(|(k, _)| k == key)
                    .and_then(|(_, v)| v.width()),
                _ => None,
            },
            ExprKind::ListGet { list, index } => match list.kind() {
                ExprKind::List(items) => items.get(*index).and_then(|e| e.width()),
                _ => None,
            },
            ExprKind::GetOutput { width, .. } => Some(*width),
            ExprKind::Symbol { width, .. } => Some(*width),
            ExprKind::Wire { width, .. } => Some(*width),
        }
    }

    fn scalar_width(&self, context: &'static str) -> Result<u32, IrError> {
        self.width().ok_or(IrError::WidthlessOperand { context })
    }

    fn check_same_width(context: &'static str, lhs: &Expr, rhs: &Expr) -> Result<(), IrError> {
        let lw = lhs.scalar_width(context)?;
        let rw = rhs.scalar_width(context)?;
        if lw != rw {
            return Err(IrError::WidthMismatch {
                context,
                expected: lw,
                found: rw,
            });
        }
        Ok(())
    }

    /// Calls `f` on every direct child expression, including instance port
    /// and parameter values.
    pub fn for_each_child(&self, f: &mut impl FnMut(&Expr)) {
        match self.kind() {
            ExprKind::Const(_)
            | ExprKind::Var { .. }
            | ExprKind::Symbol { .. }
            | ExprKind::Wire { .. } => {}
            ExprKind::Extract { expr, .. }
            | ExprKind::ZeroExtend { expr, .. }
            | ExprKind::DupExtend { expr, .. } => f(expr),
            ExprKind::Concat(parts) | ExprKind::List(parts) => {
                for p in parts {
                    f(p);
                }
            }
            ExprKind::Eq { lhs, rhs } | ExprKind::And { lhs, rhs } | ExprKind::Or { lhs, rhs } => {
                f(lhs);
                f(rhs);
            }
            ExprKind::Mux {
                sel,
                on_true,
                on_false,
            } => {
                f(sel);
                f(on_true);
                f(on_false);
            }
            ExprKind::Reg { d, .. } => f(d),
            ExprKind::Map(entries) => {
                for (_, v) in entries {
                    f(v);
                }
            }
            ExprKind::MapGet { map, .. } => f(map),
            ExprKind::ListGet { list, .. } => f(list),
            ExprKind::Instance(mi) => {
                for p in &mi.ports {
                    if let Some(v) = &p.value {
                        f(v);
                    }
                }
                for p in &mi.params {
                    f(&p.value);
                }
            }
            ExprKind::GetOutput { instance, .. } => f(instance),
        }
    }

    /// Collects the named free variables reachable from this expression,
    /// in first-visit order, deduplicated by name.
    pub fn free_vars(&self) -> Vec<(String, u32)> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if let ExprKind::Var { name, width } = e.kind() {
                if seen.insert(name.clone()) {
                    out.push((name.clone(), *width));
                }
            }
        });
        out
    }

    /// Collects the symbolic values reachable from this expression, in
    /// first-visit order, deduplicated.
    pub fn symbols(&self) -> Vec<SymbolId> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        self.walk(&mut |e| {
            if let ExprKind::Symbol { id, .. } = e.kind() {
                if seen.insert(*id) {
                    out.push(*id);
                }
            }
        });
        out
    }

    /// Pre-order traversal over the whole tree.
    fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        self.for_each_child(&mut |c| c.walk(f));
    }

    /// Replaces every hole with its value from `model`, producing a
    /// completed expression ready for interpretation or emission.
    ///
    /// Sharing is preserved: a node reachable along several paths is
    /// rewritten once. Fails if the model leaves a reachable hole
    /// unassigned or assigns a value of the wrong width.
    pub fn substitute(&self, model: &Model) -> Result<Expr, IrError> {
        let mut memo = std::collections::HashMap::new();
        self.substitute_memo(model, &mut memo)
    }

    fn substitute_memo(
        &self,
        model: &Model,
        memo: &mut std::collections::HashMap<usize, Expr>,
    ) -> Result<Expr, IrError> {
        let key = Arc::as_ptr(&self.0) as usize;
        if let Some(hit) = memo.get(&key) {
            return Ok(hit.clone());
        }
        let out = self.substitute_node(model, memo)?;
        memo.insert(key, out.clone());
        Ok(out)
    }

    fn substitute_node(
        &self,
        model: &Model,
        memo: &mut std::collections::HashMap<usize, Expr>,
    ) -> Result<Expr, IrError> {
        match self.kind() {
            ExprKind::Symbol { id, width } => {
                let value = model.get(*id).ok_or(IrError::UnassignedSymbol(*id))?;
                if value.width() != *width {
                    return Err(IrError::ModelWidthMismatch {
                        symbol: *id,
                        expected: *width,
                        found: value.width(),
                    });
                }
                Ok(Expr::constant(value.clone()))
            }
            ExprKind::Const(_) | ExprKind::Var { .. } | ExprKind::Wire { .. } => Ok(self.clone()),
            ExprKind::Extract { hi, lo, expr } => Ok(Expr::node(ExprKind::Extract {
                hi: *hi,
                lo: *lo,
                expr: expr.substitute_memo(model, memo)?,
            })),
            ExprKind::Concat(parts) => Ok(Expr::node(ExprKind::Concat(
                parts
                    .iter()
                    .map(|p| p.substitute_memo(model, memo))
                    .collect::<Result<_, _>>()?,
            ))),
            ExprKind::Eq { lhs, rhs } => Ok(Expr::node(ExprKind::Eq {
                lhs: lhs.substitute_memo(model, memo)?,
                rhs: rhs.substitute_memo(model, memo)?,
            })),
            ExprKind::And { lhs, rhs } => Ok(Expr::node(ExprKind::And {
                lhs: lhs.substitute_memo(model, memo)?,
                rhs: rhs.substitute_memo(model, memo)?,
            })),
            ExprKind::Or { lhs, rhs } => Ok(Expr::node(ExprKind::Or {
                lhs: lhs.substitute_memo(model, memo)?,
                rhs: rhs.substitute_memo(model, memo)?,
            })),
            ExprKind::Mux {
                sel,
                on_true,
                on_false,
            } => Ok(Expr::node(ExprKind::Mux {
                sel: sel.substitute_memo(model, memo)?,
                on_true: on_true.substitute_memo(model, memo)?,
                on_false: on_false.substitute_memo(model, memo)?,
            })),
            ExprKind::Reg { reset, d } => Ok(Expr::node(ExprKind::Reg {
                reset: reset.clone(),
                d: d.substitute_memo(model, memo)?,
            })),
            ExprKind::ZeroExtend { expr, width } => Ok(Expr::node(ExprKind::ZeroExtend {
                expr: expr.substitute_memo(model, memo)?,
                width: *width,
            })),
            ExprKind::DupExtend { expr, width } => Ok(Expr::node(ExprKind::DupExtend {
                expr: expr.substitute_memo(model, memo)?,
                width: *width,
            })),
            ExprKind::Map(entries) => Ok(Expr::node(ExprKind::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.substitute_memo(model, memo)?)))
                    .collect::<Result<_, IrError>>()?,
            ))),
            ExprKind::MapGet { map, key } => Ok(Expr::node(ExprKind::MapGet {
                map: map.substitute_memo(model, memo)?,
                key: key.clone(),
            })),
            ExprKind::List(items) => Ok(Expr::node(ExprKind::List(
                items
                    .iter()
                    .map(|p| p.substitute_memo(model, memo))
                    .collect::<Result<_, _>>()?,
            ))),
            ExprKind::ListGet { list, index } => Ok(Expr::node(ExprKind::ListGet {
                list: list.substitute_memo(model, memo)?,
                index: *index,
            })),
            ExprKind::Instance(mi) => {
                let ports = mi
                    .ports
                    .iter()
                    .map(|p| {
                        Ok(Port {
                            name: p.name.clone(),
                            value: p.value.as_ref().map(|v| v.substitute_memo(model, memo)).transpose()?,
                            direction: p.direction,
                            width: p.width,
                        })
                    })
                    .collect::<Result<_, IrError>>()?;
                let params = mi
                    .params
                    .iter()
                    .map(|p| {
                        Ok(Param {
                            name: p.name.clone(),
                            value: p.value.substitute_memo(model, memo)?,
                        })
                    })
                    .collect::<Result<_, IrError>>()?;
                Ok(Expr::node(ExprKind::Instance(ModuleInstance {
                    module_name: mi.module_name.clone(),
                    ports,
                    params,
                    filepath: mi.filepath.clone(),
                })))
            }
            ExprKind::GetOutput {
                instance,
                port,
                width,
            } => Ok(Expr::node(ExprKind::GetOutput {
                instance: instance.substitute_memo(model, memo)?,
                port: port.clone(),
                width: *width,
            })),
        }
    }
}
