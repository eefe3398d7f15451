//! Placeholder wires with explicit unification.
//!
//! Feedback paths are built in two steps: declare a placeholder wire,
//! reference it while constructing the surrounding expression, then unify
//! the placeholder with its defining expression. The arena holds the
//! unification map; [`WireArena::resolve`] rewrites a finished tree,
//! splicing definitions in place of placeholders.

use crate::error::IrError;
use crate::expr::{Expr, ExprKind};
use serde::{Deserialize, Serialize};

/// An index handle into a [`WireArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireId(u32);

impl WireId {
    /// Creates a `WireId` from a raw index. Intended for deserialization
    /// and testing.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireSlot {
    name: String,
    width: u32,
    def: Option<Expr>,
}

/// An arena of placeholder wires and their unification map.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WireArena {
    slots: Vec<WireSlot>,
}

impl WireArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new placeholder wire of the given width.
    pub fn declare(&mut self, name: impl Into<String>, width: u32) -> WireId {
        let id = WireId(self.slots.len() as u32);
        self.slots.push(WireSlot {
            name: name.into(),
            width,
            def: None,
        });
        id
    }

    /// Returns an expression referring to the placeholder.
    pub fn expr(&self, id: WireId) -> Expr {
        Expr::wire(id, self.slot(id).width)
    }

    /// Unifies a placeholder with its defining expression.
    ///
    /// Fails if the wire is already unified or the definition's width does
    /// not match the declaration.
    pub fn unify(&mut self, id: WireId, def: Expr) -> Result<(), IrError> {
        let slot = self.slot(id);
        if slot.def.is_some() {
            return Err(IrError::WireAlreadyUnified {
                name: slot.name.clone(),
            });
        }
        match def.width() {
            Some(w) if w == slot.width => {}
            Some(w) => {
                return Err(IrError::WidthMismatch {
                    context: "wire unification",
                    expected: slot.width,
                    found: w,
                })
            }
            None => {
                return Err(IrError::WidthlessOperand {
                    context: "wire unification",
                })
            }
        }
        self.slots[id.0 as usize].def = Some(def);
        Ok(())
    }

    /// Rewrites `expr`, replacing every placeholder with its definition.
    ///
    /// Fails on wires that were never unified, and on definitions that
    /// reach themselves without passing through a register (a combinational
    /// cycle has no finite tree form).
    pub fn resolve(&self, expr: &Expr) -> Result<Expr, IrError> {
        let mut stack = Vec::new();
        self.resolve_inner(expr, &mut stack)
    }

    fn resolve_inner(&self, expr: &Expr, stack: &mut Vec<WireId>) -> Result<Expr, IrError> {
        match expr.kind() {
            ExprKind::Wire { id, .. } => {
                let slot = self.slot(*id);
                if stack.contains(id) {
                    return Err(IrError::CyclicWire {
                        name: slot.name.clone(),
                    });
                }
                let def = slot.def.as_ref().ok_or_else(|| IrError::UnresolvedWire {
                    name: slot.name.clone(),
                })?;
                stack.push(*id);
                let resolved = self.resolve_inner(def, stack);
                stack.pop();
                resolved
            }
            _ => {
                // Rebuild through substitution machinery: collect children,
                // resolve each, and reassemble. Substitution does not touch
                // wires, so resolution recurses manually here.
                self.rebuild(expr, stack)
            }
        }
    }

    fn rebuild(&self, expr: &Expr, stack: &mut Vec<WireId>) -> Result<Expr, IrError> {
        use crate::port::{Param, Port};
        Ok(match expr.kind() {
            ExprKind::Wire { .. } => unreachable!("handled by resolve_inner"),
            ExprKind::Const(_) | ExprKind::Var { .. } | ExprKind::Symbol { .. } => expr.clone(),
            ExprKind::Extract { hi, lo, expr: e } => {
                Expr::extract(*hi, *lo, self.resolve_inner(e, stack)?)?
            }
            ExprKind::Concat(parts) => Expr::concat(
                parts
                    .iter()
                    .map(|p| self.resolve_inner(p, stack))
                    .collect::<Result<_, _>>()?,
            )?,
            ExprKind::Eq { lhs, rhs } => Expr::eq(
                self.resolve_inner(lhs, stack)?,
                self.resolve_inner(rhs, stack)?,
            )?,
            ExprKind::And { lhs, rhs } => Expr::and(
                self.resolve_inner(lhs, stack)?,
                self.resolve_inner(rhs, stack)?,
            )?,
            ExprKind::Or { lhs, rhs } => Expr::or(
                self.resolve_inner(lhs, stack)?,
                self.resolve_inner(rhs, stack)?,
            )?,
            ExprKind::Mux {
                sel,
                on_true,
                on_false,
            } => Expr::mux(
                self.resolve_inner(sel, stack)?,
                self.resolve_inner(on_true, stack)?,
                self.resolve_inner(on_false, stack)?,
            )?,
            ExprKind::Reg { reset, d } => {
                Expr::reg(reset.clone(), self.resolve_inner(d, stack)?)?
            }
            ExprKind::ZeroExtend { expr: e, width } => {
                Expr::zero_extend(self.resolve_inner(e, stack)?, *width)?
            }
            ExprKind::DupExtend { expr: e, width } => {
                Expr::dup_extend(self.resolve_inner(e, stack)?, *width)?
            }
            ExprKind::Map(entries) => Expr::map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.resolve_inner(v, stack)?)))
                    .collect::<Result<_, IrError>>()?,
            )?,
            ExprKind::MapGet { map, key } => {
                Expr::map_get(self.resolve_inner(map, stack)?, key.clone())?
            }
            ExprKind::List(items) => Expr::list(
                items
                    .iter()
                    .map(|p| self.resolve_inner(p, stack))
                    .collect::<Result<_, _>>()?,
            ),
            ExprKind::ListGet { list, index } => {
                Expr::list_get(self.resolve_inner(list, stack)?, *index)?
            }
            ExprKind::Instance(mi) => {
                let ports = mi
                    .ports
                    .iter()
                    .map(|p| {
                        Ok(Port {
                            name: p.name.clone(),
                            value: p
                                .value
                                .as_ref()
                                .map(|v| self.resolve_inner(v, stack))
                                .transpose()?,
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
                            value: self.resolve_inner(&p.value, stack)?,
                        })
                    })
                    .collect::<Result<_, IrError>>()?;
                Expr::instance(mi.module_name.clone(), ports, params, mi.filepath.clone())
            }
            ExprKind::GetOutput { instance, port, .. } => {
                Expr::get_output(self.resolve_inner(instance, stack)?, port.clone())?
            }
        })
    }

    fn slot(&self, id: WireId) -> &WireSlot {
        assert!(
            (id.0 as usize) < self.slots.len(),
            "wire {id:?} was not declared in this arena"
        );
        &self.slots[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::Bits;

    #[test]
    fn declare_and_resolve() {
        let mut arena = WireArena::new();
        let w = arena.declare("fb", 4);
        let user = Expr::and(arena.expr(w), Expr::var("a", 4)).unwrap();
        arena.unify(w, Expr::constant_u64(0b1010, 4)).unwrap();

        let resolved = arena.resolve(&user).unwrap();
        // No wire nodes remain.
        let mut saw_wire = false;
        fn scan(e: &Expr, saw: &mut bool) {
            if matches!(e.kind(), ExprKind::Wire { .. }) {
                *saw = true;
            }
            e.for_each_child(&mut |c| scan(c, saw));
        }
        scan(&resolved, &mut saw_wire);
        assert!(!saw_wire);
    }

    #[test]
    fn unresolved_wire_errors() {
        let mut arena = WireArena::new();
        let w = arena.declare("fb", 1);
        let err = arena.resolve(&arena.expr(w)).unwrap_err();
        assert!(matches!(err, IrError::UnresolvedWire { .. }));
    }

    #[test]
    fn double_unify_errors() {
        let mut arena = WireArena::new();
        let w = arena.declare("fb", 1);
        arena.unify(w, Expr::constant_u64(0, 1)).unwrap();
        let err = arena.unify(w, Expr::constant_u64(1, 1)).unwrap_err();
        assert!(matches!(err, IrError::WireAlreadyUnified { .. }));
    }

    #[test]
    fn unify_checks_width() {
        let mut arena = WireArena::new();
        let w = arena.declare("fb", 4);
        let err = arena.unify(w, Expr::constant_u64(0, 2)).unwrap_err();
        assert!(matches!(err, IrError::WidthMismatch { .. }));
    }

    #[test]
    fn combinational_cycle_detected() {
        let mut arena = WireArena::new();
        let w = arena.declare("loop", 1);
        let def = Expr::and(arena.expr(w), Expr::var("a", 1)).unwrap();
        arena.unify(w, def).unwrap();
        let err = arena.resolve(&arena.expr(w)).unwrap_err();
        assert!(matches!(err, IrError::CyclicWire { .. }));
    }

    #[test]
    fn register_feedback_still_cyclic_as_tree() {
        // A counter: reg feeding itself. As a finite tree this cannot be
        // resolved; the unification map is the representation of record.
        let mut arena = WireArena::new();
        let w = arena.declare("q", 8);
        let reg = Expr::reg(Bits::zero(8), arena.expr(w)).unwrap();
        arena.unify(w, reg.clone()).unwrap();
        assert!(matches!(
            arena.resolve(&reg),
            Err(IrError::CyclicWire { .. })
        ));
    }
}
