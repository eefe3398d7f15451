//! The solver interface.
//!
//! The core asks one question per sketch: does an assignment to the holes
//! exist making the sketch equal to the specification for every assignment
//! to the free variables? [`SynthesisQuery`] carries that question,
//! [`Solver`] is the blocking collaborator answering it, and
//! [`emit_smtlib`] renders the query as an SMT-LIB 2 script for external
//! solvers.
//!
//! Module instances have no SMT semantics of their own; expand them into
//! pure IR through a semantics table before emission.

use crate::error::SynthError;
use std::fmt::Write;
use tessera_ir::{Expr, ExprKind, IrError, Model, Session, SpecExpr, SpecKind, SpecOp, SymbolId};

/// A hole-synthesis query: `forall free_vars. spec == sketch`, solved for
/// the holes.
#[derive(Debug, Clone)]
pub struct SynthesisQuery {
    /// The user-declared free variables, in first-visit order.
    pub free_vars: Vec<(String, u32)>,
    /// The holes to solve for, in first-visit order over the sketch.
    pub holes: Vec<SymbolId>,
    /// The abstract specification expression.
    pub spec: SpecExpr,
    /// The sketch with holes.
    pub sketch: Expr,
}

impl SynthesisQuery {
    /// Builds the equivalence query for a spec/sketch pair.
    ///
    /// The sketch must expose a scalar width equal to the spec's.
    pub fn equivalence(spec: SpecExpr, sketch: Expr) -> Result<Self, SynthError> {
        let sketch_width = sketch.width().ok_or(IrError::WidthlessOperand {
            context: "equivalence query",
        })?;
        if spec.width() != sketch_width {
            return Err(SynthError::Ir(IrError::WidthMismatch {
                context: "equivalence query",
                expected: spec.width(),
                found: sketch_width,
            }));
        }

        let mut free_vars = spec.free_vars();
        for (name, width) in sketch.free_vars() {
            if !free_vars.iter().any(|(n, _)| *n == name) {
                free_vars.push((name, width));
            }
        }
        let holes = sketch.symbols();
        Ok(Self {
            free_vars,
            holes,
            spec,
            sketch,
        })
    }
}

/// The solver's verdict on a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    /// A hole assignment making spec and sketch equivalent.
    Sat(Model),
    /// No assignment exists: this sketch family cannot implement the
    /// specification on this architecture.
    Unsat,
    /// The solver gave up; the payload is its reason verbatim.
    Unknown(String),
}

impl SolverOutcome {
    /// Extracts the model, mapping `Unsat` to [`SynthError::NoMapping`]
    /// (the surrounding session may try another sketch family) and
    /// `Unknown` to [`SynthError::SolverUnknown`].
    pub fn into_model(self) -> Result<Model, SynthError> {
        match self {
            SolverOutcome::Sat(model) => Ok(model),
            SolverOutcome::Unsat => Err(SynthError::NoMapping),
            SolverOutcome::Unknown(reason) => Err(SynthError::SolverUnknown(reason)),
        }
    }
}

/// A blocking external solver.
///
/// The solve call is the only potentially long-running operation in a
/// synthesis session; cancellation, timeouts, and retries belong to the
/// caller.
pub trait Solver {
    /// Solves one query, blocking until the solver answers.
    fn solve(&mut self, query: &SynthesisQuery, session: &Session)
        -> Result<SolverOutcome, SynthError>;
}

/// Renders a query as an SMT-LIB 2 script.
///
/// Holes become `declare-const`s; the equivalence is asserted under a
/// `forall` over the free variables; the script ends with `check-sat` and
/// `get-model`. Fails on expressions with no SMT form (registers,
/// unresolved wires, unexpanded module instances).
pub fn emit_smtlib(query: &SynthesisQuery, session: &Session) -> Result<String, SynthError> {
    let mut out = String::new();
    out.push_str("(set-logic BV)\n");
    for hole in &query.holes {
        let width = session.sort_of(*hole).width();
        let _ = writeln!(out, "(declare-const {} (_ BitVec {width}))", hole_name(session, *hole));
    }

    let spec = spec_term(&query.spec);
    let sketch = term(&query.sketch, session)?;
    let body = format!("(= {spec} {sketch})");
    if query.free_vars.is_empty() {
        let _ = writeln!(out, "(assert {body})");
    } else {
        let binders: Vec<String> = query
            .free_vars
            .iter()
            .map(|(name, width)| format!("({name} (_ BitVec {width}))"))
            .collect();
        let _ = writeln!(out, "(assert (forall ({}) {body}))", binders.join(" "));
    }
    out.push_str("(check-sat)\n(get-model)\n");
    Ok(out)
}

/// The SMT symbol for a hole: the session's printable name with the id
/// separator made letter-safe.
fn hole_name(session: &Session, id: SymbolId) -> String {
    session.name_of(id).replace('%', "_")
}

fn bit_literal(v: &tessera_common::Bits) -> String {
    let mut lit = String::with_capacity(v.width() as usize + 2);
    lit.push_str("#b");
    for i in (0..v.width()).rev() {
        lit.push(if v.get(i) { '1' } else { '0' });
    }
    lit
}

/// Renders an abstract-spec expression. Every spec form has an SMT
/// counterpart, so this cannot fail.
fn spec_term(expr: &SpecExpr) -> String {
    match expr.kind() {
        SpecKind::Const(v) => bit_literal(v),
        SpecKind::Var { name, .. } => name.clone(),
        SpecKind::Not(e) => format!("(bvnot {})", spec_term(e)),
        SpecKind::Binary { op, lhs, rhs } => {
            let op = match op {
                SpecOp::And => "bvand",
                SpecOp::Or => "bvor",
                SpecOp::Xor => "bvxor",
                SpecOp::Add => "bvadd",
                SpecOp::Sub => "bvsub",
                SpecOp::Mul => "bvmul",
                SpecOp::Shl => "bvshl",
                SpecOp::Lshr => "bvlshr",
                SpecOp::Ashr => "bvashr",
            };
            format!("({op} {} {})", spec_term(lhs), spec_term(rhs))
        }
        SpecKind::Eq { lhs, rhs } => {
            format!("(ite (= {} {}) #b1 #b0)", spec_term(lhs), spec_term(rhs))
        }
        SpecKind::Extract { hi, lo, expr } => {
            format!("((_ extract {hi} {lo}) {})", spec_term(expr))
        }
        SpecKind::Concat(parts) => {
            if parts.len() == 1 {
                return spec_term(&parts[0]);
            }
            let rendered: Vec<String> = parts.iter().map(spec_term).collect();
            format!("(concat {})", rendered.join(" "))
        }
        SpecKind::ZeroExtend { expr, width } => {
            format!("((_ zero_extend {}) {})", width - expr.width(), spec_term(expr))
        }
        SpecKind::SignExtend { expr, width } => {
            format!("((_ sign_extend {}) {})", width - expr.width(), spec_term(expr))
        }
    }
}

fn term(expr: &Expr, session: &Session) -> Result<String, SynthError> {
    match expr.kind() {
        ExprKind::Const(v) => Ok(bit_literal(v)),
        ExprKind::Var { name, .. } => Ok(name.clone()),
        ExprKind::Symbol { id, .. } => Ok(hole_name(session, *id)),
        ExprKind::Extract { hi, lo, expr } => {
            Ok(format!("((_ extract {hi} {lo}) {})", term(expr, session)?))
        }
        ExprKind::Concat(parts) => {
            if parts.len() == 1 {
                return term(&parts[0], session);
            }
            let rendered = parts
                .iter()
                .map(|p| term(p, session))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("(concat {})", rendered.join(" ")))
        }
        ExprKind::Eq { lhs, rhs } => Ok(format!(
            "(ite (= {} {}) #b1 #b0)",
            term(lhs, session)?,
            term(rhs, session)?
        )),
        ExprKind::And { lhs, rhs } => Ok(format!(
            "(bvand {} {})",
            term(lhs, session)?,
            term(rhs, session)?
        )),
        ExprKind::Or { lhs, rhs } => Ok(format!(
            "(bvor {} {})",
            term(lhs, session)?,
            term(rhs, session)?
        )),
        ExprKind::Mux {
            sel,
            on_true,
            on_false,
        } => Ok(format!(
            "(ite (= {} #b1) {} {})",
            term(sel, session)?,
            term(on_true, session)?,
            term(on_false, session)?
        )),
        ExprKind::ZeroExtend { expr, width } => {
            let from = expr.width().expect("checked at construction");
            Ok(format!(
                "((_ zero_extend {}) {})",
                width - from,
                term(expr, session)?
            ))
        }
        ExprKind::DupExtend { expr, width } => {
            let from = expr.width().expect("checked at construction");
            Ok(format!(
                "((_ sign_extend {}) {})",
                width - from,
                term(expr, session)?
            ))
        }
        ExprKind::MapGet { map, key } => match map.kind() {
            ExprKind::Map(entries) => {
                let entry = entries
                    .iter()
                    .find(|(k, _)| k == key)
                    .expect("checked at construction");
                term(&entry.1, session)
            }
            _ => Err(SynthError::EmitUnsupported {
                what: "map lookup on a non-literal map",
            }),
        },
        ExprKind::ListGet { list, index } => match list.kind() {
            ExprKind::List(items) => term(&items[*index], session),
            _ => Err(SynthError::EmitUnsupported {
                what: "list index on a non-literal list",
            }),
        },
        ExprKind::Reg { .. } => Err(SynthError::EmitUnsupported { what: "register" }),
        ExprKind::Wire { .. } => Err(SynthError::EmitUnsupported {
            what: "unresolved wire",
        }),
        ExprKind::Map(_) | ExprKind::List(_) => Err(SynthError::EmitUnsupported {
            what: "bare composite literal",
        }),
        ExprKind::Instance(_) | ExprKind::GetOutput { .. } => Err(SynthError::EmitUnsupported {
            what: "module instance (expand through a semantics table first)",
        }),
    }
}
