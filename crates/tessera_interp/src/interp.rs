//! The evaluator for completed (hole-free) expressions.
//!
//! Evaluation is combinational: a register contributes its reset value;
//! multi-cycle behavior belongs to external co-simulation. Shared subtrees
//! are evaluated once per call through a node-identity cache, so heavily
//! shared sketches evaluate in time linear in the DAG, not the tree.

use crate::error::InterpError;
use crate::semantics::{expand_instance, SemanticsTable};
use indexmap::IndexMap;
use std::collections::HashMap;
use tessera_common::Bits;
use tessera_ir::{Expr, ExprKind, IrError, SpecExpr, SpecKind, SpecOp};

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A bit-vector value.
    Bits(Bits),
    /// An evaluated hash-map literal (interface output bundle).
    Map(IndexMap<String, Value>),
    /// An evaluated list literal.
    List(Vec<Value>),
}

impl Value {
    /// Unwraps a bit-vector value.
    pub fn bits(&self) -> Option<&Bits> {
        match self {
            Value::Bits(b) => Some(b),
            _ => None,
        }
    }
}

/// Evaluates a hole-free expression under an environment binding free
/// variables to values, with primitives interpreted through `table`.
pub fn interpret(
    expr: &Expr,
    env: &HashMap<String, Bits>,
    table: &SemanticsTable,
) -> Result<Value, InterpError> {
    let mut cache = HashMap::new();
    eval(expr, env, table, &mut cache)
}

fn node_key(expr: &Expr) -> usize {
    expr.kind() as *const ExprKind as usize
}

fn eval(
    expr: &Expr,
    env: &HashMap<String, Bits>,
    table: &SemanticsTable,
    cache: &mut HashMap<usize, Value>,
) -> Result<Value, InterpError> {
    let key = node_key(expr);
    if let Some(hit) = cache.get(&key) {
        return Ok(hit.clone());
    }

    let value = match expr.kind() {
        ExprKind::Const(v) => Value::Bits(v.clone()),
        ExprKind::Var { name, width } => {
            let bound = env
                .get(name)
                .ok_or_else(|| InterpError::UnboundVariable(name.clone()))?;
            if bound.width() != *width {
                return Err(InterpError::Ir(IrError::WidthMismatch {
                    context: "variable binding",
                    expected: *width,
                    found: bound.width(),
                }));
            }
            Value::Bits(bound.clone())
        }
        ExprKind::Symbol { id, .. } => return Err(InterpError::RemainingHole(*id)),
        ExprKind::Wire { .. } => return Err(InterpError::UnresolvedWire),
        ExprKind::Extract { hi, lo, expr } => {
            Value::Bits(scalar(expr, env, table, cache, "extract")?.extract(*hi, *lo))
        }
        ExprKind::Concat(parts) => {
            let mut acc = scalar(&parts[0], env, table, cache, "concat")?;
            for part in &parts[1..] {
                acc = acc.concat(&scalar(part, env, table, cache, "concat")?);
            }
            Value::Bits(acc)
        }
        ExprKind::Eq { lhs, rhs } => {
            let l = scalar(lhs, env, table, cache, "eq")?;
            let r = scalar(rhs, env, table, cache, "eq")?;
            Value::Bits(Bits::from_bool(l == r))
        }
        ExprKind::And { lhs, rhs } => Value::Bits(
            scalar(lhs, env, table, cache, "and")? & scalar(rhs, env, table, cache, "and")?,
        ),
        ExprKind::Or { lhs, rhs } => Value::Bits(
            scalar(lhs, env, table, cache, "or")? | scalar(rhs, env, table, cache, "or")?,
        ),
        ExprKind::Mux {
            sel,
            on_true,
            on_false,
        } => {
            if scalar(sel, env, table, cache, "mux selector")?.get(0) {
                eval(on_true, env, table, cache)?
            } else {
                eval(on_false, env, table, cache)?
            }
        }
        // Combinational evaluation: a register holds its reset value.
        ExprKind::Reg { reset, .. } => Value::Bits(reset.clone()),
        ExprKind::ZeroExtend { expr, width } => {
            Value::Bits(scalar(expr, env, table, cache, "zero-extend")?.zero_extend(*width))
        }
        ExprKind::DupExtend { expr, width } => {
            Value::Bits(scalar(expr, env, table, cache, "dup-extend")?.dup_extend(*width))
        }
        ExprKind::Map(entries) => {
            let mut out = IndexMap::new();
            for (name, entry) in entries {
                out.insert(name.clone(), eval(entry, env, table, cache)?);
            }
            Value::Map(out)
        }
        ExprKind::MapGet { map, key } => match eval(map, env, table, cache)? {
            Value::Map(entries) => entries
                .get(key)
                .cloned()
                .ok_or_else(|| InterpError::MissingKey(key.clone()))?,
            _ => return Err(InterpError::NotScalar { context: "map lookup" }),
        },
        ExprKind::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval(item, env, table, cache)?);
            }
            Value::List(out)
        }
        ExprKind::ListGet { list, index } => match eval(list, env, table, cache)? {
            Value::List(items) => items[*index].clone(),
            _ => return Err(InterpError::NotScalar { context: "list index" }),
        },
        ExprKind::Instance(mi) => {
            let outputs = expand_instance(mi, table)?;
            let mut out = IndexMap::new();
            for (name, expr) in outputs {
                out.insert(name, eval(&expr, env, table, cache)?);
            }
            Value::Map(out)
        }
        ExprKind::GetOutput { instance, port, .. } => match instance.kind() {
            ExprKind::Instance(mi) => {
                let outputs = expand_instance(mi, table)?;
                let expr = outputs
                    .get(port)
                    .ok_or_else(|| InterpError::MissingKey(port.clone()))?;
                eval(expr, env, table, cache)?
            }
            _ => unreachable!("get_output is constructed over instances"),
        },
    };

    cache.insert(key, value.clone());
    Ok(value)
}

fn scalar(
    expr: &Expr,
    env: &HashMap<String, Bits>,
    table: &SemanticsTable,
    cache: &mut HashMap<usize, Value>,
    context: &'static str,
) -> Result<Bits, InterpError> {
    match eval(expr, env, table, cache)? {
        Value::Bits(b) => Ok(b),
        _ => Err(InterpError::NotScalar { context }),
    }
}

/// Evaluates an abstract-spec expression under an environment.
///
/// This is the reference side of an equivalence check: the completed
/// sketch goes through [`interpret`], the specification through here, and
/// the two results are compared bit for bit.
pub fn eval_spec(spec: &SpecExpr, env: &HashMap<String, Bits>) -> Result<Bits, InterpError> {
    match spec.kind() {
        SpecKind::Const(v) => Ok(v.clone()),
        SpecKind::Var { name, width } => {
            let bound = env
                .get(name)
                .ok_or_else(|| InterpError::UnboundVariable(name.clone()))?;
            if bound.width() != *width {
                return Err(InterpError::Ir(IrError::WidthMismatch {
                    context: "variable binding",
                    expected: *width,
                    found: bound.width(),
                }));
            }
            Ok(bound.clone())
        }
        SpecKind::Not(e) => Ok(!eval_spec(e, env)?),
        SpecKind::Binary { op, lhs, rhs } => {
            let l = eval_spec(lhs, env)?;
            let r = eval_spec(rhs, env)?;
            Ok(match op {
                SpecOp::And => l & r,
                SpecOp::Or => l | r,
                SpecOp::Xor => l ^ r,
                SpecOp::Add => l.wrapping_add(&r),
                SpecOp::Sub => l.wrapping_sub(&r),
                SpecOp::Mul => l.wrapping_mul(&r),
                SpecOp::Shl => l.shl(shift_amount(&r, l.width())),
                SpecOp::Lshr => l.lshr(shift_amount(&r, l.width())),
                SpecOp::Ashr => l.ashr(shift_amount(&r, l.width())),
            })
        }
        SpecKind::Eq { lhs, rhs } => Ok(Bits::from_bool(eval_spec(lhs, env)? == eval_spec(rhs, env)?)),
        SpecKind::Extract { hi, lo, expr } => Ok(eval_spec(expr, env)?.extract(*hi, *lo)),
        SpecKind::Concat(parts) => {
            let mut acc = eval_spec(&parts[0], env)?;
            for part in &parts[1..] {
                acc = acc.concat(&eval_spec(part, env)?);
            }
            Ok(acc)
        }
        SpecKind::ZeroExtend { expr, width } => Ok(eval_spec(expr, env)?.zero_extend(*width)),
        SpecKind::SignExtend { expr, width } => Ok(eval_spec(expr, env)?.dup_extend(*width)),
    }
}

/// Clamps a shift amount to the operand width; anything at or past the
/// width already saturates in the shift itself.
fn shift_amount(amount: &Bits, width: u32) -> u32 {
    let low = if amount.width() > 64 {
        if !amount.extract(amount.width() - 1, 64).is_zero() {
            return width;
        }
        amount.extract(63, 0)
    } else {
        amount.clone()
    };
    low.to_u64().expect("at most 64 bits").min(width as u64) as u32
}
