//! The multiplication sketch generator.
//!
//! A `width x width` partial-product matrix of two-input LUT cells reduced
//! by a ripple of carry-chain adders. Row `r`, column `c` produces
//! `a[c-r] AND b[r]` for `c >= r` and constant zero elsewhere; all AND
//! cells share one truth-table token, and all row adders share one
//! bitwise-with-carry token, so the solver programs one AND table and one
//! adder for the whole matrix. The result is the low `width` bits of the
//! product, which is exact for two's-complement multiplication at that
//! width.

use crate::bitwise_carry::bitwise_with_carry;
use crate::error::SynthError;
use crate::internal_data::InternalData;
use crate::realize::realize;
use crate::sketch::{check_inputs, extend_choice};
use indexmap::IndexMap;
use tessera_arch::{ArchitectureDescription, InterfaceId};
use tessera_ir::{Expr, Session, SymbolId};

/// Generates a multiplication sketch for two equal-width inputs.
pub fn multiply(
    arch: &ArchitectureDescription,
    inputs: &[Expr],
    n_inputs: usize,
    width: u32,
    internal: Option<&InternalData>,
    session: &mut Session,
) -> Result<(Expr, InternalData), SynthError> {
    check_inputs(inputs, n_inputs, width)?;
    if n_inputs != 2 {
        return Err(SynthError::InputCount {
            expected: 2,
            found: n_inputs,
        });
    }

    let (ext_a, ext_b, mut and_token, mut adder_token) = unpack(internal, session)?;

    let a = extend_choice(&inputs[0], width, ext_a)?;
    let b = extend_choice(&inputs[1], width, ext_b)?;

    // Partial-product matrix: one AND cell per in-range (row, column).
    let lut2 = InterfaceId::lut(2);
    let mut rows = Vec::with_capacity(width as usize);
    for r in 0..width {
        let mut cells = Vec::with_capacity(width as usize);
        for c in (0..width).rev() {
            if c >= r {
                let mut pm = IndexMap::new();
                pm.insert("I0".to_string(), Expr::bit(c - r, a.clone())?);
                pm.insert("I1".to_string(), Expr::bit(r, b.clone())?);
                let (cell, token) = realize(arch, &lut2, &pm, and_token.as_ref(), session)?;
                and_token = Some(token);
                cells.push(Expr::map_get(cell, "O")?);
            } else {
                cells.push(Expr::constant_u64(0, 1));
            }
        }
        rows.push(Expr::concat(cells)?);
    }

    // Reduce by a left fold through one shared adder sketch.
    let mut acc = rows[0].clone();
    for row in &rows[1..] {
        let operands = [acc, row.clone()];
        let (sum, token) =
            bitwise_with_carry(arch, &operands, 2, width, adder_token.as_ref(), session)?;
        adder_token = Some(token);
        acc = sum;
    }

    let data = InternalData::Tuple(vec![
        InternalData::Leaf(ext_a),
        InternalData::Leaf(ext_b),
        and_token.expect("width is nonzero"),
        adder_token.unwrap_or(InternalData::Tuple(Vec::new())),
    ]);
    Ok((acc, data))
}

type Unpacked = (
    SymbolId,
    SymbolId,
    Option<InternalData>,
    Option<InternalData>,
);

fn unpack(internal: Option<&InternalData>, session: &mut Session) -> Result<Unpacked, SynthError> {
    match internal {
        Some(token) => {
            let parts = token.tuple_n(4, "multiplication sketch")?;
            Ok((
                parts[0].leaf("multiplier extension mode")?,
                parts[1].leaf("multiplicand extension mode")?,
                Some(parts[2].clone()),
                Some(parts[3].clone()),
            ))
        }
        None => Ok((
            session.fresh_bool("ext_mode_a"),
            session.fresh_bool("ext_mode_b"),
            None,
            None,
        )),
    }
}
