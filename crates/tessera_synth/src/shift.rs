//! The barrel-shift sketch generator.
//!
//! `width` stages of per-bit 2-way muxes. Stage `s` conditionally moves
//! every bit by `2^s`; each bit carries two candidate muxes, one reading
//! from `i + 2^s` (the right-shift direction, with a programmable fill) and
//! one from `i - 2^s` (the left-shift direction, zero fill), with an
//! angelic hole picking the direction. The last stage's selector OR-reduces
//! all remaining high bits of the shift amount so any overshift saturates.
//! The solver ends up choosing left vs right, logical vs arithmetic, and
//! exact-shift vs saturate all through holes.
//!
//! `width` stages is more than the `log2` a barrel shifter strictly needs;
//! the surplus stages cost nothing once the solver parks them at
//! shift-by-zero.

use crate::error::SynthError;
use crate::internal_data::InternalData;
use crate::realize::realize;
use crate::sketch::{check_inputs, extend_choice};
use indexmap::IndexMap;
use tessera_arch::{ArchitectureDescription, InterfaceId};
use tessera_ir::{Expr, Session, SymbolId};

/// Generates a barrel-shift sketch for a value and a shift amount.
pub fn shift(
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

    let (ext_a, ext_b, arith, direction, mut mux_token, mut or_token) = unpack(internal, session)?;

    let a = extend_choice(&inputs[0], width, ext_a)?;
    let b = extend_choice(&inputs[1], width, ext_b)?;

    // Fill for the right-shift direction: zero, or the MSB when the
    // arithmetic hole is set.
    let fill_right = Expr::mux(
        Expr::symbol(arith, 1),
        Expr::bit(width - 1, a.clone())?,
        Expr::constant_u64(0, 1),
    )?;

    let mux2 = InterfaceId::mux(2);
    let num_stages = width;
    let mut cur = (0..width)
        .map(|i| Expr::bit(i, a.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    for s in 0..num_stages {
        let select = if s + 1 < num_stages {
            Expr::bit(s, b.clone())?
        } else {
            // Saturating selector: OR-reduce the remaining high bits of the
            // shift amount through a LUT of matching arity.
            let remaining = width - s;
            let mut pm = IndexMap::new();
            for j in 0..remaining {
                pm.insert(format!("I{j}"), Expr::bit(s + j, b.clone())?);
            }
            let (lut, token) = realize(
                arch,
                &InterfaceId::lut(remaining as u64),
                &pm,
                or_token.as_ref(),
                session,
            )?;
            or_token = Some(token);
            Expr::map_get(lut, "O")?
        };

        let step = 1u128 << s.min(127);
        let mut next = Vec::with_capacity(width as usize);
        for i in 0..width {
            let right_src = if (i as u128) + step < width as u128 {
                cur[(i as u128 + step) as usize].clone()
            } else {
                fill_right.clone()
            };
            let mut pm = IndexMap::new();
            pm.insert("I0".to_string(), cur[i as usize].clone());
            pm.insert("I1".to_string(), right_src);
            pm.insert("S".to_string(), select.clone());
            let (mux, token) = realize(arch, &mux2, &pm, mux_token.as_ref(), session)?;
            mux_token = Some(token);
            let right_candidate = Expr::map_get(mux, "O")?;

            let left_src = if (i as u128) >= step {
                cur[(i as u128 - step) as usize].clone()
            } else {
                Expr::constant_u64(0, 1)
            };
            let mut pm = IndexMap::new();
            pm.insert("I0".to_string(), cur[i as usize].clone());
            pm.insert("I1".to_string(), left_src);
            pm.insert("S".to_string(), select.clone());
            let (mux, token) = realize(arch, &mux2, &pm, mux_token.as_ref(), session)?;
            mux_token = Some(token);
            let left_candidate = Expr::map_get(mux, "O")?;

            next.push(Expr::mux(
                Expr::symbol(direction, 1),
                left_candidate,
                right_candidate,
            )?);
        }
        cur = next;
    }

    let out = Expr::concat(cur.into_iter().rev().collect())?;
    let data = InternalData::Tuple(vec![
        InternalData::Leaf(ext_a),
        InternalData::Leaf(ext_b),
        InternalData::Leaf(arith),
        InternalData::Leaf(direction),
        mux_token.expect("width is nonzero"),
        or_token.expect("a final stage always exists"),
    ]);
    Ok((out, data))
}

type Unpacked = (
    SymbolId,
    SymbolId,
    SymbolId,
    SymbolId,
    Option<InternalData>,
    Option<InternalData>,
);

fn unpack(internal: Option<&InternalData>, session: &mut Session) -> Result<Unpacked, SynthError> {
    match internal {
        Some(token) => {
            let parts = token.tuple_n(6, "shift sketch")?;
            Ok((
                parts[0].leaf("value extension mode")?,
                parts[1].leaf("amount extension mode")?,
                parts[2].leaf("logical-or-arithmetic hole")?,
                parts[3].leaf("direction hole")?,
                Some(parts[4].clone()),
                Some(parts[5].clone()),
            ))
        }
        None => Ok((
            session.fresh_bool("ext_mode_a"),
            session.fresh_bool("ext_mode_b"),
            session.fresh_bool("logical_or_arithmetic"),
            session.fresh_bool("shift_direction"),
            None,
            None,
        )),
    }
}
