//! The bitwise sketch generator.
//!
//! One `LUT{n_inputs}` per bit position, every LUT sharing one truth-table
//! token. Two boolean holes choose forward or reverse order for the
//! logical-to-physical and physical-to-logical routing permutations.

use crate::error::SynthError;
use crate::internal_data::InternalData;
use crate::realize::realize;
use crate::routing::Permutation;
use crate::sketch::{check_inputs, extend_choice, fresh_extension_modes};
use indexmap::IndexMap;
use tessera_arch::{ArchitectureDescription, InterfaceId};
use tessera_ir::{Expr, Session, SymbolId};

/// Generates a per-bit LUT sketch over `n_inputs` logical inputs.
///
/// The result is a `width`-bit expression. The internal-data token captures
/// the extension-mode holes, both permutation holes, and the shared LUT
/// token; threading it back recreates the sketch without fresh allocations.
pub fn bitwise(
    arch: &ArchitectureDescription,
    inputs: &[Expr],
    n_inputs: usize,
    width: u32,
    internal: Option<&InternalData>,
    session: &mut Session,
) -> Result<(Expr, InternalData), SynthError> {
    check_inputs(inputs, n_inputs, width)?;

    let (ext_modes, in_rev, out_rev, mut lut_token) = unpack(internal, n_inputs, session)?;

    let extended = inputs
        .iter()
        .zip(&ext_modes)
        .map(|(x, mode)| extend_choice(x, width, *mode))
        .collect::<Result<Vec<_>, _>>()?;

    let lut_id = InterfaceId::lut(n_inputs as u64);
    let mut bits = Vec::with_capacity(width as usize);
    for i in 0..width {
        let forward = lut_at(arch, &lut_id, &extended, Permutation::Bitwise.position(i, width), lut_token.as_ref(), session)?;
        lut_token = Some(forward.1);
        let reverse = lut_at(arch, &lut_id, &extended, Permutation::BitwiseReverse.position(i, width), lut_token.as_ref(), session)?;
        lut_token = Some(reverse.1);
        bits.push(Expr::mux(Expr::symbol(in_rev, 1), reverse.0, forward.0)?);
    }

    let assembled_forward = Permutation::Bitwise.assemble(&bits)?;
    let assembled_reverse = Permutation::BitwiseReverse.assemble(&bits)?;
    let out = Expr::mux(Expr::symbol(out_rev, 1), assembled_reverse, assembled_forward)?;

    let data = InternalData::Tuple(vec![
        InternalData::Tuple(ext_modes.into_iter().map(InternalData::Leaf).collect()),
        InternalData::Leaf(in_rev),
        InternalData::Leaf(out_rev),
        lut_token.expect("width is nonzero"),
    ]);
    Ok((out, data))
}

/// One LUT reading bit `pos` of every extended input.
fn lut_at(
    arch: &ArchitectureDescription,
    lut_id: &InterfaceId,
    extended: &[Expr],
    pos: u32,
    token: Option<&InternalData>,
    session: &mut Session,
) -> Result<(Expr, InternalData), SynthError> {
    let mut pm = IndexMap::new();
    for (j, input) in extended.iter().enumerate() {
        pm.insert(format!("I{j}"), Expr::bit(pos, input.clone())?);
    }
    let (lut, token) = realize(arch, lut_id, &pm, token, session)?;
    Ok((Expr::map_get(lut, "O")?, token))
}

type Unpacked = (Vec<SymbolId>, SymbolId, SymbolId, Option<InternalData>);

fn unpack(
    internal: Option<&InternalData>,
    n_inputs: usize,
    session: &mut Session,
) -> Result<Unpacked, SynthError> {
    match internal {
        Some(token) => {
            let parts = token.tuple_n(4, "bitwise sketch")?;
            let ext_modes = parts[0]
                .tuple_n(n_inputs, "bitwise extension modes")?
                .iter()
                .map(|d| d.leaf("bitwise extension mode"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((
                ext_modes,
                parts[1].leaf("bitwise input permutation")?,
                parts[2].leaf("bitwise output permutation")?,
                Some(parts[3].clone()),
            ))
        }
        None => Ok((
            fresh_extension_modes(session, n_inputs),
            session.fresh_bool("route_in_rev"),
            session.fresh_bool("route_out_rev"),
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arch::load_architecture_from_str;

    const LUT4_ONLY: &str = r#"
name: lut4_only
implementations:
  - interface: {name: LUT, parameters: {num_inputs: 4}}
    modules:
      - module_name: LUT4
        filepath: prims/LUT4.v
        ports:
          - {name: A, value: I0, direction: input, bitwidth: 1}
          - {name: B, value: I1, direction: input, bitwidth: 1}
          - {name: C, value: I2, direction: input, bitwidth: 1}
          - {name: D, value: I3, direction: input, bitwidth: 1}
          - {name: Z, value: Z, direction: output, bitwidth: 1}
        parameters:
          - {name: INIT, value: INIT}
    internal_data: {INIT: 16}
    outputs: {O: Z}
"#;

    fn ab(width: u32) -> Vec<Expr> {
        vec![Expr::var("a", width), Expr::var("b", width)]
    }

    #[test]
    fn output_width_matches_request() {
        let arch = load_architecture_from_str(LUT4_ONLY).unwrap();
        let mut session = Session::new();
        let (out, _) = bitwise(&arch, &ab(8), 2, 8, None, &mut session).unwrap();
        assert_eq!(out.width(), Some(8));
    }

    #[test]
    fn one_truth_table_for_the_whole_slice() {
        let arch = load_architecture_from_str(LUT4_ONLY).unwrap();
        let mut session = Session::new();
        let (out, data) = bitwise(&arch, &ab(8), 2, 8, None, &mut session).unwrap();

        // Holes: 2 extension modes + 2 permutation choices + 1 shared INIT.
        assert_eq!(out.symbols().len(), 5);
        let parts = data.tuple_n(4, "t").unwrap();
        let lut_fields = parts[3].fields("t").unwrap();
        assert_eq!(lut_fields.len(), 1);
        assert_eq!(session.sort_of(lut_fields[0].1).width(), 16);
    }

    #[test]
    fn narrower_inputs_are_extended() {
        let arch = load_architecture_from_str(LUT4_ONLY).unwrap();
        let mut session = Session::new();
        let inputs = vec![Expr::var("a", 8), Expr::var("b", 3)];
        let (out, _) = bitwise(&arch, &inputs, 2, 8, None, &mut session).unwrap();
        assert_eq!(out.width(), Some(8));
    }

    #[test]
    fn token_reuse_shares_all_holes() {
        let arch = load_architecture_from_str(LUT4_ONLY).unwrap();
        let mut session = Session::new();
        let (first, token) = bitwise(&arch, &ab(4), 2, 4, None, &mut session).unwrap();
        let allocated = session.len();

        let (second, _) = bitwise(&arch, &ab(4), 2, 4, Some(&token), &mut session).unwrap();
        assert_eq!(session.len(), allocated);
        let first_syms: std::collections::HashSet<_> = first.symbols().into_iter().collect();
        for sym in second.symbols() {
            assert!(first_syms.contains(&sym));
        }
    }

    #[test]
    fn shape_is_deterministic() {
        let arch = load_architecture_from_str(LUT4_ONLY).unwrap();
        let mut s1 = Session::new();
        let (_, d1) = bitwise(&arch, &ab(4), 2, 4, None, &mut s1).unwrap();
        let mut s2 = Session::new();
        let (_, d2) = bitwise(&arch, &ab(4), 2, 4, None, &mut s2).unwrap();
        assert!(d1.same_shape(&d2));
    }

    #[test]
    fn arity_mismatch_rejected() {
        let arch = load_architecture_from_str(LUT4_ONLY).unwrap();
        let mut session = Session::new();
        let err = bitwise(&arch, &ab(4), 3, 4, None, &mut session).unwrap_err();
        assert!(matches!(err, SynthError::InputCount { .. }));
    }
}
