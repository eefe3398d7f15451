//! The comparison sketch generator.
//!
//! Two independent bitwise sketches (their truth tables may differ) drive
//! the carry's `DI` and `S` inputs; `CI` is a fresh hole. The result is the
//! carry's 1-bit `CO`, which a solver programs into an equality or ordering
//! test: `S` decides where the carry propagates, `DI` decides what is
//! injected where it does not.

use crate::bitwise::bitwise;
use crate::error::SynthError;
use crate::internal_data::InternalData;
use crate::realize::realize;
use crate::sketch::check_inputs;
use indexmap::IndexMap;
use tessera_arch::{ArchitectureDescription, InterfaceId};
use tessera_ir::{Expr, Session, SymbolId};

/// Generates a comparison sketch producing one bit.
pub fn comparison(
    arch: &ArchitectureDescription,
    inputs: &[Expr],
    n_inputs: usize,
    width: u32,
    internal: Option<&InternalData>,
    session: &mut Session,
) -> Result<(Expr, InternalData), SynthError> {
    check_inputs(inputs, n_inputs, width)?;

    let (di_token, s_token, ci, carry_token) = unpack(internal, session)?;

    let (di, di_data) = bitwise(arch, inputs, n_inputs, width, di_token.as_ref(), session)?;
    let (s, s_data) = bitwise(arch, inputs, n_inputs, width, s_token.as_ref(), session)?;

    let mut pm = IndexMap::new();
    pm.insert("CI".to_string(), Expr::symbol(ci, 1));
    pm.insert("DI".to_string(), di);
    pm.insert("S".to_string(), s);
    let (carry, carry_data) = realize(
        arch,
        &InterfaceId::carry(width as u64),
        &pm,
        carry_token.as_ref(),
        session,
    )?;

    let out = Expr::map_get(carry, "CO")?;
    let data = InternalData::Tuple(vec![
        di_data,
        s_data,
        InternalData::Leaf(ci),
        carry_data,
    ]);
    Ok((out, data))
}

type Unpacked = (
    Option<InternalData>,
    Option<InternalData>,
    SymbolId,
    Option<InternalData>,
);

fn unpack(internal: Option<&InternalData>, session: &mut Session) -> Result<Unpacked, SynthError> {
    match internal {
        Some(token) => {
            let parts = token.tuple_n(4, "comparison sketch")?;
            Ok((
                Some(parts[0].clone()),
                Some(parts[1].clone()),
                parts[2].leaf("carry-in hole")?,
                Some(parts[3].clone()),
            ))
        }
        None => Ok((None, None, session.fresh_bitvec("carry_in", 1), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arch::load_architecture_from_str;

    const XCUP_LIKE: &str = r#"
name: xcup_like
implementations:
  - interface: {name: LUT, parameters: {num_inputs: 2}}
    modules:
      - module_name: LUT2
        filepath: prims/LUT2.v
        ports:
          - {name: I0, value: I0, direction: input, bitwidth: 1}
          - {name: I1, value: I1, direction: input, bitwidth: 1}
          - {name: O, value: O, direction: output, bitwidth: 1}
        parameters:
          - {name: INIT, value: INIT}
    internal_data: {INIT: 4}
    outputs: {O: O}
  - interface: {name: carry, parameters: {width: 8}}
    modules:
      - module_name: CARRY8
        filepath: prims/CARRY8.v
        ports:
          - {name: CI, value: CI, direction: input, bitwidth: 1}
          - {name: DI, value: DI, direction: input, bitwidth: 8}
          - {name: S, value: S, direction: input, bitwidth: 8}
          - {name: O, value: O, direction: output, bitwidth: 8}
          - {name: CO, value: CO, direction: output, bitwidth: 8}
    internal_data: {}
    outputs:
      O: O
      CO: (bit 7 CO)
"#;

    fn ab(width: u32) -> Vec<Expr> {
        vec![Expr::var("a", width), Expr::var("b", width)]
    }

    #[test]
    fn result_is_one_bit() {
        let arch = load_architecture_from_str(XCUP_LIKE).unwrap();
        let mut session = Session::new();
        let (out, _) = comparison(&arch, &ab(8), 2, 8, None, &mut session).unwrap();
        assert_eq!(out.width(), Some(1));
    }

    #[test]
    fn two_independent_truth_tables() {
        let arch = load_architecture_from_str(XCUP_LIKE).unwrap();
        let mut session = Session::new();
        let (_, data) = comparison(&arch, &ab(8), 2, 8, None, &mut session).unwrap();
        let parts = data.tuple_n(4, "t").unwrap();
        let di_init = parts[0].tuple_n(4, "t").unwrap()[3].fields("t").unwrap()[0].1;
        let s_init = parts[1].tuple_n(4, "t").unwrap()[3].fields("t").unwrap()[0].1;
        assert_ne!(di_init, s_init, "DI and S sketches must not share tables");
    }

    #[test]
    fn shape_is_deterministic() {
        let arch = load_architecture_from_str(XCUP_LIKE).unwrap();
        let mut s1 = Session::new();
        let (_, d1) = comparison(&arch, &ab(8), 2, 8, None, &mut s1).unwrap();
        let mut s2 = Session::new();
        let (_, d2) = comparison(&arch, &ab(8), 2, 8, None, &mut s2).unwrap();
        assert!(d1.same_shape(&d2));
    }

    #[test]
    fn token_reuse_allocates_nothing() {
        let arch = load_architecture_from_str(XCUP_LIKE).unwrap();
        let mut session = Session::new();
        let (_, token) = comparison(&arch, &ab(8), 2, 8, None, &mut session).unwrap();
        let allocated = session.len();
        comparison(&arch, &ab(8), 2, 8, Some(&token), &mut session).unwrap();
        assert_eq!(session.len(), allocated);
    }
}
