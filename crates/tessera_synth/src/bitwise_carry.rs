//! The bitwise-with-carry sketch generator.
//!
//! A bitwise sketch drives the `S` input of a `carry{width}`; logical input
//! 0 (extended) drives `DI`; `CI` is a fresh 1-bit hole. The result is the
//! carry's per-lane output `O`. This is the sketch family that maps
//! additions and subtractions onto carry chains.

use crate::bitwise::bitwise;
use crate::error::SynthError;
use crate::internal_data::InternalData;
use crate::realize::realize;
use crate::sketch::{check_inputs, extend_choice};
use indexmap::IndexMap;
use tessera_arch::{ArchitectureDescription, InterfaceId};
use tessera_ir::{Expr, Session, SymbolId};

/// Generates a carry-chain sketch over `n_inputs` logical inputs.
pub fn bitwise_with_carry(
    arch: &ArchitectureDescription,
    inputs: &[Expr],
    n_inputs: usize,
    width: u32,
    internal: Option<&InternalData>,
    session: &mut Session,
) -> Result<(Expr, InternalData), SynthError> {
    check_inputs(inputs, n_inputs, width)?;

    let (bw_token, di_mode, ci, carry_token) = unpack(internal, session)?;

    let (s, bw_data) = bitwise(arch, inputs, n_inputs, width, bw_token.as_ref(), session)?;
    let di = extend_choice(&inputs[0], width, di_mode)?;

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

    let out = Expr::map_get(carry, "O")?;
    let data = InternalData::Tuple(vec![
        bw_data,
        InternalData::Leaf(di_mode),
        InternalData::Leaf(ci),
        carry_data,
    ]);
    Ok((out, data))
}

type Unpacked = (Option<InternalData>, SymbolId, SymbolId, Option<InternalData>);

fn unpack(internal: Option<&InternalData>, session: &mut Session) -> Result<Unpacked, SynthError> {
    match internal {
        Some(token) => {
            let parts = token.tuple_n(4, "bitwise-with-carry sketch")?;
            Ok((
                Some(parts[0].clone()),
                parts[1].leaf("DI extension mode")?,
                parts[2].leaf("carry-in hole")?,
                Some(parts[3].clone()),
            ))
        }
        None => Ok((
            None,
            session.fresh_bool("di_ext_mode"),
            session.fresh_bitvec("carry_in", 1),
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_arch::load_architecture_from_str;

    const ECP5_LIKE: &str = r#"
name: ecp5_like
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
  - interface: {name: carry, parameters: {width: 2}}
    modules:
      - module_name: CCU2C
        filepath: prims/CCU2C.v
        ports:
          - {name: CIN, value: CI, direction: input, bitwidth: 1}
          - {name: A0, value: (bit 0 DI), direction: input, bitwidth: 1}
          - {name: B0, value: (bit 0 S), direction: input, bitwidth: 1}
          - {name: A1, value: (bit 1 DI), direction: input, bitwidth: 1}
          - {name: B1, value: (bit 1 S), direction: input, bitwidth: 1}
          - {name: S0, value: S0, direction: output, bitwidth: 1}
          - {name: S1, value: S1, direction: output, bitwidth: 1}
          - {name: COUT, value: COUT, direction: output, bitwidth: 1}
        parameters:
          - {name: INIT0, value: INIT0}
          - {name: INIT1, value: INIT1}
    internal_data: {INIT0: 16, INIT1: 16}
    outputs:
      O: (concat S1 S0)
      CO: COUT
"#;

    fn ab(width: u32) -> Vec<Expr> {
        vec![Expr::var("a", width), Expr::var("b", width)]
    }

    #[test]
    fn adds_on_retiled_carry() {
        let arch = load_architecture_from_str(ECP5_LIKE).unwrap();
        let mut session = Session::new();
        let (out, data) = bitwise_with_carry(&arch, &ab(3), 2, 3, None, &mut session).unwrap();
        assert_eq!(out.width(), Some(3));
        // Token: bitwise data, DI mode, CI, carry data.
        assert_eq!(data.tuple_n(4, "t").unwrap().len(), 4);
    }

    #[test]
    fn shape_is_deterministic() {
        let arch = load_architecture_from_str(ECP5_LIKE).unwrap();
        let mut s1 = Session::new();
        let (_, d1) = bitwise_with_carry(&arch, &ab(3), 2, 3, None, &mut s1).unwrap();
        let mut s2 = Session::new();
        let (_, d2) = bitwise_with_carry(&arch, &ab(3), 2, 3, None, &mut s2).unwrap();
        assert!(d1.same_shape(&d2));
    }

    #[test]
    fn token_reuse_allocates_nothing() {
        let arch = load_architecture_from_str(ECP5_LIKE).unwrap();
        let mut session = Session::new();
        let (_, token) = bitwise_with_carry(&arch, &ab(4), 2, 4, None, &mut session).unwrap();
        let allocated = session.len();
        bitwise_with_carry(&arch, &ab(4), 2, 4, Some(&token), &mut session).unwrap();
        assert_eq!(session.len(), allocated);
    }

    #[test]
    fn carry_in_is_a_single_bit_hole() {
        let arch = load_architecture_from_str(ECP5_LIKE).unwrap();
        let mut session = Session::new();
        let (_, data) = bitwise_with_carry(&arch, &ab(2), 2, 2, None, &mut session).unwrap();
        let parts = data.tuple_n(4, "t").unwrap();
        let ci = parts[2].leaf("t").unwrap();
        assert_eq!(session.sort_of(ci).width(), 1);
    }
}
