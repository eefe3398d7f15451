//! Shared machinery for the sketch generators.
//!
//! All generators share one signature: `(arch, logical_inputs, n_inputs,
//! width, internal_data, session)` to `(expr, internal_data)`. Logical
//! inputs are treated as `width`-bit values; narrower inputs are widened by
//! [`extend_choice`], which leaves the zero-vs-duplicate decision to a
//! boolean hole so the solver picks whichever matches the target
//! semantics.

use crate::error::SynthError;
use tessera_ir::{Expr, Session, SymbolId};

/// Widens `input` to `width` bits, choosing between zero extension and
/// MSB-duplicating extension with the boolean hole `mode` (`1` duplicates).
pub fn extend_choice(input: &Expr, width: u32, mode: SymbolId) -> Result<Expr, SynthError> {
    let zext = Expr::zero_extend(input.clone(), width)?;
    let dext = Expr::dup_extend(input.clone(), width)?;
    Ok(Expr::mux(Expr::symbol(mode, 1), dext, zext)?)
}

/// Checks a generator's logical-input list against its declared arity.
pub fn check_inputs(inputs: &[Expr], n_inputs: usize, width: u32) -> Result<(), SynthError> {
    if width == 0 {
        return Err(SynthError::ZeroWidth);
    }
    if inputs.len() != n_inputs {
        return Err(SynthError::InputCount {
            expected: n_inputs,
            found: inputs.len(),
        });
    }
    Ok(())
}

/// Allocates one extension-mode hole per logical input.
pub fn fresh_extension_modes(session: &mut Session, n_inputs: usize) -> Vec<SymbolId> {
    (0..n_inputs)
        .map(|i| session.fresh_bool(&format!("ext_mode{i}")))
        .collect()
}
