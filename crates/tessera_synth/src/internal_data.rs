//! Internal-data tokens: shared symbolic state across instantiations.
//!
//! A token is an opaque algebraic tree whose leaves are the symbolic values
//! bound to fabric-programmable state (truth tables, carry padding bits,
//! selection booleans). The tree's shape is a deterministic function of the
//! synthesis path; a token produced by one call can be threaded into a
//! subsequent call taking the same path, making the two instantiations
//! share their symbols.

use crate::error::SynthError;
use serde::{Deserialize, Serialize};
use tessera_ir::SymbolId;

/// The symbolic state threaded through a realization or sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternalData {
    /// A single symbolic value (padding bits, mode choices).
    Leaf(SymbolId),
    /// One implementation's internal-state bindings, in schema order.
    Fields(Vec<(String, SymbolId)>),
    /// A fixed-arity grouping of sub-tokens.
    Tuple(Vec<InternalData>),
}

impl InternalData {
    /// Unwraps a [`InternalData::Leaf`].
    pub fn leaf(&self, context: &'static str) -> Result<SymbolId, SynthError> {
        match self {
            InternalData::Leaf(id) => Ok(*id),
            _ => Err(SynthError::InternalDataShape { context }),
        }
    }

    /// Unwraps a [`InternalData::Fields`].
    pub fn fields(&self, context: &'static str) -> Result<&[(String, SymbolId)], SynthError> {
        match self {
            InternalData::Fields(fields) => Ok(fields),
            _ => Err(SynthError::InternalDataShape { context }),
        }
    }

    /// Unwraps a [`InternalData::Tuple`] of exactly `n` elements.
    pub fn tuple_n(&self, n: usize, context: &'static str) -> Result<&[InternalData], SynthError> {
        match self {
            InternalData::Tuple(items) if items.len() == n => Ok(items),
            _ => Err(SynthError::InternalDataShape { context }),
        }
    }

    /// Collects every symbol in the tree, leaves first, in structural
    /// order.
    pub fn symbols(&self) -> Vec<SymbolId> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<SymbolId>) {
        match self {
            InternalData::Leaf(id) => out.push(*id),
            InternalData::Fields(fields) => out.extend(fields.iter().map(|(_, id)| *id)),
            InternalData::Tuple(items) => {
                for item in items {
                    item.collect(out);
                }
            }
        }
    }

    /// Compares tree shapes, ignoring the symbol ids at the leaves.
    ///
    /// Two tokens with equal shapes were produced by the same synthesis
    /// path.
    pub fn same_shape(&self, other: &InternalData) -> bool {
        match (self, other) {
            (InternalData::Leaf(_), InternalData::Leaf(_)) => true,
            (InternalData::Fields(a), InternalData::Fields(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|((an, _), (bn, _))| an == bn)
            }
            (InternalData::Tuple(a), InternalData::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
            }
            _ => false,
        }
    }
}
