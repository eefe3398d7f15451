//! Fresh symbolic values and the per-session allocator.
//!
//! Symbolic values are the "holes" of a sketch: LUT truth tables, mux
//! selectors, carry-in bits, and angelic choices. A [`Session`] owns the
//! ambient allocator for one synthesis session; allocation order is total
//! within a session, and parallel sessions each own a disjoint allocator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessera_common::Bits;

/// An opaque identifier for a symbolic value within one [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Creates a `SymbolId` from a raw index. Intended for deserialization
    /// and testing; normal allocation goes through [`Session`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// The sort of a symbolic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolSort {
    /// A bit-vector of the given width.
    BitVec(u32),
    /// A boolean, represented as one bit in the IR.
    Bool,
}

impl SymbolSort {
    /// The IR width of a value of this sort.
    pub fn width(self) -> u32 {
        match self {
            SymbolSort::BitVec(w) => w,
            SymbolSort::Bool => 1,
        }
    }
}

/// Allocation record for one symbolic value.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymbolInfo {
    name: String,
    sort: SymbolSort,
}

/// The ambient allocator for fresh symbolic values in one synthesis session.
///
/// Every hole created while generating a sketch is recorded here. The
/// solver query is quantified over exactly these symbols; user-declared
/// free variables appear in the IR as named `Var` expressions and are never
/// allocated through a session.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Session {
    symbols: Vec<SymbolInfo>,
}

impl Session {
    /// Creates a new session with an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh bit-vector symbol of the given width.
    ///
    /// The hint becomes part of the symbol's printable name; uniqueness is
    /// provided by the id, not the hint.
    pub fn fresh_bitvec(&mut self, hint: &str, width: u32) -> SymbolId {
        self.alloc(hint, SymbolSort::BitVec(width))
    }

    /// Allocates a fresh boolean symbol.
    pub fn fresh_bool(&mut self, hint: &str) -> SymbolId {
        self.alloc(hint, SymbolSort::Bool)
    }

    fn alloc(&mut self, hint: &str, sort: SymbolSort) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolInfo {
            name: format!("{hint}%{}", id.0),
            sort,
        });
        id
    }

    /// Returns the sort of an allocated symbol.
    ///
    /// # Panics
    ///
    /// Panics if the id was not allocated by this session.
    pub fn sort_of(&self, id: SymbolId) -> SymbolSort {
        self.info(id).sort
    }

    /// Returns the printable name of an allocated symbol.
    ///
    /// # Panics
    ///
    /// Panics if the id was not allocated by this session.
    pub fn name_of(&self, id: SymbolId) -> &str {
        &self.info(id).name
    }

    /// Returns the number of symbols allocated so far.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if no symbols have been allocated.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterates over all allocated symbol ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.symbols.len() as u32).map(SymbolId)
    }

    /// Returns `true` if this session allocated the given id.
    pub fn contains(&self, id: SymbolId) -> bool {
        (id.0 as usize) < self.symbols.len()
    }

    fn info(&self, id: SymbolId) -> &SymbolInfo {
        assert!(
            (id.0 as usize) < self.symbols.len(),
            "symbol {id:?} was not allocated by this session"
        );
        &self.symbols[id.0 as usize]
    }
}

/// A hole assignment, as returned by a solver.
///
/// Maps symbol ids to concrete bit-vector values. Boolean symbols are
/// stored as 1-bit values.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    values: HashMap<SymbolId, Bits>,
}

impl Model {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a bit-vector value to a symbol.
    pub fn assign(&mut self, id: SymbolId, value: Bits) {
        self.values.insert(id, value);
    }

    /// Assigns a boolean value to a symbol, stored as one bit.
    pub fn assign_bool(&mut self, id: SymbolId, value: bool) {
        self.values.insert(id, Bits::from_bool(value));
    }

    /// Looks up the value assigned to a symbol.
    pub fn get(&self, id: SymbolId) -> Option<&Bits> {
        self.values.get(&id)
    }

    /// Returns the number of assigned symbols.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no symbols are assigned.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_ordered() {
        let mut s = Session::new();
        let a = s.fresh_bitvec("init", 16);
        let b = s.fresh_bool("sel");
        assert!(a.as_raw() < b.as_raw());
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn sorts_and_names() {
        let mut s = Session::new();
        let a = s.fresh_bitvec("init", 16);
        let b = s.fresh_bool("sel");
        assert_eq!(s.sort_of(a), SymbolSort::BitVec(16));
        assert_eq!(s.sort_of(b), SymbolSort::Bool);
        assert_eq!(s.sort_of(b).width(), 1);
        assert!(s.name_of(a).starts_with("init%"));
    }

    #[test]
    fn sessions_are_disjoint() {
        let mut s1 = Session::new();
        let mut s2 = Session::new();
        let a = s1.fresh_bool("x");
        let b = s2.fresh_bool("y");
        // Ids collide across sessions by construction; they are only
        // meaningful relative to their own allocator.
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    #[should_panic(expected = "not allocated")]
    fn foreign_id_panics() {
        let s = Session::new();
        s.sort_of(SymbolId::from_raw(3));
    }

    #[test]
    fn model_assign_and_get() {
        let mut m = Model::new();
        let id = SymbolId::from_raw(0);
        m.assign(id, Bits::from_u64(0x8, 4));
        assert_eq!(m.get(id).unwrap().to_u64(), Some(0x8));
        assert!(m.get(SymbolId::from_raw(1)).is_none());
    }

    #[test]
    fn model_bool_is_one_bit() {
        let mut m = Model::new();
        let id = SymbolId::from_raw(0);
        m.assign_bool(id, true);
        assert_eq!(m.get(id).unwrap().width(), 1);
    }

    #[test]
    fn ids_iterates_in_order() {
        let mut s = Session::new();
        s.fresh_bool("a");
        s.fresh_bool("b");
        let raws: Vec<u32> = s.ids().map(SymbolId::as_raw).collect();
        assert_eq!(raws, vec![0, 1]);
    }
}
