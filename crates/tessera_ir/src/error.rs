//! Error types for IR construction and manipulation.

use crate::symbolic::SymbolId;

/// Errors raised while constructing or transforming IR expressions.
///
/// Width mismatches are checked eagerly at construction time, so a sketch
/// that builds at all is structurally well-formed.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// Two operands that must agree in width do not.
    #[error("width mismatch in {context}: expected {expected} bits, found {found}")]
    WidthMismatch {
        /// The operation being constructed.
        context: &'static str,
        /// The width required by the other operand or declaration.
        expected: u32,
        /// The width actually supplied.
        found: u32,
    },

    /// An operand has no scalar width (a map, list, or instance) where one
    /// is required.
    #[error("operand of {context} has no scalar width")]
    WidthlessOperand {
        /// The operation being constructed.
        context: &'static str,
    },

    /// An extract range is inverted or exceeds the operand width.
    #[error("invalid extract [{hi}:{lo}] on an expression of width {width}")]
    InvalidExtract {
        /// High bit of the range.
        hi: u32,
        /// Low bit of the range.
        lo: u32,
        /// Width of the operand.
        width: u32,
    },

    /// An extension was asked to narrow its operand.
    #[error("cannot extend an expression of width {from} down to {to}")]
    NarrowingExtend {
        /// Operand width.
        from: u32,
        /// Requested (smaller) width.
        to: u32,
    },

    /// A concatenation with no parts.
    #[error("concatenation requires at least one part")]
    EmptyConcat,

    /// A map lookup for a key the map literal does not contain.
    #[error("map has no entry for key {key:?}")]
    MissingKey {
        /// The missing key.
        key: String,
    },

    /// A map lookup applied to something that is not a map literal.
    #[error("map lookup applied to a non-map expression")]
    NotAMap,

    /// A list index applied to something that is not a list literal.
    #[error("list index applied to a non-list expression")]
    NotAList,

    /// A list index past the end of the list literal.
    #[error("list index {index} out of range for a list of {len} elements")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The list length.
        len: usize,
    },

    /// An output projection named a port the instance does not expose.
    #[error("module {module:?} has no output port {port:?}")]
    UnknownOutputPort {
        /// The instantiated module name.
        module: String,
        /// The requested port name.
        port: String,
    },

    /// `get_output` applied to an expression that is not a module instance.
    #[error("output projection applied to a non-instance expression")]
    NotAnInstance,

    /// A model substitution found a hole the model does not assign.
    #[error("no model value for symbolic variable {0:?}")]
    UnassignedSymbol(SymbolId),

    /// A model value has a different width than the hole it fills.
    #[error("model value for {symbol:?} has width {found}, expected {expected}")]
    ModelWidthMismatch {
        /// The hole being filled.
        symbol: SymbolId,
        /// The hole's declared width.
        expected: u32,
        /// The model value's width.
        found: u32,
    },

    /// A wire placeholder was never unified with a definition.
    #[error("wire {name:?} was never unified with a definition")]
    UnresolvedWire {
        /// The placeholder's name.
        name: String,
    },

    /// A wire placeholder was unified twice.
    #[error("wire {name:?} is already unified")]
    WireAlreadyUnified {
        /// The placeholder's name.
        name: String,
    },

    /// Resolving a wire reached its own definition again.
    #[error("wire {name:?} is defined in terms of itself")]
    CyclicWire {
        /// The placeholder's name.
        name: String,
    },
}
