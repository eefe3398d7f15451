//! Error types for interpretation.

use tessera_ir::{IrError, SymbolId};

/// Errors raised while expanding primitives or evaluating expressions.
#[derive(Debug, thiserror::Error)]
pub enum InterpError {
    /// A free variable has no binding in the environment.
    #[error("no value bound for free variable {0:?}")]
    UnboundVariable(String),

    /// The expression still contains a hole; complete the sketch with a
    /// solver model before interpreting.
    #[error("expression still contains hole {0:?}")]
    RemainingHole(SymbolId),

    /// The expression contains a placeholder wire; resolve the arena
    /// first.
    #[error("expression contains an unresolved placeholder wire")]
    UnresolvedWire,

    /// No behavioral model registered for an instantiated module.
    #[error("no behavioral model for module {module:?} from {filepath:?}")]
    UnknownModule {
        /// The module name.
        module: String,
        /// The instance's source file.
        filepath: String,
    },

    /// A model expected a port the instance does not drive.
    #[error("module {module:?} is missing input port {port:?}")]
    MissingPort {
        /// The module name.
        module: String,
        /// The absent port.
        port: String,
    },

    /// A model expected a parameter the instance does not bind.
    #[error("module {module:?} is missing parameter {param:?}")]
    MissingParam {
        /// The module name.
        module: String,
        /// The absent parameter.
        param: String,
    },

    /// A scalar value was required but a map or list was produced.
    #[error("expected a bit-vector value in {context}")]
    NotScalar {
        /// Where the composite value appeared.
        context: &'static str,
    },

    /// A map lookup into an evaluated map that lacks the key.
    #[error("evaluated map has no entry {0:?}")]
    MissingKey(String),

    /// An IR construction error during primitive expansion.
    #[error(transparent)]
    Ir(#[from] IrError),
}
