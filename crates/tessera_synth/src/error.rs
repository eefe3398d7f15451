//! Error types for interface synthesis and sketch generation.

use tessera_arch::ArchError;
use tessera_ir::IrError;

/// Errors raised by the synthesizer, the sketch generators, and the solver
/// interface.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The architecture offers neither the requested interface nor any
    /// composition that could realize it.
    #[error("interface {id} is not realizable under architecture {arch:?}")]
    InterfaceNotRealizable {
        /// The requested interface.
        id: String,
        /// The architecture name.
        arch: String,
    },

    /// The recursion budget was exhausted while composing an interface.
    ///
    /// Some fabrics send LUT composition into a loop (a larger LUT built
    /// from muxes whose muxes are built from larger LUTs); the depth limit
    /// turns that loop into an error.
    #[error("recursion depth limit exceeded while realizing {id} on {arch:?}")]
    DepthLimit {
        /// The interface being realized when the budget ran out.
        id: String,
        /// The architecture name.
        arch: String,
    },

    /// A threaded internal-data token does not match the synthesis path.
    ///
    /// Tokens may only be threaded back into a call that takes the same
    /// path as the call that produced them.
    #[error("internal data does not match the synthesis path at {context}")]
    InternalDataShape {
        /// Where the mismatch was detected.
        context: &'static str,
    },

    /// A port map is missing an interface input.
    #[error("port map is missing interface input {port:?}")]
    MissingPort {
        /// The absent port name.
        port: String,
    },

    /// A sketch generator was handed the wrong number of logical inputs.
    #[error("sketch generator expected {expected} logical inputs, found {found}")]
    InputCount {
        /// The declared input count.
        expected: usize,
        /// The number of inputs supplied.
        found: usize,
    },

    /// A sketch generator was asked for a zero-width result.
    #[error("sketch generators require a width of at least one bit")]
    ZeroWidth,

    /// The solver proved the sketch family cannot implement the
    /// specification on this architecture.
    #[error("no mapping found for this sketch family on this architecture")]
    NoMapping,

    /// The solver gave up without an answer; the reason is passed through
    /// verbatim.
    #[error("solver returned unknown: {0}")]
    SolverUnknown(String),

    /// An expression form the SMT-LIB emitter cannot render (module
    /// instances must be expanded through a semantics table first).
    #[error("cannot emit {what} to SMT-LIB")]
    EmitUnsupported {
        /// The unsupported construct.
        what: &'static str,
    },

    /// An architecture description error.
    #[error(transparent)]
    Arch(#[from] ArchError),

    /// An IR construction error.
    #[error(transparent)]
    Ir(#[from] IrError),
}
