//! Error types for architecture descriptions and the wiring DSL.

use tessera_ir::IrError;

/// Errors raised while loading, validating, or evaluating architecture
/// descriptions.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// An I/O error occurred while reading a description file.
    #[error("failed to read architecture description: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML content could not be parsed against the expected schema.
    #[error("failed to parse architecture description: {0}")]
    Parse(String),

    /// An interface name other than `LUT`, `MUX`, or `carry`.
    #[error("unknown interface kind {0:?}")]
    UnknownInterface(String),

    /// A port direction other than `input` or `output`.
    #[error("port {port:?} has unknown direction {direction:?}")]
    UnknownDirection {
        /// The port name.
        port: String,
        /// The offending direction string.
        direction: String,
    },

    /// An implementation with a module count other than one.
    #[error("implementation of {interface} has {count} modules; exactly one is supported")]
    ModuleCount {
        /// The interface being implemented.
        interface: String,
        /// The number of modules found.
        count: usize,
    },

    /// A wiring-DSL expression that could not be parsed.
    #[error("cannot parse wiring expression {text:?}: {message}")]
    WiringParse {
        /// The offending source text.
        text: String,
        /// What went wrong.
        message: String,
    },

    /// A wiring-DSL symbol with no binding in the port map or internal
    /// state.
    #[error("wiring symbol {0:?} is not bound by the port map or internal state")]
    UnresolvedSymbol(String),

    /// A wiring expression or projection whose width disagrees with the
    /// declaration it drives.
    #[error("width mismatch in {context}: expected {expected} bits, found {found}")]
    WidthMismatch {
        /// What was being checked.
        context: String,
        /// The declared width.
        expected: u32,
        /// The computed width.
        found: u32,
    },

    /// A required interface parameter is missing from an identifier.
    #[error("interface {interface} is missing parameter {param:?}")]
    MissingParameter {
        /// The interface identifier.
        interface: String,
        /// The missing parameter name.
        param: String,
    },

    /// An IR construction error while evaluating a wiring expression.
    #[error(transparent)]
    Ir(#[from] IrError),
}
