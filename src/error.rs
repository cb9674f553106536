//! Error types for the structural model builder

use thiserror::Error;

/// Broad family an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, surfaced before anything reaches the engine
    Validation,
    /// Operation not allowed in the model's current lifecycle state
    State,
    /// The external engine rejected a command
    Engine,
    /// Reading or writing configuration/results failed
    Io,
}

/// Main error type for model building and staging
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Missing required argument '{key}'")]
    MissingArgument { key: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Length mismatch for {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Node with ID {0} not found")]
    NodeNotFound(u32),

    #[error("Node reference {0} has not been resolved against the model")]
    UnresolvedNode(u32),

    #[error("Element {0} not found in model")]
    ElementNotFound(u32),

    #[error("Section '{0}' not found in model")]
    SectionNotFound(String),

    #[error("Time series {0} not found in model")]
    TimeSeriesNotFound(u32),

    #[error("Load pattern {0} not found in model")]
    PatternNotFound(u32),

    #[error("Duplicate {category} tag {tag}")]
    DuplicateTag { category: &'static str, tag: u32 },

    #[error("Model contains {0} unconverted line element(s); convert them before building")]
    UnconvertedLineElements(usize),

    #[error("No section mapping or default for line element types: {0:?}")]
    UnmappedLineTypes(Vec<String>),

    #[error("No time series defined for load pattern {pattern}")]
    MissingTimeSeries { pattern: u32 },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unknown structural element type '{0}'")]
    UnknownStructuralType(String),

    #[error("{entity} has already been realized and can no longer be modified")]
    AlreadyRealized { entity: String },

    #[error("Cannot {operation} after the model has been built")]
    ModelBuilt { operation: &'static str },

    #[error("Node {node} is still used by element {element}")]
    NodeInUse { node: u32, element: u32 },

    #[error("Engine not initialized; build the model before calling {operation}")]
    EngineNotInitialized { operation: &'static str },

    #[error("Engine rejected '{command}': {message}")]
    Engine { command: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BuildError {
    /// Family of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRealized { .. }
            | Self::ModelBuilt { .. }
            | Self::NodeInUse { .. }
            | Self::EngineNotInitialized { .. } => ErrorKind::State,
            Self::Engine { .. } => ErrorKind::Engine,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Io,
            _ => ErrorKind::Validation,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn length_mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::LengthMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}

/// Result type for builder operations
pub type BuildResult<T> = Result<T, BuildError>;
