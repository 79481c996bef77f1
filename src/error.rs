use thiserror::Error;

use crate::operations::ResultCode;

/// Top-level error type for the brepweld kernel.
#[derive(Debug, Error)]
pub enum BrepError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Naming(#[from] NamingError),
}

impl BrepError {
    /// Maps the error onto the result code reported to callers.
    #[must_use]
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Topology(_) | Self::Naming(_) => ResultCode::TopologyError,
            Self::Operation(OperationError::Cancelled) => ResultCode::Cancelled,
            Self::Geometry(_)
            | Self::History(_)
            | Self::Operation(OperationError::InvalidInput(_) | OperationError::Failed(_)) => {
                ResultCode::InvalidInput
            }
        }
    }
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised when a topological invariant would be violated.
///
/// A mutator returning one of these has left the store unchanged.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("edge would carry {uses} face usages (at most 2 allowed)")]
    NonManifoldEdge { uses: usize },

    #[error("inconsistent adjacency: {0}")]
    InconsistentAdjacency(String),

    #[error("degenerate loop: {0}")]
    DegenerateLoop(String),

    #[error("loop is not closed")]
    LoopNotClosed,
}

/// Errors related to modeling operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors related to the operation history tree.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("unknown creator handle")]
    UnknownCreator,

    #[error("creator is still referenced by {count} downstream creator(s)")]
    StillReferenced { count: usize },

    #[error("invalid operands: {0}")]
    InvalidOperands(String),
}

/// Errors related to persistent naming.
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("naming rule index range {start}..{end} exhausted")]
    IndexRangeExhausted { start: u32, end: u32 },
}

/// Convenience type alias for results using [`BrepError`].
pub type Result<T> = std::result::Result<T, BrepError>;
