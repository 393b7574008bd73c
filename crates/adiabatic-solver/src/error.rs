//! Error types for the adiabatic solver.

use thiserror::Error;

/// Unified error type for every solver operation.
#[derive(Error, Debug)]
pub enum VqaaError {
    /// A bitstring does not have one bit per graph node.
    #[error("Shape error: bitstring has {actual} bits but the graph has {expected} nodes")]
    Shape { expected: usize, actual: usize },

    /// A sampling pass returned no samples at all.
    #[error("Sample distribution has a total count of zero")]
    EmptyDistribution,

    /// Every restart ended without a finite objective value.
    #[error("No convergence: none of the {restarts} restarts produced a finite cost")]
    NoConvergence { restarts: usize },

    /// The codec rejected a point of the search space.
    #[error("Invalid search parameters: {0}")]
    InvalidParameters(String),

    /// A bitstring literal contained something other than '0' or '1'.
    #[error("Invalid bitstring: {0}")]
    InvalidBitstring(String),

    /// Graph construction errors (out-of-range nodes, non-square matrices).
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sample counts do not fit in a `u64` total.
    #[error("Sample counts overflow: {0}")]
    CountOverflow(String),

    /// The minimizer backend failed outside the objective.
    #[error("Optimizer error: {0}")]
    Optimizer(String),

    /// A sibling restart failed and the solve is shutting down.
    #[error("Solve cancelled after another restart failed")]
    Cancelled,

    /// Hard failure reported by the sampler, surfaced unchanged.
    #[error(transparent)]
    Sampler(anyhow::Error),

    /// A concurrent restart panicked or was cancelled.
    #[error("Restart task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl VqaaError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        VqaaError::Config(message.into())
    }

    /// Creates an invalid-parameters error.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        VqaaError::InvalidParameters(message.into())
    }

    /// Creates a graph construction error.
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        VqaaError::InvalidGraph(message.into())
    }

    /// True for errors that must abort the whole solve.
    ///
    /// Only codec rejections are local to a single search point.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VqaaError::InvalidParameters(_))
    }
}

/// Result type alias for solver operations.
pub type Result<T> = std::result::Result<T, VqaaError>;
