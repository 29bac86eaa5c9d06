/// Crate-level error type for the avmatch classifier library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A required dimension is zero or invalid.
    #[error("invalid size for `{name}`: {value} ({reason})")]
    InvalidSize {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    /// Input is empty where a non-empty array was required.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// Input contains non-finite values (NaN or Inf).
    #[error("non-finite values in {0}")]
    NonFinite(&'static str),

    /// Input array has incorrect shape for the operation.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Backward pass invoked on a layer with no cached forward pass.
    #[error("backward called before forward in {0}")]
    BackwardBeforeForward(&'static str),

    /// Failed to read a `.npy` input array.
    #[error("npy read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// File I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Checkpoint serialization / deserialization errors.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] serde_json::Error),

    /// Curve rendering errors.
    #[error("plot error: {0}")]
    Plot(String),
}

/// Convenience Result type for avmatch operations.
pub type Result<T> = std::result::Result<T, Error>;
