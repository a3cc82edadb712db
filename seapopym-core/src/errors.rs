use crate::array::DType;
use crate::labels::Dim;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeapopymError {
    #[error("{0}")]
    Error(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Variable '{variable}' is required by '{context}' but is not in the state")]
    MissingVariable { variable: String, context: String },
    #[error("Dimension {dimension} requested by template '{template}' is not defined in the state")]
    MissingDimension { dimension: Dim, template: String },
    #[error("Kernel unit '{kernel_unit}' did not produce the declared variable '{variable}'")]
    MissingOutput {
        variable: String,
        kernel_unit: String,
    },
    #[error("Variable '{variable}' has shape {found:?} but {expected:?} was expected")]
    ShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("Variable '{variable}' has dimensions {found:?} but {expected:?} were expected")]
    DimensionMismatch {
        variable: String,
        expected: Vec<Dim>,
        found: Vec<Dim>,
    },
    #[error("Variable '{variable}' has element type {found} but {expected} was expected")]
    DTypeMismatch {
        variable: String,
        expected: DType,
        found: DType,
    },
    #[error("Cannot chunk dimension {dimension}: {reason}")]
    InvalidChunk { dimension: Dim, reason: String },
    #[error("Label {label} is not a coordinate value of dimension {dimension}")]
    LabelNotFound { dimension: Dim, label: f64 },
    #[error("Cannot convert '{variable}' from '{from}' to '{to}'")]
    IncompatibleUnits {
        variable: String,
        from: String,
        to: String,
    },
}

/// Convenience type for `Result<T, SeapopymError>`.
pub type SeapopymResult<T> = Result<T, SeapopymError>;
