//! ## Custom Errors for Laundry
//!
//! This module defines the error type shared by every helper and transformer in the crate.
//! It uses the `thiserror` crate to derive the `Error` trait.
//! The `LaundryError` enum covers failures coming from DataFusion and Arrow as well as
//! argument validation failures (unknown column-type keys, invalid option strings,
//! mismatched train/test schemas, and so on).
//!
//! The `LaundryResult` type alias is the result type returned throughout the library.
//!
//! ### Example
//!
//! ```rust
//! use laundry::exceptions::{LaundryError, LaundryResult};
//!
//! fn check_mode(mode: &str) -> LaundryResult<()> {
//!     Err(LaundryError::InvalidParameter(format!("unknown mode '{}'", mode)))
//! }
//! ```

use thiserror::Error;

/// Errors specific to the Laundry library.
#[derive(Debug, Error)]
pub enum LaundryError {
    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Indicates that an invalid parameter was provided (e.g., unsupported option string or incorrect data type).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Indicates a column-type mapping key other than `numeric` or `categorical`.
    #[error("Invalid column type key: {0}")]
    InvalidColumnKey(String),

    /// Indicates that the specified column does not exist in the DataFrame.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Indicates that the training and test sets do not share the same columns.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Indicates the transform method was called before calling fit for a stateful transformer.
    #[error("Transform called before fit for stateful transformer")]
    FitNotCalled,
}

/// A convenient result type for Laundry operations.
pub type LaundryResult<T> = std::result::Result<T, LaundryError>;
