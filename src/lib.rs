//! # Laundry
//!
//! Preprocessing helpers for tabular data, built on Apache DataFusion.
//!
//! The crate offers four helpers that run before statistical modelling:
//!
//! - [`categorize`] classifies columns as numeric or categorical.
//! - [`fill_missing`] imputes missing values from training-set statistics.
//! - [`transform_columns`] encodes categorical columns and scales numeric columns.
//! - [`feature_selector`] ranks features by importance for a regression or classification target.
//!
//! The helpers are built from the transformers in [`transformers`], which follow a
//! `fit`/`transform` protocol and can also be chained with a [`pipeline::Pipeline`].
//!
//! Set the `DEBUG_LAUNDRY` environment variable to enable debug logging.

pub mod exceptions;
mod logging;
pub mod pipeline;
pub mod preprocess;
pub mod settings;
pub mod transformers;
mod utils;

pub use preprocess::{
    categorize, feature_selector, fill_missing, transform_columns, TrainTestFrames,
};
pub use transformers::categorical_encoding::CategoricalTransform;
pub use transformers::categorization::{CategorizeConfig, ColumnKind, ColumnTypes};
pub use transformers::feature_selection::SelectionMode;
pub use transformers::imputation::{CategoricalImputeStrategy, ImputeStrategy};
pub use transformers::scaling_and_normalization::NumericTransform;
