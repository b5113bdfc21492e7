//! # Transformer Implementations
//!
//! The submodules contain the building blocks behind the preprocessing helpers.

pub mod categorical_encoding;
pub mod categorization;
pub mod column_transformer;
pub mod feature_selection;
pub mod imputation;
pub mod scaling_and_normalization;
