//! ## Crate-wide settings
//!
//! Constants that configure the library's defaults and its logging switch.

/// Environment variable that enables debug logging when set (see [`crate::logging`]).
pub const DEBUG_ENV_VAR: &str = "DEBUG_LAUNDRY";

/// Integer columns with at most this many distinct values are treated as categorical.
pub const DEFAULT_MAX_CATEGORIES: usize = 10;

/// Default imputation strategy for numeric columns.
pub const DEFAULT_NUMERIC_IMPUTATION: &str = "mean";

/// Default imputation strategy for categorical columns.
pub const DEFAULT_CATEGORICAL_IMPUTATION: &str = "mode";

/// Default transformation for categorical columns.
pub const DEFAULT_CATEGORICAL_TRANSFORM: &str = "onehot_encoding";

/// Default transformation for numeric columns.
pub const DEFAULT_NUMERIC_TRANSFORM: &str = "standard_scaling";

/// Returns true when the given value of [`DEBUG_ENV_VAR`] turns logging on.
pub(crate) fn debug_enabled(value: Option<&str>) -> bool {
    !matches!(value, None | Some("") | Some("0") | Some("false"))
}
