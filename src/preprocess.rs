//! ## Preprocessing helpers
//!
//! The four entry points of the library. Each one validates its arguments, fits the relevant
//! transformers on the training data, and applies them:
//!
//! - [`categorize`]: split columns into numeric and categorical.
//! - [`fill_missing`]: impute missing values from training statistics, on both train and test sets.
//! - [`transform_columns`]: scale numeric columns and encode categorical columns.
//! - [`feature_selector`]: rank features for a regression or classification target.
//!
//! ### Example
//!
//! ```rust,no_run
//! use laundry::{categorize, fill_missing, transform_columns, CategorizeConfig};
//! use datafusion::prelude::*;
//!
//! # async fn run(train: DataFrame, test: DataFrame) -> laundry::exceptions::LaundryResult<()> {
//! let types = categorize(&train, &CategorizeConfig::default()).await?;
//! let filled = fill_missing(&train, &test, &types, "median".parse()?, Default::default()).await?;
//! let ready = transform_columns(
//!     &filled.train,
//!     &filled.test,
//!     &types,
//!     "onehot_encoding".parse()?,
//!     "minmax_scaling".parse()?,
//! )
//! .await?;
//! ready.train.show().await?;
//! # Ok(())
//! # }
//! ```

use crate::exceptions::{LaundryError, LaundryResult};
use crate::transformers::categorical_encoding::CategoricalTransform;
use crate::transformers::categorization::ColumnTypes;
use crate::transformers::column_transformer::ColumnTransformer;
use crate::transformers::feature_selection::{SelectKBestFeatures, SelectionMode};
use crate::transformers::imputation::{
    CategoricalImputeStrategy, CategoricalImputer, ImputeStrategy, MeanMedianImputer,
};
use crate::transformers::scaling_and_normalization::NumericTransform;
use crate::utils::{column_type, validate_same_columns};
use datafusion::prelude::DataFrame;
use tracing::info;

pub use crate::transformers::categorization::categorize;

/// A training set and a held-out set transformed with the same fitted parameters.
#[derive(Clone)]
pub struct TrainTestFrames {
    pub train: DataFrame,
    pub test: DataFrame,
}

/// Fills missing values in `train` and `test`.
///
/// Numeric columns get the training mean or median, categorical columns the training mode.
/// The test set only receives values computed from the training set.
///
/// # Errors
///
/// - [`LaundryError::SchemaMismatch`] if the two sets do not have the same columns.
/// - [`LaundryError::MissingColumn`] if the mapping names a column that does not exist.
/// - [`LaundryError::InvalidParameter`] if a numeric column is not numeric or has no observed values.
pub async fn fill_missing(
    train: &DataFrame,
    test: &DataFrame,
    column_types: &ColumnTypes,
    numeric_strategy: ImputeStrategy,
    categorical_strategy: CategoricalImputeStrategy,
) -> LaundryResult<TrainTestFrames> {
    validate_same_columns(train, test)?;
    column_types.validate(train)?;
    for col_name in &column_types.numeric {
        let data_type = column_type(train, col_name)?;
        if !data_type.is_numeric() {
            return Err(LaundryError::InvalidParameter(format!(
                "numeric column '{}' must have numeric values, found {}",
                col_name, data_type
            )));
        }
    }
    info!(
        "Filling missing values ({} for {} numeric, {} for {} categorical columns)",
        numeric_strategy,
        column_types.numeric.len(),
        categorical_strategy,
        column_types.categorical.len()
    );

    let mut numeric = MeanMedianImputer::new(column_types.numeric.clone(), numeric_strategy);
    numeric.fit(train).await?;
    let mut categorical = match categorical_strategy {
        CategoricalImputeStrategy::Mode => {
            CategoricalImputer::new(column_types.categorical.clone(), None)
        }
    };
    categorical.fit(train).await?;

    let train = categorical.transform(numeric.transform(train.clone())?)?;
    let test = categorical.transform(numeric.transform(test.clone())?)?;
    Ok(TrainTestFrames { train, test })
}

/// Scales the numeric columns and encodes the categorical columns of `train` and `test`.
///
/// Scalers and encoders are fitted on `train` only. One-hot encoding drops the first category of
/// each column. The output holds the numeric columns followed by the encoded columns; columns
/// not listed in `column_types` are dropped.
pub async fn transform_columns(
    train: &DataFrame,
    test: &DataFrame,
    column_types: &ColumnTypes,
    categorical_transform: CategoricalTransform,
    numeric_transform: NumericTransform,
) -> LaundryResult<TrainTestFrames> {
    validate_same_columns(train, test)?;
    column_types.validate(train)?;
    info!(
        "Transforming columns ({} numeric, {} categorical)",
        numeric_transform, categorical_transform
    );

    let mut transformer =
        ColumnTransformer::new(column_types.clone(), categorical_transform, numeric_transform);
    transformer.fit(train).await?;
    let train = transformer.transform(train.clone())?;
    let test = transformer.transform(test.clone())?;
    Ok(TrainTestFrames { train, test })
}

/// Returns the names of the (at most) `n_features` most important features for `target`,
/// best first. Every column other than `target` is treated as a feature.
pub async fn feature_selector(
    df: &DataFrame,
    target: &str,
    mode: SelectionMode,
    n_features: usize,
) -> LaundryResult<Vec<String>> {
    let mut selector = SelectKBestFeatures::new(target.to_string(), mode, n_features);
    selector.fit(df).await?;
    info!(
        "Selected features for '{}' ({}): {:?}",
        target, mode, selector.selected_features
    );
    Ok(selector.selected_features)
}
