//! ## Transformers for imputing missing values
//!
//! This module provides the imputers used by [`crate::fill_missing`]:
//!
//! - **MeanMedianImputer**: Imputes numeric columns using the mean or the median of the observed values.
//! - **CategoricalImputer**: Imputes categorical columns using the mode (or a provided default).
//!
//! A value is missing when it is null or, for floating-point columns, NaN.
//! Statistics are computed by `fit` (on the training set); `transform` only rewrites the logical plan,
//! so the same fitted imputer can be applied unchanged to a held-out set.
//! Errors are returned as `LaundryError` and results are wrapped in `LaundryResult`.

use crate::exceptions::{LaundryError, LaundryResult};
use crate::impl_transformer;
use crate::utils::{
    column, column_type, first_scalar, missing_predicate, scalar_to_f64, validate_columns,
};
use datafusion::arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::{avg, count, median};
use datafusion::logical_expr::{cast, lit, not, Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Constructs `CASE WHEN <missing> THEN <fallback> ELSE <col> END`.
fn fill_expr_for(name: &str, missing: Expr, fallback: Expr) -> Expr {
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(Box::new(missing), Box::new(fallback))],
        else_expr: Some(Box::new(column(name))),
    })
}

/// Generic helper function to apply a fill value to a set of target columns.
/// For each field in the DataFrame, if its name is in `target_cols` and a fill value is available via `get_fallback`,
/// then the column is replaced by a CASE WHEN expression; otherwise, the original column is retained.
fn apply_imputation<F>(
    df: DataFrame,
    target_cols: &[String],
    get_fallback: F,
) -> LaundryResult<DataFrame>
where
    F: Fn(&str) -> Option<Expr>,
{
    let exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            if target_cols.contains(name) {
                if let Some(fallback_expr) = get_fallback(name) {
                    let missing = missing_predicate(name, field.data_type());
                    fill_expr_for(name, missing, fallback_expr).alias(name)
                } else {
                    column(name)
                }
            } else {
                column(name)
            }
        })
        .collect();
    df.select(exprs).map_err(LaundryError::from)
}

/// The observed (non-missing) rows of a column.
fn observed(df: &DataFrame, col_name: &str, data_type: &DataType) -> LaundryResult<DataFrame> {
    df.clone()
        .filter(not(missing_predicate(col_name, data_type)))
        .map_err(LaundryError::from)
}

/// This enum defines the imputation strategy for the `MeanMedianImputer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImputeStrategy {
    #[default]
    Mean,
    Median,
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputeStrategy::Mean => f.write_str("mean"),
            ImputeStrategy::Median => f.write_str("median"),
        }
    }
}

impl FromStr for ImputeStrategy {
    type Err = LaundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            other => Err(LaundryError::InvalidParameter(format!(
                "numerical imputation method can only be 'mean' or 'median', got '{}'",
                other
            ))),
        }
    }
}

/// Imputation strategy for categorical columns. The mode is the only option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoricalImputeStrategy {
    #[default]
    Mode,
}

impl fmt::Display for CategoricalImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("mode")
    }
}

impl FromStr for CategoricalImputeStrategy {
    type Err = LaundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mode" => Ok(CategoricalImputeStrategy::Mode),
            other => Err(LaundryError::InvalidParameter(format!(
                "categorical imputation method can only be 'mode', got '{}'",
                other
            ))),
        }
    }
}

/// Replaces missing values with the mean (or median) value for numeric columns.
pub struct MeanMedianImputer {
    pub columns: Vec<String>,
    pub strategy: ImputeStrategy,
    pub impute_values: HashMap<String, f64>,
    fitted: bool,
}

impl MeanMedianImputer {
    /// Create a new imputer for the given columns and strategy.
    pub fn new(columns: Vec<String>, strategy: ImputeStrategy) -> Self {
        Self {
            columns,
            strategy,
            impute_values: HashMap::new(),
            fitted: false,
        }
    }

    async fn compute_value(&self, df: &DataFrame, col_name: &str) -> LaundryResult<f64> {
        let data_type = column_type(df, col_name)?;
        if !data_type.is_numeric() {
            return Err(LaundryError::InvalidParameter(format!(
                "Column '{}' must be numeric for {} imputation, found {}",
                col_name, self.strategy, data_type
            )));
        }
        let value = cast(column(col_name), DataType::Float64);
        let agg = match self.strategy {
            ImputeStrategy::Mean => avg(value),
            ImputeStrategy::Median => median(value),
        };
        let batches = observed(df, col_name, &data_type)?
            .aggregate(vec![], vec![agg.alias("value")])
            .map_err(LaundryError::from)?
            .collect()
            .await
            .map_err(LaundryError::from)?;
        let scalar = first_scalar(&batches, 0)?;
        scalar_to_f64(&scalar, &self.strategy.to_string(), col_name)
    }

    /// For each target column, compute the mean or median via an aggregate query.
    /// The queries for different columns run concurrently.
    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        validate_columns(df, &self.columns)?;
        let values = try_join_all(
            self.columns
                .iter()
                .map(|col_name| self.compute_value(df, col_name)),
        )
        .await?;
        self.impute_values = self.columns.iter().cloned().zip(values).collect();
        debug!(
            "Fitted {} imputer: {:?}",
            self.strategy, self.impute_values
        );
        self.fitted = true;
        Ok(())
    }

    /// Returns a new DataFrame where, for each target column, missing values are replaced with the fitted value.
    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        apply_imputation(df, &self.columns, |name| {
            self.impute_values.get(name).map(|&v| lit(v))
        })
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// Replaces missing values with the mode (or a provided default) for categorical columns.
///
/// When several values are tied for the mode, the smallest one wins.
pub struct CategoricalImputer {
    pub columns: Vec<String>,
    pub default: Option<ScalarValue>,
    pub impute_values: HashMap<String, ScalarValue>,
    fitted: bool,
}

impl CategoricalImputer {
    /// Create a new categorical imputer for the given columns and optional default.
    pub fn new(columns: Vec<String>, default: Option<ScalarValue>) -> Self {
        Self {
            columns,
            default,
            impute_values: HashMap::new(),
            fitted: false,
        }
    }

    async fn compute_mode(df: &DataFrame, col_name: &str) -> LaundryResult<ScalarValue> {
        let data_type = column_type(df, col_name)?;
        // Derived from the column name so it never collides with the group key.
        let count_name = format!("{}_count", col_name);
        let grouped = observed(df, col_name, &data_type)?
            .aggregate(vec![column(col_name)], vec![count(lit(1)).alias(&count_name)])
            .map_err(LaundryError::from)?
            .sort(vec![
                column(&count_name).sort(false, false),
                column(col_name).sort(true, false),
            ])
            .map_err(LaundryError::from)?
            .limit(0, Some(1))
            .map_err(LaundryError::from)?;
        let batches = grouped.collect().await.map_err(LaundryError::from)?;
        let mode = first_scalar(&batches, 0).map_err(|_| {
            LaundryError::InvalidParameter(format!(
                "Failed to compute mode for column '{}': it has no observed values",
                col_name
            ))
        })?;
        if mode.is_null() {
            return Err(LaundryError::InvalidParameter(format!(
                "Failed to compute mode for column '{}'",
                col_name
            )));
        }
        Ok(mode)
    }

    /// For each target column, if no default is provided, compute the mode via grouping and counting.
    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        validate_columns(df, &self.columns)?;
        if self.default.is_none() {
            let modes = try_join_all(
                self.columns
                    .iter()
                    .map(|col_name| Self::compute_mode(df, col_name)),
            )
            .await?;
            self.impute_values = self.columns.iter().cloned().zip(modes).collect();
            debug!("Fitted mode imputer: {:?}", self.impute_values);
        }
        self.fitted = true;
        Ok(())
    }

    /// Returns a new DataFrame where, for each target column, missing values are replaced with the computed mode (or the provided default).
    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        apply_imputation(df, &self.columns, |name| {
            if let Some(default_val) = &self.default {
                Some(lit(default_val.clone()))
            } else {
                self.impute_values
                    .get(name)
                    .map(|mode_val| lit(mode_val.clone()))
            }
        })
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(MeanMedianImputer);
impl_transformer!(CategoricalImputer);
