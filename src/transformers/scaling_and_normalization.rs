//! ## Scaling and normalization transformers
//!
//! - [`StandardScaler`]: centers each column on its mean and divides by its population standard deviation.
//! - [`MinMaxScaler`]: maps each column onto a target range (`[0, 1]` by default) using its minimum and maximum.
//!
//! Both scalers compute the statistics of all their columns in a single aggregate query during `fit`.
//! Statistics skip missing values (null, or NaN in float columns). Output columns are `Float64`;
//! missing values pass through unchanged.

use crate::exceptions::{LaundryError, LaundryResult};
use crate::impl_transformer;
use crate::utils::{
    column, column_type, first_scalar, missing_predicate, scalar_to_f64, validate_columns,
};
use datafusion::arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::{avg, max, min, stddev_pop};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use datafusion_expr::expr::Case;
use datafusion_expr::{cast, lit, Expr};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Checks that every target column has a numeric Arrow type.
fn validate_numeric(df: &DataFrame, columns: &[String]) -> LaundryResult<()> {
    for col_name in columns {
        let data_type = column_type(df, col_name)?;
        if !data_type.is_numeric() {
            return Err(LaundryError::InvalidParameter(format!(
                "Column '{}' must be numeric to be scaled, found {}",
                col_name, data_type
            )));
        }
    }
    Ok(())
}

fn as_f64(col_name: &str) -> Expr {
    cast(column(col_name), DataType::Float64)
}

/// The column as `Float64` with missing values (null or NaN) turned into nulls,
/// so aggregates skip them.
fn observed_f64(col_name: &str, data_type: &DataType) -> Expr {
    Expr::Case(Case {
        expr: None,
        when_then_expr: vec![(
            Box::new(missing_predicate(col_name, data_type)),
            Box::new(lit(ScalarValue::Float64(None))),
        )],
        else_expr: Some(Box::new(as_f64(col_name))),
    })
}

/// Runs one aggregate query with two statistics per column and returns them pairwise.
async fn column_stats(
    df: &DataFrame,
    columns: &[String],
    first: fn(Expr) -> Expr,
    second: fn(Expr) -> Expr,
    names: (&str, &str),
) -> LaundryResult<Vec<(f64, f64)>> {
    if columns.is_empty() {
        return Ok(vec![]);
    }
    let mut aggs = Vec::with_capacity(columns.len() * 2);
    for (i, col_name) in columns.iter().enumerate() {
        let data_type = column_type(df, col_name)?;
        let value = observed_f64(col_name, &data_type);
        aggs.push(first(value.clone()).alias(format!("{}_{}", names.0, i)));
        aggs.push(second(value).alias(format!("{}_{}", names.1, i)));
    }
    let batches = df
        .clone()
        .aggregate(vec![], aggs)
        .map_err(LaundryError::from)?
        .collect()
        .await
        .map_err(LaundryError::from)?;
    columns
        .iter()
        .enumerate()
        .map(|(i, col_name)| {
            let a = scalar_to_f64(&first_scalar(&batches, 2 * i)?, names.0, col_name)?;
            let b = scalar_to_f64(&first_scalar(&batches, 2 * i + 1)?, names.1, col_name)?;
            Ok::<_, LaundryError>((a, b))
        })
        .collect()
}

/// Applies `f(name, params)` to every target column that has fitted parameters.
fn apply_scaling<F>(
    df: DataFrame,
    params: &HashMap<String, (f64, f64)>,
    scale_expr: F,
) -> LaundryResult<DataFrame>
where
    F: Fn(&str, (f64, f64)) -> Expr,
{
    let exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            match params.get(name) {
                Some(&p) => scale_expr(name, p).alias(name),
                None => column(name),
            }
        })
        .collect();
    df.select(exprs).map_err(LaundryError::from)
}

/// Transformation applied to numeric columns by [`crate::transform_columns`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumericTransform {
    #[default]
    StandardScaling,
    MinMaxScaling,
}

impl fmt::Display for NumericTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericTransform::StandardScaling => f.write_str("standard_scaling"),
            NumericTransform::MinMaxScaling => f.write_str("minmax_scaling"),
        }
    }
}

impl FromStr for NumericTransform {
    type Err = LaundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard_scaling" => Ok(NumericTransform::StandardScaling),
            "minmax_scaling" => Ok(NumericTransform::MinMaxScaling),
            other => Err(LaundryError::InvalidParameter(format!(
                "transformation method for numeric columns can only be 'minmax_scaling' or 'standard_scaling', got '{}'",
                other
            ))),
        }
    }
}

/// Standardizes columns to zero mean and unit variance.
///
/// The standard deviation is the population one; a constant column gets a scale of 1.
pub struct StandardScaler {
    pub columns: Vec<String>,
    /// Mapping from column to (mean, scale)
    pub params: HashMap<String, (f64, f64)>,
    fitted: bool,
}

impl StandardScaler {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            params: HashMap::new(),
            fitted: false,
        }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        validate_numeric(df, &self.columns)?;
        let stats = column_stats(df, &self.columns, avg, stddev_pop, ("mean", "std")).await?;
        self.params = self
            .columns
            .iter()
            .cloned()
            .zip(stats)
            .map(|(name, (mean, std))| (name, (mean, if std == 0.0 { 1.0 } else { std })))
            .collect();
        debug!("Fitted standard scaler: {:?}", self.params);
        self.fitted = true;
        Ok(())
    }

    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        apply_scaling(df, &self.params, |name, (mean, scale)| {
            (as_f64(name) - lit(mean)) / lit(scale)
        })
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// Rescales columns onto `feature_range` using the minimum and maximum seen during fit.
pub struct MinMaxScaler {
    pub columns: Vec<String>,
    pub feature_range: (f64, f64),
    /// Mapping from column to (min, range)
    pub params: HashMap<String, (f64, f64)>,
    fitted: bool,
}

impl MinMaxScaler {
    pub fn new(columns: Vec<String>) -> Self {
        Self::with_range(columns, (0.0, 1.0))
    }

    pub fn with_range(columns: Vec<String>, feature_range: (f64, f64)) -> Self {
        Self {
            columns,
            feature_range,
            params: HashMap::new(),
            fitted: false,
        }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        let (lo, hi) = self.feature_range;
        if lo >= hi {
            return Err(LaundryError::InvalidParameter(format!(
                "Minimum of the feature range must be smaller than its maximum, got ({}, {})",
                lo, hi
            )));
        }
        validate_numeric(df, &self.columns)?;
        let stats = column_stats(df, &self.columns, min, max, ("min", "max")).await?;
        self.params = self
            .columns
            .iter()
            .cloned()
            .zip(stats)
            .map(|(name, (min_val, max_val))| {
                let range = max_val - min_val;
                (name, (min_val, if range == 0.0 { 1.0 } else { range }))
            })
            .collect();
        debug!("Fitted min-max scaler: {:?}", self.params);
        self.fitted = true;
        Ok(())
    }

    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        let (lo, hi) = self.feature_range;
        apply_scaling(df, &self.params, |name, (min_val, range)| {
            (as_f64(name) - lit(min_val)) / lit(range) * lit(hi - lo) + lit(lo)
        })
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(StandardScaler);
impl_transformer!(MinMaxScaler);
