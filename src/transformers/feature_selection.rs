//! ## Feature Selection Transformers
//!
//! This module provides [`SelectKBestFeatures`], which ranks features by their importance for
//! a target column and keeps the best `k`.
//!
//! ### Scores
//!
//! - **Regression:** absolute Pearson correlation between the feature and the target.
//! - **Classification:** one-way ANOVA F statistic of the feature across the target classes.
//!
//! ### Assumptions
//!
//! - The DataFrame is fully materialized (`collect()`) for computing the scores.
//! - Every feature column is numeric (encode categorical columns first); values are cast to `Float64`.
//! - The table contains no missing or infinite values (impute them first).
//!
//! Errors are returned as [`LaundryError`], and results are wrapped in [`LaundryResult`].

use crate::exceptions::{LaundryError, LaundryResult};
use crate::impl_transformer;
use crate::utils::{column, validate_columns};
use datafusion::arrow::array::{Array, Float64Array};
use datafusion::arrow::compute::concat_batches;
use datafusion::arrow::datatypes::DataType;
use datafusion::dataframe::DataFrame;
use datafusion::logical_expr::{cast, Expr};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Kind of target the features are ranked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Regression,
    Classification,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Regression => f.write_str("regression"),
            SelectionMode::Classification => f.write_str("classification"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = LaundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regression" => Ok(SelectionMode::Regression),
            "classification" => Ok(SelectionMode::Classification),
            other => Err(LaundryError::InvalidParameter(format!(
                "mode can only be 'regression' or 'classification', got '{}'",
                other
            ))),
        }
    }
}

/// Absolute Pearson correlation; 0 when either side is constant.
pub(crate) fn abs_pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if x.is_empty() || x.len() != y.len() {
        return 0.0;
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let cov: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();
    let var_x: f64 = x.iter().map(|a| (a - mean_x).powi(2)).sum();
    let var_y: f64 = y.iter().map(|b| (b - mean_y).powi(2)).sum();
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).abs()
}

/// One-way ANOVA F statistic of `x` grouped by the class labels in `y`.
///
/// When every group is constant the statistic is infinite if the group means differ, and 0 otherwise.
pub(crate) fn anova_f(x: &[f64], y: &[f64]) -> f64 {
    let mut groups: HashMap<u64, Vec<f64>> = HashMap::new();
    for (&v, &label) in x.iter().zip(y.iter()) {
        groups.entry(label.to_bits()).or_default().push(v);
    }
    let k = groups.len() as f64;
    let n = x.len() as f64;
    let grand_mean = x.iter().sum::<f64>() / n;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for values in groups.values() {
        let m = values.len() as f64;
        let mean = values.iter().sum::<f64>() / m;
        ss_between += m * (mean - grand_mean).powi(2);
        ss_within += values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }
    let df_between = k - 1.0;
    let df_within = n - k;
    if ss_within == 0.0 || df_within <= 0.0 {
        return if ss_between > 0.0 { f64::INFINITY } else { 0.0 };
    }
    (ss_between / df_between) / (ss_within / df_within)
}

/// Keeps the `k` features with the highest importance score for the target.
pub struct SelectKBestFeatures {
    pub target: String,
    pub mode: SelectionMode,
    pub k: usize,
    /// (feature, score) pairs sorted by descending score.
    pub scores: Vec<(String, f64)>,
    /// Names of the selected features in rank order.
    pub selected_features: Vec<String>,
    fitted: bool,
}

impl SelectKBestFeatures {
    pub fn new(target: String, mode: SelectionMode, k: usize) -> Self {
        Self {
            target,
            mode,
            k,
            scores: Vec::new(),
            selected_features: Vec::new(),
            fitted: false,
        }
    }

    /// Materializes the target and every feature as `Float64` vectors.
    async fn collect_columns(&self, df: &DataFrame) -> LaundryResult<(Vec<f64>, Vec<(String, Vec<f64>)>)> {
        let mut feature_names = Vec::new();
        let mut exprs: Vec<Expr> =
            vec![cast(column(&self.target), DataType::Float64).alias(&self.target)];
        for field in df.schema().fields() {
            let name = field.name();
            if name == &self.target {
                continue;
            }
            if !field.data_type().is_numeric() {
                return Err(LaundryError::InvalidParameter(format!(
                    "Feature '{}' must be numeric, found {}; encode categorical columns first",
                    name,
                    field.data_type()
                )));
            }
            exprs.push(cast(column(name), DataType::Float64).alias(name));
            feature_names.push(name.to_string());
        }
        if feature_names.is_empty() {
            return Err(LaundryError::InvalidParameter(
                "DataFrame has no feature columns besides the target.".to_string(),
            ));
        }

        let batches = df.clone().select(exprs)?.collect().await?;
        let schema = match batches.first() {
            Some(batch) => batch.schema(),
            None => {
                return Err(LaundryError::InvalidParameter(
                    "Empty DataFrame".to_string(),
                ))
            }
        };
        let batch = concat_batches(&schema, &batches)?;
        if batch.num_rows() == 0 {
            return Err(LaundryError::InvalidParameter(
                "Empty DataFrame".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(batch.num_columns());
        for (i, field) in schema.fields().iter().enumerate() {
            let array = batch
                .column(i)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    LaundryError::InvalidParameter(format!(
                        "Expected Float64 array for column {}",
                        field.name()
                    ))
                })?;
            if array.null_count() > 0 || array.values().iter().any(|v| !v.is_finite()) {
                return Err(LaundryError::InvalidParameter(format!(
                    "Column '{}' contains missing or infinite values; fill or clip them before selecting features",
                    field.name()
                )));
            }
            columns.push(array.values().to_vec());
        }
        let mut columns = columns.into_iter();
        let target_vals = columns.next().unwrap_or_default();
        Ok((target_vals, feature_names.into_iter().zip(columns).collect()))
    }

    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        if self.k == 0 {
            return Err(LaundryError::InvalidParameter(
                "Number of features to select must be at least 1".to_string(),
            ));
        }
        validate_columns(df, &[self.target.clone()])?;
        let (target_vals, features) = self.collect_columns(df).await?;

        let score_fn: fn(&[f64], &[f64]) -> f64 = match self.mode {
            SelectionMode::Regression => abs_pearson,
            SelectionMode::Classification => {
                let mut classes: Vec<u64> = target_vals.iter().map(|v| v.to_bits()).collect();
                classes.sort_unstable();
                classes.dedup();
                if classes.len() < 2 {
                    return Err(LaundryError::InvalidParameter(format!(
                        "Target '{}' must have at least two classes for classification",
                        self.target
                    )));
                }
                anova_f
            }
        };

        let mut scores: Vec<(String, f64)> = features
            .par_iter()
            .map(|(name, x)| (name.clone(), score_fn(x, &target_vals)))
            .collect();
        // Stable sort keeps schema order among ties.
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        debug!("Feature scores ({}): {:?}", self.mode, scores);

        self.selected_features = scores
            .iter()
            .take(self.k)
            .map(|(name, _)| name.clone())
            .collect();
        self.scores = scores;
        self.fitted = true;
        Ok(())
    }

    /// Keeps the target followed by the selected features (in schema order).
    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        let mut keep_exprs: Vec<Expr> = vec![column(&self.target)];
        for field in df.schema().fields() {
            if self.selected_features.contains(field.name()) {
                keep_exprs.push(column(field.name()));
            }
        }
        df.select(keep_exprs).map_err(LaundryError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(SelectKBestFeatures);
