//! # Categorical Encoding Transformers
//!
//! This module provides the categorical encoders used by [`crate::transform_columns`]:
//! - **OneHotEncoder:** Expands each categorical column into binary columns, one per distinct category
//!   (optionally dropping the first category).
//! - **OrdinalEncoder:** Replaces each category with its ordinal position among the sorted categories.
//!
//! Each encoder exposes a constructor, an asynchronous `fit` method that learns the categories
//! from a training DataFrame, and a `transform` method that applies the encoding to any DataFrame.
//! Categories may be of any scalar type; they are sorted in ascending order.

use crate::exceptions::{LaundryError, LaundryResult};
use crate::impl_transformer;
use crate::utils::{column, sorted_distinct_values, validate_columns};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use datafusion_expr::expr::Case as DFCase;
use datafusion_expr::{lit, Expr};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Helper to build a CASE WHEN expression given a mapping from categories to values.
/// For each pair, the expression generated is:
/// `WHEN <col> = lit(<category>) THEN lit(<encoded_value>)`
/// `default` is used as the ELSE branch.
fn build_case_expr(col_name: &str, mapping: &[(ScalarValue, f64)], default: Expr) -> Expr {
    let when_then_expr = mapping
        .iter()
        .map(|(cat, val)| {
            (
                Box::new(column(col_name).eq(lit(cat.clone()))),
                Box::new(lit(*val)),
            )
        })
        .collect();
    Expr::Case(DFCase {
        expr: None,
        when_then_expr,
        else_expr: Some(Box::new(default)),
    })
}

/// Learns the sorted categories of every target column.
async fn fit_categories(
    df: &DataFrame,
    columns: &[String],
) -> LaundryResult<HashMap<String, Vec<ScalarValue>>> {
    validate_columns(df, columns)?;
    let mut categories = HashMap::new();
    for col_name in columns {
        let values = sorted_distinct_values(df, col_name).await?;
        debug!("Column '{}' has {} categories", col_name, values.len());
        categories.insert(col_name.clone(), values);
    }
    Ok(categories)
}

/// Label used in generated column names.
fn category_label(value: &ScalarValue) -> String {
    value.to_string()
}

/// Transformation applied to categorical columns by [`crate::transform_columns`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoricalTransform {
    #[default]
    OneHotEncoding,
    LabelEncoding,
}

impl fmt::Display for CategoricalTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoricalTransform::OneHotEncoding => f.write_str("onehot_encoding"),
            CategoricalTransform::LabelEncoding => f.write_str("label_encoding"),
        }
    }
}

impl FromStr for CategoricalTransform {
    type Err = LaundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onehot_encoding" => Ok(CategoricalTransform::OneHotEncoding),
            "label_encoding" => Ok(CategoricalTransform::LabelEncoding),
            other => Err(LaundryError::InvalidParameter(format!(
                "transformation method for categorical columns can only be 'label_encoding' or 'onehot_encoding', got '{}'",
                other
            ))),
        }
    }
}

/// ------------------------- OneHotEncoder -------------------------
///
/// OneHotEncoder replaces each categorical column with binary `Float64` columns
/// (one per distinct category seen during fit). The new column names are constructed by
/// concatenating the original column name, an underscore, and the category value.
/// With `drop_first`, the smallest category gets no column. Unseen categories encode as all zeros.
pub struct OneHotEncoder {
    pub columns: Vec<String>,
    pub drop_first: bool,
    /// Mapping from column name to list of distinct category values.
    pub categories: HashMap<String, Vec<ScalarValue>>,
    fitted: bool,
}

impl OneHotEncoder {
    /// Create a new OneHotEncoder for the specified columns.
    pub fn new(columns: Vec<String>, drop_first: bool) -> Self {
        Self {
            columns,
            drop_first,
            categories: HashMap::new(),
            fitted: false,
        }
    }

    /// Learn distinct category values for each target column.
    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        self.categories = fit_categories(df, &self.columns).await?;
        self.fitted = true;
        Ok(())
    }

    fn encoded_categories(&self, col_name: &str) -> &[ScalarValue] {
        match self.categories.get(col_name) {
            Some(cats) if self.drop_first && !cats.is_empty() => &cats[1..],
            Some(cats) => cats,
            None => &[],
        }
    }

    /// Output column names in the order `transform` produces them.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|col_name| {
                self.encoded_categories(col_name)
                    .iter()
                    .map(move |cat| format!("{}_{}", col_name, category_label(cat)))
            })
            .collect()
    }

    /// Transform the DataFrame by replacing each target column with its indicator columns.
    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        let mut exprs = vec![];
        for field in df.schema().fields() {
            let name = field.name();
            if !self.columns.contains(name) {
                exprs.push(column(name));
                continue;
            }
            for cat in self.encoded_categories(name) {
                let new_col_name = format!("{}_{}", name, category_label(cat));
                exprs.push(
                    build_case_expr(name, &[(cat.clone(), 1.0)], lit(0.0_f64)).alias(new_col_name),
                );
            }
        }
        df.select(exprs).map_err(LaundryError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

/// ------------------------- OrdinalEncoder -------------------------
///
/// OrdinalEncoder replaces each category with an ordinal value (as `Float64`).
/// Categories are sorted in ascending order and assigned increasing numbers starting at 0.
/// Categories not seen during fit become null.
pub struct OrdinalEncoder {
    pub columns: Vec<String>,
    /// Mapping from column to (category, ordinal index) pairs
    pub mapping: HashMap<String, Vec<(ScalarValue, f64)>>,
    fitted: bool,
}

impl OrdinalEncoder {
    /// Create a new OrdinalEncoder for the specified columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            mapping: HashMap::new(),
            fitted: false,
        }
    }

    /// Learn the ordinal mapping for each target column.
    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        self.mapping = fit_categories(df, &self.columns)
            .await?
            .into_iter()
            .map(|(name, values)| {
                let mapping = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, cat)| (cat, i as f64))
                    .collect();
                (name, mapping)
            })
            .collect();
        self.fitted = true;
        Ok(())
    }

    /// Output column names; the encoded columns keep their names.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    /// Transform the DataFrame by replacing each target column's value with its ordinal index.
    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        validate_columns(&df, &self.columns)?;
        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .map(|field| {
                let name = field.name();
                let unseen = lit(ScalarValue::Float64(None));
                match self.mapping.get(name) {
                    Some(map) if self.columns.contains(name) => {
                        if map.is_empty() {
                            unseen.alias(name)
                        } else {
                            build_case_expr(name, map, unseen).alias(name)
                        }
                    }
                    _ => column(name),
                }
            })
            .collect();
        df.select(exprs).map_err(LaundryError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(OneHotEncoder);
impl_transformer!(OrdinalEncoder);
