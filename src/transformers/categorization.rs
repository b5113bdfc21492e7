//! ## Column categorization
//!
//! This module decides which columns of a table are numeric and which are categorical,
//! and defines [`ColumnTypes`], the mapping consumed by the imputation and transformation helpers.
//!
//! The rule is driven by the Arrow type of each column plus a cardinality threshold:
//!
//! - floating-point and decimal columns are **numeric**;
//! - integer columns are **categorical** when they hold at most `max_categories` distinct values,
//!   and **numeric** otherwise;
//! - every other column (strings, booleans, dates, ...) is **categorical**.

use crate::exceptions::{LaundryError, LaundryResult};
use crate::settings::DEFAULT_MAX_CATEGORIES;
use crate::utils::{column, first_scalar, validate_columns};
use datafusion::arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::count_distinct;
use datafusion::logical_expr::Expr;
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The two kinds of column the helpers know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = LaundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "numeric" => Ok(ColumnKind::Numeric),
            "categorical" => Ok(ColumnKind::Categorical),
            other => Err(LaundryError::InvalidColumnKey(format!(
                "'{}' (keys can be only 'numeric' and 'categorical')",
                other
            ))),
        }
    }
}

/// Mapping from column kind to the list of columns of that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypes {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl ColumnTypes {
    pub fn new(numeric: Vec<String>, categorical: Vec<String>) -> Self {
        Self {
            numeric,
            categorical,
        }
    }

    /// Builds the mapping from string keys. Both `numeric` and `categorical` must be present
    /// and no other key is accepted.
    pub fn from_mapping(mapping: HashMap<String, Vec<String>>) -> LaundryResult<Self> {
        let mut numeric = None;
        let mut categorical = None;
        for (key, columns) in mapping {
            match key.parse::<ColumnKind>()? {
                ColumnKind::Numeric => numeric = Some(columns),
                ColumnKind::Categorical => categorical = Some(columns),
            }
        }
        match (numeric, categorical) {
            (Some(numeric), Some(categorical)) => Ok(Self::new(numeric, categorical)),
            _ => Err(LaundryError::InvalidParameter(
                "column mapping must have 2 keys - 'numeric' and 'categorical'".to_string(),
            )),
        }
    }

    pub fn columns(&self, kind: ColumnKind) -> &[String] {
        match kind {
            ColumnKind::Numeric => &self.numeric,
            ColumnKind::Categorical => &self.categorical,
        }
    }

    /// The kind of a column, if the mapping lists it.
    pub fn kind_of(&self, col_name: &str) -> Option<ColumnKind> {
        if self.numeric.iter().any(|c| c == col_name) {
            Some(ColumnKind::Numeric)
        } else if self.categorical.iter().any(|c| c == col_name) {
            Some(ColumnKind::Categorical)
        } else {
            None
        }
    }

    /// Every listed column, numeric ones first.
    pub fn all_columns(&self) -> impl Iterator<Item = &String> {
        self.numeric.iter().chain(self.categorical.iter())
    }

    /// Checks that no column is listed twice and that every listed column exists in `df`.
    pub fn validate(&self, df: &DataFrame) -> LaundryResult<()> {
        let mut seen = HashSet::new();
        for name in self.all_columns() {
            if !seen.insert(name) {
                return Err(LaundryError::InvalidParameter(format!(
                    "Column '{}' is listed more than once in the column mapping",
                    name
                )));
            }
        }
        validate_columns(df, &self.numeric)?;
        validate_columns(df, &self.categorical)
    }
}

impl TryFrom<HashMap<String, Vec<String>>> for ColumnTypes {
    type Error = LaundryError;

    fn try_from(mapping: HashMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        Self::from_mapping(mapping)
    }
}

/// Options for [`categorize`].
#[derive(Debug, Clone)]
pub struct CategorizeConfig {
    /// Integer columns with at most this many distinct values are categorical (default: 10)
    pub max_categories: usize,
    /// Columns left out of the mapping (e.g. the target)
    pub exclude_columns: Vec<String>,
}

impl Default for CategorizeConfig {
    fn default() -> Self {
        Self {
            max_categories: DEFAULT_MAX_CATEGORIES,
            exclude_columns: vec![],
        }
    }
}

impl CategorizeConfig {
    pub fn with_max_categories(mut self, max_categories: usize) -> Self {
        self.max_categories = max_categories;
        self
    }

    pub fn with_excluded(mut self, columns: Vec<String>) -> Self {
        self.exclude_columns = columns;
        self
    }
}

fn is_always_numeric(dt: &DataType) -> bool {
    dt.is_floating() || matches!(dt, DataType::Decimal128(_, _) | DataType::Decimal256(_, _))
}

/// Classifies the columns of `df` as numeric or categorical.
///
/// Distinct counts are only needed for integer columns; they are all computed in a single
/// aggregate query.
pub async fn categorize(df: &DataFrame, config: &CategorizeConfig) -> LaundryResult<ColumnTypes> {
    validate_columns(df, &config.exclude_columns)?;

    let fields: Vec<(String, DataType)> = df
        .schema()
        .fields()
        .iter()
        .filter(|f| !config.exclude_columns.contains(f.name()))
        .map(|f| (f.name().to_string(), f.data_type().clone()))
        .collect();

    let integer_cols: Vec<&String> = fields
        .iter()
        .filter(|(_, dt)| dt.is_integer())
        .map(|(name, _)| name)
        .collect();

    let mut distinct_counts: HashMap<String, i64> = HashMap::new();
    if !integer_cols.is_empty() {
        let aggs: Vec<Expr> = integer_cols
            .iter()
            .enumerate()
            .map(|(i, name)| count_distinct(column(name.as_str())).alias(format!("n{}", i)))
            .collect();
        let batches = df
            .clone()
            .aggregate(vec![], aggs)
            .map_err(LaundryError::from)?
            .collect()
            .await
            .map_err(LaundryError::from)?;
        for (i, name) in integer_cols.iter().enumerate() {
            let n = match first_scalar(&batches, i)? {
                ScalarValue::Int64(Some(n)) => n,
                other => {
                    return Err(LaundryError::InvalidParameter(format!(
                        "Unexpected distinct count {:?} for column '{}'",
                        other, name
                    )))
                }
            };
            distinct_counts.insert(name.to_string(), n);
        }
    }

    let mut column_types = ColumnTypes::default();
    for (name, dt) in fields {
        let kind = if is_always_numeric(&dt) {
            ColumnKind::Numeric
        } else if dt.is_integer() {
            let n = distinct_counts.get(&name).copied().unwrap_or(0);
            if n as usize > config.max_categories {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            }
        } else {
            ColumnKind::Categorical
        };
        debug!("Column '{}' ({}) categorized as {}", name, dt, kind);
        match kind {
            ColumnKind::Numeric => column_types.numeric.push(name),
            ColumnKind::Categorical => column_types.categorical.push(name),
        }
    }
    Ok(column_types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind_parsing() {
        assert_eq!("numeric".parse::<ColumnKind>().unwrap(), ColumnKind::Numeric);
        assert_eq!(
            "categorical".parse::<ColumnKind>().unwrap(),
            ColumnKind::Categorical
        );
        assert!(matches!(
            "Numeric".parse::<ColumnKind>(),
            Err(LaundryError::InvalidColumnKey(_))
        ));
    }

    #[test]
    fn test_from_mapping_rejects_unknown_key() {
        let mut mapping = HashMap::new();
        mapping.insert("numeric".to_string(), vec!["a".to_string()]);
        mapping.insert("text".to_string(), vec!["b".to_string()]);
        let err = ColumnTypes::from_mapping(mapping).unwrap_err();
        assert!(matches!(err, LaundryError::InvalidColumnKey(_)));
    }

    #[test]
    fn test_from_mapping_requires_both_keys() {
        let mut mapping = HashMap::new();
        mapping.insert("numeric".to_string(), vec!["a".to_string()]);
        let err = ColumnTypes::try_from(mapping).unwrap_err();
        assert!(matches!(err, LaundryError::InvalidParameter(_)));
    }

    #[test]
    fn test_kind_of() {
        let types = ColumnTypes::new(vec!["a".to_string()], vec!["b".to_string()]);
        assert_eq!(types.kind_of("a"), Some(ColumnKind::Numeric));
        assert_eq!(types.kind_of("b"), Some(ColumnKind::Categorical));
        assert_eq!(types.kind_of("c"), None);
        assert_eq!(types.all_columns().count(), 2);
    }
}
