//! Helpers shared by the transformers.

use crate::exceptions::{LaundryError, LaundryResult};
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use datafusion::arrow::datatypes::DataType;
use datafusion::prelude::DataFrame;
use datafusion::scalar::ScalarValue;
use datafusion_expr::{ident, Expr};
use datafusion_functions::math;
use std::cmp::Ordering;

/// Validates that every column in `target_cols` exists in the DataFrame.
/// Returns an error if any target column is missing.
pub(crate) fn validate_columns(df: &DataFrame, target_cols: &[String]) -> LaundryResult<()> {
    let schema = df.schema();
    for col_name in target_cols {
        if schema.field_with_name(None, col_name).is_err() {
            return Err(LaundryError::MissingColumn(format!(
                "Column '{}' not found in DataFrame",
                col_name
            )));
        }
    }
    Ok(())
}

/// Column names of a DataFrame in schema order.
pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

/// Checks that the training and test sets have the same columns in the same order.
pub(crate) fn validate_same_columns(train: &DataFrame, test: &DataFrame) -> LaundryResult<()> {
    let train_cols = column_names(train);
    let test_cols = column_names(test);
    if train_cols != test_cols {
        return Err(LaundryError::SchemaMismatch(format!(
            "training set has columns {:?} but test set has columns {:?}",
            train_cols, test_cols
        )));
    }
    Ok(())
}

/// Looks up the Arrow type of a column.
pub(crate) fn column_type(df: &DataFrame, col_name: &str) -> LaundryResult<DataType> {
    df.schema()
        .field_with_name(None, col_name)
        .map(|f| f.data_type().clone())
        .map_err(|_| {
            LaundryError::MissingColumn(format!("Column '{}' not found in DataFrame", col_name))
        })
}

/// Reference to a column of the input table by its exact name.
///
/// Unlike `col`, the name is not parsed as a SQL identifier, so dots and upper-case letters
/// are kept as they are.
pub(crate) fn column(name: &str) -> Expr {
    ident(name)
}

/// Predicate that is true where a value counts as missing: null, or NaN for floating-point columns.
pub(crate) fn missing_predicate(col_name: &str, data_type: &DataType) -> Expr {
    if data_type.is_floating() {
        column(col_name)
            .is_null()
            .or(math::isnan().call(vec![column(col_name)]))
    } else {
        column(col_name).is_null()
    }
}

/// Reads the scalar in row 0 of column `idx` of the first batch.
pub(crate) fn first_scalar(batches: &[RecordBatch], idx: usize) -> LaundryResult<ScalarValue> {
    let batch = batches
        .iter()
        .find(|b| b.num_rows() > 0)
        .ok_or_else(|| LaundryError::InvalidParameter("Aggregate returned no rows".to_string()))?;
    ScalarValue::try_from_array(batch.column(idx), 0).map_err(LaundryError::from)
}

/// Extracts a finite `f64` out of a scalar produced by an aggregate over a Float64 column.
pub(crate) fn scalar_to_f64(scalar: &ScalarValue, what: &str, col_name: &str) -> LaundryResult<f64> {
    match scalar {
        ScalarValue::Float64(Some(v)) if v.is_finite() => Ok(*v),
        _ => Err(LaundryError::InvalidParameter(format!(
            "Failed to compute {} for column '{}': it has no observed values",
            what, col_name
        ))),
    }
}

/// Collects the distinct non-null values of a column, sorted ascending.
pub(crate) async fn sorted_distinct_values(
    df: &DataFrame,
    col_name: &str,
) -> LaundryResult<Vec<ScalarValue>> {
    let distinct_df = df
        .clone()
        .select(vec![column(col_name)])?
        .filter(column(col_name).is_not_null())?
        .distinct()?;
    let batches = distinct_df.collect().await.map_err(LaundryError::from)?;
    let mut values = Vec::new();
    for batch in batches {
        let array = batch.column(0);
        for i in 0..array.len() {
            if !array.is_null(i) {
                values.push(ScalarValue::try_from_array(array, i)?);
            }
        }
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(values)
}
