#![allow(dead_code)]

use datafusion::dataframe::DataFrame;
use datafusion::prelude::{CsvReadOptions, SessionContext};
use std::path::Path;

// Path to the directory containing the demo datasets
pub const DATA_DIR: &str = "demos/data";

/// Loads data from a given path and automatically detects the format (CSV or Parquet).
pub async fn load_data(path: &str) -> Result<DataFrame, datafusion::error::DataFusionError> {
    let ctx = SessionContext::new();

    let extension = Path::new(path).extension().and_then(|ext| ext.to_str());
    let df = match extension {
        Some("parquet") => ctx.read_parquet(path, Default::default()).await?,
        Some("csv") => ctx.read_csv(path, CsvReadOptions::new()).await?,
        _ => {
            return Err(datafusion::error::DataFusionError::Execution(
                "Unsupported file format. Please provide a CSV or Parquet file.".to_string(),
            ))
        }
    };

    Ok(df)
}

/// Splits a DataFrame into its first `n_train` rows and the remaining rows.
pub fn train_test_split(
    df: &DataFrame,
    n_train: usize,
) -> Result<(DataFrame, DataFrame), datafusion::error::DataFusionError> {
    let train = df.clone().limit(0, Some(n_train))?;
    let test = df.clone().limit(n_train, None)?;
    Ok((train, test))
}

fn main() {}
