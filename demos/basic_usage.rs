// Run `cargo run --example basic_usage` to execute this example
// Set `DEBUG_LAUNDRY=1` to see the debug logs

use laundry::settings::{
    DEFAULT_CATEGORICAL_IMPUTATION, DEFAULT_CATEGORICAL_TRANSFORM, DEFAULT_NUMERIC_IMPUTATION,
    DEFAULT_NUMERIC_TRANSFORM,
};
use laundry::{
    categorize, feature_selector, fill_missing, transform_columns, CategorizeConfig,
    SelectionMode,
};
use std::error::Error;
mod shared;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let path = format!("{}/{}", shared::DATA_DIR, "housing.csv");
    let input_df = shared::load_data(&path).await?;
    let (train, test) = shared::train_test_split(&input_df, 9)?;

    // Decide which columns are numeric and which are categorical (the target is left out)
    let config = CategorizeConfig::default()
        .with_max_categories(5)
        .with_excluded(vec!["price".to_string()]);
    let column_types = categorize(&train, &config).await?;
    println!("Numeric columns: {:?}", column_types.numeric);
    println!("Categorical columns: {:?}", column_types.categorical);

    // Fill missing values with statistics of the training set
    let filled = fill_missing(
        &train,
        &test,
        &column_types,
        DEFAULT_NUMERIC_IMPUTATION.parse()?,
        DEFAULT_CATEGORICAL_IMPUTATION.parse()?,
    )
    .await?;

    // Rank the numeric features against the price
    let categorical: Vec<&str> = column_types
        .categorical
        .iter()
        .map(String::as_str)
        .collect();
    let numeric_train = filled.train.clone().drop_columns(&categorical)?;
    let ranked = feature_selector(&numeric_train, "price", SelectionMode::Regression, 2).await?;
    println!("Top features for 'price': {:?}", ranked);

    // Scale the numeric columns and one-hot encode the categorical ones
    let transformed = transform_columns(
        &filled.train,
        &filled.test,
        &column_types,
        DEFAULT_CATEGORICAL_TRANSFORM.parse()?,
        DEFAULT_NUMERIC_TRANSFORM.parse()?,
    )
    .await?;

    transformed.train.show().await?;
    transformed.test.show().await?;

    Ok(())
}
