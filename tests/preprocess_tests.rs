use std::collections::HashMap;
use std::sync::Arc;

use approx::assert_relative_eq;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::memory::MemTable;
use datafusion::prelude::*;

use laundry::exceptions::{LaundryError, LaundryResult};
use laundry::{
    categorize, feature_selector, fill_missing, transform_columns, CategoricalImputeStrategy,
    CategoricalTransform, CategorizeConfig, ColumnTypes, ImputeStrategy, NumericTransform,
    SelectionMode,
};

async fn dataframe_from(columns: Vec<(&str, ArrayRef)>) -> DataFrame {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();
    let mem_table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    let ctx = SessionContext::new();
    ctx.register_table("t", Arc::new(mem_table)).unwrap();
    ctx.table("t").await.unwrap()
}

async fn create_train_df() -> DataFrame {
    dataframe_from(vec![
        ("a", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
        (
            "b",
            Arc::new(Float64Array::from(vec![1.2, 3.4, 3.0])) as ArrayRef,
        ),
        (
            "c",
            Arc::new(StringArray::from(vec!["A", "B", "C"])) as ArrayRef,
        ),
    ])
    .await
}

async fn create_test_df() -> DataFrame {
    dataframe_from(vec![
        ("a", Arc::new(Int64Array::from(vec![6, 2])) as ArrayRef),
        ("b", Arc::new(Float64Array::from(vec![0.5, 9.2])) as ArrayRef),
        ("c", Arc::new(StringArray::from(vec!["B", "B"])) as ArrayRef),
    ])
    .await
}

fn column_types() -> ColumnTypes {
    ColumnTypes::new(
        vec!["a".to_string(), "b".to_string()],
        vec!["c".to_string()],
    )
}

async fn collect(df: DataFrame) -> LaundryResult<RecordBatch> {
    let batches = df.collect().await?;
    let schema = batches[0].schema();
    Ok(concat_batches(&schema, &batches)?)
}

fn float_values(batch: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    let array = batch
        .column(batch.schema().index_of(name).unwrap())
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("Expected Float64Array");
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i)))
        .collect()
}

fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

#[tokio::test]
async fn test_transform_columns_with_defaults() -> LaundryResult<()> {
    let train = create_train_df().await;
    let test = create_test_df().await;

    let out = transform_columns(
        &train,
        &test,
        &column_types(),
        CategoricalTransform::default(),
        NumericTransform::default(),
    )
    .await?;

    let train_batch = collect(out.train).await?;
    let test_batch = collect(out.test).await?;
    assert_eq!(column_names(&train_batch), vec!["a", "b", "c_B", "c_C"]);
    assert_eq!(column_names(&test_batch), vec!["a", "b", "c_B", "c_C"]);

    let a = float_values(&train_batch, "a");
    let expected = [-1.224745, 0.0, 1.224745];
    for (value, exp) in a.iter().zip(expected.iter()) {
        assert_relative_eq!(value.unwrap(), *exp, epsilon = 1e-6);
    }
    let a = float_values(&test_batch, "a");
    assert_relative_eq!(a[0].unwrap(), 4.898979, epsilon = 1e-6);
    assert_relative_eq!(a[1].unwrap(), 0.0, epsilon = 1e-12);

    assert_eq!(float_values(&train_batch, "c_B"), vec![Some(0.0), Some(1.0), Some(0.0)]);
    assert_eq!(float_values(&train_batch, "c_C"), vec![Some(0.0), Some(0.0), Some(1.0)]);
    assert_eq!(float_values(&test_batch, "c_B"), vec![Some(1.0), Some(1.0)]);
    assert_eq!(float_values(&test_batch, "c_C"), vec![Some(0.0), Some(0.0)]);
    Ok(())
}

#[tokio::test]
async fn test_transform_columns_label_and_minmax() -> LaundryResult<()> {
    let train = create_train_df().await;
    let test = create_test_df().await;

    let out = transform_columns(
        &train,
        &test,
        &column_types(),
        "label_encoding".parse()?,
        "minmax_scaling".parse()?,
    )
    .await?;

    let train_batch = collect(out.train).await?;
    let test_batch = collect(out.test).await?;
    assert_eq!(column_names(&train_batch), vec!["a", "b", "c"]);
    assert_eq!(
        float_values(&train_batch, "a"),
        vec![Some(0.0), Some(0.5), Some(1.0)]
    );
    assert_eq!(float_values(&test_batch, "a"), vec![Some(2.5), Some(0.5)]);
    assert_eq!(
        float_values(&train_batch, "c"),
        vec![Some(0.0), Some(1.0), Some(2.0)]
    );
    assert_eq!(float_values(&test_batch, "c"), vec![Some(1.0), Some(1.0)]);
    Ok(())
}

#[tokio::test]
async fn test_fill_missing_uses_training_statistics() -> LaundryResult<()> {
    let train = dataframe_from(vec![
        (
            "a",
            Arc::new(Float64Array::from(vec![Some(1.0), None, Some(3.0), Some(8.0)])) as ArrayRef,
        ),
        (
            "c",
            Arc::new(StringArray::from(vec![Some("A"), Some("B"), Some("B"), None])) as ArrayRef,
        ),
    ])
    .await;
    let test = dataframe_from(vec![
        (
            "a",
            Arc::new(Float64Array::from(vec![None, Some(100.0)])) as ArrayRef,
        ),
        (
            "c",
            Arc::new(StringArray::from(vec![None, Some("A")])) as ArrayRef,
        ),
    ])
    .await;
    let types = ColumnTypes::new(vec!["a".to_string()], vec!["c".to_string()]);

    let filled = fill_missing(
        &train,
        &test,
        &types,
        ImputeStrategy::Median,
        CategoricalImputeStrategy::Mode,
    )
    .await?;

    let train_batch = collect(filled.train).await?;
    let test_batch = collect(filled.test).await?;
    assert_eq!(
        float_values(&train_batch, "a"),
        vec![Some(1.0), Some(3.0), Some(3.0), Some(8.0)]
    );
    assert_eq!(float_values(&test_batch, "a"), vec![Some(3.0), Some(100.0)]);

    let c = test_batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(c.null_count(), 0);
    assert_eq!(c.value(0), "B");
    assert_eq!(c.value(1), "A");
    Ok(())
}

#[tokio::test]
async fn test_schema_mismatch_is_rejected() {
    let train = create_train_df().await;
    let test = dataframe_from(vec![
        ("a", Arc::new(Int64Array::from(vec![6, 2])) as ArrayRef),
        ("c", Arc::new(StringArray::from(vec!["B", "B"])) as ArrayRef),
    ])
    .await;

    assert!(matches!(
        fill_missing(
            &train,
            &test,
            &column_types(),
            ImputeStrategy::Mean,
            CategoricalImputeStrategy::Mode
        )
        .await,
        Err(LaundryError::SchemaMismatch(_))
    ));
    assert!(matches!(
        transform_columns(
            &train,
            &test,
            &column_types(),
            CategoricalTransform::OneHotEncoding,
            NumericTransform::StandardScaling
        )
        .await,
        Err(LaundryError::SchemaMismatch(_))
    ));
}

#[tokio::test]
async fn test_invalid_arguments() {
    let train = create_train_df().await;
    let test = create_test_df().await;

    // "c" holds strings, so it cannot be a numeric column.
    let types = ColumnTypes::new(vec!["c".to_string()], vec![]);
    assert!(matches!(
        fill_missing(
            &train,
            &test,
            &types,
            ImputeStrategy::Mean,
            CategoricalImputeStrategy::Mode
        )
        .await,
        Err(LaundryError::InvalidParameter(_))
    ));

    let types = ColumnTypes::new(vec!["a".to_string(), "z".to_string()], vec![]);
    assert!(matches!(
        transform_columns(
            &train,
            &test,
            &types,
            CategoricalTransform::OneHotEncoding,
            NumericTransform::StandardScaling
        )
        .await,
        Err(LaundryError::MissingColumn(_))
    ));

    let mut mapping = HashMap::new();
    mapping.insert("numbers".to_string(), vec!["a".to_string()]);
    mapping.insert("categorical".to_string(), vec!["c".to_string()]);
    assert!(matches!(
        ColumnTypes::from_mapping(mapping),
        Err(LaundryError::InvalidColumnKey(_))
    ));

    assert!("mode".parse::<ImputeStrategy>().is_err());
    assert!("target_encoding".parse::<CategoricalTransform>().is_err());
    assert!("log_scaling".parse::<NumericTransform>().is_err());
}

#[tokio::test]
async fn test_column_listed_twice_is_rejected() {
    let train = create_train_df().await;
    let test = create_test_df().await;
    let types = ColumnTypes::new(
        vec!["a".to_string(), "c".to_string()],
        vec!["c".to_string()],
    );

    assert!(matches!(
        fill_missing(
            &train,
            &test,
            &types,
            ImputeStrategy::Mean,
            CategoricalImputeStrategy::Mode
        )
        .await,
        Err(LaundryError::InvalidParameter(_))
    ));
    assert!(matches!(
        transform_columns(
            &train,
            &test,
            &types,
            CategoricalTransform::OneHotEncoding,
            NumericTransform::StandardScaling
        )
        .await,
        Err(LaundryError::InvalidParameter(_))
    ));
}

#[tokio::test]
async fn test_dotted_mixed_case_column_names() -> LaundryResult<()> {
    let df = dataframe_from(vec![
        (
            "Area.m2",
            Arc::new(Float64Array::from(vec![Some(10.0), None, Some(30.0), Some(40.0)])) as ArrayRef,
        ),
        (
            "Zone.Code",
            Arc::new(StringArray::from(vec![
                Some("North"),
                Some("South"),
                None,
                Some("North"),
            ])) as ArrayRef,
        ),
        (
            "Price.EUR",
            Arc::new(Float64Array::from(vec![100.0, 200.0, 300.0, 400.0])) as ArrayRef,
        ),
    ])
    .await;

    let config = CategorizeConfig::default().with_excluded(vec!["Price.EUR".to_string()]);
    let types = categorize(&df, &config).await?;
    assert_eq!(types.numeric, vec!["Area.m2"]);
    assert_eq!(types.categorical, vec!["Zone.Code"]);

    let filled = fill_missing(
        &df,
        &df,
        &types,
        ImputeStrategy::Mean,
        CategoricalImputeStrategy::Mode,
    )
    .await?;
    let batch = collect(filled.train.clone()).await?;
    let area = float_values(&batch, "Area.m2");
    assert_relative_eq!(area[1].unwrap(), 80.0 / 3.0, epsilon = 1e-9);
    let zone = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(zone.value(2), "North");

    let out = transform_columns(
        &filled.train,
        &filled.test,
        &types,
        CategoricalTransform::OneHotEncoding,
        NumericTransform::MinMaxScaling,
    )
    .await?;
    let batch = collect(out.train).await?;
    assert_eq!(column_names(&batch), vec!["Area.m2", "Zone.Code_South"]);
    assert_eq!(float_values(&batch, "Area.m2")[0], Some(0.0));
    assert_eq!(float_values(&batch, "Area.m2")[3], Some(1.0));
    assert_eq!(
        float_values(&batch, "Zone.Code_South"),
        vec![Some(0.0), Some(1.0), Some(0.0), Some(0.0)]
    );

    let out = transform_columns(
        &filled.train,
        &filled.test,
        &types,
        CategoricalTransform::LabelEncoding,
        NumericTransform::StandardScaling,
    )
    .await?;
    let batch = collect(out.test).await?;
    assert_eq!(
        float_values(&batch, "Zone.Code"),
        vec![Some(0.0), Some(1.0), Some(0.0), Some(0.0)]
    );

    let numeric_only = filled.train.drop_columns(&["Zone.Code"])?;
    let ranked = feature_selector(&numeric_only, "Price.EUR", SelectionMode::Regression, 1).await?;
    assert_eq!(ranked, vec!["Area.m2"]);
    Ok(())
}

#[tokio::test]
async fn test_full_flow() -> LaundryResult<()> {
    let n = 20;
    let df = dataframe_from(vec![
        (
            "size",
            Arc::new(Float64Array::from(
                (0..n)
                    .map(|i| if i == 3 { None } else { Some(50.0 + i as f64) })
                    .collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        (
            "district",
            Arc::new(StringArray::from(
                (0..n)
                    .map(|i| if i < n / 2 { "north" } else { "south" })
                    .collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        (
            "noise",
            Arc::new(Float64Array::from(
                (0..n).map(|i| (i % 2) as f64).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        (
            "price",
            Arc::new(Float64Array::from(
                (0..n).map(|i| 1000.0 + 10.0 * i as f64).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
    ])
    .await;

    let config = CategorizeConfig::default().with_excluded(vec!["price".to_string()]);
    let types = categorize(&df, &config).await?;
    assert_eq!(types.numeric, vec!["size", "noise"]);
    assert_eq!(types.categorical, vec!["district"]);

    let filled = fill_missing(
        &df,
        &df,
        &types,
        ImputeStrategy::Mean,
        CategoricalImputeStrategy::Mode,
    )
    .await?;
    let ready = transform_columns(
        &filled.train,
        &filled.test,
        &types,
        CategoricalTransform::OneHotEncoding,
        NumericTransform::MinMaxScaling,
    )
    .await?;

    let names: Vec<String> = ready
        .train
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(names, vec!["size", "noise", "district_south"]);

    // Only the size drives the price.
    let numeric_only = filled.train.drop_columns(&["district"])?;
    let ranked = feature_selector(&numeric_only, "price", SelectionMode::Regression, 1).await?;
    assert_eq!(ranked, vec!["size"]);
    Ok(())
}
