//! ## Column transformer
//!
//! [`ColumnTransformer`] scales the numeric columns and encodes the categorical columns of a
//! [`ColumnTypes`] mapping in one step. Parameters are learned by `fit` only; `transform` applies
//! them unchanged, so fitting on the training set and transforming a test set never leaks
//! test statistics.
//!
//! The output holds the numeric columns (in mapping order) followed by the encoded categorical
//! columns. Columns absent from the mapping are dropped.

use crate::exceptions::{LaundryError, LaundryResult};
use crate::impl_transformer;
use crate::transformers::categorical_encoding::{
    CategoricalTransform, OneHotEncoder, OrdinalEncoder,
};
use crate::transformers::categorization::ColumnTypes;
use crate::transformers::scaling_and_normalization::{MinMaxScaler, NumericTransform, StandardScaler};
use crate::utils::column;
use datafusion::logical_expr::Expr;
use datafusion::prelude::*;
use tracing::debug;

enum NumericStep {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl NumericStep {
    async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        match self {
            NumericStep::Standard(s) => s.fit(df).await,
            NumericStep::MinMax(s) => s.fit(df).await,
        }
    }

    fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        match self {
            NumericStep::Standard(s) => s.transform(df),
            NumericStep::MinMax(s) => s.transform(df),
        }
    }
}

enum CategoricalStep {
    OneHot(OneHotEncoder),
    Ordinal(OrdinalEncoder),
}

impl CategoricalStep {
    async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        match self {
            CategoricalStep::OneHot(e) => e.fit(df).await,
            CategoricalStep::Ordinal(e) => e.fit(df).await,
        }
    }

    fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        match self {
            CategoricalStep::OneHot(e) => e.transform(df),
            CategoricalStep::Ordinal(e) => e.transform(df),
        }
    }

    fn feature_names(&self) -> Vec<String> {
        match self {
            CategoricalStep::OneHot(e) => e.feature_names(),
            CategoricalStep::Ordinal(e) => e.feature_names(),
        }
    }
}

/// Scales numeric columns and encodes categorical columns, fitting on training data only.
pub struct ColumnTransformer {
    pub column_types: ColumnTypes,
    pub categorical_transform: CategoricalTransform,
    pub numeric_transform: NumericTransform,
    numeric: NumericStep,
    categorical: CategoricalStep,
    fitted: bool,
}

impl ColumnTransformer {
    /// One-hot encoding drops the first category of each column.
    pub fn new(
        column_types: ColumnTypes,
        categorical_transform: CategoricalTransform,
        numeric_transform: NumericTransform,
    ) -> Self {
        let numeric_cols = column_types.numeric.clone();
        let categorical_cols = column_types.categorical.clone();
        let numeric = match numeric_transform {
            NumericTransform::StandardScaling => {
                NumericStep::Standard(StandardScaler::new(numeric_cols))
            }
            NumericTransform::MinMaxScaling => NumericStep::MinMax(MinMaxScaler::new(numeric_cols)),
        };
        let categorical = match categorical_transform {
            CategoricalTransform::OneHotEncoding => {
                CategoricalStep::OneHot(OneHotEncoder::new(categorical_cols, true))
            }
            CategoricalTransform::LabelEncoding => {
                CategoricalStep::Ordinal(OrdinalEncoder::new(categorical_cols))
            }
        };
        Self {
            column_types,
            categorical_transform,
            numeric_transform,
            numeric,
            categorical,
            fitted: false,
        }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()> {
        self.column_types.validate(df)?;
        self.numeric.fit(df).await?;
        self.categorical.fit(df).await?;
        debug!(
            "Fitted column transformer ({} / {}) with output columns {:?}",
            self.numeric_transform,
            self.categorical_transform,
            self.feature_names()
        );
        self.fitted = true;
        Ok(())
    }

    /// Output column names: numeric columns followed by the encoded categorical columns.
    pub fn feature_names(&self) -> Vec<String> {
        self.column_types
            .numeric
            .iter()
            .cloned()
            .chain(self.categorical.feature_names())
            .collect()
    }

    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if !self.fitted {
            return Err(LaundryError::FitNotCalled);
        }
        self.column_types.validate(&df)?;
        let df = self.numeric.transform(df)?;
        let df = self.categorical.transform(df)?;
        let exprs: Vec<Expr> = self
            .feature_names()
            .iter()
            .map(|name| column(name.as_str()))
            .collect();
        if exprs.is_empty() {
            return Err(LaundryError::InvalidParameter(
                "Column transformer produces no output columns.".to_string(),
            ));
        }
        df.select(exprs).map_err(LaundryError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(ColumnTransformer);
