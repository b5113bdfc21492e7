//! ## Laundry Pipeline
//!
//! This module provides the abstractions for fitting and applying chains of transformers.
//!
//! Every imputer, encoder, scaler and selector in [`crate::transformers`] implements
//! [`Transformer`], so they can be boxed and run in sequence by a [`Pipeline`]. Fitting a
//! pipeline on a training set fits each step on the output of the step before it; the fitted
//! pipeline can then transform a test set with the same parameters.
//!
//! [`crate::impl_transformer`] derives the trait from inherent methods and
//! [`crate::make_pipeline`] boxes the steps for you.

use crate::exceptions::{LaundryError, LaundryResult};
use async_trait::async_trait;
use datafusion::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// A preprocessing step.
///
/// `fit` may run aggregate queries to learn parameters from training data; `transform` only
/// extends the logical plan and never executes it.
#[async_trait]
pub trait Transformer {
    /// Learns the step's parameters from the training DataFrame `df`.
    async fn fit(&mut self, df: &DataFrame) -> LaundryResult<()>;

    /// Applies the fitted parameters to `df`. Stateful steps fail with
    /// [`LaundryError::FitNotCalled`] before `fit`.
    fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame>;

    /// Whether `fit` must run before `transform`.
    fn is_stateful(&self) -> bool;
}

/// Implements [`Transformer`] by forwarding to inherent methods, which the type must define:
/// - `async fn fit(&mut self, &DataFrame) -> LaundryResult<()>`
/// - `fn transform(&self, DataFrame) -> LaundryResult<DataFrame>`
/// - **`fn inherent_is_stateful(&self) -> bool`**
///
/// # Example
///
/// ```rust,no_run
/// use laundry::exceptions::LaundryResult;
/// use datafusion::prelude::DataFrame;
/// use laundry::impl_transformer;
///
/// pub struct Passthrough;
///
/// impl Passthrough {
///     pub async fn fit(&mut self, _df: &DataFrame) -> LaundryResult<()> {
///         Ok(())
///     }
///
///     pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
///         Ok(df)
///     }
///
///     pub fn inherent_is_stateful(&self) -> bool {
///         false
///     }
/// }
///
/// impl_transformer!(Passthrough);
/// ```
#[macro_export]
macro_rules! impl_transformer {
    ($ty:ty) => {
        #[async_trait::async_trait]
        impl $crate::pipeline::Transformer for $ty {
            async fn fit(
                &mut self,
                df: &datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::LaundryResult<()> {
                <$ty>::fit(self, df).await
            }
            fn transform(
                &self,
                df: datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::LaundryResult<datafusion::prelude::DataFrame> {
                <$ty>::transform(self, df)
            }
            fn is_stateful(&self) -> bool {
                <$ty>::inherent_is_stateful(self)
            }
        }
    };
}

/// Named steps run in order, each one consuming the plan produced by the previous one.
///
/// Apart from the aggregate queries issued while fitting, nothing executes until the caller
/// collects the result.
pub struct Pipeline {
    steps: Vec<(String, Box<dyn Transformer + Send + Sync>)>,
    verbose: bool,
}

impl Pipeline {
    /// `steps` are `(name, transformer)` pairs; with `verbose` every step and its timing is
    /// logged at `INFO` instead of `DEBUG`.
    pub fn new(steps: Vec<(String, Box<dyn Transformer + Send + Sync>)>, verbose: bool) -> Self {
        Self { steps, verbose }
    }

    /// Names of the steps, in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Fits each transformer (sequentially) and returns the transformed DataFrame.
    pub async fn fit(&mut self, df: &DataFrame) -> LaundryResult<DataFrame> {
        if self.steps.is_empty() {
            return Err(LaundryError::InvalidParameter(
                "Pipeline has no steps.".to_string(),
            ));
        }
        let mut current_df = df.clone();
        for (name, step) in self.steps.iter_mut() {
            if self.verbose {
                info!("Fitting step: {}", name);
            }
            let start = Instant::now();
            step.fit(&current_df).await.map_err(|e| {
                LaundryError::InvalidParameter(format!(
                    "Error fitting transformer '{}': {}",
                    name, e
                ))
            })?;
            current_df = step.transform(current_df).map_err(|e| {
                LaundryError::InvalidParameter(format!(
                    "Error transforming in '{}': {}",
                    name, e
                ))
            })?;
            if self.verbose {
                info!("Step '{}' completed in {:?}", name, start.elapsed());
            } else {
                debug!("Step '{}' completed in {:?}", name, start.elapsed());
            }
        }
        Ok(current_df)
    }

    /// Runs every fitted step over `df` without refitting.
    pub fn transform(&self, df: DataFrame) -> LaundryResult<DataFrame> {
        if self.steps.is_empty() {
            return Err(LaundryError::InvalidParameter(
                "Pipeline has no steps.".to_string(),
            ));
        }
        let mut current_df = df;
        for (name, step) in self.steps.iter() {
            if self.verbose {
                info!("Applying transformer: {}", name);
            }
            current_df = step.transform(current_df).map_err(|e| {
                LaundryError::InvalidParameter(format!("Error in transformer '{}': {}", name, e))
            })?;
        }
        Ok(current_df)
    }

    /// Alias of [`Pipeline::fit`], which already returns the transformed DataFrame.
    pub async fn fit_transform(&mut self, df: &DataFrame) -> LaundryResult<DataFrame> {
        self.fit(df).await
    }
}

/// Builds a [`Pipeline`] from `(name, transformer)` pairs, boxing each transformer.
///
/// # Example
///
/// ```rust,no_run
/// use laundry::make_pipeline;
/// use laundry::transformers::imputation::{ImputeStrategy, MeanMedianImputer};
///
/// let pipeline = make_pipeline!(false,
///     ("impute", MeanMedianImputer::new(vec!["age".to_string()], ImputeStrategy::Median)),
/// );
/// ```
#[macro_export]
macro_rules! make_pipeline {
    ($verbose:expr, $(($name:expr, $transformer:expr)),+ $(,)?) => {
        {
            let steps: Vec<(String, Box<dyn $crate::pipeline::Transformer + Send + Sync>)> = vec![
                $(
                    ($name.to_string(), Box::new($transformer)),
                )+
            ];
            $crate::pipeline::Pipeline::new(steps, $verbose)
        }
    };
}
