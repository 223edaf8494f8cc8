//! Model fitting and test-set scoring

use crate::data::PreparedDataset;
use crate::error::{ForecastError, Result};
use crate::features::{
    build_aligned, build_feature_target, feature_columns, ColumnAlignment, FeatureSet,
};
use crate::metrics::{evaluate, Metrics};
use crate::split::Split;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};
use tree_boost::{GbmParams, GradientBoostedRegressor};

/// Metrics key of the boosted regressor
pub const MODEL_NAME: &str = "GradientBoosting";
/// Metrics key of the last-value baseline
pub const BASELINE_NAME: &str = "NaiveLastValue";

/// A fitted regressor and the exact feature columns it expects.
///
/// Immutable once built; share it behind an `Arc` for concurrent inference.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    model: GradientBoostedRegressor,
    feature_columns: Vec<String>,
    target_column: String,
    trained_through: Option<NaiveDate>,
}

impl ModelArtifact {
    /// Fit a regressor on a feature set
    pub fn fit(
        params: &GbmParams,
        features: &FeatureSet,
        target_column: &str,
        trained_through: Option<NaiveDate>,
    ) -> Result<Self> {
        let model = GradientBoostedRegressor::fit(params, &features.matrix, &features.target)?;

        Ok(Self {
            model,
            feature_columns: features.columns.clone(),
            target_column: target_column.to_string(),
            trained_through,
        })
    }

    /// Predict every row of a partition, aligning it to the training columns first
    pub fn predict_dataset(&self, partition: &PreparedDataset) -> Result<Vec<f64>> {
        let alignment = ColumnAlignment::new(partition.columns(), &self.feature_columns);
        let matrix: Vec<Vec<f64>> = partition
            .rows()
            .iter()
            .map(|row| alignment.apply(row))
            .collect();
        self.predict_rows(&matrix)
    }

    /// Predict rows already aligned to [`Self::feature_columns`]
    pub fn predict_rows(&self, matrix: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self.model.predict(matrix)?)
    }

    /// Predict one row already aligned to [`Self::feature_columns`]
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        Ok(self.model.predict_row(row)?)
    }

    /// Ordered feature columns the model was trained on
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Name of the predicted column
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Latest date in the training data
    pub fn trained_through(&self) -> Option<NaiveDate> {
        self.trained_through
    }

    /// The underlying ensemble
    pub fn model(&self) -> &GradientBoostedRegressor {
        &self.model
    }

    /// Normalised gain importance per feature column, largest first
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_columns
            .iter()
            .cloned()
            .zip(self.model.feature_importances())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Predicts the last observed target value for every future row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaiveBaseline {
    value: f64,
}

impl NaiveBaseline {
    /// Baseline from the last element of a date-ordered target vector
    pub fn from_targets(targets: &[f64]) -> Result<Self> {
        targets
            .last()
            .map(|&value| Self { value })
            .ok_or_else(|| {
                ForecastError::DataError("Cannot build a baseline from no targets".to_string())
            })
    }

    /// The broadcast value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// `n` copies of the baseline value
    pub fn predict(&self, n: usize) -> Vec<f64> {
        vec![self.value; n]
    }
}

/// Everything produced by one training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub baseline: NaiveBaseline,
    /// Test-set metrics keyed by model name; empty when the test partition is empty
    pub test_metrics: BTreeMap<String, Metrics>,
}

/// Fits the regressor with fixed hyperparameters
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    params: GbmParams,
}

impl Trainer {
    /// Create a trainer with the given hyperparameters
    pub fn new(params: GbmParams) -> Self {
        Self { params }
    }

    /// Get the hyperparameters
    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    /// Fit a fresh artifact on a single partition
    pub fn fit(&self, partition: &PreparedDataset, target: &str) -> Result<ModelArtifact> {
        let features = build_feature_target(partition, target)?;
        ModelArtifact::fit(&self.params, &features, target, partition.last_date())
    }

    /// Fit on train + validation, then score the model and the naive baseline on test.
    ///
    /// Validation rows are folded into the training data; there is no early stopping.
    #[instrument(skip_all, fields(target = %target))]
    pub fn train(&self, split: &Split, target: &str) -> Result<TrainingOutcome> {
        let columns = feature_columns(&split.train, target)?;
        let fit_data = split.train_and_validation()?;
        let fit_features = build_aligned(&fit_data, &columns, target)?;

        info!(
            rows = fit_features.len(),
            features = columns.len(),
            trees = self.params.n_estimators,
            "training regressor on train + validation"
        );
        let artifact = ModelArtifact::fit(&self.params, &fit_features, target, fit_data.last_date())?;
        let baseline = NaiveBaseline::from_targets(&fit_features.target)?;

        let mut test_metrics = BTreeMap::new();
        if split.test.is_empty() {
            warn!("test partition is empty; skipping test-set scoring");
        } else {
            let test = build_aligned(&split.test, &columns, target)?;
            let predictions = artifact.predict_rows(&test.matrix)?;
            test_metrics.insert(MODEL_NAME.to_string(), evaluate(&test.target, &predictions)?);
            test_metrics.insert(
                BASELINE_NAME.to_string(),
                evaluate(&test.target, &baseline.predict(test.len()))?,
            );
        }

        Ok(TrainingOutcome {
            artifact,
            baseline,
            test_metrics,
        })
    }
}
