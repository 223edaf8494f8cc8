//! Gradient-boosted ensemble of regression trees

use crate::params::GbmParams;
use crate::tree::{RegressionTree, TreeGrower};
use crate::{BoostError, Result};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A fitted gradient-boosted regressor with squared-error loss.
///
/// Predictions are `base_score + learning_rate * Σ tree(x)`, where
/// `base_score` is the mean training target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    params: GbmParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
    gain_totals: Vec<f64>,
}

impl GradientBoostedRegressor {
    /// Fit an ensemble on row-major `features` and matching `targets`.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                  |
    /// |----------------------------------------|---------------------------------------|
    /// | [`BoostError::InvalidParameter`]       | `params` fail validation              |
    /// | [`BoostError::EmptyDataset`]           | `features` is empty                   |
    /// | [`BoostError::TargetLengthMismatch`]   | `targets.len() != features.len()`     |
    /// | [`BoostError::ZeroFeatures`]           | rows have no columns                  |
    /// | [`BoostError::FeatureCountMismatch`]   | rows have inconsistent lengths        |
    /// | [`BoostError::NonFiniteValue`]         | a feature is NaN or infinite          |
    /// | [`BoostError::NonFiniteTarget`]        | a target is NaN or infinite           |
    #[instrument(skip_all, fields(n_samples = features.len(), n_trees = params.n_estimators))]
    pub fn fit(params: &GbmParams, features: &[Vec<f64>], targets: &[f64]) -> Result<Self> {
        params.validate()?;
        let n_features = validate_training_data(features, targets)?;
        let n_samples = features.len();

        // Column-major copy so split search scans contiguous values.
        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|f| features.iter().map(|row| row[f]).collect())
            .collect();

        let base_score = targets.iter().sum::<f64>() / n_samples as f64;
        let mut predictions = vec![base_score; n_samples];
        let mut residuals = vec![0.0; n_samples];
        let mut gain_totals = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(params.n_estimators);

        let row_draw = sample_size(n_samples, params.subsample);
        let column_draw = sample_size(n_features, params.colsample_bytree);
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

        info!(
            n_samples,
            n_features,
            row_draw,
            column_draw,
            base_score,
            "fitting gradient-boosted regressor"
        );

        for round in 0..params.n_estimators {
            for (residual, (target, prediction)) in residuals
                .iter_mut()
                .zip(targets.iter().zip(predictions.iter()))
            {
                *residual = target - prediction;
            }

            let mut rows = sample(&mut rng, n_samples, row_draw).into_vec();
            rows.sort_unstable();
            let mut selected = sample(&mut rng, n_features, column_draw).into_vec();
            selected.sort_unstable();

            let tree = TreeGrower {
                columns: &columns,
                residuals: &residuals,
                features: &selected,
                max_depth: params.max_depth,
                min_samples_leaf: params.min_samples_leaf,
                reg_lambda: params.reg_lambda,
            }
            .grow(rows);

            for (prediction, row) in predictions.iter_mut().zip(features.iter()) {
                *prediction += params.learning_rate * tree.predict_row(row);
            }
            tree.accumulate_gain(&mut gain_totals);
            trees.push(tree);

            if round % 50 == 0 || round + 1 == params.n_estimators {
                let mse = targets
                    .iter()
                    .zip(predictions.iter())
                    .map(|(t, p)| (t - p).powi(2))
                    .sum::<f64>()
                    / n_samples as f64;
                debug!(round, train_rmse = mse.sqrt(), "boosting round");
            }
        }

        Ok(Self {
            params: params.clone(),
            base_score,
            trees,
            n_features,
            gain_totals,
        })
    }

    /// Predict a single row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(BoostError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }

        let boost: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
        Ok(self.base_score + self.params.learning_rate * boost)
    }

    /// Predict every row of a row-major matrix
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Total split gain per feature, normalised to sum to one.
    ///
    /// All zeros when no tree ever split.
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.gain_totals.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.n_features];
        }
        self.gain_totals.iter().map(|gain| gain / total).collect()
    }

    /// Hyperparameters the ensemble was fitted with
    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    /// Mean training target the ensemble starts from
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Fitted trees in boosting order
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Number of feature columns expected at prediction time
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Number of items drawn for a sampling fraction, at least one.
fn sample_size(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).ceil() as usize).clamp(1, n)
}

fn validate_training_data(features: &[Vec<f64>], targets: &[f64]) -> Result<usize> {
    if features.is_empty() {
        return Err(BoostError::EmptyDataset);
    }
    if targets.len() != features.len() {
        return Err(BoostError::TargetLengthMismatch {
            samples: features.len(),
            targets: targets.len(),
        });
    }

    let n_features = features[0].len();
    if n_features == 0 {
        return Err(BoostError::ZeroFeatures);
    }

    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(BoostError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(BoostError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }

    if let Some(sample_index) = targets.iter().position(|t| !t.is_finite()) {
        return Err(BoostError::NonFiniteTarget { sample_index });
    }

    Ok(n_features)
}
