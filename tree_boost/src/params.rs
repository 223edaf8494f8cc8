//! Hyperparameters for the boosted ensemble

use crate::{BoostError, Result};
use serde::{Deserialize, Serialize};

/// Gradient boosting hyperparameters
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `n_estimators`     | 300     |
/// | `max_depth`        | 5       |
/// | `learning_rate`    | 0.05    |
/// | `subsample`        | 0.8     |
/// | `colsample_bytree` | 0.8     |
/// | `min_samples_leaf` | 1       |
/// | `reg_lambda`       | 1.0     |
/// | `seed`             | 42      |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbmParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Maximum depth of each tree (root is depth 0)
    pub max_depth: usize,
    /// Shrinkage applied to every tree's output
    pub learning_rate: f64,
    /// Fraction of rows drawn without replacement for each tree
    pub subsample: f64,
    /// Fraction of feature columns drawn for each tree
    pub colsample_bytree: f64,
    /// Minimum number of rows in each leaf after a split
    pub min_samples_leaf: usize,
    /// L2 regularisation on leaf values
    pub reg_lambda: f64,
    /// Seed for row and column sampling
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_depth: 5,
            learning_rate: 0.05,
            subsample: 0.8,
            colsample_bytree: 0.8,
            min_samples_leaf: 1,
            reg_lambda: 1.0,
            seed: 42,
        }
    }
}

impl GbmParams {
    /// Set the number of trees.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Set the maximum tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the row sampling fraction.
    #[must_use]
    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample;
        self
    }

    /// Set the per-tree column sampling fraction.
    #[must_use]
    pub fn with_colsample_bytree(mut self, colsample_bytree: f64) -> Self {
        self.colsample_bytree = colsample_bytree;
        self
    }

    /// Set the minimum leaf size.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the L2 leaf regularisation.
    #[must_use]
    pub fn with_reg_lambda(mut self, reg_lambda: f64) -> Self {
        self.reg_lambda = reg_lambda;
        self
    }

    /// Set the sampling seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every parameter is inside its valid range
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(BoostError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(BoostError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(BoostError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(BoostError::InvalidParameter(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return Err(BoostError::InvalidParameter(format!(
                "colsample_bytree must be in (0, 1], got {}",
                self.colsample_bytree
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(BoostError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if !self.reg_lambda.is_finite() || self.reg_lambda < 0.0 {
            return Err(BoostError::InvalidParameter(format!(
                "reg_lambda must be non-negative, got {}",
                self.reg_lambda
            )));
        }
        Ok(())
    }
}
