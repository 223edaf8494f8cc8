//! # Tree Boost
//!
//! Gradient-boosted regression trees for tabular data.
//! This crate provides a squared-error gradient boosting ensemble built from
//! CART regression trees, with row and column subsampling driven by a
//! deterministic seed.

use thiserror::Error;

pub mod booster;
pub mod params;
pub mod tree;

pub use booster::GradientBoostedRegressor;
pub use params::GbmParams;
pub use tree::RegressionTree;

/// Errors that can occur while fitting or applying a boosted ensemble
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoostError {
    #[error("training dataset has zero samples")]
    EmptyDataset,

    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        expected: usize,
        got: usize,
        sample_index: usize,
    },

    #[error("{targets} targets supplied for {samples} samples")]
    TargetLengthMismatch { samples: usize, targets: usize },

    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        sample_index: usize,
        feature_index: usize,
    },

    #[error("non-finite target at sample {sample_index}")]
    NonFiniteTarget { sample_index: usize },

    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch { expected: usize, got: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for boosting operations
pub type Result<T> = std::result::Result<T, BoostError>;
