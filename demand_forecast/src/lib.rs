//! # Demand Forecast
//!
//! A Rust library for forecasting a daily demand signal from tagged
//! resource-usage history.
//!
//! ## Features
//!
//! - CSV/DataFrame preparation with date parsing and one-hot encoding
//! - Chronological train/validation/test splitting
//! - Gradient-boosted regression against a last-value baseline
//! - MAE, RMSE, MAPE and Bias scoring
//! - Rolling-origin backtesting, optionally on the rayon pool
//! - Multi-step forecasts, carry-forward or recursive
//! - Optional calendar, lag and rolling feature engineering
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::{ModelRegistry, PipelineConfig};
//!
//! let registry = ModelRegistry::new(PipelineConfig::default())?;
//! registry.train_all("usage.csv")?;
//!
//! for row in registry.forecast(30)? {
//!     println!("{} {:.2}", row.date, row.predicted);
//! }
//! for (model, metrics) in registry.metrics()? {
//!     println!("{}\n{}", model, metrics);
//! }
//! # Ok::<(), demand_forecast::ForecastError>(())
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod engineering;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod split;
pub mod trainer;

// Re-export commonly used types
pub use crate::backtest::{BacktestSummary, BacktestWindow, Backtester};
pub use crate::config::{
    BacktestConfig, EngineeringConfig, ForecastConfig, ForecastMode, PipelineConfig,
    PrepareConfig, SplitConfig,
};
pub use crate::data::{DataPreparer, PreparedDataset};
pub use crate::engineering::FeatureEngineer;
pub use crate::error::{ForecastError, Result};
pub use crate::features::{build_feature_target, FeatureSet};
pub use crate::forecaster::{ForecastRow, Forecaster};
pub use crate::metrics::{evaluate, Metrics};
pub use crate::registry::{ModelRegistry, RegistrySnapshot};
pub use crate::split::{time_based_split, Split};
pub use crate::trainer::{ModelArtifact, NaiveBaseline, Trainer};
pub use tree_boost::GbmParams;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
