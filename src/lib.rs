//! # Capacity Forecast
//!
//! `capacity_forecast` bundles the workspace crates behind one dependency:
//! [`tree_boost`] for the boosted regressor and [`demand_forecast`] for the
//! pipeline around it.
//!
//! ## Example
//!
//! ```no_run
//! use capacity_forecast::{forecast_csv, PipelineConfig};
//!
//! let forecasts = forecast_csv("usage.csv", PipelineConfig::default())?;
//! assert_eq!(forecasts.len(), 30);
//! # Ok::<(), capacity_forecast::ForecastError>(())
//! ```

use std::path::Path;

pub use demand_forecast;
pub use tree_boost;

pub use demand_forecast::{
    ForecastError, ForecastMode, ForecastRow, Metrics, ModelRegistry, PipelineConfig, Result,
};
pub use tree_boost::{GbmParams, GradientBoostedRegressor};

/// Train on a CSV file and forecast the configured horizon.
///
/// # Examples
///
/// ```no_run
/// use capacity_forecast::{forecast_csv, ForecastMode, PipelineConfig};
///
/// let mut config = PipelineConfig::default();
/// config.forecast.mode = ForecastMode::Recursive;
/// let forecasts = forecast_csv("usage.csv", config)?;
/// # Ok::<(), capacity_forecast::ForecastError>(())
/// ```
pub fn forecast_csv<P: AsRef<Path>>(path: P, config: PipelineConfig) -> Result<Vec<ForecastRow>> {
    let horizon_days = config.forecast.horizon_days;
    let registry = ModelRegistry::new(config)?;
    registry.train_all(path)?;
    registry.forecast(horizon_days)
}
