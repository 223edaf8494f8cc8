//! Pipeline configuration
//!
//! Every section has a `Default` matching the reference deployment and can be
//! overridden from JSON; missing keys fall back to their defaults.

use crate::error::{ForecastError, Result};
use crate::forecaster::MAX_HORIZON_DAYS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tree_boost::GbmParams;

/// How the raw table is parsed and encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Name of the date column
    pub date_column: String,
    /// `chrono` format string every date must match
    pub date_format: String,
    /// Columns to one-hot encode when they hold strings
    pub categorical_columns: Vec<String>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            date_format: "%d-%m-%Y".to_string(),
            categorical_columns: vec!["region".to_string(), "resource_type".to_string()],
        }
    }
}

/// Chronological split fractions; the test share is the remainder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_frac: f64,
    pub val_frac: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_frac: 0.7,
            val_frac: 0.2,
        }
    }
}

/// Optional derivation of calendar, lag and rolling columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineeringConfig {
    /// Run the feature engineering step before splitting
    pub enabled: bool,
    /// Add day_of_week, month, year, quarter and is_weekend
    pub calendar: bool,
    /// Target lags, in rows of the same category series
    pub lags: Vec<usize>,
    /// Rolling mean/max/min window lengths
    pub rolling_windows: Vec<usize>,
}

impl Default for EngineeringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            calendar: true,
            lags: vec![1, 3, 7],
            rolling_windows: vec![7, 30],
        }
    }
}

/// Rolling-origin backtest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Distinct dates in the first training window
    pub min_train_days: usize,
    /// Distinct dates per evaluation window
    pub horizon_days: usize,
    /// Regressor refitted for every window
    pub model: GbmParams,
    /// Fit windows on the rayon pool
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            min_train_days: 90,
            horizon_days: 30,
            model: GbmParams::default()
                .with_n_estimators(200)
                .with_max_depth(4),
            parallel: false,
        }
    }
}

/// How lag and rolling columns are filled for future dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    /// Copy lag/rolling values unchanged from the last known row
    #[default]
    CarryForward,
    /// Recompute lag/rolling values from the series extended with earlier predictions
    Recursive,
}

/// Forecast horizon and mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizon_days: usize,
    pub mode: ForecastMode,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            mode: ForecastMode::CarryForward,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column holding the demand signal
    pub target_column: String,
    pub prepare: PrepareConfig,
    pub split: SplitConfig,
    pub engineering: EngineeringConfig,
    /// Regressor fitted on train + validation
    pub model: GbmParams,
    pub backtest: BacktestConfig,
    pub forecast: ForecastConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: "usage_cpu".to_string(),
            prepare: PrepareConfig::default(),
            split: SplitConfig::default(),
            engineering: EngineeringConfig::default(),
            model: GbmParams::default(),
            backtest: BacktestConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Set the target column.
    #[must_use]
    pub fn with_target_column(mut self, target_column: &str) -> Self {
        self.target_column = target_column.to_string();
        self
    }

    /// Set the main model hyperparameters.
    #[must_use]
    pub fn with_model(mut self, model: GbmParams) -> Self {
        self.model = model;
        self
    }

    /// Set the backtest settings.
    #[must_use]
    pub fn with_backtest(mut self, backtest: BacktestConfig) -> Self {
        self.backtest = backtest;
        self
    }

    /// Set the forecast settings.
    #[must_use]
    pub fn with_forecast(mut self, forecast: ForecastConfig) -> Self {
        self.forecast = forecast;
        self
    }

    /// Set the feature engineering settings.
    #[must_use]
    pub fn with_engineering(mut self, engineering: EngineeringConfig) -> Self {
        self.engineering = engineering;
        self
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.target_column.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "target_column must not be empty".to_string(),
            ));
        }
        if self.target_column == self.prepare.date_column {
            return Err(ForecastError::InvalidParameter(
                "target_column and date_column must differ".to_string(),
            ));
        }
        validate_fractions(self.split.train_frac, self.split.val_frac)?;
        self.model
            .validate()
            .and_then(|_| self.backtest.model.validate())
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        if self.backtest.min_train_days == 0 || self.backtest.horizon_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "backtest min_train_days and horizon_days must be at least 1".to_string(),
            ));
        }
        if self.forecast.horizon_days == 0 || self.forecast.horizon_days > MAX_HORIZON_DAYS {
            return Err(ForecastError::InvalidParameter(format!(
                "forecast horizon_days must be between 1 and {}",
                MAX_HORIZON_DAYS
            )));
        }
        if self.engineering.lags.contains(&0) || self.engineering.rolling_windows.contains(&0) {
            return Err(ForecastError::InvalidParameter(
                "lags and rolling windows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split fractions must be finite, non-negative and sum to at most one
pub(crate) fn validate_fractions(train_frac: f64, val_frac: f64) -> Result<()> {
    let valid = |f: f64| f.is_finite() && f >= 0.0;
    if !valid(train_frac) || !valid(val_frac) || train_frac + val_frac > 1.0 + 1e-9 {
        return Err(ForecastError::InvalidParameter(format!(
            "split fractions must be non-negative and sum to at most 1 (train={}, val={})",
            train_frac, val_frac
        )));
    }
    Ok(())
}
