//! Rolling-origin backtesting
//!
//! The origin starts after `min_train_days` distinct dates and advances by
//! `horizon_days` each window. Every window refits a fresh regressor on rows
//! dated up to the origin and scores it on the next `horizon_days` dates.

use crate::config::BacktestConfig;
use crate::data::PreparedDataset;
use crate::error::{ForecastError, Result};
use crate::features::{build_aligned, build_feature_target};
use crate::metrics::{evaluate, Metrics};
use crate::trainer::ModelArtifact;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Metrics of one backtest window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestWindow {
    pub train_end: NaiveDate,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
    pub metrics: Metrics,
}

/// Window count and average metrics of a backtest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub windows: usize,
    pub mean: Option<Metrics>,
}

impl BacktestSummary {
    /// Summarise a sequence of windows
    pub fn from_windows(windows: &[BacktestWindow]) -> Self {
        let metrics: Vec<Metrics> = windows.iter().map(|w| w.metrics).collect();
        Self {
            windows: windows.len(),
            mean: Metrics::mean_of(&metrics),
        }
    }
}

/// Train cutoff and last test date of a planned window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub train_end: NaiveDate,
    pub test_end: NaiveDate,
}

/// Runs rolling-origin evaluation
#[derive(Debug, Clone, Default)]
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    /// Create a backtester; window lengths must be at least one date
    pub fn new(config: BacktestConfig) -> Result<Self> {
        if config.min_train_days == 0 || config.horizon_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_train_days and horizon_days must be at least 1".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Get the settings
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Window boundaries over ascending distinct dates.
    ///
    /// Empty when there is not enough history for a single window.
    pub fn plan(&self, dates: &[NaiveDate]) -> Vec<WindowPlan> {
        let horizon = self.config.horizon_days;
        let mut plans = Vec::new();
        let mut start_idx = self.config.min_train_days;

        while let Some(end_idx) = start_idx
            .checked_add(horizon)
            .filter(|&end_idx| end_idx < dates.len())
        {
            plans.push(WindowPlan {
                train_end: dates[start_idx - 1],
                test_end: dates[end_idx - 1],
            });
            start_idx = end_idx;
        }
        plans
    }

    /// Evaluate every window in chronological order.
    ///
    /// Stops at the first window whose test partition is empty.
    #[instrument(skip_all, fields(rows = dataset.len(), parallel = self.config.parallel))]
    pub fn run(&self, dataset: &PreparedDataset, target: &str) -> Result<Vec<BacktestWindow>> {
        let plans = self.plan(&dataset.unique_dates());
        if plans.is_empty() {
            info!(
                min_train_days = self.config.min_train_days,
                horizon_days = self.config.horizon_days,
                "not enough history for a backtest window"
            );
            return Ok(Vec::new());
        }

        let evaluated: Vec<Option<BacktestWindow>> = if self.config.parallel {
            plans
                .par_iter()
                .map(|plan| self.evaluate_window(dataset, plan, target))
                .collect::<Result<_>>()?
        } else {
            let mut evaluated = Vec::with_capacity(plans.len());
            for plan in &plans {
                let window = self.evaluate_window(dataset, plan, target)?;
                let stop = window.is_none();
                evaluated.push(window);
                if stop {
                    break;
                }
            }
            evaluated
        };

        let windows: Vec<BacktestWindow> = evaluated.into_iter().map_while(|w| w).collect();
        info!(windows = windows.len(), "backtest complete");
        Ok(windows)
    }

    /// Fit on rows up to `train_end` and score on `(train_end, test_end]`
    fn evaluate_window(
        &self,
        dataset: &PreparedDataset,
        plan: &WindowPlan,
        target: &str,
    ) -> Result<Option<BacktestWindow>> {
        let train = dataset.between(None, plan.train_end);
        let test = dataset.between(Some(plan.train_end), plan.test_end);
        let (Some(test_start), Some(test_end)) = (test.first_date(), test.last_date()) else {
            return Ok(None);
        };

        let train_features = build_feature_target(&train, target)?;
        let test_features = build_aligned(&test, &train_features.columns, target)?;

        let artifact =
            ModelArtifact::fit(&self.config.model, &train_features, target, train.last_date())?;
        let predictions = artifact.predict_rows(&test_features.matrix)?;
        let metrics = evaluate(&test_features.target, &predictions)?;

        debug!(
            train_end = %plan.train_end,
            test_start = %test_start,
            test_end = %test_end,
            train_rows = train.len(),
            test_rows = test.len(),
            mae = metrics.mae,
            "backtest window"
        );

        Ok(Some(BacktestWindow {
            train_end: plan.train_end,
            test_start,
            test_end,
            metrics,
        }))
    }
}
