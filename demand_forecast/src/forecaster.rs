//! Multi-step forecasts from the last known row
//!
//! Each future day clones the most recent row, refreshes calendar columns
//! from the new date and resets the holiday flag. In
//! [`ForecastMode::CarryForward`] lag and rolling columns keep the template's
//! values, so accuracy degrades as the horizon grows. [`ForecastMode::Recursive`]
//! instead recomputes them from the template's series extended with the
//! predictions made so far.

use crate::config::{ForecastConfig, ForecastMode};
use crate::data::PreparedDataset;
use crate::engineering::{calendar_value, DerivedFeature, HOLIDAY_COLUMN};
use crate::error::{ForecastError, Result};
use crate::features::ColumnAlignment;
use crate::trainer::ModelArtifact;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Longest forecast horizon accepted, in days
pub const MAX_HORIZON_DAYS: usize = 3_660;

/// A predicted value for one future date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub predicted: f64,
}

/// Forecasts plus the synthetic rows they were predicted from
#[derive(Debug, Clone)]
pub struct ForecastFrame {
    /// Future rows with the dataset's columns; the target column holds the prediction
    pub rows: PreparedDataset,
    pub forecasts: Vec<ForecastRow>,
}

/// Projects the target forward day by day
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    /// Create a forecaster with the given horizon and mode
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Get the settings
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `horizon_days` future dates, earliest first
    pub fn forecast(
        &self,
        artifact: &ModelArtifact,
        dataset: &PreparedDataset,
    ) -> Result<Vec<ForecastRow>> {
        Ok(self.forecast_frame(artifact, dataset)?.forecasts)
    }

    /// Forecast and keep the synthetic future rows
    #[instrument(skip_all, fields(horizon = self.config.horizon_days, mode = ?self.config.mode))]
    pub fn forecast_frame(
        &self,
        artifact: &ModelArtifact,
        dataset: &PreparedDataset,
    ) -> Result<ForecastFrame> {
        let horizon = self.config.horizon_days;
        if horizon == 0 || horizon > MAX_HORIZON_DAYS {
            return Err(ForecastError::InvalidParameter(format!(
                "horizon_days must be between 1 and {}, got {}",
                MAX_HORIZON_DAYS, horizon
            )));
        }

        let last_idx = dataset.len().checked_sub(1).ok_or_else(|| {
            ForecastError::DataError("Cannot forecast from an empty dataset".to_string())
        })?;
        let last_date = dataset.dates()[last_idx];
        let template = &dataset.rows()[last_idx];
        let columns = dataset.columns();
        let target = artifact.target_column();
        let target_idx = dataset.column_index(target);

        let (derived, mut history) = match self.config.mode {
            ForecastMode::CarryForward => (Vec::new(), Vec::new()),
            ForecastMode::Recursive => {
                let target_idx =
                    target_idx.ok_or_else(|| ForecastError::MissingColumn(target.to_string()))?;
                let derived: Vec<(usize, DerivedFeature)> = columns
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, name)| DerivedFeature::parse(name, target).map(|f| (idx, f)))
                    .collect();
                (derived, series_history(dataset, last_idx, target_idx))
            }
        };

        let alignment = ColumnAlignment::new(columns, artifact.feature_columns());
        let mut dates = Vec::with_capacity(horizon);
        let mut rows = Vec::with_capacity(horizon);
        let mut forecasts = Vec::with_capacity(horizon);

        for step in 1..=horizon {
            let date = last_date
                .checked_add_days(Days::new(step as u64))
                .ok_or_else(|| ForecastError::DataError(format!("Date overflow after {}", last_date)))?;

            let mut row = template.clone();
            for (idx, name) in columns.iter().enumerate() {
                if let Some(value) = calendar_value(name, date) {
                    row[idx] = value;
                } else if name == HOLIDAY_COLUMN {
                    row[idx] = 0.0;
                }
            }
            for &(idx, feature) in &derived {
                if let Some(value) = feature.compute(&history) {
                    row[idx] = value;
                }
            }

            let aligned = alignment.apply(&row);
            let predicted = artifact.predict_row(&aligned)?;
            debug!(%date, predicted, "forecast step");

            if let Some(idx) = target_idx {
                row[idx] = predicted;
            }
            history.push(predicted);
            dates.push(date);
            rows.push(row);
            forecasts.push(ForecastRow { date, predicted });
        }

        let rows = PreparedDataset::new(dates, columns.to_vec(), rows)?
            .with_indicator_columns(dataset.indicator_columns().to_vec())?;
        Ok(ForecastFrame { rows, forecasts })
    }
}

/// Target values of the rows in the same category series as `template_idx`, oldest first
fn series_history(dataset: &PreparedDataset, template_idx: usize, target_idx: usize) -> Vec<f64> {
    let key = dataset.category_key(template_idx);
    (0..=template_idx)
        .filter(|&idx| dataset.category_key(idx) == key)
        .map(|idx| dataset.rows()[idx][target_idx])
        .collect()
}
