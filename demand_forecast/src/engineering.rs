//! Calendar, lag and rolling feature derivation
//!
//! Lag and rolling columns are computed per category series (rows sharing
//! the same one-hot indicator values) from target values strictly before the
//! row, so a row's own target never leaks into its features.

use crate::config::EngineeringConfig;
use crate::data::PreparedDataset;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use tracing::info;

/// Calendar columns recomputed from a row's date
pub const CALENDAR_COLUMNS: [&str; 5] = ["day_of_week", "month", "year", "quarter", "is_weekend"];

/// Holiday indicator column; unknown for future dates
pub const HOLIDAY_COLUMN: &str = "holiday";

/// Value of a calendar column for `date`, or `None` if `column` is not calendar-derived.
///
/// `day_of_week` counts from Monday = 0.
pub fn calendar_value(column: &str, date: NaiveDate) -> Option<f64> {
    let value = match column {
        "day_of_week" => date.weekday().num_days_from_monday(),
        "month" => date.month(),
        "year" => return Some(date.year() as f64),
        "quarter" => (date.month() - 1) / 3 + 1,
        "is_weekend" => u32::from(matches!(date.weekday(), Weekday::Sat | Weekday::Sun)),
        _ => return None,
    };
    Some(value as f64)
}

/// Statistic of a rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingStat {
    Mean,
    Max,
    Min,
}

impl RollingStat {
    fn as_str(self) -> &'static str {
        match self {
            RollingStat::Mean => "mean",
            RollingStat::Max => "max",
            RollingStat::Min => "min",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "mean" => Some(RollingStat::Mean),
            "max" => Some(RollingStat::Max),
            "min" => Some(RollingStat::Min),
            _ => None,
        }
    }
}

/// A column derived from the target's own history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedFeature {
    /// `{target}_lag_{n}`: the value `n` steps back
    Lag(usize),
    /// `{target}_rolling_{stat}_{n}d`: statistic of the last `n` values
    Rolling { stat: RollingStat, window: usize },
}

impl DerivedFeature {
    /// Recognise a lag or rolling column of `target`
    pub fn parse(column: &str, target: &str) -> Option<Self> {
        let rest = column.strip_prefix(target)?.strip_prefix('_')?;

        if let Some(n) = rest.strip_prefix("lag_") {
            return n.parse().ok().filter(|&n| n > 0).map(DerivedFeature::Lag);
        }

        let rest = rest.strip_prefix("rolling_")?;
        let (stat, window) = rest.split_once('_')?;
        let window: usize = window.strip_suffix('d')?.parse().ok()?;
        if window == 0 {
            return None;
        }
        Some(DerivedFeature::Rolling {
            stat: RollingStat::parse(stat)?,
            window,
        })
    }

    /// Column name of this feature for `target`
    pub fn column_name(&self, target: &str) -> String {
        match self {
            DerivedFeature::Lag(n) => format!("{}_lag_{}", target, n),
            DerivedFeature::Rolling { stat, window } => {
                format!("{}_rolling_{}_{}d", target, stat.as_str(), window)
            }
        }
    }

    /// Value given the series `history` (oldest first) preceding the row.
    ///
    /// `None` when the history is too short.
    pub fn compute(&self, history: &[f64]) -> Option<f64> {
        match *self {
            DerivedFeature::Lag(n) => history.len().checked_sub(n).map(|idx| history[idx]),
            DerivedFeature::Rolling { stat, window } => {
                let start = history.len().checked_sub(window)?;
                let slice = &history[start..];
                Some(match stat {
                    RollingStat::Mean => slice.iter().sum::<f64>() / window as f64,
                    RollingStat::Max => slice.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    RollingStat::Min => slice.iter().copied().fold(f64::INFINITY, f64::min),
                })
            }
        }
    }
}

/// Adds calendar, lag and rolling columns to a prepared dataset
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: EngineeringConfig,
}

impl FeatureEngineer {
    /// Create an engineer with the given settings
    pub fn new(config: EngineeringConfig) -> Self {
        Self { config }
    }

    /// Derived features this engineer produces, lags first
    pub fn derived_features(&self) -> Vec<DerivedFeature> {
        let lags = self.config.lags.iter().map(|&n| DerivedFeature::Lag(n));
        let rolling = self.config.rolling_windows.iter().flat_map(|&window| {
            [RollingStat::Mean, RollingStat::Max, RollingStat::Min]
                .into_iter()
                .map(move |stat| DerivedFeature::Rolling { stat, window })
        });
        lags.chain(rolling).collect()
    }

    /// Derive the configured columns.
    ///
    /// Existing columns with the same names are overwritten. Rows whose
    /// series is too short for every lag/rolling value are dropped.
    pub fn apply(&self, dataset: &PreparedDataset, target: &str) -> Result<PreparedDataset> {
        let target_idx = dataset
            .column_index(target)
            .ok_or_else(|| ForecastError::MissingColumn(target.to_string()))?;

        let mut columns = dataset.columns().to_vec();
        let mut slot = |name: String| -> usize {
            columns.iter().position(|c| *c == name).unwrap_or_else(|| {
                columns.push(name);
                columns.len() - 1
            })
        };

        let calendar: Vec<(&str, usize)> = if self.config.calendar {
            CALENDAR_COLUMNS
                .iter()
                .map(|&name| (name, slot(name.to_string())))
                .collect()
        } else {
            Vec::new()
        };
        let derived: Vec<(DerivedFeature, usize)> = self
            .derived_features()
            .into_iter()
            .map(|feature| (feature, slot(feature.column_name(target))))
            .collect();

        let mut histories: HashMap<Vec<bool>, Vec<f64>> = HashMap::new();
        let mut dates = Vec::with_capacity(dataset.len());
        let mut rows = Vec::with_capacity(dataset.len());

        for (idx, source) in dataset.rows().iter().enumerate() {
            let date = dataset.dates()[idx];
            let history = histories.entry(dataset.category_key(idx)).or_default();

            let mut row = source.clone();
            row.resize(columns.len(), 0.0);
            for &(name, col) in &calendar {
                if let Some(value) = calendar_value(name, date) {
                    row[col] = value;
                }
            }

            let mut complete = true;
            for &(feature, col) in &derived {
                match feature.compute(history) {
                    Some(value) => row[col] = value,
                    None => complete = false,
                }
            }

            history.push(source[target_idx]);
            if complete {
                dates.push(date);
                rows.push(row);
            }
        }

        info!(
            input_rows = dataset.len(),
            output_rows = rows.len(),
            derived = derived.len(),
            "engineered features"
        );

        PreparedDataset::new(dates, columns, rows)?
            .with_indicator_columns(dataset.indicator_columns().to_vec())
    }
}
