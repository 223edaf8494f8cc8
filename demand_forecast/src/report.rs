//! CSV and JSON export of pipeline results

use crate::backtest::BacktestWindow;
use crate::error::Result;
use crate::forecaster::ForecastRow;
use crate::metrics::Metrics;
use chrono::NaiveDate;
use csv::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Flat CSV record of a backtest window
#[derive(Debug, Serialize)]
struct BacktestRecord {
    train_end: NaiveDate,
    test_start: NaiveDate,
    test_end: NaiveDate,
    #[serde(rename = "MAE")]
    mae: f64,
    #[serde(rename = "RMSE")]
    rmse: f64,
    #[serde(rename = "MAPE")]
    mape: f64,
    #[serde(rename = "Bias")]
    bias: f64,
}

impl From<&BacktestWindow> for BacktestRecord {
    fn from(window: &BacktestWindow) -> Self {
        Self {
            train_end: window.train_end,
            test_start: window.test_start,
            test_end: window.test_end,
            mae: window.metrics.mae,
            rmse: window.metrics.rmse,
            mape: window.metrics.mape,
            bias: window.metrics.bias,
        }
    }
}

/// Write forecasts as `date,predicted` rows with ISO dates
pub fn write_forecast_csv<W: Write>(writer: W, forecasts: &[ForecastRow]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    for row in forecasts {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one row per backtest window with its metrics
pub fn write_backtest_csv<W: Write>(writer: W, windows: &[BacktestWindow]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    for window in windows {
        wtr.serialize(BacktestRecord::from(window))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Pretty JSON object of metrics keyed by model name; undefined MAPE becomes `null`
pub fn metrics_to_json(metrics: &BTreeMap<String, Metrics>) -> Result<String> {
    Ok(serde_json::to_string_pretty(metrics)?)
}
