//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Forecast error metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean Absolute Error
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Root Mean Squared Error
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Mean Absolute Percentage Error over non-zero actuals; NaN when every actual is zero
    #[serde(rename = "MAPE", deserialize_with = "nan_from_null")]
    pub mape: f64,
    /// Mean of predicted minus actual; positive means over-prediction
    #[serde(rename = "Bias")]
    pub bias: f64,
}

/// Read an optional number, mapping `null` back to NaN
fn nan_from_null<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Metrics {
    /// Whether MAPE could be computed
    pub fn has_defined_mape(&self) -> bool {
        !self.mape.is_nan()
    }

    /// Average metrics across evaluations, ignoring undefined MAPE values.
    ///
    /// Returns `None` for an empty slice.
    pub fn mean_of(metrics: &[Metrics]) -> Option<Metrics> {
        if metrics.is_empty() {
            return None;
        }

        let n = metrics.len() as f64;
        let defined: Vec<f64> = metrics
            .iter()
            .filter(|m| m.has_defined_mape())
            .map(|m| m.mape)
            .collect();
        let mape = if defined.is_empty() {
            f64::NAN
        } else {
            defined.iter().sum::<f64>() / defined.len() as f64
        };

        Some(Metrics {
            mae: metrics.iter().map(|m| m.mae).sum::<f64>() / n,
            rmse: metrics.iter().map(|m| m.rmse).sum::<f64>() / n,
            mape,
            bias: metrics.iter().map(|m| m.bias).sum::<f64>() / n,
        })
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        writeln!(f, "  Bias:  {:.4}", self.bias)?;
        Ok(())
    }
}

/// Evaluate predictions against actual values.
///
/// Both slices must have the same non-zero length. MAPE only counts entries
/// whose actual value is non-zero and is NaN when there are none.
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Metrics> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Actual and predicted values must have the same non-zero length (got {} and {})",
            actual.len(),
            predicted.len()
        )));
    }

    let n = actual.len() as f64;
    let errors: Vec<f64> = predicted
        .iter()
        .zip(actual.iter())
        .map(|(&p, &a)| p - a)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e.powi(2)).sum::<f64>() / n).sqrt();
    let bias = errors.iter().sum::<f64>() / n;

    let percentage_errors: Vec<f64> = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| e.abs() / a.abs())
        .collect();
    let mape = if percentage_errors.is_empty() {
        warn!("MAPE undefined: every actual value is zero");
        f64::NAN
    } else {
        percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64 * 100.0
    };

    Ok(Metrics {
        mae,
        rmse,
        mape,
        bias,
    })
}
