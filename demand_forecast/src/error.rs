//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;
use tree_boost::BoostError;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A date value could not be parsed with the expected format
    #[error("Date parse error at row {row}: '{value}' does not match format '{format}'")]
    DateParse {
        row: usize,
        value: String,
        format: String,
    },

    /// A required column (date or target) is absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The regressor could not be fitted
    #[error("Training error: {0}")]
    Training(#[from] BoostError),

    /// Forecasts or metrics were requested before training completed
    #[error("Model not trained yet")]
    UninitializedModel,

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
