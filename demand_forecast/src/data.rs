//! Loading raw tables into date-ordered, fully numeric datasets

use crate::config::PrepareConfig;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Value reported for a missing date
const NULL_DATE: &str = "<null>";

/// Date-ordered observations with every non-date column numeric.
///
/// Rows are sorted ascending by date; rows sharing a date keep their input
/// order. The column list excludes the date and is fixed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDataset {
    /// One date per row
    dates: Vec<NaiveDate>,
    /// Column names, in row-value order
    columns: Vec<String>,
    /// Columns produced by one-hot encoding
    indicator_columns: Vec<String>,
    /// Row-major values
    rows: Vec<Vec<f64>>,
}

/// Borrowed view of a single row
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub date: NaiveDate,
    pub columns: &'a [String],
    pub values: &'a [f64],
}

impl<'a> Observation<'a> {
    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }
}

impl PreparedDataset {
    /// Build a dataset, sorting rows by date.
    ///
    /// Fails when the date count differs from the row count, when a row width
    /// differs from the column count, or when column names repeat.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if dates.len() != rows.len() {
            return Err(ForecastError::DataError(format!(
                "{} dates supplied for {} rows",
                dates.len(),
                rows.len()
            )));
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ForecastError::DataError(format!(
                "Row {} has {} values, expected {}",
                idx,
                row.len(),
                columns.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ForecastError::DataError(format!(
                "Duplicate column '{}'",
                dup
            )));
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&idx| dates[idx]);

        let sorted_dates = order.iter().map(|&idx| dates[idx]).collect();
        let mut rows: Vec<Option<Vec<f64>>> = rows.into_iter().map(Some).collect();
        let sorted_rows = order
            .iter()
            .filter_map(|&idx| rows[idx].take())
            .collect();

        Ok(Self {
            dates: sorted_dates,
            columns,
            indicator_columns: Vec::new(),
            rows: sorted_rows,
        })
    }

    /// Mark columns as one-hot indicators; each must already exist
    pub fn with_indicator_columns(mut self, indicator_columns: Vec<String>) -> Result<Self> {
        if let Some(missing) = indicator_columns
            .iter()
            .find(|name| !self.columns.contains(name))
        {
            return Err(ForecastError::MissingColumn(missing.clone()));
        }
        self.indicator_columns = indicator_columns;
        Ok(self)
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the row dates
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Get the column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the one-hot indicator column names
    pub fn indicator_columns(&self) -> &[String] {
        &self.indicator_columns
    }

    /// Get the row-major values
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Borrow a single row
    pub fn row(&self, idx: usize) -> Option<Observation<'_>> {
        self.rows.get(idx).map(|values| Observation {
            date: self.dates[idx],
            columns: &self.columns,
            values,
        })
    }

    /// Position of a column in each row
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of a named column
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Earliest date, if any
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Latest date, if any
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Distinct dates in ascending order
    pub fn unique_dates(&self) -> Vec<NaiveDate> {
        let mut unique = self.dates.clone();
        unique.dedup();
        unique
    }

    /// Get a slice of the rows from start to end index
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);

        Self {
            dates: self.dates[start..end].to_vec(),
            columns: self.columns.clone(),
            indicator_columns: self.indicator_columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Rows with `after < date <= through`; `after = None` keeps everything up to `through`
    pub fn between(&self, after: Option<NaiveDate>, through: NaiveDate) -> Self {
        let start = match after {
            Some(after) => self.dates.partition_point(|d| *d <= after),
            None => 0,
        };
        let end = self.dates.partition_point(|d| *d <= through);
        self.slice(start, end.max(start))
    }

    /// Append another dataset with the same columns
    pub fn concat(&self, other: &Self) -> Result<Self> {
        if self.columns != other.columns {
            return Err(ForecastError::DataError(
                "Cannot concatenate datasets with different columns".to_string(),
            ));
        }

        let mut dates = self.dates.clone();
        dates.extend_from_slice(&other.dates);
        let mut rows = self.rows.clone();
        rows.extend_from_slice(&other.rows);

        Self::new(dates, self.columns.clone(), rows)?
            .with_indicator_columns(self.indicator_columns.clone())
    }

    /// Indicator values of a row, identifying its category series
    pub fn category_key(&self, idx: usize) -> Vec<bool> {
        self.indicator_columns
            .iter()
            .filter_map(|name| self.column_index(name))
            .map(|col| self.rows[idx][col] != 0.0)
            .collect()
    }
}

/// Parses raw tables into [`PreparedDataset`]s
#[derive(Debug, Clone, Default)]
pub struct DataPreparer {
    config: PrepareConfig,
}

impl DataPreparer {
    /// Create a preparer with the given parsing rules
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Get the parsing rules
    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    /// Load and prepare a CSV file
    pub fn from_csv<P: AsRef<Path>>(&self, path: P) -> Result<PreparedDataset> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        self.from_dataframe(&df)
    }

    /// Prepare an in-memory DataFrame.
    ///
    /// Parses the date column with the configured format, one-hot encodes
    /// string categorical columns (dropping the first category), casts every
    /// other column to `f64` and sorts rows by date.
    #[instrument(skip_all, fields(height = df.height()))]
    pub fn from_dataframe(&self, df: &DataFrame) -> Result<PreparedDataset> {
        let date_column = &self.config.date_column;
        let date_series = df
            .column(date_column)
            .map_err(|_| ForecastError::MissingColumn(date_column.clone()))?;
        let dates = self.parse_dates(date_series)?;

        let mut columns = Vec::new();
        let mut values: Vec<Vec<f64>> = Vec::new();
        let mut categorical = Vec::new();

        for series in df.get_columns() {
            let name = series.name();
            if name == date_column.as_str() {
                continue;
            }

            let is_categorical = self.config.categorical_columns.iter().any(|c| c == name);
            if is_categorical && series.dtype() == &DataType::Utf8 {
                categorical.push(series.clone());
            } else {
                columns.push(name.to_string());
                values.push(column_as_f64(series)?);
            }
        }

        let mut indicator_columns = Vec::new();
        for series in &categorical {
            let labels = column_as_labels(series)?;
            for (name, indicator) in one_hot_encode(series.name(), &labels) {
                indicator_columns.push(name.clone());
                columns.push(name);
                values.push(indicator);
            }
        }

        let rows = (0..dates.len())
            .map(|row| values.iter().map(|col| col[row]).collect())
            .collect();

        let dataset =
            PreparedDataset::new(dates, columns, rows)?.with_indicator_columns(indicator_columns)?;

        info!(
            rows = dataset.len(),
            columns = dataset.columns().len(),
            indicators = dataset.indicator_columns().len(),
            "prepared dataset"
        );
        Ok(dataset)
    }

    /// Parse the date column.
    ///
    /// Temporal columns are taken as-is; anything else is read as text and
    /// parsed with the configured format.
    fn parse_dates(&self, series: &Series) -> Result<Vec<NaiveDate>> {
        let format = &self.config.date_format;
        let unparsed = |row: usize, value: &str| ForecastError::DateParse {
            row,
            value: value.to_string(),
            format: format.clone(),
        };

        if matches!(series.dtype(), DataType::Date | DataType::Datetime(_, _)) {
            let as_date = series.cast(&DataType::Date)?;
            return as_date
                .date()?
                .as_date_iter()
                .enumerate()
                .map(|(row, value)| value.ok_or_else(|| unparsed(row, NULL_DATE)))
                .collect();
        }

        let as_text = if series.dtype() == &DataType::Utf8 {
            series.clone()
        } else {
            series.cast(&DataType::Utf8)?
        };

        as_text
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let raw = value.ok_or_else(|| unparsed(row, NULL_DATE))?;
                NaiveDate::parse_from_str(raw.trim(), format).map_err(|_| unparsed(row, raw))
            })
            .collect()
    }
}

/// One indicator column per distinct label except the lexicographically first.
///
/// Columns are named `{column}_{label}` and ordered by label.
pub fn one_hot_encode(column: &str, labels: &[String]) -> Vec<(String, Vec<f64>)> {
    let categories: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
    debug!(column, categories = categories.len(), "one-hot encoding");

    categories
        .into_iter()
        .skip(1)
        .map(|category| {
            let indicator = labels
                .iter()
                .map(|label| if label == category { 1.0 } else { 0.0 })
                .collect();
            (format!("{}_{}", column, category), indicator)
        })
        .collect()
}

/// Helper to get a column as f64 values, rejecting gaps and non-numeric text
fn column_as_f64(series: &Series) -> Result<Vec<f64>> {
    let name = series.name();
    if series.null_count() > 0 {
        return Err(ForecastError::DataError(format!(
            "Column '{}' has {} missing values",
            name,
            series.null_count()
        )));
    }

    let cast = series.cast(&DataType::Float64).map_err(|e| {
        ForecastError::DataError(format!("Column '{}' cannot be converted to f64: {}", name, e))
    })?;
    if cast.null_count() > 0 {
        return Err(ForecastError::DataError(format!(
            "Column '{}' is not numeric",
            name
        )));
    }

    Ok(cast.f64()?.into_iter().flatten().collect())
}

fn column_as_labels(series: &Series) -> Result<Vec<String>> {
    let name = series.name();
    series
        .utf8()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Column '{}' has a missing category at row {}",
                    name, row
                ))
            })
        })
        .collect()
}
