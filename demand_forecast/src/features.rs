//! Feature matrix and target vector construction
//!
//! The column list produced for the training partition is the contract for
//! every later partition: [`build_aligned`] and [`align_row`] re-shape data to
//! that list, filling absent columns with `0.0`.

use crate::data::PreparedDataset;
use crate::error::{ForecastError, Result};
use std::collections::HashMap;

/// Row-major feature values
pub type FeatureMatrix = Vec<Vec<f64>>;

/// Features, target and the ordered feature column names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub matrix: FeatureMatrix,
    pub target: Vec<f64>,
    pub columns: Vec<String>,
}

impl FeatureSet {
    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Every column except the target, in dataset order
pub fn feature_columns(partition: &PreparedDataset, target: &str) -> Result<Vec<String>> {
    if partition.column_index(target).is_none() {
        return Err(ForecastError::MissingColumn(target.to_string()));
    }

    Ok(partition
        .columns()
        .iter()
        .filter(|c| c.as_str() != target)
        .cloned()
        .collect())
}

/// Split a partition into features and target.
///
/// The date is never a feature; it is kept outside the value columns.
pub fn build_feature_target(partition: &PreparedDataset, target: &str) -> Result<FeatureSet> {
    let columns = feature_columns(partition, target)?;
    build_aligned(partition, &columns, target)
}

/// Build features for `partition` using a column list frozen elsewhere
pub fn build_aligned(
    partition: &PreparedDataset,
    columns: &[String],
    target: &str,
) -> Result<FeatureSet> {
    let target_values = partition.column_values(target)?;
    let alignment = ColumnAlignment::new(partition.columns(), columns);
    let matrix = partition
        .rows()
        .iter()
        .map(|row| alignment.apply(row))
        .collect();

    Ok(FeatureSet {
        matrix,
        target: target_values,
        columns: columns.to_vec(),
    })
}

/// Source position of every target column, resolved once per column layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAlignment {
    sources: Vec<Option<usize>>,
}

impl ColumnAlignment {
    /// Map `row_columns` onto `columns`; columns absent from the rows map to `None`
    pub fn new(row_columns: &[String], columns: &[String]) -> Self {
        let positions: HashMap<&str, usize> = row_columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();
        let sources = columns
            .iter()
            .map(|name| positions.get(name.as_str()).copied())
            .collect();
        Self { sources }
    }

    /// Re-order one row; missing columns become `0.0`
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        self.sources
            .iter()
            .map(|source| source.map_or(0.0, |idx| values[idx]))
            .collect()
    }
}

/// Re-order one row's values to `columns`; missing columns become `0.0`
pub fn align_row(row_columns: &[String], values: &[f64], columns: &[String]) -> Vec<f64> {
    ColumnAlignment::new(row_columns, columns).apply(values)
}
