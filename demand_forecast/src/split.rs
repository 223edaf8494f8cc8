//! Chronological train/validation/test partitioning

use crate::config::validate_fractions;
use crate::data::PreparedDataset;
use crate::error::Result;
use tracing::info;

/// Three contiguous, date-ordered partitions covering a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: PreparedDataset,
    pub validation: PreparedDataset,
    pub test: PreparedDataset,
}

impl Split {
    /// Train and validation rows joined in date order
    pub fn train_and_validation(&self) -> Result<PreparedDataset> {
        self.train.concat(&self.validation)
    }

    /// Row counts as `(train, validation, test)`
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.len(), self.validation.len(), self.test.len())
    }
}

/// Split by row position: `floor(n * train_frac)` rows train, up to
/// `floor(n * (train_frac + val_frac))` validation, the rest test.
///
/// Ties on a boundary date may land on both sides; the split is by row count,
/// not a hard date cutoff.
pub fn time_based_split(dataset: &PreparedDataset, train_frac: f64, val_frac: f64) -> Result<Split> {
    validate_fractions(train_frac, val_frac)?;

    let n = dataset.len();
    let train_end = boundary(n, train_frac);
    let val_end = boundary(n, train_frac + val_frac).max(train_end);

    let split = Split {
        train: dataset.slice(0, train_end),
        validation: dataset.slice(train_end, val_end),
        test: dataset.slice(val_end, n),
    };

    let (train, validation, test) = split.sizes();
    info!(train, validation, test, "time-based split");
    Ok(split)
}

/// Floor of `n * frac`, tolerant of binary rounding such as `0.7 + 0.2 = 0.8999…`
fn boundary(n: usize, frac: f64) -> usize {
    ((n as f64 * frac + 1e-9).floor() as usize).min(n)
}
