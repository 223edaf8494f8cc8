//! Trained-state holder shared by readers
//!
//! Training builds a complete [`RegistrySnapshot`] off to the side and then
//! swaps it in under a short write lock. Readers clone the `Arc` and keep
//! working on a consistent model, dataset and metrics set even if a retrain
//! lands meanwhile.

use crate::backtest::{BacktestSummary, BacktestWindow, Backtester};
use crate::config::{ForecastConfig, PipelineConfig};
use crate::data::{DataPreparer, PreparedDataset};
use crate::engineering::FeatureEngineer;
use crate::error::{ForecastError, Result};
use crate::forecaster::{ForecastRow, Forecaster};
use crate::metrics::Metrics;
use crate::split::time_based_split;
use crate::trainer::{ModelArtifact, NaiveBaseline, Trainer};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, instrument};

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// Model fitted on train + validation
    pub artifact: ModelArtifact,
    /// Full dataset the forecaster starts from, after feature engineering
    pub dataset: PreparedDataset,
    /// Test-set metrics keyed by model name
    pub metrics: BTreeMap<String, Metrics>,
    /// Rolling-origin windows in chronological order
    pub backtest: Vec<BacktestWindow>,
    pub baseline: NaiveBaseline,
}

impl RegistrySnapshot {
    /// Window count and average backtest metrics
    pub fn backtest_summary(&self) -> BacktestSummary {
        BacktestSummary::from_windows(&self.backtest)
    }
}

/// Run engineering, split, training and backtest on a prepared dataset
#[instrument(skip_all, fields(rows = dataset.len(), target = %config.target_column))]
pub fn run_pipeline(config: &PipelineConfig, dataset: PreparedDataset) -> Result<RegistrySnapshot> {
    let target = config.target_column.as_str();
    if dataset.column_index(target).is_none() {
        return Err(ForecastError::MissingColumn(target.to_string()));
    }

    let dataset = if config.engineering.enabled {
        FeatureEngineer::new(config.engineering.clone()).apply(&dataset, target)?
    } else {
        dataset
    };
    if dataset.is_empty() {
        return Err(ForecastError::DataError(
            "No rows left to train on".to_string(),
        ));
    }

    let split = time_based_split(&dataset, config.split.train_frac, config.split.val_frac)?;

    let outcome = Trainer::new(config.model.clone()).train(&split, target)?;
    let backtest = Backtester::new(config.backtest.clone())?.run(&dataset, target)?;

    Ok(RegistrySnapshot {
        artifact: outcome.artifact,
        dataset,
        metrics: outcome.test_metrics,
        backtest,
        baseline: outcome.baseline,
    })
}

/// Service object owning the current trained state
#[derive(Debug, Default)]
pub struct ModelRegistry {
    config: PipelineConfig,
    current: RwLock<Option<Arc<RegistrySnapshot>>>,
}

impl ModelRegistry {
    /// Create an untrained registry
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            current: RwLock::new(None),
        })
    }

    /// Get the pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Prepare a CSV file and train on it
    pub fn train_all<P: AsRef<Path>>(&self, path: P) -> Result<Arc<RegistrySnapshot>> {
        let dataset = DataPreparer::new(self.config.prepare.clone()).from_csv(path)?;
        self.train_dataset(dataset)
    }

    /// Prepare an in-memory table and train on it
    pub fn train_dataframe(&self, df: &DataFrame) -> Result<Arc<RegistrySnapshot>> {
        let dataset = DataPreparer::new(self.config.prepare.clone()).from_dataframe(df)?;
        self.train_dataset(dataset)
    }

    /// Train on a prepared dataset and publish the result.
    ///
    /// On error the previous snapshot stays in place.
    pub fn train_dataset(&self, dataset: PreparedDataset) -> Result<Arc<RegistrySnapshot>> {
        let snapshot = Arc::new(run_pipeline(&self.config, dataset)?);

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&snapshot));
        drop(current);

        info!(
            features = snapshot.artifact.feature_columns().len(),
            windows = snapshot.backtest.len(),
            "published trained model"
        );
        Ok(snapshot)
    }

    /// Whether a model has been published
    pub fn is_trained(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Result<Arc<RegistrySnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ForecastError::UninitializedModel)
    }

    /// Forecast `horizon_days` ahead with the configured mode
    pub fn forecast(&self, horizon_days: usize) -> Result<Vec<ForecastRow>> {
        let snapshot = self.snapshot()?;
        let forecaster = Forecaster::new(ForecastConfig {
            horizon_days,
            mode: self.config.forecast.mode,
        });
        forecaster.forecast(&snapshot.artifact, &snapshot.dataset)
    }

    /// Test-set metrics keyed by model name
    pub fn metrics(&self) -> Result<BTreeMap<String, Metrics>> {
        Ok(self.snapshot()?.metrics.clone())
    }

    /// Backtest windows in chronological order
    pub fn backtest_results(&self) -> Result<Vec<BacktestWindow>> {
        Ok(self.snapshot()?.backtest.clone())
    }

    /// Feature importances of the published model, largest first
    pub fn feature_importances(&self) -> Result<Vec<(String, f64)>> {
        Ok(self.snapshot()?.artifact.feature_importances())
    }
}
