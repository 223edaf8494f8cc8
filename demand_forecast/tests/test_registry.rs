mod common;

use common::{day, quick_params, write_usage_csv, REGIONS};
use demand_forecast::config::{BacktestConfig, EngineeringConfig, PipelineConfig, SplitConfig};
use demand_forecast::error::ForecastError;
use demand_forecast::registry::ModelRegistry;
use demand_forecast::trainer::{BASELINE_NAME, MODEL_NAME};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

fn test_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_model(quick_params())
        .with_backtest(BacktestConfig {
            model: quick_params(),
            ..BacktestConfig::default()
        })
}

#[test]
fn test_untrained_registry_errors() {
    let registry = ModelRegistry::new(test_config()).unwrap();

    assert!(!registry.is_trained());
    assert!(matches!(registry.snapshot(), Err(ForecastError::UninitializedModel)));
    assert!(matches!(registry.forecast(30), Err(ForecastError::UninitializedModel)));
    assert!(matches!(registry.metrics(), Err(ForecastError::UninitializedModel)));
    assert!(matches!(
        registry.backtest_results(),
        Err(ForecastError::UninitializedModel)
    ));
}

#[test]
fn test_train_all_end_to_end() {
    let file = write_usage_csv(130, &REGIONS);
    let registry = ModelRegistry::new(test_config()).unwrap();

    let snapshot = registry.train_all(file.path()).unwrap();

    assert!(registry.is_trained());
    assert_eq!(snapshot.dataset.len(), 390);

    let metrics = registry.metrics().unwrap();
    assert!(metrics.contains_key(MODEL_NAME));
    assert!(metrics.contains_key(BASELINE_NAME));

    let windows = registry.backtest_results().unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(snapshot.backtest_summary().windows, 1);

    let forecasts = registry.forecast(30).unwrap();
    assert_eq!(forecasts.len(), 30);
    assert_eq!(forecasts[0].date, day(130));
    assert_eq!(forecasts[29].date, day(159));

    let importances = registry.feature_importances().unwrap();
    assert_eq!(importances.len(), snapshot.artifact.feature_columns().len());
}

#[test]
fn test_training_with_engineering() {
    let file = write_usage_csv(60, &REGIONS);
    let config = test_config().with_engineering(EngineeringConfig {
        enabled: true,
        ..EngineeringConfig::default()
    });
    let registry = ModelRegistry::new(config).unwrap();

    let snapshot = registry.train_all(file.path()).unwrap();

    // 30 warm-up days per region are dropped
    assert_eq!(snapshot.dataset.len(), 90);
    let columns = snapshot.artifact.feature_columns();
    assert!(columns.iter().any(|c| c == "usage_cpu_lag_7"));
    assert!(columns.iter().any(|c| c == "day_of_week"));
    assert!(registry.backtest_results().unwrap().is_empty());
}

#[test]
fn test_failed_training_keeps_previous_snapshot() {
    let registry = ModelRegistry::new(test_config()).unwrap();
    let missing = registry.train_all("nonexistent_file.csv");
    assert!(matches!(missing, Err(ForecastError::IoError(_))));
    assert!(!registry.is_trained());

    let file = write_usage_csv(40, &REGIONS);
    let first = registry.train_all(file.path()).unwrap();

    let mut bad_dates = NamedTempFile::new().unwrap();
    writeln!(bad_dates, "date,region,usage_cpu").unwrap();
    writeln!(bad_dates, "2023-01-01,east,1.0").unwrap();
    bad_dates.flush().unwrap();
    let retrain = registry.train_all(bad_dates.path());
    assert!(matches!(retrain, Err(ForecastError::DateParse { row: 0, .. })));

    let mut no_target = NamedTempFile::new().unwrap();
    writeln!(no_target, "date,region,usage_mem").unwrap();
    writeln!(no_target, "01-01-2023,east,1.0").unwrap();
    no_target.flush().unwrap();
    let retrain = registry.train_all(no_target.path());
    assert!(matches!(retrain, Err(ForecastError::MissingColumn(_))));

    assert!(Arc::ptr_eq(&first, &registry.snapshot().unwrap()));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = test_config();
    config.split = SplitConfig {
        train_frac: 0.9,
        val_frac: 0.3,
    };

    assert!(matches!(
        ModelRegistry::new(config),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_concurrent_readers_during_retrain() {
    let short = write_usage_csv(40, &REGIONS);
    let long = write_usage_csv(50, &REGIONS);
    let registry = ModelRegistry::new(test_config()).unwrap();
    registry.train_all(short.path()).unwrap();

    thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    for _ in 0..5 {
                        let snapshot = registry.snapshot().unwrap();
                        let forecasts = registry.forecast(7).unwrap();
                        assert_eq!(forecasts.len(), 7);
                        assert_eq!(
                            snapshot.artifact.feature_columns().len(),
                            snapshot.artifact.model().n_features()
                        );
                    }
                })
            })
            .collect();

        registry.train_all(long.path()).unwrap();

        for reader in readers {
            reader.join().unwrap();
        }
    });

    let forecasts = registry.forecast(1).unwrap();
    assert_eq!(forecasts[0].date, day(50));
}
