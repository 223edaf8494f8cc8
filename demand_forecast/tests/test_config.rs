use demand_forecast::config::{ForecastMode, PipelineConfig};
use demand_forecast::error::ForecastError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = PipelineConfig::default();

    assert_eq!(config.target_column, "usage_cpu");
    assert_eq!(config.prepare.date_column, "date");
    assert_eq!(config.prepare.date_format, "%d-%m-%Y");
    assert_eq!(config.prepare.categorical_columns, vec!["region", "resource_type"]);
    assert_eq!(config.split.train_frac, 0.7);
    assert_eq!(config.split.val_frac, 0.2);
    assert!(!config.engineering.enabled);
    assert_eq!(config.model.n_estimators, 300);
    assert_eq!(config.model.max_depth, 5);
    assert_eq!(config.backtest.min_train_days, 90);
    assert_eq!(config.backtest.horizon_days, 30);
    assert_eq!(config.backtest.model.n_estimators, 200);
    assert_eq!(config.backtest.model.max_depth, 4);
    assert_eq!(config.forecast.horizon_days, 30);
    assert_eq!(config.forecast.mode, ForecastMode::CarryForward);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let json = r#"{
        "target_column": "usage_storage",
        "forecast": { "mode": "recursive" },
        "backtest": { "parallel": true, "model": { "n_estimators": 50 } }
    }"#;

    let config = PipelineConfig::from_json_str(json).unwrap();

    assert_eq!(config.target_column, "usage_storage");
    assert_eq!(config.forecast.mode, ForecastMode::Recursive);
    assert_eq!(config.forecast.horizon_days, 30);
    assert!(config.backtest.parallel);
    assert_eq!(config.backtest.model.n_estimators, 50);
    assert_eq!(config.backtest.min_train_days, 90);
    assert_eq!(config.prepare, PipelineConfig::default().prepare);
}

#[test]
fn test_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "split": {{ "train_frac": 0.6, "val_frac": 0.3 }} }}"#).unwrap();
    file.flush().unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.split.train_frac, 0.6);
    assert_eq!(config.split.val_frac, 0.3);
}

#[test]
fn test_invalid_json_and_values() {
    assert!(matches!(
        PipelineConfig::from_json_str("{ not json"),
        Err(ForecastError::JsonError(_))
    ));
    assert!(matches!(
        PipelineConfig::from_json_str(r#"{ "forecast": { "horizon_days": 0 } }"#),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        PipelineConfig::from_json_str(r#"{ "forecast": { "horizon_days": 18446744073709551615 } }"#),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        PipelineConfig::from_json_str(r#"{ "model": { "learning_rate": 0.0 } }"#),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        PipelineConfig::from_json_str(r#"{ "target_column": "date" }"#),
        Err(ForecastError::InvalidParameter(_))
    ));
}
