mod common;

use approx::assert_relative_eq;
use common::{daily_dataset, day, usage, write_usage_csv};
use demand_forecast::config::EngineeringConfig;
use demand_forecast::data::DataPreparer;
use demand_forecast::engineering::{calendar_value, DerivedFeature, FeatureEngineer, RollingStat};
use demand_forecast::error::ForecastError;
use rstest::rstest;

#[rstest]
#[case("day_of_week", 6.0)]
#[case("month", 1.0)]
#[case("year", 2023.0)]
#[case("quarter", 1.0)]
#[case("is_weekend", 1.0)]
fn test_calendar_values_for_sunday(#[case] column: &str, #[case] expected: f64) {
    // 2023-01-01 is a Sunday
    assert_eq!(calendar_value(column, day(0)), Some(expected));
}

#[test]
fn test_calendar_value_weekday_and_unknown_column() {
    let wednesday = day(3);
    assert_eq!(calendar_value("day_of_week", wednesday), Some(2.0));
    assert_eq!(calendar_value("is_weekend", wednesday), Some(0.0));
    assert_eq!(calendar_value("quarter", day(200)), Some(3.0));
    assert_eq!(calendar_value("usage_cpu", wednesday), None);
}

#[rstest]
#[case("usage_cpu_lag_3", Some(DerivedFeature::Lag(3)))]
#[case(
    "usage_cpu_rolling_mean_7d",
    Some(DerivedFeature::Rolling { stat: RollingStat::Mean, window: 7 })
)]
#[case(
    "usage_cpu_rolling_max_30d",
    Some(DerivedFeature::Rolling { stat: RollingStat::Max, window: 30 })
)]
#[case("usage_cpu_lag_0", None)]
#[case("usage_cpu_rolling_median_7d", None)]
#[case("usage_storage_lag_1", None)]
#[case("usage_cpu", None)]
fn test_parse_derived_columns(#[case] column: &str, #[case] expected: Option<DerivedFeature>) {
    let parsed = DerivedFeature::parse(column, "usage_cpu");
    assert_eq!(parsed, expected);
    if let Some(feature) = parsed {
        assert_eq!(feature.column_name("usage_cpu"), column);
    }
}

#[test]
fn test_compute_uses_preceding_values() {
    let history = [1.0, 4.0, 2.0, 8.0];

    assert_eq!(DerivedFeature::Lag(1).compute(&history), Some(8.0));
    assert_eq!(DerivedFeature::Lag(4).compute(&history), Some(1.0));
    assert_eq!(DerivedFeature::Lag(5).compute(&history), None);

    let mean = DerivedFeature::Rolling { stat: RollingStat::Mean, window: 3 };
    let max = DerivedFeature::Rolling { stat: RollingStat::Max, window: 3 };
    let min = DerivedFeature::Rolling { stat: RollingStat::Min, window: 3 };
    assert_relative_eq!(mean.compute(&history).unwrap(), 14.0 / 3.0);
    assert_eq!(max.compute(&history), Some(8.0));
    assert_eq!(min.compute(&history), Some(2.0));
    assert_eq!(mean.compute(&history[..2]), None);
}

#[test]
fn test_default_engineering_drops_warmup_rows() {
    let dataset = daily_dataset(40);
    let engineered = FeatureEngineer::default().apply(&dataset, "usage_cpu").unwrap();

    // The 30-day rolling window needs 30 earlier rows
    assert_eq!(engineered.len(), 10);
    assert_eq!(engineered.first_date(), Some(day(30)));

    let first = engineered.row(0).unwrap();
    assert_eq!(first.get("usage_cpu"), Some(usage(30, 0)));
    assert_eq!(first.get("usage_cpu_lag_1"), Some(usage(29, 0)));
    assert_eq!(first.get("usage_cpu_lag_7"), Some(usage(23, 0)));
    let week: f64 = (23..30).map(|i| usage(i, 0)).sum::<f64>() / 7.0;
    assert_relative_eq!(first.get("usage_cpu_rolling_mean_7d").unwrap(), week, epsilon = 1e-9);
    assert_eq!(first.get("day_of_week"), calendar_value("day_of_week", day(30)));
    assert_eq!(engineered.columns().len(), 2 + 5 + 3 + 6);
}

#[test]
fn test_lags_follow_each_category_series() {
    let file = write_usage_csv(5, &["east", "north"]);
    let dataset = DataPreparer::default().from_csv(file.path()).unwrap();
    let config = EngineeringConfig {
        calendar: false,
        lags: vec![1],
        rolling_windows: vec![],
        ..EngineeringConfig::default()
    };

    let engineered = FeatureEngineer::new(config).apply(&dataset, "usage_cpu").unwrap();

    assert_eq!(engineered.len(), 8);
    assert_eq!(engineered.indicator_columns(), dataset.indicator_columns());
    for idx in 0..engineered.len() {
        let row = engineered.row(idx).unwrap();
        let offset = (row.date - day(0)).num_days() as usize;
        let region = row.get("region_north").unwrap() as usize;
        let lag = row.get("usage_cpu_lag_1").unwrap();
        assert_relative_eq!(lag, usage(offset - 1, region), epsilon = 1e-9);
    }
}

#[test]
fn test_engineering_requires_target() {
    let dataset = daily_dataset(10);
    let result = FeatureEngineer::default().apply(&dataset, "usage_mem");

    assert!(matches!(result, Err(ForecastError::MissingColumn(_))));
}
