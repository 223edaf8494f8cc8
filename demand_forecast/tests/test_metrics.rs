use approx::assert_relative_eq;
use demand_forecast::error::ForecastError;
use demand_forecast::metrics::{evaluate, Metrics};
use rstest::rstest;

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    let metrics = evaluate(&actual, &predicted).unwrap();

    assert_relative_eq!(metrics.mae, 2.4, epsilon = 1e-9);
    assert_relative_eq!(metrics.rmse, 6.0f64.sqrt(), epsilon = 1e-9);
    assert_relative_eq!(metrics.bias, 0.4, epsilon = 1e-9);
    let expected_mape = (0.2 + 0.1 + 0.1 + 0.075 + 0.04) / 5.0 * 100.0;
    assert_relative_eq!(metrics.mape, expected_mape, epsilon = 1e-9);
}

#[test]
fn test_identical_series_score_zero() {
    let values = vec![3.0, 7.5, 11.0];
    let metrics = evaluate(&values, &values).unwrap();

    assert_eq!(metrics.mae, 0.0);
    assert_eq!(metrics.rmse, 0.0);
    assert_eq!(metrics.mape, 0.0);
    assert_eq!(metrics.bias, 0.0);
}

#[test]
fn test_mape_skips_zero_actuals() {
    let metrics = evaluate(&[0.0, 0.0, 10.0], &[1.0, 1.0, 12.0]).unwrap();

    assert_relative_eq!(metrics.mape, 20.0, epsilon = 1e-9);
    assert!(metrics.has_defined_mape());
}

#[test]
fn test_mape_undefined_when_all_actuals_zero() {
    let metrics = evaluate(&[0.0, 0.0], &[1.0, -1.0]).unwrap();

    assert!(metrics.mape.is_nan());
    assert!(!metrics.has_defined_mape());
    assert_relative_eq!(metrics.mae, 1.0);
}

#[test]
fn test_symmetry_of_absolute_metrics() {
    let a = vec![4.0, 8.0, 15.0, 16.0];
    let b = vec![5.0, 6.0, 15.5, 20.0];

    let forward = evaluate(&a, &b).unwrap();
    let backward = evaluate(&b, &a).unwrap();

    assert_relative_eq!(forward.mae, backward.mae, epsilon = 1e-12);
    assert_relative_eq!(forward.rmse, backward.rmse, epsilon = 1e-12);
    assert_relative_eq!(forward.bias, -backward.bias, epsilon = 1e-12);
}

#[rstest]
#[case(vec![1.0, 2.0], vec![1.0])]
#[case(vec![], vec![])]
fn test_length_validation(#[case] actual: Vec<f64>, #[case] predicted: Vec<f64>) {
    let result = evaluate(&actual, &predicted);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_mean_of_ignores_undefined_mape() {
    let defined = evaluate(&[10.0], &[12.0]).unwrap();
    let undefined = evaluate(&[0.0], &[4.0]).unwrap();

    let mean = Metrics::mean_of(&[defined, undefined]).unwrap();

    assert_relative_eq!(mean.mae, 3.0);
    assert_relative_eq!(mean.mape, 20.0, epsilon = 1e-9);
    assert!(Metrics::mean_of(&[]).is_none());
}

#[test]
fn test_metrics_display() {
    let metrics = evaluate(&[10.0, 20.0], &[11.0, 19.0]).unwrap();
    let output = format!("{}", metrics);

    assert!(output.contains("MAE:"));
    assert!(output.contains("RMSE:"));
    assert!(output.contains("MAPE:"));
    assert!(output.contains("Bias:"));
}
