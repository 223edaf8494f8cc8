use demand_forecast::error::ForecastError;
use std::io;
use tree_boost::BoostError;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(ForecastError::from(io_error), ForecastError::IoError(_)));

    let boost_error = BoostError::EmptyDataset;
    assert!(matches!(
        ForecastError::from(boost_error),
        ForecastError::Training(BoostError::EmptyDataset)
    ));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(ForecastError::from(json_error), ForecastError::JsonError(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::DateParse {
        row: 4,
        value: "2023/01/05".to_string(),
        format: "%d-%m-%Y".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("row 4"));
    assert!(message.contains("2023/01/05"));
    assert!(message.contains("%d-%m-%Y"));

    assert_eq!(
        ForecastError::MissingColumn("usage_cpu".to_string()).to_string(),
        "Missing column: usage_cpu"
    );
    assert_eq!(
        ForecastError::UninitializedModel.to_string(),
        "Model not trained yet"
    );

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let message = ForecastError::from(io_error).to_string();
    assert!(message.contains("IO error"));
    assert!(message.contains("permission denied"));
}
