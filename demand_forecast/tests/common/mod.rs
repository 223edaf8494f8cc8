#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use demand_forecast::{GbmParams, PreparedDataset};
use std::io::Write;
use tempfile::NamedTempFile;

pub const REGIONS: [&str; 3] = ["east", "north", "west"];

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

pub fn day(offset: usize) -> NaiveDate {
    start_date().checked_add_days(Days::new(offset as u64)).unwrap()
}

/// Small, fast regressor for tests
pub fn quick_params() -> GbmParams {
    GbmParams::default()
        .with_n_estimators(25)
        .with_max_depth(3)
        .with_learning_rate(0.2)
}

/// Deterministic CPU usage with a weekly cycle and a regional offset
pub fn usage(offset: usize, region_idx: usize) -> f64 {
    40.0 + 10.0 * region_idx as f64 + 3.0 * (offset % 7) as f64 + 0.05 * offset as f64
}

/// Write a usage CSV with one row per region per day, dates as `dd-mm-yyyy`
pub fn write_usage_csv(days: usize, regions: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,region,resource_type,usage_cpu,usage_storage,holiday").unwrap();
    for offset in 0..days {
        let date = day(offset).format("%d-%m-%Y");
        for (region_idx, region) in regions.iter().enumerate() {
            let resource = if region_idx % 2 == 0 { "VM" } else { "Container" };
            let holiday = u8::from(offset % 30 == 0);
            writeln!(
                file,
                "{},{},{},{:.2},{},{}",
                date,
                region,
                resource,
                usage(offset, region_idx),
                500 + offset,
                holiday
            )
            .unwrap();
        }
    }
    file.flush().unwrap();
    file
}

/// One row per day with a target and a single driver column
pub fn daily_dataset(days: usize) -> PreparedDataset {
    let dates = (0..days).map(day).collect();
    let rows = (0..days)
        .map(|offset| vec![usage(offset, 0), (offset % 7) as f64])
        .collect();
    PreparedDataset::new(
        dates,
        vec!["usage_cpu".to_string(), "driver".to_string()],
        rows,
    )
    .unwrap()
}
