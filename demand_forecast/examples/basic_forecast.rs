use chrono::{Days, NaiveDate};
use demand_forecast::report::metrics_to_json;
use demand_forecast::{BacktestConfig, GbmParams, ModelRegistry, PipelineConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Demand Forecast: Basic Forecasting Example");
    println!("==========================================\n");

    // Use the CSV given on the command line, or generate a sample one
    let path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let path = std::env::temp_dir().join("demand_forecast_sample.csv");
            write_sample_csv(&path, 240)?;
            println!("No CSV given, wrote sample data to {}\n", path.display());
            path
        }
    };

    let params = GbmParams::default()
        .with_n_estimators(100)
        .with_max_depth(4);
    let config = PipelineConfig::default()
        .with_model(params.clone())
        .with_backtest(BacktestConfig {
            min_train_days: 120,
            horizon_days: 30,
            model: params,
            parallel: true,
        });

    println!("Training models...");
    let registry = ModelRegistry::new(config)?;
    let snapshot = registry.train_all(&path)?;
    println!(
        "Trained on {} rows, {} backtest windows\n",
        snapshot.dataset.len(),
        snapshot.backtest.len()
    );

    println!("Holdout metrics:");
    println!("{}\n", metrics_to_json(&registry.metrics()?)?);

    println!("Top features:");
    for (name, importance) in registry.feature_importances()?.iter().take(5) {
        println!("  {:<24} {:.4}", name, importance);
    }

    println!("\nForecast (14 days):");
    for row in registry.forecast(14)? {
        println!("  {}  {:.2}", row.date, row.predicted);
    }

    Ok(())
}

/// Daily CPU usage for two regions with a weekly cycle and a slow trend
fn write_sample_csv(path: &PathBuf, days: u64) -> Result<(), Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).ok_or("invalid start date")?;
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "date,region,resource_type,usage_cpu,usage_storage,holiday")?;

    for offset in 0..days {
        let date = start
            .checked_add_days(Days::new(offset))
            .ok_or("date overflow")?;
        for (region_idx, (region, resource)) in [("east", "VM"), ("west", "Container")]
            .iter()
            .enumerate()
        {
            let usage = 40.0
                + 10.0 * region_idx as f64
                + 3.0 * (offset % 7) as f64
                + 0.05 * offset as f64;
            writeln!(
                out,
                "{},{},{},{:.2},{},{}",
                date.format("%d-%m-%Y"),
                region,
                resource,
                usage,
                500 + offset,
                u8::from(offset % 30 == 0)
            )?;
        }
    }
    out.flush()?;
    Ok(())
}
