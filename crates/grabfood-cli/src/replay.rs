//! `replay` command: runs the full capture pipeline over a recorded session.

use std::path::Path;
use std::time::Duration;

use grabfood_capture::{CapturePipeline, CaptureSettings, ReplayBrowser};
use grabfood_core::AppConfig;

/// Replays `session`, writes both outputs, and prints delivery averages.
///
/// Recordings have no live page behind them, so the scroll delay and input
/// settle pause are dropped.
pub(crate) async fn run_replay(config: &AppConfig, session: &Path) -> anyhow::Result<()> {
    let browser = ReplayBrowser::from_path(session)?;

    let mut settings = CaptureSettings::from_config(config);
    settings.scroll.delay = Duration::ZERO;
    settings.input_settle = Duration::ZERO;

    tracing::info!(
        session = %session.display(),
        search_url = %settings.search_url,
        "replaying recorded session"
    );

    let report = CapturePipeline::new(settings).spawn(browser).join().await?;

    if let Some(output) = &report.output {
        println!(
            "Wrote {} restaurants to {} and {}",
            output.rows,
            output.csv_path.display(),
            output.json_gz_path.display()
        );
    }
    println!(
        "Average Delivery Time: {}",
        fmt_average(report.stats.average_delivery_time(), " min")
    );
    println!(
        "Average Delivery Fee: {}",
        fmt_average(report.stats.average_fee(), "")
    );

    Ok(())
}

fn fmt_average(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "no data".to_string(), |v| format!("{v:.2}{unit}"))
}
