//! Generates an executive report from a sales CSV using a local Ollama
//! instance.
//!
//! ```bash
//! cargo run --example sales_report -- sales_data.csv ./output
//! ```

use anyhow::{Context, Result};
use sales_report_builder::*;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let csv_path = args.next().unwrap_or_else(|| "sales_data.csv".to_string());
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "output".to_string()));

    let config = ReportConfig {
        chart_dir: output_dir.join("charts"),
        ..ReportConfig::default()
    };

    let file = File::open(&csv_path).with_context(|| format!("opening {}", csv_path))?;
    let rows = read_transactions(file, &ColumnMapping::default())?;
    println!("Loaded {} rows from {}", rows.len(), csv_path);

    let backend = OllamaBackend::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
    println!("Generating commentary with {} at {}", config.model, backend.host());

    let output = generate_report(&rows, config, backend).await?;

    for status in &output.summary.sections {
        println!(
            "  {} ({}): commentary {:?}, chart {:?}",
            status.aggregate,
            status.role.as_str(),
            status.commentary,
            status.chart
        );
    }
    println!("Overall status: {:?}", output.summary.overall());

    std::fs::create_dir_all(&output_dir)?;
    let report_path = output_dir.join("executive_report.md");
    std::fs::write(&report_path, output.document.to_markdown())?;
    std::fs::write(
        output_dir.join("aggregates.json"),
        serde_json::to_string_pretty(&output.aggregates)?,
    )?;

    println!("Report written to {}", report_path.display());
    Ok(())
}
