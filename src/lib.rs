//! # Sales Report Builder
//!
//! A library for turning raw tabular transaction data into an executive
//! report: summary analytics, chart artifacts, and narrative commentary
//! generated by a locally hosted language model, assembled into one ordered
//! document.
//!
//! ## Pipeline
//!
//! Raw rows flow through fixed stages communicating via immutable values:
//!
//! ```text
//! rows → aggregates → {charts, prompts} → commentary → report document
//! ```
//!
//! Only input validation can fail a run. Charts with no data and sections
//! whose commentary generation fails are recovered locally as placeholders,
//! and the per-section status summary reports how trustworthy the result is.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_report_builder::*;
//! use std::time::Duration;
//!
//! let config = ReportConfig::default();
//! let backend = OllamaBackend::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
//!
//! let rows = read_transactions(std::fs::File::open("sales.csv")?, &ColumnMapping::default())?;
//! let output = generate_report(&rows, config, backend).await?;
//!
//! std::fs::write("executive_report.md", output.document.to_markdown())?;
//! ```

pub mod aggregate;
pub mod chart;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod schema;

pub use aggregate::{
    compute_aggregates, default_aggregations, Aggregate, AggregationSpec, EntryOrdering, GroupKey,
    Reduction,
};
pub use chart::{render_chart, ChartArtifact, ChartStatus};
pub use error::{ReportError, Result};
pub use ingestion::read_transactions;
pub use llm::*;
pub use pipeline::{
    CancellationHandle, Pipeline, PipelineState, RunOutput, SectionStatus, StatusSummary,
};
pub use report::{ReportDocument, Section};
pub use schema::*;

/// Convenience entry point: runs the whole pipeline once over a loaded row
/// set and returns everything the output collaborator needs.
pub async fn generate_report<B: GenerationBackend>(
    rows: &[schema::TransactionRow],
    config: schema::ReportConfig,
    backend: B,
) -> Result<RunOutput> {
    let mut pipeline = Pipeline::new(config, backend);
    pipeline.run(rows).await
}
