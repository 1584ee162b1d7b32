//! Pipeline orchestration.
//!
//! A run walks `Loaded → Aggregated → Rendered → Prompted → Commented →
//! Assembled → Done`; each transition is a complete pass over all sections.
//! `Failed` is terminal and reachable only from input validation at `Loaded`.
//! Every later stage tolerates per-section failure: empty charts become
//! placeholders, failed commentary becomes a placeholder result, and the
//! per-section status summary tells the caller how trustworthy the report is.

use crate::aggregate::{compute_aggregates, default_aggregations, Aggregate, AggregationSpec};
use crate::chart::{render_chart, ChartArtifact, ChartStatus};
use crate::error::{ReportError, Result};
use crate::llm::client::GenerationBackend;
use crate::llm::commentary::{CommentaryClient, CommentaryResult, CommentaryStatus};
use crate::llm::prompts::build_prompt;
use crate::report::{assemble, ReportDocument};
use crate::schema::{ReportConfig, SectionRole, TransactionRow};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Loaded,
    Aggregated,
    Rendered,
    Prompted,
    Commented,
    Assembled,
    Done,
    Failed,
}

/// Status of one report section, as judged at the end of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionStatus {
    pub aggregate: String,
    pub role: SectionRole,
    pub commentary: CommentaryStatus,
    pub chart: ChartStatus,
}

/// Per-section status summary handed to the caller alongside the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSummary {
    pub sections: Vec<SectionStatus>,
}

impl StatusSummary {
    /// Worst commentary status across all sections.
    pub fn overall(&self) -> CommentaryStatus {
        let mut overall = CommentaryStatus::Ok;
        for section in &self.sections {
            match section.commentary {
                CommentaryStatus::Failed => return CommentaryStatus::Failed,
                CommentaryStatus::Degraded => overall = CommentaryStatus::Degraded,
                CommentaryStatus::Ok => {}
            }
        }
        overall
    }
}

/// Everything flushed to the output collaborator at `Done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub aggregates: Vec<Aggregate>,
    pub charts: Vec<ChartArtifact>,
    pub document: ReportDocument,
    pub summary: StatusSummary,
}

/// Handle for aborting a run between stages (e.g. on operator interrupt).
#[derive(Clone)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sequences the pipeline stages for one report run.
pub struct Pipeline<B: GenerationBackend> {
    config: ReportConfig,
    aggregations: Vec<AggregationSpec>,
    client: CommentaryClient<B>,
    cancel: Arc<AtomicBool>,
    state: PipelineState,
}

impl<B: GenerationBackend> Pipeline<B> {
    pub fn new(config: ReportConfig, backend: B) -> Self {
        let client = CommentaryClient::new(
            backend,
            config.model.clone(),
            config.temperature,
            config.retries,
            config.thinking_markers.clone(),
        );
        Self {
            config,
            aggregations: default_aggregations(),
            client,
            cancel: Arc::new(AtomicBool::new(false)),
            state: PipelineState::Loaded,
        }
    }

    /// Override the fixed aggregation set.
    pub fn with_aggregations(mut self, aggregations: Vec<AggregationSpec>) -> Self {
        self.aggregations = aggregations;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle(self.cancel.clone())
    }

    /// Runs the whole pipeline over a loaded, read-only row set.
    ///
    /// Only input validation can fail the run outright; chart and commentary
    /// problems are absorbed into the per-section status summary. Nothing is
    /// handed to the caller unless the run reaches `Done`.
    pub async fn run(&mut self, rows: &[TransactionRow]) -> Result<RunOutput> {
        if let Err(e) = self.validate(rows) {
            self.state = PipelineState::Failed;
            return Err(e);
        }
        info!("Pipeline loaded {} rows", rows.len());

        self.checkpoint()?;
        let aggregates = compute_aggregates(rows, &self.aggregations);
        self.state = PipelineState::Aggregated;
        info!("Computed {} aggregates", aggregates.len());

        self.checkpoint()?;
        let charts = self.render_charts(&aggregates)?;
        self.state = PipelineState::Rendered;

        self.checkpoint()?;
        let prompts: Vec<_> = self
            .config
            .sections
            .iter()
            .filter_map(|spec| {
                aggregates
                    .iter()
                    .find(|a| a.name == spec.aggregate)
                    .map(|a| build_prompt(a, spec.role))
            })
            .collect();
        self.state = PipelineState::Prompted;

        self.checkpoint()?;
        // Sections are independent; completion order does not matter because
        // results are bound back by aggregate name and role.
        let concurrency = self.config.llm_concurrency.max(1);
        let commentaries: Vec<CommentaryResult> = stream::iter(prompts.iter())
            .map(|prompt| self.client.comment(prompt))
            .buffer_unordered(concurrency)
            .collect()
            .await;
        self.state = PipelineState::Commented;

        self.checkpoint()?;
        let document = assemble(
            self.config.report_title.clone(),
            &self.config.sections,
            &aggregates,
            &charts,
            &commentaries,
        )?;
        self.state = PipelineState::Assembled;

        let summary = self.summarize(&charts, &commentaries);
        self.log_summary(&summary);

        self.state = PipelineState::Done;
        Ok(RunOutput {
            aggregates,
            charts,
            document,
            summary,
        })
    }

    fn validate(&self, rows: &[TransactionRow]) -> Result<()> {
        if rows.is_empty() {
            return Err(ReportError::NoRows);
        }
        for spec in &self.config.sections {
            if !self.aggregations.iter().any(|a| a.name == spec.aggregate) {
                return Err(ReportError::UnknownAggregate(spec.aggregate.clone()));
            }
        }
        Ok(())
    }

    fn render_charts(&self, aggregates: &[Aggregate]) -> Result<Vec<ChartArtifact>> {
        let mut charts = Vec::with_capacity(self.config.sections.len());
        for spec in &self.config.sections {
            let Some(aggregate) = aggregates.iter().find(|a| a.name == spec.aggregate) else {
                continue;
            };
            charts.push(render_chart(aggregate, spec.chart, &self.config.chart_dir)?);
        }
        Ok(charts)
    }

    fn summarize(
        &self,
        charts: &[ChartArtifact],
        commentaries: &[CommentaryResult],
    ) -> StatusSummary {
        let sections = self
            .config
            .sections
            .iter()
            .map(|spec| {
                let commentary = commentaries
                    .iter()
                    .find(|c| c.aggregate == spec.aggregate && c.role == spec.role)
                    .map(|c| c.status)
                    .unwrap_or(CommentaryStatus::Failed);
                let chart = charts
                    .iter()
                    .find(|c| c.aggregate == spec.aggregate)
                    .map(|c| c.status)
                    .unwrap_or(ChartStatus::Empty);
                SectionStatus {
                    aggregate: spec.aggregate.clone(),
                    role: spec.role,
                    commentary,
                    chart,
                }
            })
            .collect();
        StatusSummary { sections }
    }

    fn log_summary(&self, summary: &StatusSummary) {
        for section in &summary.sections {
            match section.commentary {
                CommentaryStatus::Ok => info!(
                    "Section '{}' ({}): ok",
                    section.aggregate,
                    section.role.as_str()
                ),
                CommentaryStatus::Degraded => warn!(
                    "Section '{}' ({}): degraded commentary",
                    section.aggregate,
                    section.role.as_str()
                ),
                CommentaryStatus::Failed => warn!(
                    "Section '{}' ({}): commentary failed, placeholder used",
                    section.aggregate,
                    section.role.as_str()
                ),
            }
        }
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.load(Ordering::SeqCst) {
            warn!("Run cancelled at state {:?}", self.state);
            return Err(ReportError::Cancelled);
        }
        Ok(())
    }
}
