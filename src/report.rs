//! Report assembly: purely structural composition of aggregates, chart
//! references, and commentary into an ordered document.
//!
//! The assembler performs no numeric computation. Section order is exactly
//! the configured order, bindings are by aggregate name, and a missing
//! commentary becomes an explicit placeholder rather than a missing section.

use crate::aggregate::Aggregate;
use crate::chart::ChartArtifact;
use crate::error::{ReportError, Result};
use crate::llm::commentary::{CommentaryResult, CommentaryStatus};
use crate::schema::{SectionRole, SectionSpec};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const COMMENTARY_UNAVAILABLE: &str = "*Commentary unavailable*";

/// One unit of the final report, identified by its aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub role: SectionRole,
    pub title: String,
    pub aggregate: String,
    /// Tabular rendering of the aggregate, in aggregator order.
    pub table: Vec<(String, f64)>,
    /// Location of the rendered chart, absent when the chart was empty.
    pub chart: Option<PathBuf>,
    pub commentary: CommentaryResult,
}

impl Section {
    /// Commentary text shown in the rendered document.
    pub fn commentary_text(&self) -> &str {
        if self.commentary.status == CommentaryStatus::Failed || self.commentary.text.is_empty() {
            COMMENTARY_UNAVAILABLE
        } else {
            &self.commentary.text
        }
    }
}

/// The final composed artifact, handed to the caller at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated: NaiveDate,
    pub sections: Vec<Section>,
}

/// Composes the document from everything produced during the run.
///
/// Inputs may arrive in any order; output sections follow `specs` exactly.
/// A spec referencing an unknown aggregate is a configuration error.
pub fn assemble(
    title: impl Into<String>,
    specs: &[SectionSpec],
    aggregates: &[Aggregate],
    charts: &[ChartArtifact],
    commentaries: &[CommentaryResult],
) -> Result<ReportDocument> {
    let aggregates_by_name: BTreeMap<&str, &Aggregate> =
        aggregates.iter().map(|a| (a.name.as_str(), a)).collect();
    let charts_by_name: BTreeMap<&str, &ChartArtifact> =
        charts.iter().map(|c| (c.aggregate.as_str(), c)).collect();
    let commentary_by_key: BTreeMap<(&str, SectionRole), &CommentaryResult> = commentaries
        .iter()
        .map(|c| ((c.aggregate.as_str(), c.role), c))
        .collect();

    let mut sections = Vec::with_capacity(specs.len());

    for spec in specs {
        let aggregate = aggregates_by_name
            .get(spec.aggregate.as_str())
            .ok_or_else(|| ReportError::UnknownAggregate(spec.aggregate.clone()))?;

        let chart = charts_by_name
            .get(spec.aggregate.as_str())
            .filter(|c| c.is_rendered())
            .map(|c| c.path.clone());

        let commentary = commentary_by_key
            .get(&(spec.aggregate.as_str(), spec.role))
            .map(|c| (*c).clone())
            .unwrap_or_else(|| CommentaryResult::failed(spec.aggregate.clone(), spec.role));

        sections.push(Section {
            role: spec.role,
            title: spec.role.title().to_string(),
            aggregate: spec.aggregate.clone(),
            table: aggregate.entries.clone(),
            chart,
            commentary,
        });
    }

    Ok(ReportDocument {
        title: title.into(),
        generated: Local::now().date_naive(),
        sections,
    })
}

impl ReportDocument {
    /// Renders the document to markdown for the output collaborator.
    pub fn to_markdown(&self) -> String {
        let mut md = format!(
            "# {}\n\n_Generated {}_\n",
            self.title,
            self.generated.format("%Y-%m-%d")
        );

        for section in &self.sections {
            md.push_str(&format!("\n## {}\n\n", section.title));

            if let Some(path) = &section.chart {
                md.push_str(&format!("[Interactive chart]({})\n\n", path.display()));
            }

            md.push_str(section.commentary_text());
            md.push_str("\n\n");

            md.push_str("| Key | Value |\n|---|---|\n");
            for (key, value) in &section.table {
                md.push_str(&format!("| {} | ${:.2} |\n", key, value));
            }
        }

        md
    }
}
