//! Chart rendering: one saved artifact per aggregate.
//!
//! Charts are self-contained plotly HTML files. The chart type is always
//! taken from the section configuration. An empty aggregate produces an
//! `Empty` placeholder artifact instead of an error so a single blank chart
//! cannot abort a whole report.

use crate::aggregate::Aggregate;
use crate::error::Result;
use crate::schema::ChartType;
use log::{debug, warn};
use plotly::common::{Mode, Title};
use plotly::{Bar, Layout, Pie, Plot, Scatter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ChartStatus {
    Rendered,
    /// The source aggregate had no entries; no file was written.
    Empty,
}

/// Reference to one rendered visualization. Consumed by the report assembler
/// only; never re-parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub id: String,
    /// Name of the aggregate this chart was rendered from.
    pub aggregate: String,
    pub path: PathBuf,
    pub status: ChartStatus,
}

impl ChartArtifact {
    pub fn is_rendered(&self) -> bool {
        self.status == ChartStatus::Rendered
    }
}

/// File location for an aggregate's chart, derived deterministically from
/// the aggregate name.
pub fn artifact_path(chart_dir: &Path, aggregate_name: &str) -> PathBuf {
    chart_dir.join(format!("{}.html", aggregate_name))
}

/// Renders one aggregate to a chart file under `chart_dir`.
///
/// The only hard failure is I/O; an aggregate with no entries yields an
/// `Empty` artifact and writes nothing.
pub fn render_chart(
    aggregate: &Aggregate,
    chart_type: ChartType,
    chart_dir: &Path,
) -> Result<ChartArtifact> {
    let path = artifact_path(chart_dir, &aggregate.name);
    let id = format!("chart-{}", aggregate.name);

    if aggregate.is_empty() {
        warn!(
            "Aggregate '{}' has no entries, emitting empty chart placeholder",
            aggregate.name
        );
        return Ok(ChartArtifact {
            id,
            aggregate: aggregate.name.clone(),
            path,
            status: ChartStatus::Empty,
        });
    }

    let keys: Vec<String> = aggregate.entries.iter().map(|(k, _)| k.clone()).collect();
    let values: Vec<f64> = aggregate.entries.iter().map(|(_, v)| *v).collect();

    let mut plot = Plot::new();
    match chart_type {
        ChartType::Bar => plot.add_trace(Bar::new(keys, values)),
        ChartType::Line => plot.add_trace(Scatter::new(keys, values).mode(Mode::LinesMarkers)),
        ChartType::Pie => plot.add_trace(Pie::new(values).labels(keys)),
    }
    plot.set_layout(Layout::new().title(Title::with_text(&aggregate.name)));

    fs::create_dir_all(chart_dir)?;
    fs::write(&path, plot.to_html())?;
    debug!("Rendered chart for '{}' to {}", aggregate.name, path.display());

    Ok(ChartArtifact {
        id,
        aggregate: aggregate.name.clone(),
        path,
        status: ChartStatus::Rendered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(name: &str, entries: Vec<(&str, f64)>) -> Aggregate {
        Aggregate {
            name: name.to_string(),
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            excluded_rows: 0,
        }
    }

    #[test]
    fn test_empty_aggregate_yields_placeholder() {
        let dir = std::env::temp_dir().join("srb-chart-empty-test");
        let artifact =
            render_chart(&aggregate("blank", vec![]), ChartType::Bar, &dir).unwrap();

        assert_eq!(artifact.status, ChartStatus::Empty);
        assert!(!artifact.path.exists());
    }

    #[test]
    fn test_renders_bar_chart_file() {
        let dir = std::env::temp_dir().join("srb-chart-bar-test");
        let agg = aggregate("total_by_category", vec![("A", 100.0), ("B", 50.0)]);
        let artifact = render_chart(&agg, ChartType::Bar, &dir).unwrap();

        assert_eq!(artifact.status, ChartStatus::Rendered);
        assert_eq!(artifact.aggregate, "total_by_category");
        assert!(artifact.path.exists());
        assert!(artifact.path.ends_with("total_by_category.html"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_artifact_path_is_deterministic() {
        let dir = PathBuf::from("charts");
        assert_eq!(
            artifact_path(&dir, "monthly_trend"),
            PathBuf::from("charts/monthly_trend.html")
        );
        assert_eq!(
            artifact_path(&dir, "monthly_trend"),
            artifact_path(&dir, "monthly_trend")
        );
    }
}
