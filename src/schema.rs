use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One raw transaction record.
///
/// Rows are immutable once loaded. Field parsing is lenient: a missing or
/// unparseable date/amount does not reject the row, it only excludes the row
/// from the aggregations that need that field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub date: Option<NaiveDate>,
    pub category: String,
    pub amount: Option<f64>,
    /// Optional free-text item/product label.
    pub item: Option<String>,
    /// Optional free-text notes, carried through untouched.
    pub notes: Option<String>,
}

/// Maps logical field names to source column names.
///
/// Resolved once, before the pipeline starts. A mapped required column that
/// is absent from the input header is a fatal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub category: String,
    pub amount: String,
    pub item: Option<String>,
    pub notes: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            category: "category".to_string(),
            amount: "amount".to_string(),
            item: Some("item".to_string()),
            notes: None,
        }
    }
}

/// Chart type for one aggregate. Always configured explicitly, never
/// inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
}

/// The report section a prompt and its commentary belong to. Each role has
/// its own fixed prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SectionRole {
    ExecutiveSummary,
    CategoryBreakdown,
    TopItems,
    CategoryAverages,
}

impl SectionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionRole::ExecutiveSummary => "executive_summary",
            SectionRole::CategoryBreakdown => "category_breakdown",
            SectionRole::TopItems => "top_items",
            SectionRole::CategoryAverages => "category_averages",
        }
    }

    /// Human-readable section heading used in the rendered report.
    pub fn title(&self) -> &'static str {
        match self {
            SectionRole::ExecutiveSummary => "Revenue Overview",
            SectionRole::CategoryBreakdown => "Revenue by Category",
            SectionRole::TopItems => "Top Items",
            SectionRole::CategoryAverages => "Average Transaction by Category",
        }
    }
}

/// One entry of the section ordering list: which aggregate feeds the section,
/// the role (prompt template) it plays, and the chart type to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSpec {
    pub aggregate: String,
    pub role: SectionRole,
    pub chart: ChartType,
}

/// Configuration for one report run, supplied in full at pipeline start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Model identifier passed to the text-generation service.
    pub model: String,
    /// Base URL of the local text-generation service.
    pub base_url: String,
    pub temperature: f32,
    /// Bounded wait per generation call, in seconds.
    pub timeout_secs: u64,
    /// Extra attempts after the first failed generation call.
    pub retries: u32,
    /// Commentary calls in flight at once. 1 = fully sequential.
    pub llm_concurrency: usize,
    /// Directory chart artifacts are written into.
    pub chart_dir: PathBuf,
    pub report_title: String,
    /// (open, close) marker pairs stripped from model responses.
    pub thinking_markers: Vec<(String, String)>,
    /// Section ordering; also carries the per-aggregation chart mapping.
    pub sections: Vec<SectionSpec>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: "phi4:latest".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.1,
            timeout_secs: 120,
            retries: 2,
            llm_concurrency: 1,
            chart_dir: PathBuf::from("output/charts"),
            report_title: "Executive Sales Report".to_string(),
            thinking_markers: default_thinking_markers(),
            sections: default_sections(),
        }
    }
}

/// Marker pairs some local models emit around chain-of-thought text. Not
/// exhaustive; callers can extend the list per model.
pub fn default_thinking_markers() -> Vec<(String, String)> {
    vec![
        ("<think>".to_string(), "</think>".to_string()),
        ("<THINKING>".to_string(), "</THINKING>".to_string()),
    ]
}

/// Default section ordering, one section per default aggregation.
pub fn default_sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec {
            aggregate: "monthly_trend".to_string(),
            role: SectionRole::ExecutiveSummary,
            chart: ChartType::Line,
        },
        SectionSpec {
            aggregate: "total_by_category".to_string(),
            role: SectionRole::CategoryBreakdown,
            chart: ChartType::Bar,
        },
        SectionSpec {
            aggregate: "top_items".to_string(),
            role: SectionRole::TopItems,
            chart: ChartType::Pie,
        },
        SectionSpec {
            aggregate: "average_by_category".to_string(),
            role: SectionRole::CategoryAverages,
            chart: ChartType::Bar,
        },
    ]
}
