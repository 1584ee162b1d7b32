//! Prompt construction for report commentary.
//!
//! Templates are versioned constants, never computed at runtime, so the same
//! aggregate always produces byte-identical prompt text. The data block
//! serializes aggregate entries in exactly the order the aggregator produced
//! them. Prompts carry textual summaries only, never chart data.

use crate::aggregate::Aggregate;
use crate::schema::SectionRole;

pub const TEMPLATE_VERSION: &str = "v1";

pub const SYSTEM_PROMPT: &str = "\
You are a data analyst assistant. Your task is to analyze and describe
the provided data in a factual manner. Follow these rules:
1. Only use information explicitly provided in the data
2. Do not make assumptions beyond what's in the numbers
3. Avoid speculative language like \"might\", \"could\", \"possibly\"
4. State exact percentages and values from the data
5. If no notable patterns exist, say so directly
6. Use clear, concise business language";

const EXECUTIVE_SUMMARY_TEMPLATE: &str = "\
Analyze these revenue trends using ONLY the provided data:
{data}

Required analysis:
1. Period-over-period changes in total revenue
2. Notable percentage contributions
3. State \"No notable changes\" if under 5% variance

Output format:
- Start with overall trend summary
- Bullet points of key observations
- End with largest contributor percentage";

const CATEGORY_BREAKDOWN_TEMPLATE: &str = "\
Analyze the revenue distribution across categories using:
{data}

Required analysis:
1. Top 3 category contributions as percentages
2. Concentration risk assessment
3. Compare top/bottom performer amounts
4. State \"Balanced distribution\" if top 3 < 60%

Output format:
- Summary statement
- Key percentages
- Risk assessment";

const TOP_ITEMS_TEMPLATE: &str = "\
Analyze the top items by revenue using:
{data}

Required analysis:
1. Largest contributors and their share of the listed total
2. Gap between the first and last listed item
3. State \"Evenly spread\" if no item exceeds 40%

Output format:
- Summary statement
- Top 3 contributors
- Notable gaps";

const CATEGORY_AVERAGES_TEMPLATE: &str = "\
Analyze the average transaction value per category using:
{data}

Required analysis:
1. Highest and lowest average transaction values
2. Spread between categories
3. State \"Uniform averages\" if all values are within 10% of each other

Output format:
- Summary statement
- Key comparisons";

/// Text payload plus metadata for one commentary request. Ephemeral:
/// constructed, sent, and discarded once the response is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Name of the aggregate the commentary is about.
    pub aggregate: String,
    pub role: SectionRole,
    pub text: String,
}

/// Builds the prompt for one aggregate and section role.
pub fn build_prompt(aggregate: &Aggregate, role: SectionRole) -> Prompt {
    let template = match role {
        SectionRole::ExecutiveSummary => EXECUTIVE_SUMMARY_TEMPLATE,
        SectionRole::CategoryBreakdown => CATEGORY_BREAKDOWN_TEMPLATE,
        SectionRole::TopItems => TOP_ITEMS_TEMPLATE,
        SectionRole::CategoryAverages => CATEGORY_AVERAGES_TEMPLATE,
    };

    let body = template.replace("{data}", &render_data_block(aggregate));
    let text = format!("{}\n\n{}", SYSTEM_PROMPT, body);

    Prompt {
        aggregate: aggregate.name.clone(),
        role,
        text,
    }
}

/// Serializes entries in aggregator order, with each entry's share of the
/// aggregate total.
fn render_data_block(aggregate: &Aggregate) -> String {
    let total = aggregate.total();

    aggregate
        .entries
        .iter()
        .map(|(key, value)| {
            if total > 0.0 {
                format!(
                    "- {}: ${:.2} ({:.1}% of total)",
                    key,
                    value,
                    value / total * 100.0
                )
            } else {
                format!("- {}: ${:.2}", key, value)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate() -> Aggregate {
        Aggregate {
            name: "total_by_category".to_string(),
            entries: vec![("A".to_string(), 100.0), ("B".to_string(), 50.0)],
            excluded_rows: 0,
        }
    }

    #[test]
    fn test_prompt_is_byte_stable() {
        let agg = aggregate();
        let first = build_prompt(&agg, SectionRole::CategoryBreakdown);
        let second = build_prompt(&agg, SectionRole::CategoryBreakdown);
        assert_eq!(first.text, second.text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_prompt_preserves_entry_order() {
        let prompt = build_prompt(&aggregate(), SectionRole::CategoryBreakdown);
        let a_pos = prompt.text.find("- A: $100.00").unwrap();
        let b_pos = prompt.text.find("- B: $50.00").unwrap();
        assert!(a_pos < b_pos);
        assert!(prompt.text.contains("(66.7% of total)"));
    }

    #[test]
    fn test_prompt_carries_metadata() {
        let prompt = build_prompt(&aggregate(), SectionRole::TopItems);
        assert_eq!(prompt.aggregate, "total_by_category");
        assert_eq!(prompt.role, SectionRole::TopItems);
        assert!(prompt.text.starts_with(SYSTEM_PROMPT));
    }

    #[test]
    fn test_zero_total_omits_percentages() {
        let agg = Aggregate {
            name: "monthly_trend".to_string(),
            entries: vec![("2024-01".to_string(), 0.0)],
            excluded_rows: 0,
        };
        let prompt = build_prompt(&agg, SectionRole::ExecutiveSummary);
        assert!(prompt.text.contains("- 2024-01: $0.00"));
        assert!(!prompt.text.contains("% of total"));
    }
}
