//! Aggregation of raw transaction rows into named summary statistics.
//!
//! Each aggregation is a grouping plus a reduction over one key field and the
//! amount field, described declaratively by [`AggregationSpec`]. Output order
//! is fully deterministic: grouping goes through a `BTreeMap`, ranked
//! aggregates sort by value descending with key-ascending tie-breaks, and
//! everything else stays in lexical key order.

use crate::schema::TransactionRow;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TOTAL_BY_CATEGORY: &str = "total_by_category";
pub const MONTHLY_TREND: &str = "monthly_trend";
pub const TOP_ITEMS: &str = "top_items";
pub const AVERAGE_BY_CATEGORY: &str = "average_by_category";

/// Which row field supplies the grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum GroupKey {
    Category,
    /// Calendar month of the transaction date, as `YYYY-MM`.
    Month,
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Reduction {
    Sum,
    Count,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EntryOrdering {
    /// Ranked output: largest value first, ties broken by key ascending.
    ValueDescending,
    /// Lexical key order.
    KeyAscending,
}

/// Declarative description of one aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub name: String,
    pub key: GroupKey,
    pub reduction: Reduction,
    pub ordering: EntryOrdering,
    /// Keep only the first N entries after ordering.
    pub top_n: Option<usize>,
}

/// A named grouped-and-reduced summary. Entries carry their own order and
/// keys are unique; values are always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub name: String,
    pub entries: Vec<(String, f64)>,
    /// Rows left out of this aggregation because the key or a finite amount
    /// was missing.
    pub excluded_rows: usize,
}

impl Aggregate {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

/// The fixed aggregation set computed for every report run.
pub fn default_aggregations() -> Vec<AggregationSpec> {
    vec![
        AggregationSpec {
            name: TOTAL_BY_CATEGORY.to_string(),
            key: GroupKey::Category,
            reduction: Reduction::Sum,
            ordering: EntryOrdering::ValueDescending,
            top_n: None,
        },
        AggregationSpec {
            name: MONTHLY_TREND.to_string(),
            key: GroupKey::Month,
            reduction: Reduction::Sum,
            ordering: EntryOrdering::KeyAscending,
            top_n: None,
        },
        AggregationSpec {
            name: TOP_ITEMS.to_string(),
            key: GroupKey::Item,
            reduction: Reduction::Sum,
            ordering: EntryOrdering::ValueDescending,
            top_n: Some(5),
        },
        AggregationSpec {
            name: AVERAGE_BY_CATEGORY.to_string(),
            key: GroupKey::Category,
            reduction: Reduction::Mean,
            ordering: EntryOrdering::ValueDescending,
            top_n: None,
        },
    ]
}

/// Computes every aggregation in `specs` over the row set.
pub fn compute_aggregates(rows: &[TransactionRow], specs: &[AggregationSpec]) -> Vec<Aggregate> {
    specs.iter().map(|spec| compute_one(rows, spec)).collect()
}

fn compute_one(rows: &[TransactionRow], spec: &AggregationSpec) -> Aggregate {
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut excluded_rows = 0usize;

    for row in rows {
        let key = match spec.key {
            GroupKey::Category => {
                let trimmed = row.category.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            GroupKey::Month => row.date.map(|d| d.format("%Y-%m").to_string()),
            GroupKey::Item => row.item.clone(),
        };

        let Some(key) = key else {
            excluded_rows += 1;
            continue;
        };

        match spec.reduction {
            // Count needs the key only.
            Reduction::Count => {
                let entry = groups.entry(key).or_insert((0.0, 0));
                entry.1 += 1;
            }
            Reduction::Sum | Reduction::Mean => {
                let Some(amount) = row.amount.filter(|a| a.is_finite()) else {
                    excluded_rows += 1;
                    continue;
                };
                let entry = groups.entry(key).or_insert((0.0, 0));
                entry.0 += amount;
                entry.1 += 1;
            }
        }
    }

    let mut entries: Vec<(String, f64)> = groups
        .into_iter()
        .map(|(key, (sum, count))| {
            let value = match spec.reduction {
                Reduction::Sum => sum,
                Reduction::Count => count as f64,
                Reduction::Mean => sum / count as f64,
            };
            (key, value)
        })
        .filter(|(_, value)| value.is_finite())
        .collect();

    if spec.ordering == EntryOrdering::ValueDescending {
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    }

    if let Some(n) = spec.top_n {
        entries.truncate(n);
    }

    debug!(
        "Aggregate '{}': {} entries, {} rows excluded",
        spec.name,
        entries.len(),
        excluded_rows
    );

    Aggregate {
        name: spec.name.clone(),
        entries,
        excluded_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(date: &str, category: &str, amount: Option<f64>, item: Option<&str>) -> TransactionRow {
        TransactionRow {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            category: category.to_string(),
            amount,
            item: item.map(str::to_string),
            notes: None,
        }
    }

    fn sample_rows() -> Vec<TransactionRow> {
        vec![
            row("2024-01-01", "A", Some(100.0), Some("Widget")),
            row("2024-01-02", "B", Some(50.0), Some("Gadget")),
            row("2024-02-10", "A", Some(20.0), Some("Widget")),
            row("2024-02-11", "B", None, Some("Gadget")),
            row("bad", "A", Some(5.0), None),
        ]
    }

    #[test]
    fn test_total_by_category_sorted_descending() {
        let aggregates = compute_aggregates(&sample_rows(), &default_aggregations());
        let totals = aggregates
            .iter()
            .find(|a| a.name == TOTAL_BY_CATEGORY)
            .unwrap();

        assert_eq!(
            totals.entries,
            vec![("A".to_string(), 125.0), ("B".to_string(), 50.0)]
        );
        // One row has no amount.
        assert_eq!(totals.excluded_rows, 1);
    }

    #[test]
    fn test_monthly_trend_sorted_by_month() {
        let aggregates = compute_aggregates(&sample_rows(), &default_aggregations());
        let trend = aggregates.iter().find(|a| a.name == MONTHLY_TREND).unwrap();

        assert_eq!(
            trend.entries,
            vec![("2024-01".to_string(), 150.0), ("2024-02".to_string(), 20.0)]
        );
        // One unparseable date, one missing amount.
        assert_eq!(trend.excluded_rows, 2);
    }

    #[test]
    fn test_top_items_truncates() {
        let rows: Vec<TransactionRow> = (0..10)
            .map(|i| {
                let item = format!("item-{}", i);
                row("2024-01-01", "A", Some(i as f64), Some(item.as_str()))
            })
            .collect();
        let aggregates = compute_aggregates(&rows, &default_aggregations());
        let top = aggregates.iter().find(|a| a.name == TOP_ITEMS).unwrap();

        assert_eq!(top.entries.len(), 5);
        assert_eq!(top.entries[0], ("item-9".to_string(), 9.0));
    }

    #[test]
    fn test_mean_reduction() {
        let aggregates = compute_aggregates(&sample_rows(), &default_aggregations());
        let avg = aggregates
            .iter()
            .find(|a| a.name == AVERAGE_BY_CATEGORY)
            .unwrap();

        assert_eq!(
            avg.entries,
            vec![("A".to_string(), 125.0 / 3.0), ("B".to_string(), 50.0)]
        );
    }

    #[test]
    fn test_count_reduction_ignores_missing_amounts() {
        let spec = AggregationSpec {
            name: "transactions_by_category".to_string(),
            key: GroupKey::Category,
            reduction: Reduction::Count,
            ordering: EntryOrdering::ValueDescending,
            top_n: None,
        };

        // Count only needs the grouping key: the amount-less B row still
        // counts, while the row with an empty category is excluded.
        let rows = vec![
            row("2024-01-01", "A", Some(100.0), None),
            row("2024-01-02", "A", Some(20.0), None),
            row("2024-01-03", "B", None, None),
            row("2024-01-04", "", Some(5.0), None),
        ];
        let aggregates = compute_aggregates(&rows, &[spec]);
        let counts = &aggregates[0];

        assert_eq!(
            counts.entries,
            vec![("A".to_string(), 2.0), ("B".to_string(), 1.0)]
        );
        assert_eq!(counts.excluded_rows, 1);
    }

    #[test]
    fn test_non_finite_amounts_are_excluded() {
        let rows = vec![
            row("2024-01-01", "A", Some(f64::NAN), None),
            row("2024-01-01", "A", Some(f64::INFINITY), None),
            row("2024-01-01", "A", Some(1.0), None),
        ];
        let aggregates = compute_aggregates(&rows, &default_aggregations());
        let totals = aggregates
            .iter()
            .find(|a| a.name == TOTAL_BY_CATEGORY)
            .unwrap();

        assert_eq!(totals.entries, vec![("A".to_string(), 1.0)]);
        assert_eq!(totals.excluded_rows, 2);
        assert!(totals.entries.iter().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn test_value_descending_ties_break_by_key() {
        let rows = vec![
            row("2024-01-01", "B", Some(10.0), None),
            row("2024-01-01", "A", Some(10.0), None),
        ];
        let aggregates = compute_aggregates(&rows, &default_aggregations());
        let totals = aggregates
            .iter()
            .find(|a| a.name == TOTAL_BY_CATEGORY)
            .unwrap();

        assert_eq!(totals.entries[0].0, "A");
        assert_eq!(totals.entries[1].0, "B");
    }

    #[test]
    fn test_determinism_across_runs() {
        let rows = sample_rows();
        let specs = default_aggregations();
        let first = compute_aggregates(&rows, &specs);
        let second = compute_aggregates(&rows, &specs);
        assert_eq!(first, second);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }
}
