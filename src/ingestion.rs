use crate::error::{ReportError, Result};
use crate::schema::{ColumnMapping, TransactionRow};
use chrono::NaiveDate;
use log::{debug, warn};
use std::io::Read;

/// Reads transaction rows from CSV data using a logical-to-source column
/// mapping. The mapped date, category, and amount columns must exist in the
/// header; individual cell values are parsed leniently.
pub fn read_transactions<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Vec<TransactionRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let date_idx = column_index(&headers, &mapping.date)?;
    let category_idx = column_index(&headers, &mapping.category)?;
    let amount_idx = column_index(&headers, &mapping.amount)?;
    let item_idx = optional_column_index(&headers, mapping.item.as_deref());
    let notes_idx = optional_column_index(&headers, mapping.notes.as_deref());

    let mut rows = Vec::new();
    let mut skipped_dates = 0usize;

    for record in csv_reader.records() {
        let record = record?;

        let date = record.get(date_idx).and_then(parse_date);
        if date.is_none() {
            skipped_dates += 1;
        }

        let category = record
            .get(category_idx)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        let amount = record
            .get(amount_idx)
            .and_then(|v| v.trim().parse::<f64>().ok());

        rows.push(TransactionRow {
            date,
            category,
            amount,
            item: item_idx.and_then(|i| non_empty(record.get(i))),
            notes: notes_idx.and_then(|i| non_empty(record.get(i))),
        });
    }

    if skipped_dates > 0 {
        warn!("{} rows have unparseable dates", skipped_dates);
    }
    debug!("Loaded {} transaction rows", rows.len());

    Ok(rows)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
}

fn optional_column_index(headers: &csv::StringRecord, name: Option<&str>) -> Option<usize> {
    name.and_then(|n| headers.iter().position(|h| h == n))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV_DATA: &str = "\
date,category,amount,item
2024-01-01,A,100,Widget
2024-01-02,B,50,Gadget
not-a-date,A,25,Widget
2024-02-01,B,,Gadget
";

    #[test]
    fn test_read_transactions() {
        let mapping = ColumnMapping::default();
        let rows = read_transactions(CSV_DATA.as_bytes(), &mapping).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0].date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(rows[0].amount, Some(100.0));
        assert_eq!(rows[0].item.as_deref(), Some("Widget"));
        // Bad cells become None instead of rejecting the row.
        assert_eq!(rows[2].date, None);
        assert_eq!(rows[3].amount, None);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let mapping = ColumnMapping {
            amount: "revenue".to_string(),
            ..ColumnMapping::default()
        };
        let err = read_transactions(CSV_DATA.as_bytes(), &mapping).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(c) if c == "revenue"));
    }

    #[test]
    fn test_missing_optional_column_is_tolerated() {
        let mapping = ColumnMapping {
            notes: Some("notes".to_string()),
            ..ColumnMapping::default()
        };
        let rows = read_transactions(CSV_DATA.as_bytes(), &mapping).unwrap();
        assert!(rows.iter().all(|r| r.notes.is_none()));
    }
}
