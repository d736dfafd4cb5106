// src/pipeline/flatten.rs

use super::PipelineError;
use super::dates;
use super::record::{ExtractionRecord, FlatRow, coerce_amount};

/// Expand one record into one flat row per line item, in original order.
///
/// Header fields are repeated on every row, the date is normalized on the
/// way through, and both amounts are coerced to numbers. A single
/// non-coercible amount fails the whole record; no partial rows are
/// emitted. Zero line items yield zero rows with the header fields
/// dropped silently (a documented non-goal, not a bug).
pub fn flatten(record: &ExtractionRecord) -> Result<Vec<FlatRow>, PipelineError> {
    let total_amount = coerce_amount(&record.total_amount).ok_or_else(|| {
        PipelineError::BadLineItem(format!("total amount is not numeric: {}", record.total_amount))
    })?;
    let date = dates::normalize(&record.date);

    record
        .line_items
        .iter()
        .map(|item| {
            let item_amount = coerce_amount(&item.amount).ok_or_else(|| {
                PipelineError::BadLineItem(format!(
                    "amount for item '{}' is not numeric: {}",
                    item.name, item.amount
                ))
            })?;
            Ok(FlatRow {
                document_id: record.document_id.clone(),
                date: date.clone(),
                submitter: record.submitter.clone(),
                department: record.department.clone(),
                item_name: item.name.clone(),
                item_amount,
                total_amount,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::LineItem;
    use serde_json::json;

    fn record(items: Vec<LineItem>) -> ExtractionRecord {
        ExtractionRecord {
            document_id: "A001".into(),
            date: "2024年5月1日".into(),
            submitter: "张三".into(),
            department: "财务部".into(),
            line_items: items,
            total_amount: json!(42.5),
        }
    }

    fn item(name: &str, amount: serde_json::Value) -> LineItem {
        LineItem {
            name: name.into(),
            amount,
        }
    }

    #[test]
    fn one_row_per_line_item() {
        let rec = record(vec![item("打印", json!(12.5)), item("交通", json!(30))]);
        let rows = flatten(&rec).unwrap();
        assert_eq!(rows.len(), rec.line_items.len());
        assert_eq!(rows[0].item_name, "打印");
        assert_eq!(rows[1].item_name, "交通");
    }

    #[test]
    fn header_fields_repeat_per_row() {
        let rec = record(vec![item("打印", json!(12.5)), item("交通", json!(30))]);
        let rows = flatten(&rec).unwrap();
        for row in &rows {
            assert_eq!(row.document_id, "A001");
            assert_eq!(row.date, "2024-05-01");
            assert_eq!(row.submitter, "张三");
            assert_eq!(row.department, "财务部");
            assert_eq!(row.total_amount, 42.5);
        }
    }

    #[test]
    fn zero_items_zero_rows() {
        let rows = flatten(&record(vec![])).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn string_amounts_coerce() {
        let rec = record(vec![item("交通", json!("30"))]);
        let rows = flatten(&rec).unwrap();
        assert_eq!(rows[0].item_amount, 30.0);
    }

    #[test]
    fn bad_item_amount_is_fatal() {
        let rec = record(vec![item("打印", json!(12.5)), item("交通", json!("约30元"))]);
        let err = flatten(&rec).unwrap_err();
        assert!(matches!(err, PipelineError::BadLineItem(_)));
    }

    #[test]
    fn bad_total_is_fatal() {
        let mut rec = record(vec![item("打印", json!(12.5))]);
        rec.total_amount = json!(null);
        let err = flatten(&rec).unwrap_err();
        assert!(matches!(err, PipelineError::BadLineItem(_)));
    }

    #[test]
    fn unparseable_date_passes_through() {
        let mut rec = record(vec![item("打印", json!(12.5))]);
        rec.date = "not-a-date".into();
        let rows = flatten(&rec).unwrap();
        assert_eq!(rows[0].date, "not-a-date");
    }
}
