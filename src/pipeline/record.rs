// src/pipeline/record.rs

use serde::Serialize;
use serde_json::Value;

use super::schema;

/// One expense entry within a report. The amount stays a raw JSON value
/// until flattening, where coercion failure is defined to surface.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub name: String,
    pub amount: Value,
}

/// The structured result of interpreting one expense-form image,
/// projected from the model payload after schema validation passed.
#[derive(Debug, Clone)]
pub struct ExtractionRecord {
    pub document_id: String,
    pub date: String,
    pub submitter: String,
    pub department: String,
    pub line_items: Vec<LineItem>,
    pub total_amount: Value,
}

/// One exportable table row: header fields repeated per line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub document_id: String,
    /// Normalized to `YYYY-MM-DD` where the source date was parseable.
    pub date: String,
    pub submitter: String,
    pub department: String,
    pub item_name: String,
    pub item_amount: f64,
    pub total_amount: f64,
}

impl ExtractionRecord {
    /// Project a validated payload into the typed record.
    ///
    /// Callers must run the schema validator first; `None` here means the
    /// payload did not have the validated shape after all.
    pub(crate) fn from_payload(payload: &Value) -> Option<Self> {
        let obj = payload.as_object()?;
        let items = obj
            .get(schema::KEY_LINE_ITEMS)?
            .as_array()?
            .iter()
            .map(|item| {
                let fields = item.as_object()?;
                Some(LineItem {
                    name: display_string(fields.get(schema::KEY_ITEM_NAME)?),
                    amount: fields.get(schema::KEY_ITEM_AMOUNT)?.clone(),
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            document_id: display_string(obj.get(schema::KEY_DOCUMENT_ID)?),
            date: display_string(obj.get(schema::KEY_DATE)?),
            submitter: display_string(obj.get(schema::KEY_SUBMITTER)?),
            department: display_string(obj.get(schema::KEY_DEPARTMENT)?),
            line_items: items,
            total_amount: obj.get(schema::KEY_TOTAL_AMOUNT)?.clone(),
        })
    }
}

/// Render a scalar payload value as display text. Strings pass through
/// unquoted; anything else falls back to its JSON rendering, so a numeric
/// document id still exports as `1024` rather than failing.
pub(crate) fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a payload amount to a number. JSON numbers pass through;
/// strings get a trimmed parse. Everything else is non-coercible.
pub(crate) fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
