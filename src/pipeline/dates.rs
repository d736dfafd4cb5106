// src/pipeline/dates.rs

use chrono::NaiveDate;
use tracing::warn;

/// Formats a human (or a model reading a human's handwriting) may have
/// used on the form, tried in this order.
const DATE_FORMATS: [&str; 4] = ["%Y年%m月%d日", "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Normalize a free-form date string to `YYYY-MM-DD`.
///
/// Fail-open: when none of the known formats parse, the original string
/// is returned verbatim — export must never block on an unparseable date.
pub fn normalize(date_str: &str) -> String {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    warn!(date = %date_str, "unrecognized date format, keeping original value");
    date_str.to_string()
}
