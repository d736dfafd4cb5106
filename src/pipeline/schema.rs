// src/pipeline/schema.rs

use serde_json::Value;
use tracing::{debug, warn};

use super::record::coerce_amount;

// Wire field names as the model returns them.
pub(crate) const KEY_DOCUMENT_ID: &str = "报销单号";
pub(crate) const KEY_DATE: &str = "日期";
pub(crate) const KEY_SUBMITTER: &str = "报销人";
pub(crate) const KEY_DEPARTMENT: &str = "部门";
pub(crate) const KEY_LINE_ITEMS: &str = "项目";
pub(crate) const KEY_ITEM_NAME: &str = "名称";
pub(crate) const KEY_ITEM_AMOUNT: &str = "金额";
pub(crate) const KEY_TOTAL_AMOUNT: &str = "总金额";

const REQUIRED_KEYS: [&str; 6] = [
    KEY_DOCUMENT_ID,
    KEY_DATE,
    KEY_SUBMITTER,
    KEY_DEPARTMENT,
    KEY_LINE_ITEMS,
    KEY_TOTAL_AMOUNT,
];

/// Allowed drift between the stated total and the sum of line items when
/// reconciliation is enforced.
const TOTAL_TOLERANCE: f64 = 0.01;

/// Validation knobs, injected by the caller.
#[derive(Debug, Clone, Default)]
pub struct ValidationPolicy {
    /// Require the stated total to match the sum of line-item amounts
    /// within the tolerance. Off by default; the check was switched off
    /// in production and stays off pending product clarification.
    pub enforce_total_reconciliation: bool,
}

/// Check a decoded payload against the required shape.
///
/// Rejects (returns false) rather than erroring: a malformed payload is a
/// business outcome here, not a fault. Diagnostics go to the log.
pub fn validate(payload: &Value, policy: &ValidationPolicy) -> bool {
    let Some(obj) = payload.as_object() else {
        warn!("payload is not a JSON object");
        return false;
    };

    for key in REQUIRED_KEYS {
        if !obj.contains_key(key) {
            warn!(field = key, "missing required field");
            return false;
        }
    }

    let Some(items) = obj[KEY_LINE_ITEMS].as_array() else {
        warn!("line item list is not an array");
        return false;
    };

    for item in items {
        let well_formed = item
            .as_object()
            .is_some_and(|m| m.contains_key(KEY_ITEM_NAME) && m.contains_key(KEY_ITEM_AMOUNT));
        if !well_formed {
            warn!("line item missing name or amount");
            return false;
        }
    }

    if policy.enforce_total_reconciliation && !items.is_empty() {
        if !totals_reconcile(items, &obj[KEY_TOTAL_AMOUNT]) {
            return false;
        }
    }

    debug!("payload passed schema validation");
    true
}

fn totals_reconcile(items: &[Value], stated_total: &Value) -> bool {
    let mut sum = 0.0;
    for item in items {
        match coerce_amount(&item[KEY_ITEM_AMOUNT]) {
            Some(amount) => sum += amount,
            None => {
                warn!("line item amount not numeric, cannot reconcile total");
                return false;
            }
        }
    }
    let Some(total) = coerce_amount(stated_total) else {
        warn!("stated total not numeric, cannot reconcile");
        return false;
    };
    if (sum - total).abs() > TOTAL_TOLERANCE {
        warn!(computed = sum, stated = total, "total does not match sum of line items");
        return false;
    }
    true
}
