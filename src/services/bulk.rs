//! Non-atomic bulk deletion.
//!
//! A batch is a sequence of independent per-record deletions. There is no
//! surrounding transaction: a failure on one id is recorded and the batch
//! moves on, and a crash mid-batch leaves the already-processed ids deleted.

use super::error::ServiceError;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Deleted,
    Missing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub id: i64,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub deleted: usize,
    pub items: Vec<ItemOutcome>,
}

impl BulkReport {
    fn record(&mut self, id: i64, result: Result<bool>) {
        let item = match result {
            Ok(true) => {
                self.deleted += 1;
                ItemOutcome {
                    id,
                    outcome: Outcome::Deleted,
                    error: None,
                }
            }
            Ok(false) => ItemOutcome {
                id,
                outcome: Outcome::Missing,
                error: None,
            },
            Err(e) => ItemOutcome {
                id,
                outcome: Outcome::Failed,
                error: Some(e.to_string()),
            },
        };
        self.items.push(item);
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome == Outcome::Failed)
            .count()
    }
}

/// Extracts the `ids` array of a bulk request body.
///
/// Returns `None` when the field is missing, not an array, empty, or holds
/// anything other than positive integers (JSON numbers or numeric strings).
/// Duplicates are collapsed, keeping first-occurrence order.
pub fn parse_ids(body: &Value) -> Option<Vec<i64>> {
    let raw = body.get("ids")?.as_array()?;
    if raw.is_empty() {
        return None;
    }

    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        let id = match value {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        if id < 1 {
            return None;
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ids)
}

/// Like [`parse_ids`], but an unusable selection becomes `ServiceError::NothingSelected`.
pub fn selection(body: Option<&Value>, noun: &'static str) -> Result<Vec<i64>> {
    match body.and_then(parse_ids) {
        Some(ids) => Ok(ids),
        None => Err(ServiceError::NothingSelected(noun).into()),
    }
}

/// Runs `delete_one` for every id and collects the outcomes.
///
/// `delete_one` returns `Ok(true)` when it deleted the record, `Ok(false)`
/// when there was nothing to delete.
pub fn delete_each<F>(ids: &[i64], mut delete_one: F) -> BulkReport
where
    F: FnMut(i64) -> Result<bool>,
{
    let mut report = BulkReport::default();
    for &id in ids {
        let result = delete_one(id);
        if let Err(e) = &result {
            tracing::error!(id, error = %e, "Bulk delete item failed");
        }
        report.record(id, result);
    }
    report
}
