//! Task data structures and the conversions between them.
//!
//! A [`Task`] is what the user owns and what gets persisted. [`TaskInput`] is
//! what the add form produces, [`PartialTask`] is one loosely-typed element of
//! an import payload, and [`AnalyzedTask`] is a task as the analysis service
//! hands it back, with a score attached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PRIORITY: u8 = 5;
pub const DEFAULT_EFFORT: u8 = 5;

/// A user-entered work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub priority: u8,
    pub effort: u8,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Values collected by the add form, before an id is assigned.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub priority: u8,
    pub effort: u8,
    pub due_date: Option<NaiveDate>,
    pub dependencies: Vec<String>,
}

impl TaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        TaskInput {
            title: title.into(),
            priority: DEFAULT_PRIORITY,
            effort: DEFAULT_EFFORT,
            due_date: None,
            dependencies: Vec::new(),
        }
    }
}

/// One element of an import payload. Every field may be missing.
///
/// `id`, `priority` and `effort` stay loosely typed until [`PartialTask::complete`]
/// so that ids written as numbers and whole-valued floats such as `7.0` import.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialTask {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub priority: Option<Value>,
    pub effort: Option<Value>,
    pub due_date: Option<String>,
    pub dependencies: Option<Vec<String>>,
}

fn loose_id(value: Option<Value>) -> Result<Option<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s).filter(|s| !s.is_empty())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(format!("has an invalid id {other}")),
    }
}

/// A 0..=255 whole number, written as an integer or a float with no fraction.
fn loose_scale(value: Option<Value>, field: &str) -> Result<Option<u8>, String> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let whole = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u8::MAX))
            .map(|f| f as u64)
    });
    whole
        .and_then(|n| u8::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| format!("has an invalid {field} {value}"))
}

impl PartialTask {
    /// Fill in defaults and produce a complete task.
    ///
    /// `generated_id` is used only when the record carries no id of its own.
    /// An explicit `0` priority or effort is kept as given. The error is the
    /// reason the record was rejected, phrased to follow "Task <n> ".
    pub fn complete(self, generated_id: String) -> Result<Task, String> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "is missing a title".to_string())?;

        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| format!("has an invalid due_date '{raw}'"))?,
            ),
        };

        Ok(Task {
            id: loose_id(self.id)?.unwrap_or(generated_id),
            title,
            priority: loose_scale(self.priority, "priority")?.unwrap_or(DEFAULT_PRIORITY),
            effort: loose_scale(self.effort, "effort")?.unwrap_or(DEFAULT_EFFORT),
            due_date,
            dependencies: self.dependencies.unwrap_or_default(),
        })
    }
}

/// Normalised sub-scores reported by the analysis service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub urgency: f64,
    pub importance_norm: f64,
    pub effort: f64,
}

/// A task as returned by the analysis service, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedTask {
    #[serde(flatten)]
    pub task: Task,
    pub score: f64,
    pub components: Components,
}

/// Split the comma-separated dependency field into trimmed, non-empty ids.
pub fn parse_dependencies(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|dep| !dep.is_empty())
        .map(str::to_string)
        .collect()
}

/// Id for a task created at `millis`; `index` distinguishes members of one import batch.
pub fn generate_id(millis: i64, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("task_{millis}_{i}"),
        None => format!("task_{millis}"),
    }
}
