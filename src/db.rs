//! Persistent stores and display helpers.
//!
//! This module provides the [`TaskStore`] that owns the user's task list, the
//! [`FeedbackStore`] that tracks helpful/unhelpful ratings, and the
//! [`BlobSlot`] they both persist through. Every mutating call rewrites the
//! owning store's blob in full before returning.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TriageError};
use crate::task::{generate_id, PartialTask, Task, TaskInput};

/// Where a store keeps its serialized form. A slot without a path keeps nothing.
#[derive(Debug, Clone, Default)]
pub struct BlobSlot {
    path: Option<PathBuf>,
}

impl BlobSlot {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        BlobSlot { path: Some(path.into()) }
    }

    pub fn memory() -> Self {
        BlobSlot { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the stored blob, or `None` if nothing has been written yet.
    pub fn read(&self) -> Result<Option<String>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        Ok(Some(buf))
    }

    /// Replace the stored blob using an atomic write (temp file + rename).
    pub fn write(&self, data: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

/// Ordered list of user tasks, the only writer of task data.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    slot: BlobSlot,
}

impl TaskStore {
    /// Open the store from its slot. A missing or malformed blob yields an empty store.
    pub fn open(slot: BlobSlot) -> Self {
        let mut store = TaskStore { tasks: Vec::new(), slot };
        match store.slot.read() {
            Ok(Some(blob)) => {
                if let Err(e) = store.deserialize(&blob) {
                    warn!(error = %e, "stored tasks are unreadable, starting fresh");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read stored tasks, starting fresh"),
        }
        store
    }

    pub fn in_memory() -> Self {
        TaskStore::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Create a task from form input and append it.
    pub fn add(&mut self, input: TaskInput) -> Result<Task> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(TriageError::Validation("Please enter a task title".into()));
        }

        let base = generate_id(Utc::now().timestamp_millis(), None);
        let id = unique_id(base, |candidate| self.contains_id(candidate));
        let task = Task {
            id,
            title: title.to_string(),
            priority: input.priority,
            effort: input.effort,
            due_date: input.due_date,
            dependencies: input.dependencies,
        };
        self.tasks.push(task.clone());
        if let Err(e) = self.persist() {
            self.tasks.pop();
            return Err(e);
        }
        debug!(id = %task.id, "task added");
        Ok(task)
    }

    /// Import a JSON array of task-like records.
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TriageError::Format("Please paste JSON data".into()));
        }
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| TriageError::Format(e.to_string()))?;
        let serde_json::Value::Array(records) = value else {
            return Err(TriageError::Format("JSON must be an array of tasks".into()));
        };
        self.import_batch(&records)
    }

    /// Append every record or none of them.
    ///
    /// All records are validated before the first one is appended, so a bad
    /// element leaves the store exactly as it was.
    pub fn import_batch(&mut self, records: &[serde_json::Value]) -> Result<usize> {
        let millis = Utc::now().timestamp_millis();
        let mut batch: Vec<Task> = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let partial: PartialTask = serde_json::from_value(record.clone())
                .map_err(|e| TriageError::Import { index, reason: format!("is malformed: {e}") })?;
            let generated = unique_id(generate_id(millis, Some(index)), |candidate| {
                self.contains_id(candidate) || batch.iter().any(|t| t.id == candidate)
            });
            let task = partial
                .complete(generated)
                .map_err(|reason| TriageError::Import { index, reason })?;
            batch.push(task);
        }

        let mut seen: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        for task in &batch {
            if !seen.insert(task.id.as_str()) {
                warn!(id = %task.id, "imported task id collides with an existing task");
            }
        }

        let count = batch.len();
        let before = self.tasks.len();
        self.tasks.extend(batch);
        if let Err(e) = self.persist() {
            self.tasks.truncate(before);
            return Err(e);
        }
        debug!(count, "tasks imported");
        Ok(count)
    }

    /// Remove and return the task at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Task> {
        if index >= self.tasks.len() {
            return Err(TriageError::Index { index, len: self.tasks.len() });
        }
        let task = self.tasks.remove(index);
        if let Err(e) = self.persist() {
            self.tasks.insert(index, task);
            return Err(e);
        }
        debug!(id = %task.id, index, "task removed");
        Ok(task)
    }

    /// Drop every task. Callers holding an analysis result must discard it too.
    pub fn clear(&mut self) -> Result<()> {
        let previous = std::mem::take(&mut self.tasks);
        if let Err(e) = self.persist() {
            self.tasks = previous;
            return Err(e);
        }
        debug!("tasks cleared");
        Ok(())
    }

    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.tasks).map_err(|e| TriageError::Format(e.to_string()))
    }

    /// Replace the contents from a serialized blob. On failure the store is left empty.
    pub fn deserialize(&mut self, blob: &str) -> Result<()> {
        match serde_json::from_str::<Vec<Task>>(blob) {
            Ok(tasks) => {
                self.tasks = tasks;
                Ok(())
            }
            Err(e) => {
                self.tasks.clear();
                Err(TriageError::Format(e.to_string()))
            }
        }
    }

    fn contains_id(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    fn persist(&self) -> Result<()> {
        let blob = self.serialize()?;
        self.slot.write(&blob)
    }
}

/// Append `_2`, `_3`, ... to `base` until `taken` no longer matches.
fn unique_id(base: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&base) {
        return base;
    }
    let mut n = 2u64;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Helpful/unhelpful counters for one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub helpful: u32,
    pub unhelpful: u32,
}

impl FeedbackRecord {
    pub fn total(&self) -> u32 {
        self.helpful + self.unhelpful
    }
}

/// Per-task feedback counters, persisted independently of the tasks.
#[derive(Debug, Default)]
pub struct FeedbackStore {
    records: BTreeMap<String, FeedbackRecord>,
    slot: BlobSlot,
}

impl FeedbackStore {
    pub fn open(slot: BlobSlot) -> Self {
        let records = match slot.read() {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                warn!(error = %e, "stored feedback is unreadable, starting fresh");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "could not read stored feedback, starting fresh");
                BTreeMap::new()
            }
        };
        FeedbackStore { records, slot }
    }

    pub fn in_memory() -> Self {
        FeedbackStore::default()
    }

    pub fn get(&self, task_id: &str) -> Option<&FeedbackRecord> {
        self.records.get(task_id)
    }

    /// Count one verdict for `task_id`. Nothing changes if the write fails.
    pub fn record(&mut self, task_id: &str, helpful: bool) -> Result<()> {
        let mut updated = self.get(task_id).copied().unwrap_or_default();
        if helpful {
            updated.helpful += 1;
        } else {
            updated.unhelpful += 1;
        }

        let mut records = self.records.clone();
        records.insert(task_id.to_string(), updated);
        let blob = serde_json::to_string_pretty(&records)
            .map_err(|e| TriageError::Format(e.to_string()))?;
        self.slot.write(&blob)?;

        self.records = records;
        debug!(task_id, helpful, "feedback recorded");
        Ok(())
    }

    /// Summary of the feedback for `task_id`, or `None` when there is none.
    pub fn badge(&self, task_id: &str) -> Option<String> {
        self.records
            .get(task_id)
            .filter(|r| r.total() > 0)
            .map(|r| format!("{}👍 {}👎", r.helpful, r.unhelpful))
    }
}

/// Parse due date input relative to `today`.
///
/// Supports "today", "tomorrow", "in 3d", "in 2w" and "YYYY-MM-DD".
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.checked_add_days(Days::new(1)),
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            return nd.trim().parse::<u64>().ok().and_then(|d| today.checked_add_days(Days::new(d)));
        }
        if let Some(nw) = rest.strip_suffix('w') {
            return nw.trim().parse::<u64>().ok().and_then(|w| today.checked_add_days(Days::new(w * 7)));
        }
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format an optional due date for display.
pub fn format_due(due: Option<NaiveDate>) -> String {
    match due {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => "Not set".into(),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
