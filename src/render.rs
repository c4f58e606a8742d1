//! Turns an [`Analysis`] into display-ready structure.
//!
//! Nothing here draws; the CLI report and the TUI both read the same
//! [`ResultView`]. Rows keep the service's rank order.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::Analysis;
use crate::db::{format_due, FeedbackStore};
use crate::fields::{PriorityTier, Quadrant, Strategy};
use crate::graph::{self, Canvas, GraphLayout};
use crate::quadrant;
use crate::task::{AnalyzedTask, Components};

/// Importance at or above this counts towards the "high priority" statistic.
pub const HIGH_IMPORTANCE: f64 = 0.7;

pub const FALLBACK_REASON: &str = "overall balance of all factors";

/// One ranked line of the results list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub rank: usize,
    pub id: String,
    pub title: String,
    pub score: f64,
    pub tier: PriorityTier,
    pub priority: u8,
    pub effort: u8,
    pub due_date: Option<NaiveDate>,
    pub due_display: String,
    pub components: Components,
    pub quadrant: Quadrant,
    pub explanation: String,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub high_priority: usize,
    pub cycle_count: usize,
    pub strategy: Strategy,
}

impl Summary {
    pub fn strategy_line(&self) -> String {
        format!("{} - {}", self.strategy.label(), self.strategy.description())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub rows: Vec<ResultRow>,
    pub summary: Summary,
    pub cycle_detected: bool,
    /// Each reported cycle as `A → B → C`.
    pub cycles: Vec<String>,
    /// `None` when there is nothing to draw.
    pub graph: Option<GraphLayout>,
    /// Row indices per quadrant, in [`Quadrant::ALL`] order.
    pub matrix: [Vec<usize>; 4],
}

impl ResultView {
    pub fn quadrant_rows(&self, q: Quadrant) -> impl Iterator<Item = &ResultRow> {
        self.matrix[q.index()].iter().map(move |&i| &self.rows[i])
    }
}

/// Reasons in fixed order, comma-joined and terminated with a full stop.
pub fn explain(components: &Components) -> String {
    let mut reasons = Vec::new();
    if components.urgency >= 0.7 {
        reasons.push("approaching deadline");
    }
    if components.importance_norm >= 0.7 {
        reasons.push("high importance");
    }
    if components.effort >= 0.5 {
        reasons.push("good effort-to-value ratio");
    }
    if reasons.is_empty() {
        reasons.push(FALLBACK_REASON);
    }
    format!("{}.", reasons.join(", "))
}

/// Percentage for a component bar, rounded to a whole number.
pub fn percent(value: f64) -> u32 {
    (value * 100.0).round().clamp(0.0, 100.0) as u32
}

fn row(rank: usize, task: &AnalyzedTask, feedback: &FeedbackStore) -> ResultRow {
    ResultRow {
        rank,
        id: task.task.id.clone(),
        title: task.task.title.clone(),
        score: task.score,
        tier: PriorityTier::from_score(task.score),
        priority: task.task.priority,
        effort: task.task.effort,
        due_date: task.task.due_date,
        due_display: format_due(task.task.due_date),
        components: task.components,
        quadrant: quadrant::classify(task),
        explanation: explain(&task.components),
        feedback: feedback.badge(&task.task.id),
    }
}

pub fn render(analysis: &Analysis, feedback: &FeedbackStore, canvas: &Canvas) -> ResultView {
    let response = &analysis.response;
    let rows: Vec<ResultRow> = response
        .tasks
        .iter()
        .enumerate()
        .map(|(i, task)| row(i + 1, task, feedback))
        .collect();

    let summary = Summary {
        total: response.tasks.len(),
        high_priority: response
            .tasks
            .iter()
            .filter(|t| t.components.importance_norm >= HIGH_IMPORTANCE)
            .count(),
        cycle_count: response.cycles.len(),
        strategy: analysis.strategy,
    };

    let graph = (!response.tasks.is_empty() && !analysis.submitted.is_empty())
        .then(|| graph::layout(&analysis.submitted, &response.cycles, canvas));

    ResultView {
        rows,
        summary,
        cycle_detected: response.cycle_detected,
        cycles: response.cycles.iter().map(|c| c.join(" → ")).collect(),
        graph,
        matrix: quadrant::bucket(&response.tasks),
    }
}
