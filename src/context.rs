//! Top-level application context.
//!
//! Owns both stores, the orchestrator and the service handle. Commands and
//! the TUI borrow what they need from here; nothing is reachable globally.

use std::path::Path;
use std::sync::Arc;

use crate::analysis::{
    Analysis, AnalysisJob, AnalysisRequest, AnalysisService, HttpService, Orchestrator, Suggestion,
};
use crate::config::Config;
use crate::db::{BlobSlot, FeedbackStore, TaskStore};
use crate::error::{Result, TriageError};
use crate::fields::Strategy;
use crate::render::{self, ResultView};

pub const TASKS_FILE: &str = "tasks.json";
pub const FEEDBACK_FILE: &str = "feedback.json";

pub struct Context {
    pub config: Config,
    pub tasks: TaskStore,
    pub feedback: FeedbackStore,
    pub orchestrator: Orchestrator,
    service: Arc<dyn AnalysisService>,
}

impl Context {
    /// Open the stores under `data_dir` and talk to the configured service over HTTP.
    pub fn open(data_dir: &Path, config: Config) -> Self {
        let service = HttpService::new(&config.api_url, config.timeout());
        Context::new(
            config,
            TaskStore::open(BlobSlot::file(data_dir.join(TASKS_FILE))),
            FeedbackStore::open(BlobSlot::file(data_dir.join(FEEDBACK_FILE))),
            Box::new(service),
        )
    }

    pub fn new(
        config: Config,
        tasks: TaskStore,
        feedback: FeedbackStore,
        service: Box<dyn AnalysisService>,
    ) -> Self {
        Context {
            config,
            tasks,
            feedback,
            orchestrator: Orchestrator::new(),
            service: Arc::from(service),
        }
    }

    /// Empty the task list and throw away any analysis built from it.
    pub fn clear_tasks(&mut self) -> Result<()> {
        self.orchestrator.reset();
        self.tasks.clear()
    }

    pub fn analyze(&mut self, strategy: Strategy) -> Result<&Analysis> {
        self.orchestrator
            .analyze(self.service.as_ref(), self.tasks.tasks(), strategy)
    }

    /// Start an analysis on a worker thread, superseding any run still in flight.
    pub fn start_analysis(&mut self, strategy: Strategy) -> Result<AnalysisJob> {
        let pending = self.orchestrator.begin(self.tasks.tasks(), strategy)?;
        Ok(AnalysisJob::spawn(Arc::clone(&self.service), pending))
    }

    /// Apply the outcome of `job` if it has one yet.
    pub fn poll_analysis(&mut self, job: &mut AnalysisJob) -> Option<Result<&Analysis>> {
        let (pending, outcome) = job.try_take()?;
        Some(self.orchestrator.finish(pending, outcome))
    }

    pub fn suggest(&self, strategy: Strategy) -> Result<Vec<Suggestion>> {
        if self.tasks.is_empty() {
            return Err(TriageError::EmptyInput);
        }
        self.service.suggest(&AnalysisRequest {
            tasks: self.tasks.tasks().to_vec(),
            strategy,
        })
    }

    /// Display structure for the latest successful analysis.
    pub fn view(&self) -> Option<ResultView> {
        self.orchestrator
            .latest()
            .map(|analysis| render::render(analysis, &self.feedback, &self.config.canvas()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use crate::analysis::tests::FakeService;
    use crate::analysis::AnalysisState;
    use crate::task::TaskInput;

    fn context() -> Context {
        Context::new(
            Config::default(),
            TaskStore::in_memory(),
            FeedbackStore::in_memory(),
            Box::new(FakeService::ok()),
        )
    }

    #[test]
    fn analyze_then_view() {
        let mut ctx = context();
        ctx.tasks.add(TaskInput::new("First")).unwrap();
        ctx.tasks.add(TaskInput::new("Second")).unwrap();
        ctx.analyze(Strategy::Smart).unwrap();

        let view = ctx.view().unwrap();
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].title, "First");
        assert!(view.graph.is_some());
    }

    #[test]
    fn clear_discards_analysis() {
        let mut ctx = context();
        ctx.tasks.add(TaskInput::new("Only")).unwrap();
        ctx.analyze(Strategy::Smart).unwrap();
        ctx.clear_tasks().unwrap();
        assert!(ctx.tasks.is_empty());
        assert!(ctx.view().is_none());
        assert_eq!(ctx.orchestrator.state(), &AnalysisState::Idle);
    }

    fn wait(ctx: &mut Context, job: &mut AnalysisJob) -> Result<Strategy> {
        for _ in 0..500 {
            if let Some(outcome) = ctx.poll_analysis(job) {
                return outcome.map(|analysis| analysis.strategy);
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("analysis job never finished");
    }

    #[test]
    fn background_analysis_feeds_the_view() {
        let mut ctx = context();
        ctx.tasks.add(TaskInput::new("First")).unwrap();
        let mut job = ctx.start_analysis(Strategy::Importance).unwrap();
        assert!(ctx.orchestrator.is_pending());
        assert!(ctx.view().is_none());

        assert_eq!(wait(&mut ctx, &mut job).unwrap(), Strategy::Importance);
        assert_eq!(ctx.view().unwrap().rows.len(), 1);
    }

    #[test]
    fn restarting_supersedes_the_earlier_job() {
        let mut ctx = context();
        ctx.tasks.add(TaskInput::new("Only")).unwrap();
        let mut first = ctx.start_analysis(Strategy::Smart).unwrap();
        let mut second = ctx.start_analysis(Strategy::Urgency).unwrap();

        assert_eq!(wait(&mut ctx, &mut second).unwrap(), Strategy::Urgency);
        assert!(matches!(wait(&mut ctx, &mut first).unwrap_err(), TriageError::Superseded { .. }));
        assert_eq!(ctx.view().unwrap().summary.strategy, Strategy::Urgency);
    }

    #[test]
    fn background_analysis_rejects_empty_list() {
        let mut ctx = context();
        assert!(matches!(ctx.start_analysis(Strategy::Smart).err(), Some(TriageError::EmptyInput)));
    }

    #[test]
    fn suggest_requires_tasks() {
        let ctx = context();
        assert!(matches!(ctx.suggest(Strategy::Smart).unwrap_err(), TriageError::EmptyInput));
    }

    #[test]
    fn suggest_returns_service_picks() {
        let mut ctx = context();
        for title in ["a", "b", "c", "d"] {
            ctx.tasks.add(TaskInput::new(title)).unwrap();
        }
        let picks = ctx.suggest(Strategy::Effort).unwrap();
        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].title, "a");
    }
}
