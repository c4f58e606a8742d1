//! Analysis orchestration: the request/response contract with the scoring
//! service and the lifecycle of a single analysis run.
//!
//! Scoring and cycle detection happen remotely. This module builds the
//! request, talks to the service through the [`AnalysisService`] seam, and
//! tracks the `Idle -> Pending -> {Succeeded, Failed}` state machine. Every
//! call is stamped with a generation so a superseded result can never
//! overwrite a newer one. [`AnalysisJob`] moves the service call onto a
//! worker thread so an interactive caller keeps running while it is pending.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, TriageError};
use crate::fields::Strategy;
use crate::task::{AnalyzedTask, Task};

/// Body of `POST <api>/analyze/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub tasks: Vec<Task>,
    pub strategy: Strategy,
}

/// What the service returns, tasks ordered by rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub tasks: Vec<AnalyzedTask>,
    #[serde(default)]
    pub cycle_detected: bool,
    #[serde(default)]
    pub cycles: Vec<Vec<String>>,
}

/// One entry of `GET <api>/suggest/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub why: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    suggestions: Vec<Suggestion>,
}

/// The remote scoring service. Calls may run on a worker thread.
pub trait AnalysisService: Send + Sync {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse>;

    /// Top picks with a short justification each.
    fn suggest(&self, request: &AnalysisRequest) -> Result<Vec<Suggestion>>;
}

/// [`AnalysisService`] over HTTP/JSON.
pub struct HttpService {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpService {
    /// `timeout` of `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        HttpService {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/", self.base_url, name)
    }
}

fn map_ureq_error(err: ureq::Error) -> TriageError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            TriageError::Service { status, body }
        }
        ureq::Error::Transport(transport) => TriageError::Transport(transport.to_string()),
    }
}

impl AnalysisService for HttpService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let url = self.endpoint("analyze");
        debug!(%url, tasks = request.tasks.len(), "posting analysis request");
        let response = self
            .agent
            .post(&url)
            .send_json(request)
            .map_err(map_ureq_error)?;
        response
            .into_json::<AnalysisResponse>()
            .map_err(|e| TriageError::Decode(format!("malformed response: {e}")))
    }

    fn suggest(&self, request: &AnalysisRequest) -> Result<Vec<Suggestion>> {
        let url = self.endpoint("suggest");
        let tasks = serde_json::to_string(&request.tasks)
            .map_err(|e| TriageError::Format(e.to_string()))?;
        let response = self
            .agent
            .get(&url)
            .query("tasks", &tasks)
            .query("strategy", request.strategy.as_str())
            .call()
            .map_err(map_ureq_error)?;
        let body: SuggestResponse = response
            .into_json()
            .map_err(|e| TriageError::Decode(format!("malformed response: {e}")))?;
        Ok(body.suggestions)
    }
}

/// Handle to an analysis whose service call runs on a worker thread.
///
/// The event loop polls [`AnalysisJob::try_take`]; dropping the job abandons
/// the call, and the worker's late outcome is discarded.
pub struct AnalysisJob {
    pending: Option<PendingAnalysis>,
    rx: mpsc::Receiver<Result<AnalysisResponse>>,
}

impl AnalysisJob {
    pub fn spawn(service: Arc<dyn AnalysisService>, pending: PendingAnalysis) -> Self {
        let (tx, rx) = mpsc::channel();
        let request = pending.request().clone();
        let worker_tx = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("analysis-{}", pending.generation()))
            .spawn(move || {
                let _ = worker_tx.send(service.analyze(&request));
            });
        if let Err(e) = spawned {
            let _ = tx.send(Err(TriageError::Io(e)));
        }
        AnalysisJob { pending: Some(pending), rx }
    }

    pub fn generation(&self) -> Option<u64> {
        self.pending.as_ref().map(PendingAnalysis::generation)
    }

    /// The ticket and outcome once the worker is done. Never blocks, yields at most once.
    pub fn try_take(&mut self) -> Option<(PendingAnalysis, Result<AnalysisResponse>)> {
        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => {
                Err(TriageError::Transport("analysis worker stopped".into()))
            }
        };
        self.pending.take().map(|pending| (pending, outcome))
    }
}

/// A finished analysis together with what was submitted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub strategy: Strategy,
    /// The task list as it was sent; the dependency graph is drawn from this.
    pub submitted: Vec<Task>,
    pub response: AnalysisResponse,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnalysisState {
    #[default]
    Idle,
    Pending {
        generation: u64,
    },
    Succeeded,
    Failed(String),
}

/// Ticket for an in-flight analysis.
#[derive(Debug)]
pub struct PendingAnalysis {
    generation: u64,
    request: AnalysisRequest,
}

impl PendingAnalysis {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }
}

/// Drives analysis runs and keeps the latest result.
#[derive(Debug, Default)]
pub struct Orchestrator {
    state: AnalysisState,
    generation: u64,
    latest: Option<Analysis>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Orchestrator::default()
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, AnalysisState::Pending { .. })
    }

    pub fn latest(&self) -> Option<&Analysis> {
        self.latest.as_ref()
    }

    /// Start a run. Any previous result is dropped and any in-flight run is superseded.
    pub fn begin(&mut self, tasks: &[Task], strategy: Strategy) -> Result<PendingAnalysis> {
        if tasks.is_empty() {
            return Err(TriageError::EmptyInput);
        }
        self.generation += 1;
        self.latest = None;
        self.state = AnalysisState::Pending { generation: self.generation };
        info!(generation = self.generation, strategy = strategy.as_str(), tasks = tasks.len(), "analysis started");
        Ok(PendingAnalysis {
            generation: self.generation,
            request: AnalysisRequest { tasks: tasks.to_vec(), strategy },
        })
    }

    /// Apply the outcome of a run started by [`Orchestrator::begin`].
    ///
    /// Outcomes for anything but the most recent run are rejected with
    /// [`TriageError::Superseded`] and leave the state untouched.
    pub fn finish(
        &mut self,
        pending: PendingAnalysis,
        outcome: Result<AnalysisResponse>,
    ) -> Result<&Analysis> {
        if pending.generation != self.generation || !self.is_pending() {
            warn!(generation = pending.generation, current = self.generation, "dropping superseded analysis");
            return Err(TriageError::Superseded { generation: pending.generation });
        }
        match outcome {
            Ok(response) => {
                info!(
                    generation = pending.generation,
                    tasks = response.tasks.len(),
                    cycles = response.cycles.len(),
                    "analysis succeeded"
                );
                self.state = AnalysisState::Succeeded;
                let analysis = Analysis {
                    strategy: pending.request.strategy,
                    submitted: pending.request.tasks,
                    response,
                };
                Ok(&*self.latest.insert(analysis))
            }
            Err(e) => {
                warn!(generation = pending.generation, error = %e, "analysis failed");
                self.state = AnalysisState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Run one analysis to completion against `service`.
    pub fn analyze(
        &mut self,
        service: &dyn AnalysisService,
        tasks: &[Task],
        strategy: Strategy,
    ) -> Result<&Analysis> {
        let pending = self.begin(tasks, strategy)?;
        let outcome = service.analyze(pending.request());
        self.finish(pending, outcome)
    }

    /// Forget the current result and supersede anything in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.latest = None;
        self.state = AnalysisState::Idle;
        debug!(generation = self.generation, "analysis reset");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::task::Components;

    /// Canned service that counts how often it is called.
    pub(crate) struct FakeService {
        calls: AtomicUsize,
        fail_with: Option<u16>,
    }

    impl FakeService {
        pub fn ok() -> Self {
            FakeService { calls: AtomicUsize::new(0), fail_with: None }
        }

        pub fn failing(status: u16) -> Self {
            FakeService { calls: AtomicUsize::new(0), fail_with: Some(status) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    /// Blocks every analysis until the test sends on the paired channel.
    struct GatedService {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl AnalysisService for GatedService {
        fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
            let _ = self.gate.lock().unwrap().recv();
            FakeService::ok().analyze(request)
        }

        fn suggest(&self, _request: &AnalysisRequest) -> Result<Vec<Suggestion>> {
            Ok(Vec::new())
        }
    }

    fn gated() -> (mpsc::Sender<()>, Arc<dyn AnalysisService>) {
        let (release, gate) = mpsc::channel();
        (release, Arc::new(GatedService { gate: Mutex::new(gate) }))
    }

    pub(crate) fn wait_for(job: &mut AnalysisJob) -> (PendingAnalysis, Result<AnalysisResponse>) {
        for _ in 0..500 {
            if let Some(done) = job.try_take() {
                return done;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("analysis job never finished");
    }

    pub(crate) fn score(task: &Task, score: f64, urgency: f64, importance_norm: f64) -> AnalyzedTask {
        AnalyzedTask {
            task: task.clone(),
            score,
            components: Components { urgency, importance_norm, effort: 0.5 },
        }
    }

    impl AnalysisService for FakeService {
        fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.fail_with {
                return Err(TriageError::Service { status, body: String::new() });
            }
            let n = request.tasks.len() as f64;
            let tasks = request
                .tasks
                .iter()
                .enumerate()
                .map(|(i, t)| score(t, 1.0 - i as f64 / n, 0.6, 0.6))
                .collect();
            Ok(AnalysisResponse { tasks, cycle_detected: false, cycles: Vec::new() })
        }

        fn suggest(&self, request: &AnalysisRequest) -> Result<Vec<Suggestion>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(request
                .tasks
                .iter()
                .take(3)
                .map(|t| Suggestion {
                    id: t.id.clone(),
                    title: t.title.clone(),
                    score: 0.5,
                    why: "Top priority by selected strategy".into(),
                    due_date: t.due_date,
                })
                .collect())
        }
    }

    fn task(id: &str) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            priority: 5,
            effort: 5,
            due_date: None,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn empty_input_never_reaches_the_service() {
        let service = FakeService::ok();
        let mut orchestrator = Orchestrator::new();
        let err = orchestrator.analyze(&service, &[], Strategy::Smart).unwrap_err();
        assert!(matches!(err, TriageError::EmptyInput));
        assert_eq!(service.calls(), 0);
        assert_eq!(orchestrator.state(), &AnalysisState::Idle);
    }

    #[test]
    fn success_records_result_and_strategy() {
        let service = FakeService::ok();
        let mut orchestrator = Orchestrator::new();
        let tasks = vec![task("A"), task("B")];
        let analysis = orchestrator.analyze(&service, &tasks, Strategy::Effort).unwrap();
        assert_eq!(analysis.strategy, Strategy::Effort);
        assert_eq!(analysis.submitted, tasks);
        assert_eq!(analysis.response.tasks.len(), 2);
        assert_eq!(orchestrator.state(), &AnalysisState::Succeeded);
        assert_eq!(service.calls(), 1);
    }

    #[test]
    fn failure_transitions_to_failed_and_drops_previous_result() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.analyze(&FakeService::ok(), &[task("A")], Strategy::Smart).unwrap();
        assert!(orchestrator.latest().is_some());

        let err = orchestrator
            .analyze(&FakeService::failing(500), &[task("A")], Strategy::Smart)
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to analyze tasks: HTTP error! status: 500");
        assert_eq!(
            orchestrator.state(),
            &AnalysisState::Failed("Failed to analyze tasks: HTTP error! status: 500".into())
        );
        assert!(orchestrator.latest().is_none());
    }

    #[test]
    fn superseded_run_cannot_overwrite_newer_one() {
        let service = FakeService::ok();
        let mut orchestrator = Orchestrator::new();
        let first = orchestrator.begin(&[task("OLD")], Strategy::Smart).unwrap();
        let second = orchestrator.begin(&[task("NEW")], Strategy::Urgency).unwrap();
        assert!(second.generation() > first.generation());

        let second_outcome = service.analyze(second.request());
        orchestrator.finish(second, second_outcome).unwrap();

        let first_outcome = service.analyze(first.request());
        let err = orchestrator.finish(first, first_outcome).unwrap_err();
        assert!(matches!(err, TriageError::Superseded { .. }));

        let latest = orchestrator.latest().unwrap();
        assert_eq!(latest.submitted[0].id, "NEW");
        assert_eq!(latest.strategy, Strategy::Urgency);
    }

    #[test]
    fn reset_supersedes_in_flight_run() {
        let service = FakeService::ok();
        let mut orchestrator = Orchestrator::new();
        let pending = orchestrator.begin(&[task("A")], Strategy::Smart).unwrap();
        orchestrator.reset();
        let outcome = service.analyze(pending.request());
        assert!(orchestrator.finish(pending, outcome).is_err());
        assert_eq!(orchestrator.state(), &AnalysisState::Idle);
        assert!(orchestrator.latest().is_none());
    }

    #[test]
    fn job_stays_pending_while_the_service_is_busy() {
        let (release, service) = gated();
        let mut orchestrator = Orchestrator::new();
        let pending = orchestrator.begin(&[task("A")], Strategy::Smart).unwrap();
        let mut job = AnalysisJob::spawn(service, pending);

        thread::sleep(Duration::from_millis(20));
        assert!(job.try_take().is_none());
        assert!(orchestrator.is_pending());
        assert_eq!(job.generation(), Some(1));

        release.send(()).unwrap();
        let (pending, outcome) = wait_for(&mut job);
        orchestrator.finish(pending, outcome).unwrap();
        assert_eq!(orchestrator.state(), &AnalysisState::Succeeded);
        assert!(job.try_take().is_none());
    }

    #[test]
    fn rerun_while_busy_wins_over_the_slow_call() {
        let (release, slow) = gated();
        let mut orchestrator = Orchestrator::new();
        let first = orchestrator.begin(&[task("OLD")], Strategy::Smart).unwrap();
        let mut slow_job = AnalysisJob::spawn(slow, first);

        let second = orchestrator.begin(&[task("NEW")], Strategy::Urgency).unwrap();
        let mut fast_job = AnalysisJob::spawn(Arc::new(FakeService::ok()), second);
        let (pending, outcome) = wait_for(&mut fast_job);
        orchestrator.finish(pending, outcome).unwrap();

        release.send(()).unwrap();
        let (pending, outcome) = wait_for(&mut slow_job);
        assert!(matches!(
            orchestrator.finish(pending, outcome).unwrap_err(),
            TriageError::Superseded { generation: 1 }
        ));
        assert_eq!(orchestrator.latest().unwrap().submitted[0].id, "NEW");
    }

    #[test]
    fn dropped_job_does_not_block_on_the_worker() {
        let (release, service) = gated();
        let mut orchestrator = Orchestrator::new();
        let pending = orchestrator.begin(&[task("A")], Strategy::Smart).unwrap();
        drop(AnalysisJob::spawn(service, pending));
        // The worker's send fails quietly once it is released.
        release.send(()).unwrap();
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = AnalysisRequest { tasks: vec![task("A")], strategy: Strategy::Importance };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["strategy"], "importance");
        assert_eq!(value["tasks"][0]["id"], "A");
        assert_eq!(value["tasks"][0]["due_date"], serde_json::Value::Null);
        assert_eq!(value["tasks"][0]["dependencies"], serde_json::json!([]));
    }

    #[test]
    fn response_defaults_missing_cycle_fields() {
        let json = r#"{"tasks": []}"#;
        let response: AnalysisResponse = serde_json::from_str(json).unwrap();
        assert!(!response.cycle_detected);
        assert!(response.cycles.is_empty());
    }

    #[test]
    fn http_service_normalises_base_url() {
        let service = HttpService::new("http://127.0.0.1:8000/api/tasks/", None);
        assert_eq!(service.endpoint("analyze"), "http://127.0.0.1:8000/api/tasks/analyze/");
    }
}
