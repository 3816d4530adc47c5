use std::fmt;

use crate::adapters::Adapter;
use crate::bedrock::{ModelInvoker, RawResponse};
use crate::cost::CostInfo;
use crate::error::LabelscribeError;
use crate::fetch::ImageFetcher;
use crate::prompt::Prompt;
use crate::registry::ModelSpec;
use crate::state_machine::{Decision, FailureKind, JobError, JobId, RunState};
use crate::writer::ResultWriter;

/// Result of one [`Orchestrator::run_step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One job was processed (successfully, or failed without pausing).
    Advanced,
    /// The run is waiting for an operator [`Decision`].
    Paused,
    /// Nothing is left to do.
    Exhausted,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Advanced => write!(f, "advanced"),
            StepOutcome::Paused => write!(f, "paused"),
            StepOutcome::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// First half of a step: either nothing to run, or a job now in progress.
#[derive(Debug)]
pub enum StepStart {
    Idle(StepOutcome),
    Started(StartedJob),
}

/// A job taken off the queue by [`Orchestrator::begin_step`].
#[derive(Debug, Clone)]
pub struct StartedJob {
    pub id: JobId,
    url: String,
    attempt: u32,
}

/// Run-level switches that change when the orchestrator pauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunPolicy {
    /// Pause right away when an image cannot be fetched, instead of collecting
    /// the failure when the queue drains.
    pub pause_on_fetch_failure: bool,
}

/// Drives jobs from the queue through fetch, invocation, parsing and persistence.
pub struct Orchestrator<I, F, W> {
    adapter: Adapter,
    spec: ModelSpec,
    prompt: Prompt,
    invoker: I,
    fetcher: F,
    writer: W,
    policy: RunPolicy,
}

impl<I, F, W> Orchestrator<I, F, W>
where
    I: ModelInvoker,
    F: ImageFetcher,
    W: ResultWriter,
{
    /// Fails when no adapter exists for the model's family.
    pub fn new(
        spec: ModelSpec,
        prompt: Prompt,
        invoker: I,
        fetcher: F,
        writer: W,
    ) -> Result<Self, LabelscribeError> {
        Ok(Self {
            adapter: Adapter::for_spec(&spec)?,
            spec,
            prompt,
            invoker,
            fetcher,
            writer,
            policy: RunPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Process at most one job: [`Self::begin_step`] then [`Self::finish_step`].
    ///
    /// A paused run is left untouched and reported as [`StepOutcome::Paused`];
    /// an aborted run is always [`StepOutcome::Exhausted`]. Per-job failures
    /// are recorded on the job; only contract violations are returned as errors.
    pub async fn run_step(&self, state: &mut RunState) -> Result<StepOutcome, LabelscribeError> {
        match self.begin_step(state)? {
            StepStart::Idle(outcome) => Ok(outcome),
            StepStart::Started(job) => self.finish_step(state, job).await,
        }
    }

    /// Take the next pending job and mark it in progress, without any I/O.
    ///
    /// Callers that checkpoint should save between this and
    /// [`Self::finish_step`] so an attempt survives a crash mid-invocation.
    pub fn begin_step(&self, state: &mut RunState) -> Result<StepStart, LabelscribeError> {
        if state.pending_decision().is_some() {
            return Ok(StepStart::Idle(StepOutcome::Paused));
        }
        if state.is_aborted() {
            return Ok(StepStart::Idle(StepOutcome::Exhausted));
        }

        let Some(job) = state.next_pending() else {
            if state.failed_ids().is_empty() {
                return Ok(StepStart::Idle(StepOutcome::Exhausted));
            }
            state.set_pending_decision();
            tracing::info!(
                failed = state.failed_ids().len(),
                "queue drained with failed jobs; waiting for a decision"
            );
            return Ok(StepStart::Idle(StepOutcome::Paused));
        };
        let id = job.id.clone();
        let url = job.source_url.clone();

        state.mark_in_progress(&id)?;
        let attempt = state.job(&id).map(|j| j.attempts).unwrap_or_default();
        tracing::info!(job_id = %id, attempt, "processing job");
        Ok(StepStart::Started(StartedJob { id, url, attempt }))
    }

    /// Fetch, invoke, parse and persist a job returned by [`Self::begin_step`].
    pub async fn finish_step(
        &self,
        state: &mut RunState,
        job: StartedJob,
    ) -> Result<StepOutcome, LabelscribeError> {
        let StartedJob { id, url, attempt } = job;

        let image = match self.fetcher.fetch(&id, &url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = JobError::new(FailureKind::Network, e.to_string());
                if self.policy.pause_on_fetch_failure {
                    return self.fail_and_pause(state, &id, error, None, None);
                }
                tracing::warn!(job_id = %id, kind = %error.kind, "{}", error.message);
                state.mark_failed(&id, error, None, None)?;
                return Ok(StepOutcome::Advanced);
            }
        };

        let request = self.adapter.build_request(&self.prompt, &image, &self.spec);
        tracing::debug!(
            job_id = %id,
            invocation_target = self.spec.invocation_target(),
            structured = request.structured,
            "invoking model"
        );

        let raw = match self.adapter.invoke(&self.invoker, &request, &self.spec).await {
            Ok(raw) => raw,
            Err(e) => return self.fail_and_pause(state, &id, e.into(), None, None),
        };

        let (fields, usage) = match self.adapter.parse_response(&raw, &self.prompt) {
            Ok(parsed) => parsed,
            Err(e) => {
                let cost = self
                    .adapter
                    .usage(&raw)
                    .map(|u| self.adapter.compute_cost(u, &self.spec));
                let error = JobError::new(FailureKind::Parse, e.to_string());
                return self.fail_and_pause(state, &id, error, Some(raw), cost);
            }
        };
        let cost = self.adapter.compute_cost(usage, &self.spec);

        if let Err(e) = self.writer.write(&id, &fields, &raw) {
            let error = JobError::new(FailureKind::Storage, e.to_string());
            return self.fail_and_pause(state, &id, error, Some(raw), Some(cost));
        }

        tracing::info!(
            job_id = %id,
            attempt,
            confident = fields.confident_count(),
            fields = fields.len(),
            cost = cost.total_cost(),
            "job succeeded"
        );
        state.mark_success(&id, fields, raw, cost)?;
        Ok(StepOutcome::Advanced)
    }

    fn fail_and_pause(
        &self,
        state: &mut RunState,
        id: &JobId,
        error: JobError,
        raw: Option<RawResponse>,
        cost: Option<CostInfo>,
    ) -> Result<StepOutcome, LabelscribeError> {
        tracing::warn!(job_id = %id, kind = %error.kind, "{}", error.message);
        state.mark_failed(id, error, raw, cost)?;
        state.set_pending_decision();
        Ok(StepOutcome::Paused)
    }

    /// Apply the operator's answer to a pause. `WAIT` keeps the run paused.
    pub fn resume(&self, state: &mut RunState, decision: Decision) -> Result<(), LabelscribeError> {
        if state.pending_decision().is_none() {
            return Err(LabelscribeError::InvalidDecision(format!(
                "{decision}: the run is not waiting for a decision"
            )));
        }
        state.apply_decision(decision)?;
        if decision != Decision::Wait {
            state.clear_pending_decision();
        }
        tracing::info!(%decision, model = %self.spec.model_id, "decision applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use crate::adapters::test_support::{prompt, spec};
    use crate::bedrock::{InvocationError, InvocationKind};
    use crate::checkpoint::Checkpoint;
    use crate::error::{FetchError, WriteError};
    use crate::state_machine::{JobStatus, TranscriptionFields, UNSURE};

    const FULL_REPLY: &str = "verbatimCollectors: J. Smith\nrecordNumber: 12\ncountry: Peru";

    fn reply(text: &str) -> Result<RawResponse, InvocationError> {
        Ok(RawResponse::new(json!({
            "generation": text,
            "prompt_token_count": 1000,
            "generation_token_count": 50
        })))
    }

    fn throttled() -> Result<RawResponse, InvocationError> {
        Err(InvocationError::new(InvocationKind::Throttled, "Too many requests"))
    }

    /// Replays scripted results in order; answers with a full reply once the script runs out.
    struct ScriptedInvoker {
        script: Mutex<VecDeque<Result<RawResponse, InvocationError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedInvoker {
        fn new(script: Vec<Result<RawResponse, InvocationError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ModelInvoker for &ScriptedInvoker {
        async fn invoke_model(&self, target: &str, _body: &Value) -> Result<RawResponse, InvocationError> {
            self.calls.lock().unwrap().push(target.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| reply(FULL_REPLY))
        }
    }

    #[derive(Default)]
    struct StubFetcher {
        failing: HashSet<String>,
    }

    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, _id: &JobId, source: &str) -> Result<Vec<u8>, FetchError> {
            if self.failing.contains(source) {
                return Err(FetchError {
                    url: source.to_string(),
                    message: "status 404".into(),
                });
            }
            Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
        }
    }

    #[derive(Default)]
    struct MemoryWriter {
        written: Mutex<Vec<JobId>>,
        broken: bool,
    }

    impl ResultWriter for &MemoryWriter {
        fn write(
            &self,
            job_id: &JobId,
            _fields: &TranscriptionFields,
            _raw: &RawResponse,
        ) -> Result<(), WriteError> {
            if self.broken {
                return Err(WriteError {
                    job_id: job_id.to_string(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.written.lock().unwrap().push(job_id.clone());
            Ok(())
        }
    }

    fn orchestrator<'a>(
        invoker: &'a ScriptedInvoker,
        fetcher: StubFetcher,
        writer: &'a MemoryWriter,
    ) -> Orchestrator<&'a ScriptedInvoker, StubFetcher, &'a MemoryWriter> {
        Orchestrator::new(
            spec("meta.llama3-2-90b-instruct-v1:0", false),
            prompt(),
            invoker,
            fetcher,
            writer,
        )
        .unwrap()
    }

    fn urls(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://img.example/{i}.jpg")).collect()
    }

    async fn drive(
        orch: &Orchestrator<&ScriptedInvoker, StubFetcher, &MemoryWriter>,
        state: &mut RunState,
    ) -> StepOutcome {
        loop {
            match orch.run_step(state).await.unwrap() {
                StepOutcome::Advanced => continue,
                outcome => return outcome,
            }
        }
    }

    #[tokio::test]
    async fn throttled_job_retried_to_full_success() {
        let invoker = ScriptedInvoker::new(vec![reply(FULL_REPLY), throttled()]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(3), 3).unwrap();
        let job2 = state.jobs()[1].id.clone();

        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Paused);
        assert_eq!(state.pending_decision().unwrap().failed, vec![job2.clone()]);
        assert_eq!(
            state.job(&job2).unwrap().last_error.as_ref().unwrap().kind,
            FailureKind::Throttled
        );

        orch.resume(&mut state, Decision::RetryFailed).unwrap();
        assert!(state.pending_decision().is_none());
        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Exhausted);

        let summary = state.summary();
        assert_eq!((summary.success, summary.failed, summary.skipped), (3, 0, 0));
        assert_eq!(state.job(&job2).unwrap().attempts, 2);
        assert_eq!(writer.written.lock().unwrap().len(), 3);
        assert_eq!(invoker.calls(), 4);
    }

    #[tokio::test]
    async fn exhausted_retries_then_skip() {
        let invoker = ScriptedInvoker::new(vec![reply(FULL_REPLY), throttled(), throttled()]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(3), 2).unwrap();
        let job2 = state.jobs()[1].id.clone();

        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Paused);
        orch.resume(&mut state, Decision::RetryFailed).unwrap();
        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Paused);
        assert_eq!(state.job(&job2).unwrap().attempts, 2);

        // job2 is at max_attempts, so the retry only lets job3 run.
        orch.resume(&mut state, Decision::RetryFailed).unwrap();
        assert_eq!(state.job(&job2).unwrap().status, JobStatus::Failed);
        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Paused);
        assert_eq!(state.pending_decision().unwrap().failed, vec![job2.clone()]);

        orch.resume(&mut state, Decision::SkipFailed).unwrap();
        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Exhausted);

        let summary = state.summary();
        assert_eq!((summary.success, summary.failed, summary.skipped), (2, 0, 1));
        assert_eq!(state.job(&job2).unwrap().status, JobStatus::Skipped);
    }

    #[tokio::test]
    async fn free_text_reply_missing_field_still_succeeds() {
        let invoker = ScriptedInvoker::new(vec![reply("verbatimCollectors: J. Smith\ncountry: Peru")]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(1), 3).unwrap();

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Advanced);
        let job = &state.jobs()[0];
        assert_eq!(job.status, JobStatus::Success);
        let result = job.result.as_ref().unwrap();
        assert_eq!(result.get("recordNumber"), Some(UNSURE));
        assert_eq!(result.get("country"), Some("Peru"));
    }

    #[tokio::test]
    async fn reply_with_only_empty_fields_is_a_parse_failure() {
        let empty = r#"{"verbatimCollectors": "", "recordNumber": "", "country": ""}"#;
        let invoker = ScriptedInvoker::new(vec![reply(empty)]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(2), 3).unwrap();
        let job1 = state.jobs()[0].id.clone();

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        let job = state.job(&job1).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.last_error.as_ref().unwrap().kind, FailureKind::Parse);
        assert!(job.result.is_none());
        assert_eq!(state.pending_decision().unwrap().failed, vec![job1]);
        assert!(writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn abort_ends_run_without_side_effects() {
        let invoker = ScriptedInvoker::new(vec![throttled()]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(3), 3).unwrap();

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        orch.resume(&mut state, Decision::Abort).unwrap();
        assert_eq!(state.to_process().count(), 0);

        let before = serde_json::to_string(&state).unwrap();
        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Exhausted);
        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Exhausted);
        assert_eq!(serde_json::to_string(&state).unwrap(), before);
        assert_eq!(invoker.calls(), 1);
        assert_eq!(state.summary().pending, 2);
    }

    #[tokio::test]
    async fn paused_run_step_is_idempotent() {
        let invoker = ScriptedInvoker::new(vec![throttled()]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(2), 3).unwrap();

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        let first = serde_json::to_string(&state).unwrap();
        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        assert_eq!(serde_json::to_string(&state).unwrap(), first);
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test]
    async fn wait_keeps_the_run_paused() {
        let invoker = ScriptedInvoker::new(vec![throttled()]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(2), 3).unwrap();

        orch.run_step(&mut state).await.unwrap();
        orch.resume(&mut state, Decision::Wait).unwrap();
        assert!(state.pending_decision().is_some());
        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
    }

    #[tokio::test]
    async fn resume_without_pause_is_rejected() {
        let invoker = ScriptedInvoker::new(vec![]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(1), 3).unwrap();

        let err = orch.resume(&mut state, Decision::RetryFailed).unwrap_err();
        assert!(matches!(err, LabelscribeError::InvalidDecision(_)));
    }

    #[tokio::test]
    async fn fetch_failure_is_collected_at_drain_by_default() {
        let invoker = ScriptedInvoker::new(vec![]);
        let writer = MemoryWriter::default();
        let fetcher = StubFetcher {
            failing: HashSet::from(["https://img.example/1.jpg".to_string()]),
        };
        let orch = orchestrator(&invoker, fetcher, &writer);
        let mut state = RunState::initialize(urls(2), 3).unwrap();
        let job1 = state.jobs()[0].id.clone();

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Advanced);
        assert_eq!(state.job(&job1).unwrap().status, JobStatus::Failed);
        assert!(state.pending_decision().is_none());

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Advanced);
        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        assert_eq!(state.pending_decision().unwrap().failed, vec![job1.clone()]);
        assert_eq!(
            state.job(&job1).unwrap().last_error.as_ref().unwrap().kind,
            FailureKind::Network
        );
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_pauses_when_configured() {
        let invoker = ScriptedInvoker::new(vec![]);
        let writer = MemoryWriter::default();
        let fetcher = StubFetcher {
            failing: HashSet::from(["https://img.example/1.jpg".to_string()]),
        };
        let orch = orchestrator(&invoker, fetcher, &writer).with_policy(RunPolicy {
            pause_on_fetch_failure: true,
        });
        let mut state = RunState::initialize(urls(2), 3).unwrap();

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        assert_eq!(invoker.calls(), 0);
    }

    #[tokio::test]
    async fn writer_failure_is_storage_and_pauses() {
        let invoker = ScriptedInvoker::new(vec![]);
        let writer = MemoryWriter {
            broken: true,
            ..Default::default()
        };
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(1), 3).unwrap();

        assert_eq!(orch.run_step(&mut state).await.unwrap(), StepOutcome::Paused);
        let job = &state.jobs()[0];
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.last_error.as_ref().unwrap().kind, FailureKind::Storage);
        assert!(job.raw_response.is_some());
        assert_eq!(state.costs().snapshot().jobs, 0);
    }

    #[tokio::test]
    async fn run_cost_equals_sum_over_successful_jobs() {
        // The unparseable reply still reports usage, which must not reach the run totals.
        let invoker = ScriptedInvoker::new(vec![
            reply(FULL_REPLY),
            reply("I cannot read this label."),
            reply(FULL_REPLY),
        ]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let mut state = RunState::initialize(urls(3), 3).unwrap();

        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Paused);
        let job2 = &state.jobs()[1];
        assert_eq!(job2.last_error.as_ref().unwrap().kind, FailureKind::Parse);
        assert!(job2.cost.is_some());

        orch.resume(&mut state, Decision::RetryFailed).unwrap();
        assert_eq!(drive(&orch, &mut state).await, StepOutcome::Exhausted);

        let expected: f64 = state
            .jobs()
            .iter()
            .filter(|j| j.status == JobStatus::Success)
            .filter_map(|j| j.cost.as_ref())
            .map(CostInfo::total_cost)
            .sum();
        let totals = state.costs().snapshot();
        assert_eq!(totals.jobs, 3);
        assert_eq!(totals.input_tokens, 3000);
        assert!((totals.total_cost() - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn crash_after_begin_reloads_as_interrupted_failure() {
        let invoker = ScriptedInvoker::new(vec![]);
        let writer = MemoryWriter::default();
        let orch = orchestrator(&invoker, StubFetcher::default(), &writer);
        let state = RunState::initialize(urls(2), 3).unwrap();
        let mut cp = Checkpoint::new(
            "meta.llama3-2-90b-instruct-v1:0".into(),
            "herbarium.txt".into(),
            "country: country".into(),
            state,
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        let StepStart::Started(job) = orch.begin_step(&mut cp.state).unwrap() else {
            panic!("expected a started job");
        };
        cp.save(&path).unwrap();
        // The process dies here: finish_step never runs.
        drop(cp);

        let mut back = Checkpoint::load(&path).unwrap();
        let reloaded = back.state.job(&job.id).unwrap();
        assert_eq!(reloaded.status, JobStatus::Failed);
        assert_eq!(reloaded.attempts, 1);
        assert_eq!(reloaded.last_error.as_ref().unwrap().kind, FailureKind::Unknown);
        assert_eq!(orch.run_step(&mut back.state).await.unwrap(), StepOutcome::Paused);
        assert_eq!(invoker.calls(), 0);

        orch.resume(&mut back.state, Decision::RetryFailed).unwrap();
        assert_eq!(drive(&orch, &mut back.state).await, StepOutcome::Exhausted);
        assert_eq!(back.state.job(&job.id).unwrap().attempts, 2);
        assert_eq!(back.state.summary().success, 2);
    }

    #[tokio::test]
    async fn unknown_family_cannot_build_orchestrator() {
        let invoker = ScriptedInvoker::new(vec![]);
        let writer = MemoryWriter::default();
        let result = Orchestrator::new(
            spec("cohere.command-r-v1:0", false),
            prompt(),
            &invoker,
            StubFetcher::default(),
            &writer,
        );
        assert!(matches!(result, Err(LabelscribeError::Config(_))));
    }
}
