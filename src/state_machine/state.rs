use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::job::{FailureKind, Job, JobError, JobId, JobStatus, TranscriptionFields};
use crate::bedrock::RawResponse;
use crate::cost::{CostAccumulator, CostInfo, CostTotals};
use crate::error::LabelscribeError;

/// Operator choice offered while a run is paused on failed jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    RetryFailed,
    SkipFailed,
    Abort,
    Wait,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::RetryFailed => write!(f, "RETRY_FAILED"),
            Decision::SkipFailed => write!(f, "SKIP_FAILED"),
            Decision::Abort => write!(f, "ABORT"),
            Decision::Wait => write!(f, "WAIT"),
        }
    }
}

impl FromStr for Decision {
    type Err = LabelscribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "retry" | "retry_failed" | "r" => Ok(Decision::RetryFailed),
            "skip" | "skip_failed" | "s" => Ok(Decision::SkipFailed),
            "abort" | "cancel" | "a" => Ok(Decision::Abort),
            "wait" | "pause" | "w" => Ok(Decision::Wait),
            _ => Err(LabelscribeError::InvalidDecision(s.trim().to_string())),
        }
    }
}

/// Pause record exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDecision {
    pub failed: Vec<JobId>,
}

/// Final (or current) tally of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub costs: CostTotals,
}

/// Per-run job table, work queue and pause flag.
///
/// Jobs are kept in input order; `to_process` holds the ids still waiting for
/// an invocation. All mutation goes through the `mark_*` and `apply_decision`
/// methods, which reject transitions the state machine does not allow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    jobs: Vec<Job>,
    #[serde(skip)]
    index: HashMap<JobId, usize>,
    to_process: VecDeque<JobId>,
    pending_decision: Option<PendingDecision>,
    max_attempts: u32,
    aborted: bool,
    costs: CostAccumulator,
}

impl RunState {
    /// Create one pending job per URL, in input order. Blank entries are ignored.
    pub fn initialize<I, S>(urls: I, max_attempts: u32) -> Result<Self, LabelscribeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let jobs: Vec<Job> = urls
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .enumerate()
            .map(|(i, url)| Job::new(i + 1, url))
            .collect();

        if jobs.is_empty() {
            return Err(LabelscribeError::EmptyInput);
        }

        let to_process = jobs.iter().map(|j| j.id.clone()).collect();
        let mut state = Self {
            jobs,
            index: HashMap::new(),
            to_process,
            pending_decision: None,
            max_attempts: max_attempts.max(1),
            aborted: false,
            costs: CostAccumulator::default(),
        };
        state.rebuild_index();
        Ok(state)
    }

    /// Restore the id lookup table after deserialization.
    pub(crate) fn rebuild_index(&mut self) {
        self.index = self
            .jobs
            .iter()
            .enumerate()
            .map(|(i, j)| (j.id.clone(), i))
            .collect();
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.index.get(id).map(|&i| &self.jobs[i])
    }

    fn job_mut(&mut self, id: &JobId) -> Result<&mut Job, LabelscribeError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.jobs[i]),
            None => Err(LabelscribeError::UnknownJob(id.to_string())),
        }
    }

    pub fn to_process(&self) -> impl Iterator<Item = &JobId> {
        self.to_process.iter()
    }

    /// Jobs that reached a terminal state.
    pub fn completed(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|j| j.status.is_terminal())
    }

    pub fn failed_ids(&self) -> Vec<JobId> {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Failed)
            .map(|j| j.id.clone())
            .collect()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn pending_decision(&self) -> Option<&PendingDecision> {
        self.pending_decision.as_ref()
    }

    pub(crate) fn set_pending_decision(&mut self) {
        self.pending_decision = Some(PendingDecision {
            failed: self.failed_ids(),
        });
    }

    pub(crate) fn clear_pending_decision(&mut self) {
        self.pending_decision = None;
    }

    pub fn costs(&self) -> &CostAccumulator {
        &self.costs
    }

    /// Earliest pending job still queued.
    pub fn next_pending(&self) -> Option<&Job> {
        self.to_process
            .iter()
            .filter_map(|id| self.job(id))
            .find(|j| j.status == JobStatus::Pending)
    }

    fn ensure(job: &Job, allowed: &[JobStatus], to: JobStatus) -> Result<(), LabelscribeError> {
        if allowed.contains(&job.status) {
            Ok(())
        } else {
            Err(LabelscribeError::InvalidTransition {
                job: job.id.to_string(),
                from: job.status,
                to,
            })
        }
    }

    /// `pending -> in_progress`. Dequeues the job and counts the attempt.
    pub fn mark_in_progress(&mut self, id: &JobId) -> Result<(), LabelscribeError> {
        let max_attempts = self.max_attempts;
        let job = self.job_mut(id)?;
        Self::ensure(job, &[JobStatus::Pending], JobStatus::InProgress)?;
        if job.attempts >= max_attempts {
            return Err(LabelscribeError::InvalidTransition {
                job: job.id.to_string(),
                from: job.status,
                to: JobStatus::InProgress,
            });
        }
        job.status = JobStatus::InProgress;
        job.attempts += 1;
        job.updated_at = Utc::now();
        self.to_process.retain(|queued| queued != id);
        Ok(())
    }

    /// `in_progress -> success`. The cost is added to the run totals.
    pub fn mark_success(
        &mut self,
        id: &JobId,
        result: TranscriptionFields,
        raw_response: RawResponse,
        cost: CostInfo,
    ) -> Result<(), LabelscribeError> {
        let job = self.job_mut(id)?;
        Self::ensure(job, &[JobStatus::InProgress], JobStatus::Success)?;
        job.status = JobStatus::Success;
        job.last_error = None;
        job.result = Some(result);
        job.raw_response = Some(raw_response);
        job.cost = Some(cost.clone());
        job.updated_at = Utc::now();
        self.costs.record(&cost);
        Ok(())
    }

    /// `in_progress -> failed`.
    pub fn mark_failed(
        &mut self,
        id: &JobId,
        error: JobError,
        raw_response: Option<RawResponse>,
        cost: Option<CostInfo>,
    ) -> Result<(), LabelscribeError> {
        let job = self.job_mut(id)?;
        Self::ensure(job, &[JobStatus::InProgress], JobStatus::Failed)?;
        job.status = JobStatus::Failed;
        job.last_error = Some(error);
        job.result = None;
        job.raw_response = raw_response;
        if cost.is_some() {
            job.cost = cost;
        }
        job.updated_at = Utc::now();
        Ok(())
    }

    /// Apply an operator decision to the queue. Does not touch the pause flag.
    pub fn apply_decision(&mut self, decision: Decision) -> Result<(), LabelscribeError> {
        match decision {
            Decision::RetryFailed => {
                let max_attempts = self.max_attempts;
                let mut retried = Vec::new();
                for job in self.jobs.iter_mut() {
                    if job.status == JobStatus::Failed && job.attempts < max_attempts {
                        job.status = JobStatus::Pending;
                        job.last_error = None;
                        job.updated_at = Utc::now();
                        retried.push(job.id.clone());
                    }
                }
                for id in retried.into_iter().rev() {
                    self.to_process.push_front(id);
                }
            }
            Decision::SkipFailed => {
                for job in self.jobs.iter_mut() {
                    if job.status == JobStatus::Failed {
                        job.status = JobStatus::Skipped;
                        job.updated_at = Utc::now();
                    }
                }
            }
            Decision::Abort => {
                self.to_process.clear();
                self.aborted = true;
            }
            Decision::Wait => {}
        }
        Ok(())
    }

    /// Interrupted jobs (a crash mid-call) become failed so they can be retried or skipped.
    pub(crate) fn recover_interrupted(&mut self) -> Vec<JobId> {
        let interrupted: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::InProgress)
            .map(|j| j.id.clone())
            .collect();
        for id in &interrupted {
            let error = JobError::new(
                FailureKind::Unknown,
                "interrupted before the invocation completed",
            );
            // Only in-progress ids are collected above, so this transition is legal.
            let _ = self.mark_failed(id, error, None, None);
        }
        if !interrupted.is_empty() && !self.aborted {
            self.set_pending_decision();
        }
        interrupted
    }

    pub fn summary(&self) -> RunSummary {
        let count = |status: JobStatus| self.jobs.iter().filter(|j| j.status == status).count();
        RunSummary {
            total: self.jobs.len(),
            success: count(JobStatus::Success),
            failed: count(JobStatus::Failed),
            skipped: count(JobStatus::Skipped),
            pending: count(JobStatus::Pending) + count(JobStatus::InProgress),
            costs: self.costs.snapshot(),
        }
    }
}
