mod job;
mod state;

pub use job::{FailureKind, Job, JobError, JobId, JobStatus, TranscriptionFields, UNSURE};
pub use state::{Decision, PendingDecision, RunState, RunSummary};
