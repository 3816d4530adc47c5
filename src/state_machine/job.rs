use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bedrock::RawResponse;
use crate::cost::CostInfo;

/// Value written into a field the model did not confidently populate.
pub const UNSURE: &str = "unsure and check";

/// Stable identity of a job within a run, e.g. `0002_label.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Derive the id from the 1-based input position and the last path segment of the URL.
    pub fn derive(number: usize, url: &str) -> Self {
        let name = url
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let name = name.split(['?', '#']).next().unwrap_or_default();
        let legal: String = name
            .chars()
            .map(|c| match c {
                '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' => '_',
                c => c,
            })
            .collect();
        if legal.is_empty() {
            Self(format!("{number:04}"))
        } else {
            Self(format!("{number:04}_{legal}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Tracks the lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Skipped,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Skipped)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Classifies why a job failed, so the operator can choose between retrying and skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend is rate limiting or out of quota.
    Throttled,
    /// The model or inference profile cannot service this request.
    Unsupported,
    /// Credentials are missing, expired or lack access to the model.
    Auth,
    /// Connection, timeout or image download failure.
    Network,
    /// The model replied but no usable content could be extracted.
    Parse,
    /// The transcription could not be persisted.
    Storage,
    Unknown,
}

impl FailureKind {
    /// Operator-facing explanation attached to the failure message.
    pub fn hint(self) -> &'static str {
        match self {
            FailureKind::Throttled => "the service is rate limiting requests; retrying later usually works",
            FailureKind::Unsupported => {
                "the selected model or inference profile cannot service this request; \
                 choose a vision-capable model or configure an inference profile for it"
            }
            FailureKind::Auth => "access denied; check the API key and model access for this account",
            FailureKind::Network => "the request or image download did not complete",
            FailureKind::Parse => "the model reply contained no usable transcription",
            FailureKind::Storage => "the result could not be written to disk",
            FailureKind::Unknown => "an unexpected error occurred",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Throttled => write!(f, "throttled"),
            FailureKind::Unsupported => write!(f, "unsupported"),
            FailureKind::Auth => write!(f, "auth"),
            FailureKind::Network => write!(f, "network"),
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::Storage => write!(f, "storage"),
            FailureKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Structured error recorded on a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub kind: FailureKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.message, self.kind.hint())
    }
}

/// Parsed transcription, one string value per field in prompt order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranscriptionFields(Map<String, Value>);

impl TranscriptionFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), Value::String(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
    }

    /// Number of fields holding a value other than the unsure marker.
    pub fn confident_count(&self) -> usize {
        self.iter().filter(|(_, v)| *v != UNSURE).count()
    }
}

/// A single image-to-transcription unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub source_url: String,
    pub status: JobStatus,
    pub attempts: u32,
    pub last_error: Option<JobError>,
    pub result: Option<TranscriptionFields>,
    pub raw_response: Option<RawResponse>,
    pub cost: Option<CostInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(number: usize, source_url: String) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::derive(number, &source_url),
            source_url,
            status: JobStatus::Pending,
            attempts: 0,
            last_error: None,
            result: None,
            raw_response: None,
            cost: None,
            created_at: now,
            updated_at: now,
        }
    }
}
