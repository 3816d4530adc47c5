use thiserror::Error;

use crate::state_machine::JobStatus;

#[derive(Debug, Error)]
pub enum LabelscribeError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("No image URLs to process. The URL list is empty.")]
    EmptyInput,

    #[error("Job not found: {0}")]
    UnknownJob(String),

    #[error("Model not found in registry: {0}")]
    UnknownModel(String),

    #[error("Invalid transition for job {job}: {from} -> {to}")]
    InvalidTransition {
        job: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure to obtain the image bytes for a job.
#[derive(Debug, Error)]
#[error("failed to fetch {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

/// The model answered but nothing usable could be pulled out of the reply.
#[derive(Debug, Error)]
#[error("could not extract a transcription: {0}")]
pub struct ParseError(pub String);

/// Failure to persist a transcription.
#[derive(Debug, Error)]
#[error("failed to write result for {job_id}: {source}")]
pub struct WriteError {
    pub job_id: String,
    #[source]
    pub source: std::io::Error,
}
