//! Durable persistence of transcriptions.
//!
//! Every write goes to a sibling temp file, is flushed to disk and then
//! renamed over the target, so a crash never leaves a half-written result
//! and writing the same job twice simply replaces the earlier output.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde_json::{Map, Value, json};

use crate::bedrock::RawResponse;
use crate::error::{LabelscribeError, WriteError};
use crate::state_machine::{JobId, JobStatus, RunState, TranscriptionFields};

/// Sink for successful transcriptions, keyed by job id.
pub trait ResultWriter {
    fn write(
        &self,
        job_id: &JobId,
        fields: &TranscriptionFields,
        raw: &RawResponse,
    ) -> Result<(), WriteError>;
}

/// Write `bytes` to `path` via temp file, fsync and rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)
}

/// Writes `<root>/transcriptions/<id>.json` and `<root>/raw/<id>-raw.json`.
#[derive(Debug, Clone)]
pub struct JsonDirWriter {
    root: PathBuf,
}

impl JsonDirWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn transcription_path(&self, job_id: &JobId) -> PathBuf {
        self.root.join("transcriptions").join(format!("{job_id}.json"))
    }

    pub fn raw_path(&self, job_id: &JobId) -> PathBuf {
        self.root.join("raw").join(format!("{job_id}-raw.json"))
    }
}

impl ResultWriter for JsonDirWriter {
    fn write(
        &self,
        job_id: &JobId,
        fields: &TranscriptionFields,
        raw: &RawResponse,
    ) -> Result<(), WriteError> {
        let wrap = |source: io::Error| WriteError {
            job_id: job_id.to_string(),
            source,
        };
        let fields_json = serde_json::to_vec_pretty(fields).map_err(|e| wrap(e.into()))?;
        let raw_json = serde_json::to_vec_pretty(raw).map_err(|e| wrap(e.into()))?;

        write_atomic(&self.raw_path(job_id), &raw_json).map_err(wrap)?;
        write_atomic(&self.transcription_path(job_id), &fields_json).map_err(wrap)?;
        tracing::debug!(job_id = %job_id, "transcription written");
        Ok(())
    }
}

/// Layout of the combined export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Txt,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
        }
    }
}

/// Write every successful transcription, in job order, to one file.
pub fn export(
    state: &RunState,
    format: OutputFormat,
    path: &Path,
) -> Result<usize, LabelscribeError> {
    let done: Vec<_> = state
        .jobs()
        .iter()
        .filter(|j| j.status == JobStatus::Success)
        .filter_map(|j| j.result.as_ref().map(|r| (j, r)))
        .collect();

    let contents = match format {
        OutputFormat::Json => {
            let records: Vec<Value> = done
                .iter()
                .map(|(job, fields)| {
                    let mut record = Map::new();
                    record.insert("image".into(), json!(job.id.as_str()));
                    record.insert("source_url".into(), json!(job.source_url));
                    for (name, value) in fields.iter() {
                        record.insert(name.to_string(), json!(value));
                    }
                    Value::Object(record)
                })
                .collect();
            serde_json::to_string_pretty(&records)?
        }
        OutputFormat::Txt => done
            .iter()
            .map(|(job, fields)| {
                let body: String = fields
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}\n"))
                    .collect();
                format!("== {} ({}) ==\n{body}\n", job.id, job.source_url)
            })
            .collect(),
    };

    write_atomic(path, contents.as_bytes())?;
    Ok(done.len())
}
