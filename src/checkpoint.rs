//! Saved runs.
//!
//! A [`Checkpoint`] is the whole [`RunState`] plus what is needed to rebuild
//! the orchestrator on resume (model id and prompt).

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LabelscribeError;
use crate::state_machine::RunState;
use crate::writer::write_atomic;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub run_id: Uuid,
    pub model_id: String,
    pub prompt_name: String,
    pub prompt_text: String,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub state: RunState,
}

impl Checkpoint {
    pub fn new(model_id: String, prompt_name: String, prompt_text: String, state: RunState) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            model_id,
            prompt_name,
            prompt_text,
            created_at: now,
            saved_at: now,
            state,
        }
    }

    pub fn save(&mut self, path: &Path) -> Result<(), LabelscribeError> {
        self.saved_at = Utc::now();
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)?;
        tracing::debug!(run_id = %self.run_id, path = %path.display(), "checkpoint saved");
        Ok(())
    }

    /// Load a checkpoint. Jobs that were mid-invocation when the run stopped
    /// are marked failed and the run comes back paused on them.
    pub fn load(path: &Path) -> Result<Self, LabelscribeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LabelscribeError::Config(format!("cannot read checkpoint {}: {e}", path.display()))
        })?;
        let mut checkpoint: Checkpoint = serde_json::from_str(&contents)?;
        checkpoint.state.rebuild_index();

        let interrupted = checkpoint.state.recover_interrupted();
        if !interrupted.is_empty() {
            tracing::warn!(
                run_id = %checkpoint.run_id,
                count = interrupted.len(),
                "jobs were interrupted mid-invocation and are now failed"
            );
        }
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{FailureKind, JobStatus};

    fn checkpoint() -> Checkpoint {
        let state = RunState::initialize(["https://h/a.jpg", "https://h/b.jpg"], 3).unwrap();
        Checkpoint::new(
            "amazon.nova-lite-v1:0".into(),
            "herbarium.txt".into(),
            "country: country".into(),
            state,
        )
    }

    #[test]
    fn save_and_load_preserves_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut cp = checkpoint();
        cp.save(&path).unwrap();

        let back = Checkpoint::load(&path).unwrap();
        assert_eq!(back.run_id, cp.run_id);
        assert_eq!(back.model_id, "amazon.nova-lite-v1:0");
        assert_eq!(back.state.jobs().len(), 2);
        let first = back.state.jobs()[0].id.clone();
        assert!(back.state.job(&first).is_some());
        assert_eq!(back.state.next_pending().unwrap().id, first);
        assert!(back.state.pending_decision().is_none());
    }

    #[test]
    fn load_marks_interrupted_jobs_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut cp = checkpoint();
        let id = cp.state.jobs()[0].id.clone();
        cp.state.mark_in_progress(&id).unwrap();
        cp.save(&path).unwrap();

        let back = Checkpoint::load(&path).unwrap();
        let job = back.state.job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.last_error.as_ref().unwrap().kind, FailureKind::Unknown);
        assert_eq!(back.state.pending_decision().unwrap().failed, vec![id]);
    }

    #[test]
    fn missing_checkpoint_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checkpoint::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LabelscribeError::Config(_)));
    }
}
