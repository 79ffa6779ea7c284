//! Analysis submission flow.
//!
//! One [`UploadFlow`] per submission: select a file, validate it locally,
//! post it to the prediction API and cache the result in the session scope.
//! A failed submit leaves the selection in place so it can be retried.

use crate::client::AnalysisBackend;
use crate::errors::{ScopeError, ScopeResult};
use crate::models::{AnalysisPayload, SessionResultEnvelope};
use crate::storage::{store_envelope, StorageScope};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing selected; submit is disabled.
    Idle,
    /// A valid file is selected; submit is enabled.
    Ready,
    /// Request in flight; submit is disabled.
    Analyzing,
    /// Result cached in the session scope.
    Complete,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub envelope: SessionResultEnvelope,
    pub payload: AnalysisPayload,
}

#[derive(Debug)]
pub struct UploadFlow {
    max_bytes: u64,
    selected: Option<SelectedFile>,
    state: FlowState,
}

impl UploadFlow {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            selected: None,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        self.state == FlowState::Ready
    }

    /// Validate and select a file. A rejected file leaves the previous
    /// selection untouched.
    pub fn select(&mut self, path: &Path) -> ScopeResult<&SelectedFile> {
        let metadata =
            std::fs::metadata(path).map_err(|e| ScopeError::io(e, path.to_path_buf()))?;

        let size = metadata.len();
        if size > self.max_bytes {
            return Err(ScopeError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size / (1024 * 1024),
                limit_mb: self.max_bytes / (1024 * 1024),
            });
        }
        if size == 0 {
            return Err(ScopeError::EmptyFile(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::info!("Selected {} ({} bytes)", name, size);
        self.state = FlowState::Ready;
        Ok(&*self.selected.insert(SelectedFile {
            path: path.to_path_buf(),
            name,
            size,
        }))
    }

    /// Upload the selected file and cache the result. On error the flow
    /// returns to `Ready` so the caller can show the message and retry.
    pub async fn submit(
        &mut self,
        backend: &dyn AnalysisBackend,
        session: &dyn StorageScope,
    ) -> ScopeResult<SubmissionOutcome> {
        let file = match (&self.selected, self.state) {
            (Some(file), FlowState::Ready) => file.clone(),
            _ => return Err(ScopeError::NoFileSelected),
        };

        self.state = FlowState::Analyzing;
        match Self::upload(&file, backend, session).await {
            Ok(outcome) => {
                self.state = FlowState::Complete;
                Ok(outcome)
            }
            Err(e) => {
                log::warn!("Analysis of {} failed: {}", file.name, e);
                self.state = FlowState::Ready;
                Err(e)
            }
        }
    }

    async fn upload(
        file: &SelectedFile,
        backend: &dyn AnalysisBackend,
        session: &dyn StorageScope,
    ) -> ScopeResult<SubmissionOutcome> {
        let data = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ScopeError::io(e, file.path.clone()))?;

        let result = backend.predict(&file.name, data).await?;
        let envelope = SessionResultEnvelope::new(file.name.clone(), file.size, result);
        store_envelope(session, &envelope)?;

        let payload = envelope.payload();
        log::info!(
            "Analysis stored: {} ({:.1}%)",
            payload.detected.as_deref().unwrap_or("Unknown"),
            payload.confidence.unwrap_or(0.0)
        );

        Ok(SubmissionOutcome { envelope, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::MockBackend;
    use crate::storage::{load_envelope, MemoryScope};
    use serde_json::json;
    use std::io::Write;
    use std::sync::atomic::Ordering;
    use tempfile::NamedTempFile;

    fn sample_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_oversized_file_rejected() {
        let file = sample_file(&[0u8; 2048]);
        let mut flow = UploadFlow::new(1024);

        let err = flow.select(file.path()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(!flow.can_submit());
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = sample_file(&[]);
        let mut flow = UploadFlow::new(1024);
        assert!(matches!(flow.select(file.path()), Err(ScopeError::EmptyFile(_))));
    }

    #[tokio::test]
    async fn test_submit_without_selection_never_calls_backend() {
        let backend = MockBackend::default();
        let session = MemoryScope::new();
        let mut flow = UploadFlow::new(1024);

        let err = flow.submit(&backend, &session).await.unwrap_err();
        assert!(matches!(err, ScopeError::NoFileSelected));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_submit_caches_envelope() {
        let file = sample_file(b"\x7fELF firmware");
        let backend = MockBackend {
            prediction: Some(json!({
                "detected": "AES128",
                "category": "Symmetric Cipher",
                "confidence": 88.7,
                "protocols": [],
            })),
            ..Default::default()
        };
        let session = MemoryScope::new();
        let mut flow = UploadFlow::new(1024);
        flow.select(file.path()).unwrap();

        let outcome = flow.submit(&backend, &session).await.unwrap();
        assert_eq!(outcome.payload.detected.as_deref(), Some("AES128"));
        assert_eq!(flow.state(), FlowState::Complete);

        let cached = load_envelope(&session).unwrap();
        assert_eq!(cached.filesize, 13);
        assert_eq!(cached.architecture.as_deref(), Some("Auto-detected"));
        assert_eq!(cached.payload().confidence, Some(88.7));
    }

    #[tokio::test]
    async fn test_failed_submit_reenables_trigger() {
        let file = sample_file(b"MZ payload");
        let backend = MockBackend::default();
        let session = MemoryScope::new();
        let mut flow = UploadFlow::new(1024);
        flow.select(file.path()).unwrap();

        let err = flow.submit(&backend, &session).await.unwrap_err();
        assert!(err.is_transport());
        assert!(flow.can_submit());
        assert!(load_envelope(&session).is_none());
    }
}
