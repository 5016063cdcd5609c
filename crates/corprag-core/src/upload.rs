use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::RagBackend;
use crate::error::{Ignored, ServiceError};
use crate::session::Session;
use crate::state::{UploadState, UploadStatus};

/// Extensions the ingestion service knows how to read
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

/// A document ready to be sent for ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name(path), bytes))
    }
}

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn is_supported_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

enum Source {
    Loaded(UploadFile),
    Path(PathBuf),
}

/// Sends documents to the ingestion endpoint, one at a time.
#[derive(Clone)]
pub struct UploadCoordinator {
    session: Session,
    backend: Arc<dyn RagBackend>,
}

impl UploadCoordinator {
    pub fn new(session: Session, backend: Arc<dyn RagBackend>) -> Self {
        Self { session, backend }
    }

    /// Mark the session as uploading `file`. `None` means the user dismissed
    /// the picker.
    pub fn begin(&self, file: Option<UploadFile>) -> Result<PendingUpload, Ignored> {
        let file = file.ok_or(Ignored::NoFile)?;
        let name = file.name.clone();
        self.start(name, Source::Loaded(file))
    }

    /// Like [`begin`](Self::begin), reading the document from disk once the
    /// upload has started. An empty path counts as no file.
    pub fn begin_path(&self, path: Option<&Path>) -> Result<PendingUpload, Ignored> {
        let path = path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(Ignored::NoFile)?;
        self.start(file_name(path), Source::Path(path.to_path_buf()))
    }

    pub fn submit_file(
        &self,
        file: Option<UploadFile>,
    ) -> impl Future<Output = Result<UploadStatus, Ignored>> + Send + 'static {
        let pending = self.begin(file);
        async move { Ok(pending?.resolve().await) }
    }

    pub fn submit_path(
        &self,
        path: Option<&Path>,
    ) -> impl Future<Output = Result<UploadStatus, Ignored>> + Send + 'static {
        let pending = self.begin_path(path);
        async move { Ok(pending?.resolve().await) }
    }

    fn start(&self, name: String, source: Source) -> Result<PendingUpload, Ignored> {
        let started = self.session.try_mutate_upload(|u| {
            if u.status.is_in_flight() {
                return Err(Ignored::InFlight);
            }
            u.status = UploadStatus::Uploading;
            Ok(())
        });

        if let Err(reason) = started {
            debug!(%reason, file = %name, "upload ignored");
            return Err(reason);
        }

        debug!(file = %name, "upload started");
        Ok(PendingUpload {
            name,
            source,
            backend: self.backend.clone(),
            guard: UploadingGuard {
                session: Some(self.session.clone()),
            },
        })
    }
}

/// An upload that has been announced as `uploading` but not yet sent.
pub struct PendingUpload {
    name: String,
    source: Source,
    backend: Arc<dyn RagBackend>,
    guard: UploadingGuard,
}

impl PendingUpload {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transmit the document and record the outcome. Returns the final status.
    pub async fn resolve(self) -> UploadStatus {
        let PendingUpload {
            name,
            source,
            backend,
            guard,
        } = self;

        let outcome = match source {
            Source::Loaded(file) => backend.ingest(&file).await,
            Source::Path(path) => match UploadFile::read(&path).await {
                Ok(file) => backend.ingest(&file).await,
                Err(e) => Err(ServiceError::from(e)),
            },
        };

        let status = match outcome {
            Ok(()) => {
                info!(file = %name, "document ingested");
                UploadStatus::Ingested(name.clone())
            }
            Err(e) => {
                warn!(file = %name, error = %e, "upload failed");
                UploadStatus::Failed
            }
        };

        let recorded = status.clone();
        guard.finish(|u| {
            if let UploadStatus::Ingested(name) = &recorded {
                u.ingested.push(name.clone());
            }
            u.status = recorded;
        });
        status
    }
}

/// Moves the status to `failed` if the upload is dropped mid-flight.
struct UploadingGuard {
    session: Option<Session>,
}

impl UploadingGuard {
    fn finish(mut self, f: impl FnOnce(&mut UploadState)) {
        if let Some(session) = self.session.take() {
            session.mutate_upload(f);
        }
    }
}

impl Drop for UploadingGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("upload dropped before it resolved");
            session.mutate_upload(|u| u.status = UploadStatus::Failed);
        }
    }
}
