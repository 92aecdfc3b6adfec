use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// Raw bytes of a user-selected file with its declared MIME type and name.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a local file, guessing its MIME type from the extension.
    ///
    /// Unknown extensions get `application/octet-stream`, which the upload
    /// predicate later rejects unless the name ends in `.heic`.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        if path
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(AppError::InvalidInput(format!(
                "Invalid path: {}",
                path.display()
            )));
        }

        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid filename: {}", path.display())))?
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self::new(filename, mime_type, data))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether the name ends in `.{ext}`, ignoring case. A bare `.heic` counts.
    pub fn has_extension(&self, ext: &str) -> bool {
        self.filename
            .to_lowercase()
            .ends_with(&format!(".{}", ext.to_lowercase()))
    }
}

/// Locally minted identifier of a queued upload, unique per pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UploadId(pub u64);

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upload-{}", self.0)
    }
}

/// Revocable reference to an item's source bytes, used only for previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PreviewHandle(pub u64);

/// Lifecycle of a queued upload: `pending -> uploading -> {completed | error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed { media_id: Uuid },
    Error { detail: String },
}

impl UploadStatus {
    pub fn name(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Completed { .. } => "completed",
            UploadStatus::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Completed { .. } | UploadStatus::Error { .. }
        )
    }
}

/// Input to [`UploadItem::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Start,
    Progress(u8),
    Complete { media_id: Uuid },
    Fail { detail: String },
}

/// One user-selected file in flight.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: UploadId,
    pub source: SourceFile,
    pub collection_id: Option<Uuid>,
    pub preview: PreviewHandle,
    progress: u8,
    status: UploadStatus,
}

impl UploadItem {
    pub fn new(
        id: UploadId,
        source: SourceFile,
        collection_id: Option<Uuid>,
        preview: PreviewHandle,
    ) -> Self {
        Self {
            id,
            source,
            collection_id,
            preview,
            progress: 0,
            status: UploadStatus::Pending,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status(&self) -> &UploadStatus {
        &self.status
    }

    pub fn error_detail(&self) -> Option<&str> {
        match &self.status {
            UploadStatus::Error { detail } => Some(detail),
            _ => None,
        }
    }

    /// Counts against the queue capacity (pending or uploading).
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Apply a state transition.
    ///
    /// Progress is clamped to 100 and never decreases; stale lower values are
    /// ignored. Any transition out of a terminal state is rejected.
    pub fn apply(&mut self, transition: Transition) -> Result<(), AppError> {
        match (self.status.clone(), transition) {
            (UploadStatus::Pending, Transition::Start) => {
                self.status = UploadStatus::Uploading;
                self.progress = 0;
            }
            (UploadStatus::Uploading, Transition::Progress(percent)) => {
                self.progress = self.progress.max(percent.min(100));
            }
            (UploadStatus::Uploading, Transition::Complete { media_id }) => {
                self.status = UploadStatus::Completed { media_id };
                self.progress = 100;
            }
            (UploadStatus::Uploading, Transition::Fail { detail }) => {
                self.status = UploadStatus::Error { detail };
            }
            (status, transition) => {
                return Err(AppError::InvalidState(format!(
                    "invalid upload transition for {}: {} -> {:?}",
                    self.id,
                    status.name(),
                    transition
                )));
            }
        }
        Ok(())
    }
}
