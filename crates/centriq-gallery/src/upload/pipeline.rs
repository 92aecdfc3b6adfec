//! Upload pipeline
//!
//! Files go through three steps:
//!
//! 1. [`UploadPipeline::enqueue`] filters unsupported files, enforces the queue
//!    capacity and appends `pending` items with fresh preview handles.
//! 2. [`UploadPipeline::start`] uploads every pending item with bounded
//!    concurrency. HEIC sources are converted first; a failed conversion falls
//!    back to the original bytes. Each item fails on its own without stopping
//!    its siblings, and the call resolves once every item is terminal.
//! 3. [`UploadPipeline::finish`] waits for the display delay and clears the
//!    finished items, releasing their previews.
//!
//! Queue state sits behind a `std::sync::Mutex` that is never held across an
//! await point.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use centriq_core::config::UploadConfig;
use centriq_core::models::{
    MediaRecord, SourceFile, Transition, UploadId, UploadItem, UploadStatus,
};
use centriq_core::{AppError, MediaService, ProgressFn, Session};
use centriq_processing::{FormatConverter, HeicToJpegConverter, MediaValidator};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::preview::PreviewRegistry;

/// Observable queue changes, delivered to every [`UploadPipeline::subscribe`] receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Queued { id: UploadId, filename: String },
    Started { id: UploadId },
    Progress { id: UploadId, percent: u8 },
    ConversionFallback { id: UploadId, reason: String },
    Completed { id: UploadId, media_id: Uuid },
    Failed { id: UploadId, detail: String },
    Removed { id: UploadId },
    Cleared { count: usize },
}

/// Result of one `enqueue` call.
#[derive(Debug, Default)]
pub struct EnqueueReport {
    /// Queued items, in the order the files were supplied.
    pub accepted: Vec<UploadId>,
    /// One `UnsupportedFormat` per skipped file, and at most one `QueueFull`.
    pub issues: Vec<AppError>,
}

impl EnqueueReport {
    /// Number of files turned away because the queue was at capacity.
    pub fn rejected_over_capacity(&self) -> usize {
        self.issues
            .iter()
            .map(|issue| match issue {
                AppError::QueueFull { rejected, .. } => *rejected,
                _ => 0,
            })
            .sum()
    }

    pub fn rejected_unsupported(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, AppError::UnsupportedFormat { .. }))
            .count()
    }
}

/// An item that ended in `error` during `start`.
#[derive(Debug)]
pub struct UploadFailure {
    pub id: UploadId,
    pub filename: String,
    /// Always `AppError::TransferFailure`.
    pub error: AppError,
}

/// Result of one `start` call.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records of completed items, in enqueue order.
    pub records: Vec<MediaRecord>,
    pub failures: Vec<UploadFailure>,
}

impl BatchOutcome {
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempted() == 0
    }
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    items: Vec<UploadItem>,
    previews: PreviewRegistry,
    subscribers: Vec<mpsc::UnboundedSender<UploadEvent>>,
}

impl QueueState {
    fn item_mut(&mut self, id: UploadId) -> Option<&mut UploadItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn emit(&mut self, event: UploadEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn lock_state(state: &Mutex<QueueState>) -> MutexGuard<'_, QueueState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (sent.min(total) * 100 / total) as u8
}

/// Batched upload queue with per-item progress.
pub struct UploadPipeline {
    service: Arc<dyn MediaService>,
    converter: Arc<dyn FormatConverter>,
    validator: MediaValidator,
    config: UploadConfig,
    state: Arc<Mutex<QueueState>>,
}

impl UploadPipeline {
    /// Pipeline converting HEIC files with the configured JPEG quality.
    pub fn new(service: Arc<dyn MediaService>, config: UploadConfig) -> Self {
        let converter = Arc::new(HeicToJpegConverter::new(config.jpeg_quality));
        Self::with_converter(service, converter, config)
    }

    pub fn with_converter(
        service: Arc<dyn MediaService>,
        converter: Arc<dyn FormatConverter>,
        config: UploadConfig,
    ) -> Self {
        Self {
            service,
            converter,
            validator: MediaValidator::for_gallery(),
            config,
            state: Arc::new(Mutex::new(QueueState::default())),
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        lock_state(&self.state)
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<UploadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Queue files for upload to `collection_id` (`None` means unsorted).
    ///
    /// Unsupported files and files beyond the capacity are reported in the
    /// returned [`EnqueueReport`] without aborting the rest of the batch.
    /// Only an empty selection is an error.
    pub fn enqueue(
        &self,
        files: Vec<SourceFile>,
        collection_id: Option<Uuid>,
    ) -> Result<EnqueueReport, AppError> {
        if files.is_empty() {
            return Err(AppError::InvalidInput("No files selected".to_string()));
        }

        let capacity = self.config.queue_cap;
        let mut report = EnqueueReport::default();
        let mut over_capacity = 0usize;

        let mut state = self.lock();
        let mut active = state.items.iter().filter(|item| item.is_active()).count();

        for file in files {
            if let Err(e) = self.validator.validate(&file) {
                report.issues.push(e);
                continue;
            }
            if active >= capacity {
                over_capacity += 1;
                continue;
            }

            state.next_id += 1;
            let id = UploadId(state.next_id);
            let preview = state.previews.mint(file.data.clone());
            let filename = file.filename.clone();
            state
                .items
                .push(UploadItem::new(id, file, collection_id, preview));
            state.emit(UploadEvent::Queued { id, filename });

            report.accepted.push(id);
            active += 1;
        }

        if over_capacity > 0 {
            tracing::warn!(
                rejected = over_capacity,
                capacity,
                "Upload queue full, files rejected"
            );
            report.issues.push(AppError::QueueFull {
                rejected: over_capacity,
                capacity,
            });
        }

        tracing::info!(
            accepted = report.accepted.len(),
            skipped = report.rejected_unsupported(),
            collection_id = ?collection_id,
            "Files queued for upload"
        );

        Ok(report)
    }

    /// Upload every pending item and wait until all of them are terminal.
    ///
    /// An empty queue is a no-op. Without an uploader identity the call fails
    /// with `NotAuthenticated` before any network activity, leaving the queue
    /// untouched. Completed items are never uploaded again.
    pub async fn start(&self, session: &Session) -> Result<BatchOutcome, AppError> {
        let pending: Vec<UploadId> = self
            .lock()
            .items
            .iter()
            .filter(|item| item.status() == &UploadStatus::Pending)
            .map(|item| item.id)
            .collect();

        if pending.is_empty() {
            tracing::debug!("No pending uploads");
            return Ok(BatchOutcome::default());
        }

        let uploader = session
            .uploader_name()
            .ok_or_else(|| {
                AppError::NotAuthenticated("no uploader identity in session".to_string())
            })?
            .to_string();

        let limit = match self.config.max_concurrent_uploads {
            0 => pending.len(),
            n => n.min(pending.len()),
        };

        tracing::info!(
            items = pending.len(),
            concurrency = limit,
            uploader = %uploader,
            "Starting upload batch"
        );

        let mut settled: Vec<(usize, Option<Result<MediaRecord, UploadFailure>>)> =
            stream::iter(pending.into_iter().enumerate())
                .map(|(ordinal, id)| {
                    let uploader = uploader.as_str();
                    async move { (ordinal, self.run_item(id, uploader).await) }
                })
                .buffer_unordered(limit)
                .collect()
                .await;
        settled.sort_by_key(|(ordinal, _)| *ordinal);

        let mut outcome = BatchOutcome::default();
        for (_, result) in settled {
            match result {
                Some(Ok(record)) => outcome.records.push(record),
                Some(Err(failure)) => outcome.failures.push(failure),
                None => {}
            }
        }

        tracing::info!(
            completed = outcome.records.len(),
            failed = outcome.failures.len(),
            "Upload batch finished"
        );

        Ok(outcome)
    }

    /// Wait for the display delay, then clear finished items.
    pub async fn finish(&self) -> usize {
        tokio::time::sleep(self.config.clear_delay).await;
        self.clear_finished()
    }

    /// Drop every completed or failed item and release its preview.
    pub fn clear_finished(&self) -> usize {
        let mut state = self.lock();
        let (finished, kept): (Vec<UploadItem>, Vec<UploadItem>) = std::mem::take(&mut state.items)
            .into_iter()
            .partition(|item| item.status().is_terminal());
        state.items = kept;

        for item in &finished {
            state.previews.revoke(item.preview);
        }

        let count = finished.len();
        if count > 0 {
            state.emit(UploadEvent::Cleared { count });
        }
        count
    }

    /// Remove a `pending` or `error` item and release its preview.
    pub fn remove(&self, id: UploadId) -> Result<(), AppError> {
        let mut state = self.lock();
        let position = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| AppError::NotFound(format!("{} is not queued", id)))?;

        match state.items[position].status() {
            UploadStatus::Pending | UploadStatus::Error { .. } => {}
            other => {
                return Err(AppError::InvalidState(format!(
                    "cannot remove {} while {}",
                    id,
                    other.name()
                )))
            }
        }

        let item = state.items.remove(position);
        state.previews.revoke(item.preview);
        state.emit(UploadEvent::Removed { id });
        tracing::debug!(upload_id = %id, filename = %item.source.filename, "Removed from queue");
        Ok(())
    }

    /// Copy of the queue, in enqueue order.
    pub fn snapshot(&self) -> Vec<UploadItem> {
        self.lock().items.clone()
    }

    pub fn item(&self, id: UploadId) -> Option<UploadItem> {
        self.lock().items.iter().find(|item| item.id == id).cloned()
    }

    /// Preview bytes of a queued item.
    pub fn preview(&self, id: UploadId) -> Option<Bytes> {
        let state = self.lock();
        let handle = state.items.iter().find(|item| item.id == id)?.preview;
        state.previews.resolve(handle)
    }

    pub fn live_previews(&self) -> usize {
        self.lock().previews.live_count()
    }

    /// Run one item to a terminal status. Returns `None` when the item is no
    /// longer pending (removed before its slot came up).
    async fn run_item(
        &self,
        id: UploadId,
        uploader: &str,
    ) -> Option<Result<MediaRecord, UploadFailure>> {
        let (source, collection_id) = {
            let mut state = self.lock();
            let item = state.item_mut(id)?;
            item.apply(Transition::Start).ok()?;
            let claimed = (item.source.clone(), item.collection_id);
            state.emit(UploadEvent::Started { id });
            claimed
        };

        let filename = source.filename.clone();
        let file = self.prepare(id, source).await;
        let progress = self.progress_callback(id);

        match self.service.upload(file, collection_id, progress).await {
            Ok(uploaded) => {
                let media_id = uploaded.id;
                let record = MediaRecord::from_upload(uploaded, uploader);
                self.settle(
                    id,
                    Transition::Complete { media_id },
                    UploadEvent::Completed { id, media_id },
                );
                tracing::info!(
                    upload_id = %id,
                    media_id = %media_id,
                    filename = %filename,
                    "Upload completed"
                );
                Some(Ok(record))
            }
            Err(e) => {
                let detail = format!("{:#}", e);
                tracing::error!(
                    upload_id = %id,
                    filename = %filename,
                    error = %detail,
                    "Upload failed"
                );
                self.settle(
                    id,
                    Transition::Fail {
                        detail: detail.clone(),
                    },
                    UploadEvent::Failed {
                        id,
                        detail: detail.clone(),
                    },
                );
                Some(Err(UploadFailure {
                    id,
                    filename: filename.clone(),
                    error: AppError::TransferFailure {
                        filename,
                        reason: detail,
                    },
                }))
            }
        }
    }

    /// Convert the source if needed, falling back to the original on failure.
    async fn prepare(&self, id: UploadId, source: SourceFile) -> SourceFile {
        if !self.converter.needs_conversion(&source) {
            return source;
        }

        let converted = self.converter.convert(&source).await;
        match converted {
            Ok(converted) => converted,
            Err(e) => {
                tracing::warn!(
                    upload_id = %id,
                    filename = %source.filename,
                    error = %e,
                    "Conversion failed, uploading original file"
                );
                self.lock().emit(UploadEvent::ConversionFallback {
                    id,
                    reason: e.to_string(),
                });
                source
            }
        }
    }

    fn progress_callback(&self, id: UploadId) -> ProgressFn {
        let state = Arc::clone(&self.state);
        Arc::new(move |sent, total| {
            let mut state = lock_state(&state);
            let advanced = state.item_mut(id).and_then(|item| {
                let before = item.progress();
                item.apply(Transition::Progress(percent_of(sent, total)))
                    .ok()
                    .filter(|_| item.progress() > before)
                    .map(|_| item.progress())
            });
            if let Some(percent) = advanced {
                state.emit(UploadEvent::Progress { id, percent });
            }
        })
    }

    fn settle(&self, id: UploadId, transition: Transition, event: UploadEvent) {
        let mut state = self.lock();
        let applied = match state.item_mut(id) {
            Some(item) => item.apply(transition),
            None => Err(AppError::NotFound(format!("{} left the queue", id))),
        };
        match applied {
            Ok(()) => state.emit(event),
            Err(e) => tracing::warn!(upload_id = %id, error = %e, "Dropped upload transition"),
        }
    }
}
