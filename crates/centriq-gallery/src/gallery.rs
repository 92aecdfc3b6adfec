//! Gallery facade
//!
//! Couples a [`GalleryIndex`] with the [`MediaService`]. Every backend call is
//! awaited with the index unlocked; writes back into the index go through
//! fetch tickets or favorite mutations so late responses cannot clobber newer
//! state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use centriq_core::models::{DownloadLink, GalleryScope, MediaPage, MediaRecord};
use centriq_core::{AppError, MediaService};
use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::index::{GalleryIndex, PageState};

/// How `bulk_toggle_favorite` updates the local flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkFavoritePolicy {
    /// Only ids the backend confirmed are updated.
    #[default]
    ConfirmedOnly,
    /// Every id gets the target value before the backend answers, and keeps it
    /// even if its update fails. Callers should re-fetch after a failure.
    Optimistic,
}

/// Result of `load_page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum LoadOutcome {
    Applied { items: usize, total: u64, pages: u32 },
    /// A newer fetch for the same scope started while this one was in flight.
    Discarded,
}

#[derive(Debug, Default, Serialize)]
pub struct DeleteReport {
    pub deleted: Vec<Uuid>,
    pub failed: Vec<(Uuid, String)>,
}

pub struct Gallery {
    service: Arc<dyn MediaService>,
    index: Mutex<GalleryIndex>,
    default_page_size: u32,
    bulk_policy: BulkFavoritePolicy,
}

impl Gallery {
    pub fn new(service: Arc<dyn MediaService>, default_page_size: u32) -> Self {
        Self {
            service,
            index: Mutex::new(GalleryIndex::new()),
            default_page_size,
            bulk_policy: BulkFavoritePolicy::default(),
        }
    }

    pub fn with_bulk_policy(mut self, policy: BulkFavoritePolicy) -> Self {
        self.bulk_policy = policy;
        self
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    fn lock(&self) -> MutexGuard<'_, GalleryIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load one page of `scope` (pages start at 1), replacing whatever the
    /// scope held before.
    pub async fn load_page(
        &self,
        scope: GalleryScope,
        page: u32,
        page_size: Option<u32>,
    ) -> Result<LoadOutcome, AppError> {
        let page_size = page_size.unwrap_or(self.default_page_size);
        if page == 0 || page_size == 0 {
            return Err(AppError::InvalidInput(format!(
                "page and page size must be positive (page={}, page_size={})",
                page, page_size
            )));
        }

        let ticket = self.lock().begin_fetch(scope, page, page_size);
        tracing::debug!(scope = %scope, page, page_size, generation = ticket.generation(), "Loading page");

        let fetched: anyhow::Result<MediaPage> = match scope {
            GalleryScope::Collection(collection_id) => {
                self.service
                    .list_collection(collection_id, page, page_size)
                    .await
            }
            GalleryScope::Unsorted => self.service.list_unsorted(page, page_size).await,
            GalleryScope::Favorites => self.service.list_favorites(page, page_size).await,
        };

        let mut index = self.lock();
        match fetched {
            Ok(media) => {
                let outcome = LoadOutcome::Applied {
                    items: media.items.len(),
                    total: media.total,
                    pages: media.pages,
                };
                if index.complete_fetch(&ticket, Ok(media)) {
                    Ok(outcome)
                } else {
                    Ok(LoadOutcome::Discarded)
                }
            }
            Err(e) => {
                if index.complete_fetch(&ticket, Err(format!("{:#}", e))) {
                    tracing::warn!(scope = %scope, page, error = %e, "Page load failed");
                    Err(AppError::from_service(e))
                } else {
                    Ok(LoadOutcome::Discarded)
                }
            }
        }
    }

    /// Forget in-flight fetches for `scope`.
    pub fn leave(&self, scope: GalleryScope) {
        self.lock().invalidate(scope);
    }

    /// Flip a record's favorite flag optimistically.
    ///
    /// Returns the confirmed value, or `None` when the record is not loaded
    /// (nothing is sent). On backend failure the flag is reverted and the
    /// error returned.
    pub async fn toggle_favorite(&self, media_id: Uuid) -> Result<Option<bool>, AppError> {
        let mutation = {
            let mut index = self.lock();
            match index.is_favorite(media_id) {
                Some(current) => index.begin_favorite(media_id, !current),
                None => None,
            }
        };
        let Some(mut mutation) = mutation else {
            tracing::debug!(media_id = %media_id, "Favorite toggle ignored, record not loaded");
            return Ok(None);
        };

        match self.service.set_favorite(media_id, mutation.tentative).await {
            Ok(record) => {
                self.lock()
                    .confirm_favorite(&mut mutation, record.is_favorite)?;
                tracing::info!(media_id = %media_id, is_favorite = record.is_favorite, "Favorite updated");
                Ok(Some(record.is_favorite))
            }
            Err(e) => {
                self.lock().revert_favorite(&mut mutation)?;
                tracing::warn!(media_id = %media_id, error = %e, "Favorite update failed, reverted");
                Err(AppError::from_service(e))
            }
        }
    }

    /// Set the favorite flag of several records to `target`, one backend call
    /// per id, all in flight together.
    ///
    /// Returns the confirmed ids. Any failure yields `ReconciliationFailure`
    /// listing the rejected ids; what the local flags show afterwards depends
    /// on the [`BulkFavoritePolicy`].
    pub async fn bulk_toggle_favorite(
        &self,
        media_ids: &[Uuid],
        target: bool,
    ) -> Result<Vec<Uuid>, AppError> {
        if media_ids.is_empty() {
            return Ok(Vec::new());
        }

        if self.bulk_policy == BulkFavoritePolicy::Optimistic {
            let mut index = self.lock();
            for id in media_ids {
                index.force_favorite(*id, target);
            }
        }

        let results = join_all(
            media_ids
                .iter()
                .map(|id| async move { (*id, self.service.set_favorite(*id, target).await) }),
        )
        .await;

        let mut confirmed = Vec::new();
        let mut failed = Vec::new();
        {
            let mut index = self.lock();
            for (id, result) in results {
                match result {
                    Ok(record) => {
                        index.force_favorite(id, record.is_favorite);
                        confirmed.push(id);
                    }
                    Err(e) => {
                        tracing::warn!(media_id = %id, error = %e, "Bulk favorite update failed");
                        failed.push(id);
                    }
                }
            }
        }

        if failed.is_empty() {
            tracing::info!(count = confirmed.len(), target, "Bulk favorite update applied");
            Ok(confirmed)
        } else {
            Err(AppError::ReconciliationFailure {
                failed,
                attempted: media_ids.len(),
            })
        }
    }

    /// Delete a record; the index only changes once the backend confirms.
    pub async fn delete(&self, media_id: Uuid) -> Result<(), AppError> {
        self.service
            .delete(media_id)
            .await
            .map_err(AppError::from_service)?;
        self.lock().remove(media_id);
        tracing::info!(media_id = %media_id, "Media deleted");
        Ok(())
    }

    /// Delete several records concurrently. Failed ids stay in the index.
    pub async fn delete_many(&self, media_ids: &[Uuid]) -> DeleteReport {
        let results = join_all(
            media_ids
                .iter()
                .map(|id| async move { (*id, self.service.delete(*id).await) }),
        )
        .await;

        let mut report = DeleteReport::default();
        let mut index = self.lock();
        for (id, result) in results {
            match result {
                Ok(()) => {
                    index.remove(id);
                    report.deleted.push(id);
                }
                Err(e) => {
                    tracing::warn!(media_id = %id, error = %e, "Delete failed");
                    report.failed.push((id, format!("{:#}", e)));
                }
            }
        }
        report
    }

    pub async fn download(&self, media_id: Uuid) -> Result<Bytes, AppError> {
        self.service
            .download(media_id)
            .await
            .map_err(AppError::from_service)
    }

    pub async fn download_links(&self, collection_id: Uuid) -> Result<Vec<DownloadLink>, AppError> {
        self.service
            .collection_download_links(collection_id)
            .await
            .map_err(AppError::from_service)
    }

    /// Drop a deleted trip from the index.
    pub fn forget_collection(&self, collection_id: Uuid) -> usize {
        let dropped = self.lock().forget(GalleryScope::Collection(collection_id));
        tracing::debug!(trip_id = %collection_id, dropped, "Trip removed from gallery");
        dropped
    }

    /// Add upload results to the index.
    pub fn merge_uploaded(&self, records: Vec<MediaRecord>) -> usize {
        self.lock().merge_uploaded(records)
    }

    pub fn collection_items(&self, scope: GalleryScope) -> Vec<MediaRecord> {
        self.lock().items(scope).to_vec()
    }

    pub fn page_state(&self, scope: GalleryScope) -> PageState {
        self.lock().page_state(scope)
    }

    pub fn find(&self, media_id: Uuid) -> Option<MediaRecord> {
        self.lock().find(media_id).cloned()
    }

    pub fn is_favorite(&self, media_id: Uuid) -> Option<bool> {
        self.lock().is_favorite(media_id)
    }

    pub fn uploaders(&self) -> Vec<String> {
        self.lock().uploaders()
    }

    pub fn by_uploader(&self, name: &str) -> Vec<MediaRecord> {
        self.lock()
            .by_uploader(name)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn favorites(&self) -> Vec<MediaRecord> {
        self.lock().favorites().into_iter().cloned().collect()
    }
}
