//! In-memory `MediaService` for testing without a backend

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use centriq_core::models::{
    ActivityPhoto, DownloadLink, GalleryScope, MediaPage, MediaRecord, SourceFile,
    UploadedMedia,
};
use centriq_core::{AppError, MediaService, ProgressFn};
use chrono::Utc;
use uuid::Uuid;

use super::media_record;

#[derive(Default)]
struct MockState {
    failing_uploads: HashSet<String>,
    failing_media: HashSet<Uuid>,
    failing_pages: HashSet<(GalleryScope, u32)>,
    pages: HashMap<(GalleryScope, u32), MediaPage>,
    page_delays: HashMap<(GalleryScope, u32), Duration>,
    upload_delay: Duration,
    progress_steps: Vec<u8>,
    uploads: Vec<SourceFile>,
    activity_uploads: Vec<(Uuid, SourceFile)>,
    favorite_calls: Vec<(Uuid, bool)>,
    deleted: Vec<Uuid>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Mock backend with per-filename and per-media failure rigging
pub struct MockMediaService {
    state: Mutex<MockState>,
}

impl Default for MockMediaService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                progress_steps: vec![25, 50, 75, 100],
                ..MockState::default()
            }),
        }
    }

    /// Uploads of this filename fail with a 500.
    pub fn fail_upload(&self, filename: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(filename.to_string());
    }

    /// Favorite updates and deletes of this id fail.
    pub fn fail_media(&self, media_id: Uuid) {
        self.state.lock().unwrap().failing_media.insert(media_id);
    }

    pub fn fail_page(&self, scope: GalleryScope, page: u32) {
        self.state
            .lock()
            .unwrap()
            .failing_pages
            .insert((scope, page));
    }

    pub fn set_page(&self, scope: GalleryScope, page: u32, media: MediaPage) {
        self.state.lock().unwrap().pages.insert((scope, page), media);
    }

    pub fn delay_page(&self, scope: GalleryScope, page: u32, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .page_delays
            .insert((scope, page), delay);
    }

    pub fn set_upload_delay(&self, delay: Duration) {
        self.state.lock().unwrap().upload_delay = delay;
    }

    /// Percentages reported through the progress callback of every upload.
    pub fn set_progress_steps(&self, steps: Vec<u8>) {
        self.state.lock().unwrap().progress_steps = steps;
    }

    pub fn uploads(&self) -> Vec<SourceFile> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    pub fn activity_uploads(&self) -> Vec<(Uuid, SourceFile)> {
        self.state.lock().unwrap().activity_uploads.clone()
    }

    pub fn favorite_calls(&self) -> Vec<(Uuid, bool)> {
        self.state.lock().unwrap().favorite_calls.clone()
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    async fn page(&self, scope: GalleryScope, page: u32) -> Result<MediaPage> {
        let delay = self.state.lock().unwrap().page_delays.get(&(scope, page)).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_pages.contains(&(scope, page)) {
            return Err(AppError::Api {
                status: 503,
                message: "Service unavailable".to_string(),
            }
            .into());
        }
        Ok(state
            .pages
            .get(&(scope, page))
            .cloned()
            .unwrap_or_else(MediaPage::empty))
    }

    fn known_record(&self, media_id: Uuid) -> Option<MediaRecord> {
        let state = self.state.lock().unwrap();
        state
            .pages
            .values()
            .flat_map(|page| page.items.iter())
            .find(|record| record.id == media_id)
            .cloned()
    }
}

#[async_trait]
impl MediaService for MockMediaService {
    async fn upload(
        &self,
        file: SourceFile,
        collection_id: Option<Uuid>,
        progress: ProgressFn,
    ) -> Result<UploadedMedia> {
        let (delay, steps) = {
            let mut state = self.state.lock().unwrap();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.uploads.push(file.clone());
            (state.upload_delay, state.progress_steps.clone())
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let total = file.size() as u64;
        for step in steps {
            progress(total * u64::from(step) / 100, total);
        }

        let failing = {
            let mut state = self.state.lock().unwrap();
            state.in_flight -= 1;
            state.failing_uploads.contains(&file.filename)
        };
        if failing {
            return Err(AppError::Api {
                status: 500,
                message: format!("storage rejected {}", file.filename),
            }
            .into());
        }

        let id = Uuid::new_v4();
        Ok(UploadedMedia {
            id,
            trip_id: collection_id,
            public_url: format!("https://storage.example.com/{}", file.filename),
            mime_type: file.mime_type.clone(),
            filename: file.filename.clone(),
            size_bytes: file.size() as i64,
            created_at: Utc::now(),
            is_favorite: false,
        })
    }

    async fn list_collection(
        &self,
        collection_id: Uuid,
        page: u32,
        _page_size: u32,
    ) -> Result<MediaPage> {
        self.page(GalleryScope::Collection(collection_id), page)
            .await
    }

    async fn list_unsorted(&self, page: u32, _page_size: u32) -> Result<MediaPage> {
        self.page(GalleryScope::Unsorted, page).await
    }

    async fn list_favorites(&self, page: u32, _page_size: u32) -> Result<MediaPage> {
        self.page(GalleryScope::Favorites, page).await
    }

    async fn set_favorite(&self, media_id: Uuid, is_favorite: bool) -> Result<MediaRecord> {
        let failing = {
            let mut state = self.state.lock().unwrap();
            state.favorite_calls.push((media_id, is_favorite));
            state.failing_media.contains(&media_id)
        };
        if failing {
            return Err(AppError::Api {
                status: 500,
                message: "favorite update failed".to_string(),
            }
            .into());
        }

        let mut record = self.known_record(media_id).unwrap_or_else(|| {
            let mut record = media_record(None);
            record.id = media_id;
            record
        });
        record.is_favorite = is_favorite;
        Ok(record)
    }

    async fn delete(&self, media_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_media.contains(&media_id) {
            return Err(AppError::Api {
                status: 403,
                message: "Not allowed".to_string(),
            }
            .into());
        }
        state.deleted.push(media_id);
        Ok(())
    }

    async fn download(&self, media_id: Uuid) -> Result<Bytes> {
        if self.state.lock().unwrap().failing_media.contains(&media_id) {
            return Err(AppError::Api {
                status: 404,
                message: "Media not found".to_string(),
            }
            .into());
        }
        Ok(Bytes::from(format!("bytes-of-{}", media_id)))
    }

    async fn collection_download_links(
        &self,
        collection_id: Uuid,
    ) -> Result<Vec<DownloadLink>> {
        let state = self.state.lock().unwrap();
        let scope = GalleryScope::Collection(collection_id);
        Ok(state
            .pages
            .iter()
            .filter(|((page_scope, _), _)| *page_scope == scope)
            .flat_map(|(_, page)| page.items.iter())
            .map(|record| DownloadLink {
                id: Some(record.id),
                filename: record.filename.clone().unwrap_or_default(),
                url: record.public_url.clone(),
            })
            .collect())
    }

    async fn upload_activity_photo(
        &self,
        activity_id: Uuid,
        file: SourceFile,
    ) -> Result<ActivityPhoto> {
        let image_url = format!(
            "https://storage.example.com/activities/{}/{}",
            activity_id, file.filename
        );
        self.state
            .lock()
            .unwrap()
            .activity_uploads
            .push((activity_id, file));
        Ok(ActivityPhoto { image_url })
    }
}
