//! Media endpoints: the [`MediaService`] implementation for [`ApiClient`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use centriq_core::models::{
    ActivityPhoto, DownloadLink, MediaPage, MediaRecord, SourceFile, UploadedMedia,
};
use centriq_core::{MediaService, ProgressFn};
use uuid::Uuid;

use crate::{progress_part, ApiClient};

fn page_query(page: u32, page_size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.to_string()),
        ("page_size", page_size.to_string()),
    ]
}

#[async_trait]
impl MediaService for ApiClient {
    async fn upload(
        &self,
        file: SourceFile,
        collection_id: Option<Uuid>,
        progress: ProgressFn,
    ) -> Result<UploadedMedia> {
        let part = progress_part(file.data, &file.filename, &file.mime_type, progress)?;

        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(trip_id) = collection_id {
            form = form.text("trip_id", trip_id.to_string());
        }

        let uploaded: UploadedMedia = self
            .post_multipart("/media/upload", form)
            .await
            .with_context(|| format!("Failed to upload {}", file.filename))?;

        tracing::debug!(
            media_id = %uploaded.id,
            filename = %uploaded.filename,
            size_bytes = uploaded.size_bytes,
            "Upload stored by backend"
        );
        Ok(uploaded)
    }

    async fn list_collection(
        &self,
        collection_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<MediaPage> {
        self.get(
            &format!("/media/trip/{}", collection_id),
            &page_query(page, page_size),
        )
        .await
    }

    async fn list_unsorted(&self, page: u32, page_size: u32) -> Result<MediaPage> {
        self.get("/media/unsorted", &page_query(page, page_size))
            .await
    }

    async fn list_favorites(&self, page: u32, page_size: u32) -> Result<MediaPage> {
        self.get("/media/favorites", &page_query(page, page_size))
            .await
    }

    async fn set_favorite(&self, media_id: Uuid, is_favorite: bool) -> Result<MediaRecord> {
        self.patch_json(
            &format!("/media/{}", media_id),
            &serde_json::json!({ "is_favorite": is_favorite }),
        )
        .await
    }

    async fn delete(&self, media_id: Uuid) -> Result<()> {
        ApiClient::delete(self, &format!("/media/{}", media_id)).await
    }

    async fn download(&self, media_id: Uuid) -> Result<Bytes> {
        let query: Vec<(&str, String)> = match self.token() {
            Some(token) => vec![("token", token.to_string())],
            None => Vec::new(),
        };
        self.get_bytes(&format!("/media/{}/download", media_id), &query)
            .await
    }

    async fn collection_download_links(&self, collection_id: Uuid) -> Result<Vec<DownloadLink>> {
        self.get(&format!("/media/trip/{}/download-all", collection_id), &[])
            .await
    }

    async fn upload_activity_photo(
        &self,
        activity_id: Uuid,
        file: SourceFile,
    ) -> Result<ActivityPhoto> {
        let part = reqwest::multipart::Part::bytes(file.data.to_vec())
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type)
            .context("Invalid MIME type for upload")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        self.post_multipart(
            &format!("/itinerary/activities/{}/upload-photo", activity_id),
            form,
        )
        .await
    }
}
