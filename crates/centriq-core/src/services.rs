//! Collaborator traits for the REST backend.
//!
//! The upload pipeline and gallery only depend on [`MediaService`], trip
//! management on [`CollectionService`]; the HTTP client in
//! `centriq-api-client` implements both, tests use in-memory mocks.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::models::{
    ActivityPhoto, Collection, DownloadLink, MediaPage, MediaRecord, NewCollection, SourceFile,
    UploadedMedia,
};

/// Progress callback invoked with `(bytes_sent, total_bytes)` while an upload body streams.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Media operations offered by the backend.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Persist one asset, optionally attached to a trip.
    async fn upload(
        &self,
        file: SourceFile,
        collection_id: Option<Uuid>,
        progress: ProgressFn,
    ) -> anyhow::Result<UploadedMedia>;

    /// One page of a trip's media.
    async fn list_collection(
        &self,
        collection_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> anyhow::Result<MediaPage>;

    /// One page of media uploaded without a trip.
    async fn list_unsorted(&self, page: u32, page_size: u32) -> anyhow::Result<MediaPage>;

    /// One page of the current user's favorites, filtered server-side.
    async fn list_favorites(&self, page: u32, page_size: u32) -> anyhow::Result<MediaPage>;

    /// Set the favorite flag and return the updated record.
    async fn set_favorite(&self, media_id: Uuid, is_favorite: bool) -> anyhow::Result<MediaRecord>;

    async fn delete(&self, media_id: Uuid) -> anyhow::Result<()>;

    /// Raw bytes of one asset.
    async fn download(&self, media_id: Uuid) -> anyhow::Result<Bytes>;

    /// Download links for every asset of a trip.
    async fn collection_download_links(
        &self,
        collection_id: Uuid,
    ) -> anyhow::Result<Vec<DownloadLink>>;

    /// Replace the photo of an itinerary activity.
    async fn upload_activity_photo(
        &self,
        activity_id: Uuid,
        file: SourceFile,
    ) -> anyhow::Result<ActivityPhoto>;
}

/// Trip management offered by the backend.
#[async_trait]
pub trait CollectionService: Send + Sync {
    /// Trips the current user is a member of.
    async fn list_collections(&self) -> anyhow::Result<Vec<Collection>>;

    /// Create a trip; the creator becomes its admin.
    async fn create_collection(&self, collection: &NewCollection) -> anyhow::Result<Collection>;

    /// Join a trip by its code. Joining twice returns the same trip.
    async fn join_collection(&self, join_code: &str) -> anyhow::Result<Collection>;

    async fn collection(&self, collection_id: Uuid) -> anyhow::Result<Collection>;

    /// Delete a trip. Only its creator may do this.
    async fn delete_collection(&self, collection_id: Uuid) -> anyhow::Result<()>;
}
