use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

/// Backend-confirmed descriptor of a stored asset.
///
/// Only ever built from a backend response; the client never mints a media id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: Uuid,
    /// Owning trip; `None` means the asset is unsorted.
    #[serde(rename = "trip_id", default)]
    pub collection_id: Option<Uuid>,
    #[serde(default)]
    pub uploader_id: Option<Uuid>,
    /// Display name of the uploader. Listing endpoints do not return it, so it
    /// is only known for records produced by this client's own uploads.
    #[serde(rename = "uploader_name", default)]
    pub uploader: Option<String>,
    pub public_url: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<i64>,
}

impl MediaRecord {
    /// Build a record from an upload response merged with the locally known uploader name.
    pub fn from_upload(uploaded: UploadedMedia, uploader: &str) -> Self {
        Self {
            id: uploaded.id,
            collection_id: uploaded.trip_id,
            uploader_id: None,
            uploader: Some(uploader.to_string()),
            public_url: uploaded.public_url,
            mime_type: uploaded.mime_type,
            created_at: uploaded.created_at,
            is_favorite: uploaded.is_favorite,
            filename: Some(uploaded.filename),
            size_bytes: Some(uploaded.size_bytes),
        }
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.to_lowercase().starts_with("video/")
    }

    /// Scope this record belongs to in the gallery index.
    pub fn scope(&self) -> GalleryScope {
        GalleryScope::for_collection(self.collection_id)
    }
}

/// Response of `POST /media/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub id: Uuid,
    #[serde(default)]
    pub trip_id: Option<Uuid>,
    pub public_url: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    pub filename: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
}

/// One page of media as returned by the listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPage {
    pub items: Vec<MediaRecord>,
    pub total: u64,
    pub pages: u32,
}

impl MediaPage {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            pages: 0,
        }
    }
}

/// Signed download link for one asset of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub id: Option<Uuid>,
    pub filename: String,
    pub url: String,
}

/// Response of the itinerary activity photo upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPhoto {
    pub image_url: String,
}

/// A view of the gallery whose contents are fetched page by page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum GalleryScope {
    Collection(Uuid),
    Unsorted,
    Favorites,
}

impl GalleryScope {
    pub fn for_collection(collection_id: Option<Uuid>) -> Self {
        match collection_id {
            Some(id) => GalleryScope::Collection(id),
            None => GalleryScope::Unsorted,
        }
    }
}

impl std::fmt::Display for GalleryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GalleryScope::Collection(id) => write!(f, "trip:{}", id),
            GalleryScope::Unsorted => write!(f, "unsorted"),
            GalleryScope::Favorites => write!(f, "favorites"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_record_from_backend_listing() {
        let json = serde_json::json!({
            "id": "6f1c1b9e-8f0e-4b1a-9a53-3c6d8c1f0a11",
            "trip_id": null,
            "uploader_id": "0b8f6e4a-2f7d-4c4e-9f44-6d1e0f7c9a22",
            "public_url": "https://storage.example.com/a.jpg",
            "media_type": "image",
            "is_favorite": true,
            "created_at": "2025-12-27T10:00:00Z"
        });

        let record: MediaRecord = serde_json::from_value(json).unwrap();
        assert!(record.collection_id.is_none());
        assert_eq!(record.scope(), GalleryScope::Unsorted);
        assert_eq!(record.mime_type, "image/jpeg");
        assert!(record.is_favorite);
        assert!(record.uploader.is_none());
    }

    #[test]
    fn test_media_record_from_upload_merges_uploader() {
        let trip = Uuid::new_v4();
        let uploaded = UploadedMedia {
            id: Uuid::new_v4(),
            trip_id: Some(trip),
            public_url: "https://storage.example.com/clip.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            filename: "clip.mp4".to_string(),
            size_bytes: 2048,
            created_at: Utc::now(),
            is_favorite: false,
        };

        let record = MediaRecord::from_upload(uploaded.clone(), "maya");
        assert_eq!(record.id, uploaded.id);
        assert_eq!(record.uploader.as_deref(), Some("maya"));
        assert_eq!(record.scope(), GalleryScope::Collection(trip));
        assert_eq!(record.size_bytes, Some(2048));
        assert!(record.is_video());
    }

    #[test]
    fn test_gallery_scope_display() {
        assert_eq!(GalleryScope::Unsorted.to_string(), "unsorted");
        assert_eq!(GalleryScope::Favorites.to_string(), "favorites");
    }
}
