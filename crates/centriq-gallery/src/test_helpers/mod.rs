//! Test helpers for gallery and pipeline unit tests
//!
//! [`MockMediaService`] and [`MockCollectionService`] stand in for the REST
//! backend; the fixtures below build sessions, files and records.

pub mod mock_collections;
pub mod mock_service;

pub use mock_collections::MockCollectionService;
pub use mock_service::MockMediaService;

use std::io::Cursor;

use centriq_core::models::{MediaPage, MediaRecord, SourceFile};
use centriq_core::{Session, UserIdentity};
use chrono::Utc;
use uuid::Uuid;

/// Authenticated session for the uploader "maya".
pub fn session() -> Session {
    Session::authenticated(
        "test-token",
        UserIdentity {
            id: None,
            name: "maya".to_string(),
            email: Some("maya@example.com".to_string()),
        },
    )
}

/// A 1000 byte file declared as JPEG.
pub fn jpeg(name: &str) -> SourceFile {
    SourceFile::new(name, "image/jpeg", vec![0xABu8; 1000])
}

/// A file declared as HEIC whose bytes no decoder understands.
pub fn heic_garbage(name: &str) -> SourceFile {
    SourceFile::new(name, "image/heic", b"ftypheic-not-really-an-image".to_vec())
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 6, image::Rgba([200, 40, 40, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn media_record(collection_id: Option<Uuid>) -> MediaRecord {
    let id = Uuid::new_v4();
    MediaRecord {
        id,
        collection_id,
        uploader_id: None,
        uploader: None,
        public_url: format!("https://storage.example.com/{}.jpg", id),
        mime_type: "image/jpeg".to_string(),
        created_at: Utc::now(),
        is_favorite: false,
        filename: Some(format!("{}.jpg", id)),
        size_bytes: Some(1000),
    }
}

pub fn uploaded_by(mut record: MediaRecord, uploader: &str) -> MediaRecord {
    record.uploader = Some(uploader.to_string());
    record
}

pub fn page_of(items: Vec<MediaRecord>, total: u64, pages: u32) -> MediaPage {
    MediaPage {
        items,
        total,
        pages,
    }
}
