pub mod collection;
pub mod media;
pub mod upload;

pub use collection::{normalize_join_code, Collection, NewCollection, ProfileUpdate, JOIN_CODE_LEN};
pub use media::{
    ActivityPhoto, DownloadLink, GalleryScope, MediaPage, MediaRecord, UploadedMedia,
};
pub use upload::{PreviewHandle, SourceFile, Transition, UploadId, UploadItem, UploadStatus};
