//! Centriq gallery
//!
//! Client-side state for the shared photo gallery:
//!
//! - [`UploadPipeline`]: batched uploads with per-item progress and isolated failures
//! - [`GalleryIndex`] / [`Gallery`]: paginated scopes guarded by generation counters,
//!   two-phase optimistic favorites, confirmed deletes
//! - [`ActivityPhotoUploader`]: single photo uploads for itinerary activities
//! - [`Collections`]: trip listing, creation, joining by code and deletion
//!
//! Media goes through [`centriq_core::MediaService`], trips through
//! [`centriq_core::CollectionService`].

pub mod collections;
pub mod gallery;
pub mod index;
pub mod itinerary;
pub mod upload;

#[cfg(test)]
pub mod test_helpers;

pub use collections::Collections;
pub use gallery::{BulkFavoritePolicy, DeleteReport, Gallery, LoadOutcome};
pub use index::{FavoriteMutation, FetchTicket, GalleryIndex, MutationPhase, PageState};
pub use itinerary::ActivityPhotoUploader;
pub use upload::{
    BatchOutcome, EnqueueReport, PreviewRegistry, UploadEvent, UploadFailure, UploadPipeline,
};
