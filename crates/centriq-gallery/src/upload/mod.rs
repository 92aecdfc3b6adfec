//! Batched upload queue.

pub mod pipeline;
pub mod preview;

pub use pipeline::{BatchOutcome, EnqueueReport, UploadEvent, UploadFailure, UploadPipeline};
pub use preview::PreviewRegistry;
