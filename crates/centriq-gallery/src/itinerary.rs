//! Itinerary activity photos.

use std::sync::Arc;

use centriq_core::models::{ActivityPhoto, SourceFile};
use centriq_core::{AppError, MediaService};
use centriq_processing::{FormatConverter, HeicToJpegConverter, MediaValidator};
use uuid::Uuid;

/// Uploads the cover photo of an itinerary activity.
///
/// Files pass the gallery's accepted-media check, HEIC is converted to JPEG
/// (keeping the original on failure), and the result must be a format the
/// itinerary backend stores. Rejections happen before any network call.
pub struct ActivityPhotoUploader {
    service: Arc<dyn MediaService>,
    converter: Arc<dyn FormatConverter>,
    accepted: MediaValidator,
    storable: MediaValidator,
}

impl ActivityPhotoUploader {
    pub fn new(service: Arc<dyn MediaService>, jpeg_quality: u8) -> Self {
        Self::with_converter(service, Arc::new(HeicToJpegConverter::new(jpeg_quality)))
    }

    pub fn with_converter(
        service: Arc<dyn MediaService>,
        converter: Arc<dyn FormatConverter>,
    ) -> Self {
        Self {
            service,
            converter,
            accepted: MediaValidator::for_gallery(),
            storable: MediaValidator::for_activity_photos(),
        }
    }

    pub async fn upload(
        &self,
        activity_id: Uuid,
        file: SourceFile,
    ) -> Result<ActivityPhoto, AppError> {
        self.accepted.validate(&file)?;

        let file = if self.converter.needs_conversion(&file) {
            let converted = self.converter.convert(&file).await;
            match converted {
                Ok(converted) => converted,
                Err(e) => {
                    tracing::warn!(
                        activity_id = %activity_id,
                        filename = %file.filename,
                        error = %e,
                        "Conversion failed, keeping original file"
                    );
                    file
                }
            }
        } else {
            file
        };

        self.storable.validate(&file)?;

        let photo = self
            .service
            .upload_activity_photo(activity_id, file)
            .await
            .map_err(AppError::from_service)?;
        tracing::info!(activity_id = %activity_id, image_url = %photo.image_url, "Activity photo updated");
        Ok(photo)
    }
}
