use centriq_core::models::SourceFile;
use centriq_core::AppError;

/// True when the file is declared or named as HEIC.
pub fn is_heic(file: &SourceFile) -> bool {
    file.mime_type.eq_ignore_ascii_case("image/heic")
        || file.filename.to_lowercase().ends_with(".heic")
}

/// Media file validator
///
/// A file is accepted when its MIME type starts with one of the allowed
/// prefixes, equals one of the allowed content types, or its extension is in
/// the allowed list. Comparisons are case-insensitive.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    allowed_prefixes: Vec<String>,
    allowed_content_types: Vec<String>,
    allowed_extensions: Vec<String>,
}

impl MediaValidator {
    pub fn new(
        allowed_prefixes: Vec<String>,
        allowed_content_types: Vec<String>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            allowed_prefixes,
            allowed_content_types,
            allowed_extensions,
        }
    }

    /// Gallery uploads: any image or video, plus `.heic` files whatever their declared type.
    pub fn for_gallery() -> Self {
        Self::new(
            vec!["image/".to_string(), "video/".to_string()],
            Vec::new(),
            vec!["heic".to_string()],
        )
    }

    /// Itinerary activity photos: only the formats that backend stores.
    pub fn for_activity_photos() -> Self {
        Self::new(
            Vec::new(),
            vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            Vec::new(),
        )
    }

    pub fn accepts(&self, file: &SourceFile) -> bool {
        let mime = file.mime_type.to_lowercase();

        if self
            .allowed_prefixes
            .iter()
            .any(|prefix| mime.starts_with(prefix.as_str()))
        {
            return true;
        }

        if self.allowed_content_types.iter().any(|ct| ct == &mime) {
            return true;
        }

        self.allowed_extensions
            .iter()
            .any(|ext| file.has_extension(ext))
    }

    /// Same as [`accepts`](Self::accepts), reporting `UnsupportedFormat` on rejection.
    pub fn validate(&self, file: &SourceFile) -> Result<(), AppError> {
        if self.accepts(file) {
            return Ok(());
        }
        tracing::debug!(
            filename = %file.filename,
            mime_type = %file.mime_type,
            "Rejected unsupported file"
        );
        Err(AppError::UnsupportedFormat {
            filename: file.filename.clone(),
            mime_type: file.mime_type.clone(),
        })
    }
}
