//! Configuration module
//!
//! Client configuration read from `CENTRIQ_*` environment variables (a `.env`
//! file is loaded first when present). Malformed numbers fall back to defaults;
//! [`ClientConfig::validate`] rejects values the pipeline cannot work with.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

// Common constants
const DEFAULT_API_URL: &str = "http://localhost:8000";
const HTTP_TIMEOUT_SECS: u64 = 60;
const UPLOAD_QUEUE_CAP: usize = 20;
const UPLOAD_CONCURRENCY: usize = 5;
const UPLOAD_CLEAR_DELAY_MS: u64 = 2000;
const JPEG_QUALITY: u8 = 80;
const DEFAULT_PAGE_SIZE: u32 = 24;

/// Upload pipeline settings
#[derive(Clone, Debug, PartialEq)]
pub struct UploadConfig {
    /// Maximum pending + uploading items in the queue.
    pub queue_cap: usize,
    /// Simultaneous transfers; 0 runs every pending item at once.
    pub max_concurrent_uploads: usize,
    /// How long finished items stay visible before the queue is cleared.
    pub clear_delay: Duration,
    /// JPEG quality (1-100) used when converting HEIC files.
    pub jpeg_quality: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            queue_cap: UPLOAD_QUEUE_CAP,
            max_concurrent_uploads: UPLOAD_CONCURRENCY,
            clear_delay: Duration::from_millis(UPLOAD_CLEAR_DELAY_MS),
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub http_timeout: Duration,
    pub upload: UploadConfig,
    pub default_page_size: u32,
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            upload: UploadConfig::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            session_file: default_session_file(),
        }
    }
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("centriq")
        .join("session.json")
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("CENTRIQ_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let session_file = env::var("CENTRIQ_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_file());

        let config = Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(parse_or(
                "CENTRIQ_HTTP_TIMEOUT_SECS",
                HTTP_TIMEOUT_SECS,
            )),
            upload: UploadConfig {
                queue_cap: parse_or("CENTRIQ_UPLOAD_QUEUE_CAP", UPLOAD_QUEUE_CAP),
                max_concurrent_uploads: parse_or("CENTRIQ_UPLOAD_CONCURRENCY", UPLOAD_CONCURRENCY),
                clear_delay: Duration::from_millis(parse_or(
                    "CENTRIQ_UPLOAD_CLEAR_DELAY_MS",
                    UPLOAD_CLEAR_DELAY_MS,
                )),
                jpeg_quality: parse_or("CENTRIQ_JPEG_QUALITY", JPEG_QUALITY),
            },
            default_page_size: parse_or("CENTRIQ_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            session_file,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_url.is_empty() {
            return Err(AppError::Config("CENTRIQ_API_URL must not be empty".to_string()));
        }
        if self.upload.queue_cap == 0 {
            return Err(AppError::Config(
                "CENTRIQ_UPLOAD_QUEUE_CAP must be at least 1".to_string(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(AppError::Config(
                "CENTRIQ_DEFAULT_PAGE_SIZE must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.upload.jpeg_quality) {
            return Err(AppError::Config(format!(
                "CENTRIQ_JPEG_QUALITY must be between 1 and 100, got {}",
                self.upload.jpeg_quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_behavior() {
        let config = ClientConfig::default();
        assert_eq!(config.upload.queue_cap, 20);
        assert_eq!(config.upload.max_concurrent_uploads, 5);
        assert_eq!(config.upload.clear_delay, Duration::from_millis(2000));
        assert_eq!(config.upload.jpeg_quality, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_queue_cap() {
        let mut config = ClientConfig::default();
        config.upload.queue_cap = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_jpeg_quality_out_of_range() {
        let mut config = ClientConfig::default();
        config.upload.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.upload.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        std::env::set_var("CENTRIQ_TEST_PARSE_OR", "not-a-number");
        assert_eq!(parse_or("CENTRIQ_TEST_PARSE_OR", 7usize), 7);
        std::env::set_var("CENTRIQ_TEST_PARSE_OR", " 12 ");
        assert_eq!(parse_or("CENTRIQ_TEST_PARSE_OR", 7usize), 12);
        std::env::remove_var("CENTRIQ_TEST_PARSE_OR");
    }
}
