//! Centriq media processing
//!
//! Decides which files the upload queue accepts ([`MediaValidator`]) and
//! normalizes formats the backend cannot display ([`FormatConverter`]).

pub mod conversion;
pub mod validator;

pub use conversion::{is_heif_container, jpeg_filename, FormatConverter, HeicToJpegConverter};
pub use validator::{is_heic, MediaValidator};
