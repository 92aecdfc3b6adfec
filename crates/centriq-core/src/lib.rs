//! Centriq Core Library
//!
//! This crate provides the domain models, error types, configuration and session
//! context shared by every Centriq client component, together with the
//! [`MediaService`] and [`CollectionService`] collaborator traits the client
//! components talk to.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use services::{CollectionService, MediaService, ProgressFn};
pub use session::{Session, UserIdentity};
