//! Trip management: list, create, join by code, inspect and delete trips.

use std::sync::Arc;

use centriq_core::models::{normalize_join_code, Collection, NewCollection};
use centriq_core::{AppError, CollectionService};
use uuid::Uuid;

use crate::gallery::Gallery;

/// Map the backend's 403/404 answers to errors that say what went wrong.
fn classify(err: anyhow::Error, forbidden: &str, not_found: String) -> AppError {
    match AppError::from_service(err) {
        AppError::Api { status: 403, .. } => AppError::Forbidden(forbidden.to_string()),
        AppError::Api { status: 404, .. } => AppError::NotFound(not_found),
        other => other,
    }
}

pub struct Collections {
    service: Arc<dyn CollectionService>,
}

impl Collections {
    pub fn new(service: Arc<dyn CollectionService>) -> Self {
        Self { service }
    }

    /// Trips the current user created or joined.
    pub async fn list(&self) -> Result<Vec<Collection>, AppError> {
        self.service
            .list_collections()
            .await
            .map_err(AppError::from_service)
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Collection, AppError> {
        let new_trip = NewCollection::new(name, description)?;
        self.service
            .create_collection(&new_trip)
            .await
            .map_err(AppError::from_service)
    }

    /// Join a trip by its share code. Case and surrounding blanks are
    /// ignored; malformed codes are rejected before any request.
    pub async fn join(&self, join_code: &str) -> Result<Collection, AppError> {
        let code = normalize_join_code(join_code)?;
        let trip = self
            .service
            .join_collection(&code)
            .await
            .map_err(|e| {
                classify(
                    e,
                    "Joining this trip is not allowed",
                    format!("No trip uses join code {}", code),
                )
            })?;
        tracing::info!(trip_id = %trip.id, name = %trip.name, "Joined trip");
        Ok(trip)
    }

    pub async fn details(&self, collection_id: Uuid) -> Result<Collection, AppError> {
        self.service
            .collection(collection_id)
            .await
            .map_err(|e| {
                classify(
                    e,
                    "You are not a member of this trip",
                    format!("Trip {} not found", collection_id),
                )
            })
    }

    /// Delete a trip and drop its media from `gallery`. Only the creator may
    /// delete; anyone else gets `Forbidden` and nothing changes locally.
    pub async fn delete(&self, collection_id: Uuid, gallery: &Gallery) -> Result<(), AppError> {
        self.service
            .delete_collection(collection_id)
            .await
            .map_err(|e| {
                classify(
                    e,
                    "You can only delete trips that you created",
                    format!("Trip {} not found", collection_id),
                )
            })?;
        gallery.forget_collection(collection_id);
        tracing::info!(trip_id = %collection_id, "Trip deleted");
        Ok(())
    }
}
