//! In-memory `CollectionService` with creator and membership rules

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use centriq_core::models::{Collection, NewCollection};
use centriq_core::{AppError, CollectionService};
use chrono::Utc;
use uuid::Uuid;

#[derive(Default)]
struct MockState {
    trips: Vec<Collection>,
    created_by_me: HashSet<Uuid>,
    member_of: HashSet<Uuid>,
    join_calls: Vec<String>,
    deleted: Vec<Uuid>,
}

fn api_error(status: u16, message: &str) -> anyhow::Error {
    AppError::Api {
        status,
        message: message.to_string(),
    }
    .into()
}

/// Mock trip backend. The current user sees the trips they created or joined.
#[derive(Default)]
pub struct MockCollectionService {
    state: Mutex<MockState>,
}

impl MockCollectionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trip created by someone else, joinable with `join_code`.
    pub fn add_foreign_trip(&self, name: &str, join_code: &str) -> Collection {
        let trip = trip(name, join_code);
        self.state.lock().unwrap().trips.push(trip.clone());
        trip
    }

    pub fn join_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().join_calls.clone()
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().deleted.clone()
    }
}

fn trip(name: &str, join_code: &str) -> Collection {
    Collection {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        cover_photo_url: None,
        join_code: Some(join_code.to_string()),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl CollectionService for MockCollectionService {
    async fn list_collections(&self) -> Result<Vec<Collection>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .trips
            .iter()
            .filter(|t| state.member_of.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn create_collection(&self, collection: &NewCollection) -> Result<Collection> {
        let mut state = self.state.lock().unwrap();
        let mut created = trip(&collection.name, &format!("C{:05}", state.trips.len()));
        created.description = collection.description.clone();
        state.created_by_me.insert(created.id);
        state.member_of.insert(created.id);
        state.trips.push(created.clone());
        Ok(created)
    }

    async fn join_collection(&self, join_code: &str) -> Result<Collection> {
        let mut state = self.state.lock().unwrap();
        state.join_calls.push(join_code.to_string());
        let found = state
            .trips
            .iter()
            .find(|t| t.join_code.as_deref() == Some(join_code))
            .cloned();
        match found {
            Some(trip) => {
                state.member_of.insert(trip.id);
                Ok(trip)
            }
            None => Err(api_error(404, "Invalid join code")),
        }
    }

    async fn collection(&self, collection_id: Uuid) -> Result<Collection> {
        let state = self.state.lock().unwrap();
        let trip = state
            .trips
            .iter()
            .find(|t| t.id == collection_id)
            .cloned()
            .ok_or_else(|| api_error(404, "Trip not found"))?;
        if !state.member_of.contains(&collection_id) {
            return Err(api_error(403, "Not a member of this trip"));
        }
        Ok(trip)
    }

    async fn delete_collection(&self, collection_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.trips.iter().any(|t| t.id == collection_id) {
            return Err(api_error(404, "Trip not found"));
        }
        if !state.created_by_me.contains(&collection_id) {
            return Err(api_error(403, "Only the creator can delete this trip"));
        }
        state.trips.retain(|t| t.id != collection_id);
        state.member_of.remove(&collection_id);
        state.deleted.push(collection_id);
        Ok(())
    }
}
