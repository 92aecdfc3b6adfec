//! Trip endpoints: the [`CollectionService`] implementation for [`ApiClient`].

use anyhow::Result;
use async_trait::async_trait;
use centriq_core::models::{Collection, NewCollection};
use centriq_core::CollectionService;
use uuid::Uuid;

use crate::ApiClient;

#[async_trait]
impl CollectionService for ApiClient {
    async fn list_collections(&self) -> Result<Vec<Collection>> {
        self.get("/trips/", &[]).await
    }

    async fn create_collection(&self, collection: &NewCollection) -> Result<Collection> {
        let created: Collection = self.post_json("/trips/", collection).await?;
        tracing::info!(trip_id = %created.id, name = %created.name, "Trip created");
        Ok(created)
    }

    async fn join_collection(&self, join_code: &str) -> Result<Collection> {
        self.post_json("/trips/join", &serde_json::json!({ "code": join_code }))
            .await
    }

    async fn collection(&self, collection_id: Uuid) -> Result<Collection> {
        self.get(&format!("/trips/{}", collection_id), &[]).await
    }

    async fn delete_collection(&self, collection_id: Uuid) -> Result<()> {
        ApiClient::delete(self, &format!("/trips/{}", collection_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use centriq_core::AppError;
    use mockito::Matcher;
    use std::time::Duration;

    fn client(url: String) -> ApiClient {
        ApiClient::new(url, Auth::Bearer("tok".to_string()), Duration::from_secs(5)).unwrap()
    }

    fn trip_json(id: Uuid, name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": name,
            "description": null,
            "cover_photo_url": null,
            "join_code": "AB12CD",
            "created_at": "2025-12-27T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_list_collections() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("GET", "/trips/")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!([trip_json(id, "Lisbon")]).to_string())
            .create_async()
            .await;

        let trips = client(server.url()).list_collections().await.unwrap();

        mock.assert_async().await;
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].id, id);
        assert_eq!(trips[0].join_code.as_deref(), Some("AB12CD"));
    }

    #[tokio::test]
    async fn test_create_collection_posts_only_set_fields() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("POST", "/trips/")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "Lisbon",
                "description": "Spring break"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(trip_json(id, "Lisbon").to_string())
            .create_async()
            .await;

        let new_trip = NewCollection::new("Lisbon", Some("Spring break".to_string())).unwrap();
        let trip = client(server.url())
            .create_collection(&new_trip)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(trip.id, id);
    }

    #[tokio::test]
    async fn test_join_collection_sends_code() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("POST", "/trips/join")
            .match_body(Matcher::Json(serde_json::json!({ "code": "AB12CD" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(trip_json(id, "Lisbon").to_string())
            .create_async()
            .await;

        let trip = client(server.url())
            .join_collection("AB12CD")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(trip.id, id);
    }

    #[tokio::test]
    async fn test_collection_details_and_delete() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let path = format!("/trips/{}", id);
        server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(trip_json(id, "Lisbon").to_string())
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", path.as_str())
            .with_status(204)
            .create_async()
            .await;

        let api = client(server.url());
        assert_eq!(api.collection(id).await.unwrap().name, "Lisbon");
        api.delete_collection(id).await.unwrap();

        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_collection_by_non_creator_is_403() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        server
            .mock("DELETE", format!("/trips/{}", id).as_str())
            .with_status(403)
            .with_body(r#"{"detail":"Only the creator can delete this trip"}"#)
            .create_async()
            .await;

        let err = client(server.url())
            .delete_collection(id)
            .await
            .unwrap_err();

        assert!(matches!(
            AppError::from_service(err),
            AppError::Api { status: 403, .. }
        ));
    }
}
