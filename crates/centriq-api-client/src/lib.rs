//! HTTP client for the Centriq backend.
//!
//! Provides a minimal client with Bearer auth, generic GET/POST/PATCH/DELETE
//! helpers, and domain methods: the [`MediaService`] implementation lives in
//! [`api`], the [`CollectionService`](centriq_core::CollectionService) one in
//! [`collections`], login/registration and account management in [`auth`].
//!
//! Non-2xx responses become `anyhow` errors wrapping
//! [`AppError::Api`](centriq_core::AppError::Api) so callers can downcast to the
//! status code.

pub mod api;
pub mod auth;
pub mod collections;

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use centriq_core::{AppError, ClientConfig, ProgressFn, Session};
use futures::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Size of the body chunks whose hand-off to the transport drives upload progress.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// No credentials (login and registration).
    Anonymous,
    /// `Authorization: Bearer {token}`
    Bearer(String),
}

/// HTTP client for the Centriq API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create a client for the configured backend, authenticated with the session token if any.
    pub fn from_session(config: &ClientConfig, session: &Session) -> Result<Self> {
        let auth = match session.token() {
            Some(token) => Auth::Bearer(token.to_string()),
            None => Auth::Anonymous,
        };
        Self::new(config.api_url.clone(), auth, config.http_timeout)
    }

    /// Same client, new credentials.
    pub fn with_auth(&self, auth: Auth) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn token(&self) -> Option<&str> {
        match &self.auth {
            Auth::Bearer(token) => Some(token.as_str()),
            Auth::Anonymous => None,
        }
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::Anonymous => request,
        }
    }

    /// Send the request and turn non-2xx statuses into `AppError::Api`.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == reqwest::StatusCode::UNAUTHORIZED {
                tracing::warn!("Backend rejected credentials; log in again");
            }
            return Err(AppError::Api {
                status: status.as_u16(),
                message: error_text,
            }
            .into());
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;
        Ok(body)
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        self.json(request).await
    }

    /// GET request returning the raw body.
    pub async fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Bytes> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.send(request).await?;
        response.bytes().await.context("Failed to read response body")
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.json(self.client.post(self.build_url(path)).json(body))
            .await
    }

    /// PATCH JSON body and deserialize response.
    pub async fn patch_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.json(self.client.patch(self.build_url(path)).json(body))
            .await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.json(self.client.put(self.build_url(path)).json(body))
            .await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        self.json(self.client.post(self.build_url(path)).multipart(form))
            .await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.client.delete(self.build_url(path))).await?;
        Ok(())
    }

    /// Raw client for custom requests. Caller must apply auth via build_url and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Multipart file part whose body reports `(sent, total)` as chunks are handed to the transport.
pub(crate) fn progress_part(
    data: Bytes,
    filename: &str,
    mime_type: &str,
    progress: ProgressFn,
) -> Result<reqwest::multipart::Part> {
    let total = data.len() as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
        .collect();

    let mut sent = 0u64;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress(sent, total);
        Ok::<Bytes, std::io::Error>(chunk)
    });

    let mime_type = if mime_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };

    reqwest::multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
        .file_name(filename.to_string())
        .mime_str(mime_type)
        .context("Invalid MIME type for upload")
}

// Re-export domain types for convenience.
pub use auth::TokenResponse;
pub use centriq_core::models::{Collection, MediaPage, MediaRecord, UploadedMedia};
