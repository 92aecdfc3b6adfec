//! Authentication and account endpoints.

use std::path::Path;

use anyhow::Result;
use centriq_core::models::ProfileUpdate;
use centriq_core::{AppError, Session, UserIdentity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiClient;

/// Response of `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Profile returned by `GET /users/me`.
#[derive(Debug, Clone, Deserialize)]
struct Profile {
    id: Option<Uuid>,
    name: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<Profile> for UserIdentity {
    fn from(profile: Profile) -> Self {
        UserIdentity {
            id: profile.id,
            name: profile.name,
            email: profile.email,
        }
    }
}

impl ApiClient {
    /// Log in by e-mail and password. The display name is the e-mail local part.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let token: TokenResponse = self
            .post_json(
                "/auth/login",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        tracing::info!(email = %email, "Logged in");
        Ok(Session::authenticated(
            token.access_token,
            UserIdentity::from_email(email),
        ))
    }

    /// Create an account and log in with it.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let token: TokenResponse = self
            .post_json(
                "/auth/register",
                &serde_json::json!({ "name": name, "email": email, "password": password }),
            )
            .await?;

        tracing::info!(email = %email, "Registered account");
        Ok(Session::authenticated(
            token.access_token,
            UserIdentity {
                id: None,
                name: name.to_string(),
                email: Some(email.to_string()),
            },
        ))
    }

    /// Fetch the authenticated user's profile.
    pub async fn me(&self) -> Result<UserIdentity> {
        let profile: Profile = self.get("/users/me", &[]).await?;
        Ok(profile.into())
    }

    /// Update the profile and refresh the session identity with the result.
    /// New uploads are stamped with the updated name.
    pub async fn update_profile(
        &self,
        session: &mut Session,
        update: &ProfileUpdate,
    ) -> Result<UserIdentity> {
        if update.is_empty() {
            return Err(AppError::InvalidInput("Nothing to update".to_string()).into());
        }
        let profile: Profile = self.put_json("/users/me", update).await?;
        let user = UserIdentity::from(profile);
        session.set_user(user.clone());
        tracing::info!(name = %user.name, "Profile updated");
        Ok(user)
    }

    /// Delete the account, then drop the session and its persisted file.
    /// The session is kept if the backend refuses.
    pub async fn delete_account(&self, session: &mut Session, session_file: &Path) -> Result<()> {
        self.delete("/users/me").await?;
        session.logout(session_file)?;
        tracing::info!("Account deleted");
        Ok(())
    }
}
