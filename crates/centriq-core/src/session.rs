//! Session context
//!
//! The current user and bearer token live in an explicit [`Session`] value that
//! callers pass around. It is restored on start-up (environment override, then
//! the persisted session file) and torn down by [`Session::logout`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Identity shown as the uploader of new media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserIdentity {
    /// Identity for a login by e-mail: the display name is the local part.
    pub fn from_email(email: &str) -> Self {
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            id: None,
            name,
            email: Some(email.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: Option<String>,
    user: Option<UserIdentity>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>, user: UserIdentity) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    /// Restore the session: `CENTRIQ_TOKEN` + `CENTRIQ_USER_NAME` win over the file.
    pub fn restore(path: &Path) -> Result<Self, AppError> {
        if let (Ok(token), Ok(name)) = (
            std::env::var("CENTRIQ_TOKEN"),
            std::env::var("CENTRIQ_USER_NAME"),
        ) {
            tracing::debug!("Session restored from environment");
            return Ok(Self::authenticated(
                token,
                UserIdentity {
                    id: None,
                    name,
                    email: None,
                },
            ));
        }
        Self::restore_from_file(path)
    }

    /// Read a persisted session. A missing file yields an anonymous session.
    pub fn restore_from_file(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::anonymous());
        }
        let raw = std::fs::read_to_string(path)?;
        let session: Session = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "Session restored from file");
        Ok(session)
    }

    pub fn persist(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Clear the identity and remove the persisted session.
    pub fn logout(&mut self, path: &Path) -> Result<(), AppError> {
        self.token = None;
        self.user = None;
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        tracing::info!("Logged out");
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    /// Name stamped on uploads; `None` means uploads must be refused.
    pub fn uploader_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|name| !name.trim().is_empty())
    }

    pub fn set_user(&mut self, user: UserIdentity) {
        self.user = Some(user);
    }
}
