use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Length of the code members share to join a trip.
pub const JOIN_CODE_LEN: usize = 6;

/// A trip: the shared collection media is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_photo_url: Option<String>,
    #[serde(default)]
    pub join_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of a trip creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo_url: Option<String>,
}

impl NewCollection {
    /// Trimmed name, rejected when blank.
    pub fn new(name: &str, description: Option<String>) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Trip name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            cover_photo_url: None,
        })
    }
}

/// Normalize a join code the way the backend stores it: trimmed, upper case,
/// six ASCII letters or digits.
pub fn normalize_join_code(code: &str) -> Result<String, AppError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != JOIN_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::InvalidInput(format!(
            "Join code must be {} letters or digits, got {:?}",
            JOIN_CODE_LEN, code
        )));
    }
    Ok(code)
}

/// Partial profile update; unset fields are left alone by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.profile_pic_url.is_none()
    }
}
