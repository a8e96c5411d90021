//! Authentication DTOs

use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// Response of the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    pub access_token: String,
    /// Always `bearer`
    #[serde(default)]
    pub token_type: String,
}

/// The signed-in user, as returned by `/api/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Display name
    pub full_name: String,
}
