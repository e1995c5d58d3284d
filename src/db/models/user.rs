//! User models and auth DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::CefrLevel;

/// Stored user row. Not serializable: the password hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub level: CefrLevel,
    pub created_at: String,
    pub updated_at: String,
}

/// Public profile returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub level: CefrLevel,
    pub learned_words: i64,
    pub created_at: String,
}

impl UserResponse {
    pub fn new(user: User, learned_words: i64) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            level: user.level,
            learned_words,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile changes accepted by `PUT /api/auth/me`. Email and password are not updatable here.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserResponse,
}
