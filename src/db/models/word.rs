//! Word models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::CefrLevel;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub word: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[sqlx(try_from = "String")]
    pub level: CefrLevel,
    /// Owning user id
    #[sqlx(rename = "user_id")]
    pub user: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Validated word fields ready for persistence.
///
/// Built by the API layer after validation; the owner is supplied separately
/// from the authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDraft {
    pub word: String,
    pub meaning: String,
    pub example: Option<String>,
    pub level: CefrLevel,
}

/// Body for `POST /api/words` and `PUT /api/words/:id`.
///
/// Every field is optional at the serde level so that missing values are
/// reported as validation errors instead of deserialization failures. A `user`
/// key in the payload is accepted and ignored.
#[derive(Debug, Default, Deserialize)]
pub struct WordRequest {
    pub word: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
    pub level: Option<String>,
    #[serde(default, rename = "user")]
    pub _user: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct WordResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Word,
}

#[derive(Debug, Serialize)]
pub struct WordListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Word>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
