use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{CefrLevel, MessageResponse, Word, WordListResponse, WordRequest, WordResponse};
use crate::AppState;

use super::auth::AuthContext;
use super::error::ApiError;
use super::validation::validate_word_request;

fn list_response(words: Vec<Word>) -> Json<WordListResponse> {
    Json(WordListResponse {
        success: true,
        count: words.len(),
        data: words,
    })
}

/// Load a word the caller is about to mutate, enforcing ownership when configured
async fn load_for_mutation(
    state: &AppState,
    auth: &AuthContext,
    id: &str,
) -> Result<Word, ApiError> {
    let word = state
        .words
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Word not found"))?;

    if state.config.words.enforce_owner_on_mutation && word.user != auth.user.id {
        warn!(
            word_id = %word.id,
            owner_id = %word.user,
            user_id = %auth.user.id,
            "Rejected mutation of a word owned by another user"
        );
        return Err(ApiError::forbidden("Not authorized to modify this word"));
    }

    Ok(word)
}

/// List all words, newest first
///
/// GET /api/words
pub async fn list_words(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WordListResponse>, ApiError> {
    let words = state.words.find_all().await?;
    Ok(list_response(words))
}

/// GET /api/words/:id
pub async fn get_word(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WordResponse>, ApiError> {
    let word = state
        .words
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Word not found"))?;

    Ok(Json(WordResponse {
        success: true,
        message: None,
        data: word,
    }))
}

/// GET /api/words/level/:level
pub async fn words_by_level(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
) -> Result<Json<WordListResponse>, ApiError> {
    let level: CefrLevel = level
        .parse()
        .map_err(|e: crate::db::ParseLevelError| ApiError::validation_field("level", e.to_string()))?;

    let words = state.words.find_by_level(level).await?;
    Ok(list_response(words))
}

/// GET /api/words/user/:user_id
pub async fn words_by_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<WordListResponse>, ApiError> {
    let words = state.words.find_by_owner(&user_id).await?;
    Ok(list_response(words))
}

/// Create a word owned by the caller. Any `user` key in the body is ignored.
///
/// POST /api/words
pub async fn create_word(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    WithRejection(Json(req), _): WithRejection<Json<WordRequest>, ApiError>,
) -> Result<(StatusCode, Json<WordResponse>), ApiError> {
    let draft = validate_word_request(&req)
        .map_err(|e| e.with_message("Error creating word"))?;

    let word = state.words.create(&draft, &auth.user.id).await?;

    info!(word_id = %word.id, user_id = %auth.user.id, level = %word.level, "Word created");

    Ok((
        StatusCode::CREATED,
        Json(WordResponse {
            success: true,
            message: Some("Word created successfully".to_string()),
            data: word,
        }),
    ))
}

/// Replace a word's fields
///
/// PUT /api/words/:id
pub async fn update_word(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<WordRequest>, ApiError>,
) -> Result<Json<WordResponse>, ApiError> {
    // Validation runs before the store is touched
    let draft = validate_word_request(&req)
        .map_err(|e| e.with_message("Error updating word"))?;

    load_for_mutation(&state, &auth, &id).await?;

    let word = state.words.update(&id, &draft).await.map_err(|e| match e {
        crate::db::StoreError::NotFound => ApiError::not_found("Word not found"),
        other => other.into(),
    })?;

    info!(word_id = %word.id, user_id = %auth.user.id, "Word updated");

    Ok(Json(WordResponse {
        success: true,
        message: None,
        data: word,
    }))
}

/// DELETE /api/words/:id
pub async fn delete_word(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    load_for_mutation(&state, &auth, &id).await?;

    state.words.delete(&id).await.map_err(|e| match e {
        crate::db::StoreError::NotFound => ApiError::not_found("Word not found"),
        other => other.into(),
    })?;

    info!(word_id = %id, user_id = %auth.user.id, "Word deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "Word deleted".to_string(),
    }))
}
