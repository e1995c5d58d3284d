//! Registration, login, profile endpoints and the access control gate.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password_or_dummy};
use crate::db::{
    AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, StoreError,
    UpdateProfileRequest, User, UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_level, validate_name, validate_password};

/// Identity resolved by [`require_auth`] for the current request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Auth middleware: resolves the bearer token to a user or rejects with 401.
///
/// This is the only place tokens are parsed. Handlers get the identity through
/// the [`AuthContext`] extractor.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;

    let user_id = state
        .tokens
        .verify(token)
        .ok_or_else(|| ApiError::unauthorized("Not authorized, token failed"))?;

    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Not authorized, user not found"))?;

    request.extensions_mut().insert(AuthContext { user });
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authorized"))
    }
}

/// Argon2 is deliberately slow; keep it off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "Blocking task failed");
        ApiError::internal("Server error")
    })
}

async fn profile_of(state: &AppState, user: User) -> Result<UserResponse, ApiError> {
    let learned = state.words.count_by_owner(&user.id).await?;
    Ok(UserResponse::new(user, learned))
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    state.tokens.issue(&user.id).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign token");
        ApiError::internal("Server error")
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let name = validate_name(req.name.as_deref());
    let email = validate_email(req.email.as_deref());
    let password = validate_password(req.password.as_deref());

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = &name {
        errors.add("name", e);
    }
    if let Err(e) = &email {
        errors.add("email", e);
    }
    if let Err(e) = &password {
        errors.add("password", e);
    }
    errors.finish()?;

    let (Ok(name), Ok(email), Ok(password)) = (name, email, password) else {
        return Err(ApiError::bad_request("Invalid registration"));
    };

    // Cheap check before paying for the hash; the insert re-checks
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "Registration rejected: email already in use");
        return Err(StoreError::DuplicateEmail.into());
    }

    let password_hash = run_blocking(move || hash_password(&password))
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            ApiError::internal("Server error")
        })?;

    let user = state.users.create(&name, &email, &password_hash).await?;
    let token = issue_token(&state, &user)?;

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: profile_of(&state, user).await?,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let user = state.users.find_by_email(email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());

    let verified =
        run_blocking(move || verify_password_or_dummy(&password, stored_hash.as_deref())).await?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            info!("Failed login attempt");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    let token = issue_token(&state, &user)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        success: true,
        token,
        user: profile_of(&state, user).await?,
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Json<ProfileResponse>, ApiError> {
    Ok(Json(ProfileResponse {
        success: true,
        user: profile_of(&state, auth.user).await?,
    }))
}

/// PUT /api/auth/me
///
/// Only `name` and `level` can change; other keys in the body are ignored.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let name = req.name.as_deref().map(|raw| validate_name(Some(raw))).transpose();
    let level = req.level.as_deref().map(|raw| validate_level(Some(raw))).transpose();

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = &name {
        errors.add("name", e);
    }
    if let Err(e) = &level {
        errors.add("level", e);
    }
    errors.finish()?;

    let (Ok(name), Ok(level)) = (name, level) else {
        return Err(ApiError::bad_request("Invalid profile update"));
    };

    let user = state
        .users
        .update_profile(&auth.user.id, name.as_deref(), level)
        .await?;

    info!(user_id = %user.id, "Profile updated");

    Ok(Json(ProfileResponse {
        success: true,
        user: profile_of(&state, user).await?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(&headers("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer(&headers("Basic abc")), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&headers("abc")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
