pub mod auth;
pub mod error;
pub mod validation;
mod words;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::AppState;

use self::error::ApiError;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes: /me sits behind the gate, register/login are public
    let auth_routes = Router::new()
        .route("/me", get(auth::me).put(auth::update_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Protected API routes
    let api_routes = Router::new()
        .route("/words", get(words::list_words).post(words::create_word))
        .route("/words/level/:level", get(words::words_by_level))
        .route("/words/user/:user_id", get(words::words_by_user))
        .route(
            "/words/:id",
            get(words::get_word)
                .put(words::update_word)
                .delete(words::delete_word),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy from the configured origins. Empty or `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub timestamp: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
