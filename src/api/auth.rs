/// Session endpoints
///
/// POST exchanges an identity-provider access token for a session token;
/// GET returns the current user; DELETE logs out.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::auth::bearer_token;
use crate::domain::User;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Access token issued by the identity provider
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Public routes (no session yet)
pub fn create_login_routes() -> Router<AppState> {
    Router::new().route("/api/auth/session", post(login))
}

/// Routes behind the session middleware
pub fn create_session_routes() -> Router<AppState> {
    Router::new().route("/api/auth/session", get(current_user).delete(logout))
}

/// POST /api/auth/session
/// Body: { "access_token": "..." }
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ServiceResult<(StatusCode, Json<SessionResponse>)> {
    let access_token = payload.access_token.trim();
    if access_token.is_empty() {
        return Err(ServiceError::validation("access_token must not be empty"));
    }

    let profile = state.identity.fetch_profile(access_token).await?;
    let user = state.services.users.upsert_from_profile(&profile).await?;
    let ttl = Duration::hours(state.config.auth.session_ttl_hours);
    let session = state.services.users.create_session(user.id, ttl).await?;

    tracing::info!("🔑 User {} signed in", user.id);
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token: session.token,
            expires_at: session.expires_at,
            user,
        }),
    ))
}

/// GET /api/auth/session
async fn current_user(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// DELETE /api/auth/session
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ServiceResult<StatusCode> {
    if let Some(token) = bearer_token(&headers) {
        state.services.users.revoke(token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
