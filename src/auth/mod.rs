/// Authentication
///
/// Login is delegated to an external OAuth/OIDC identity provider: the
/// frontend obtains an access token from the provider, and the backend
/// resolves it to a profile through the provider's userinfo endpoint before
/// issuing its own session token. Every other API call carries that session
/// token as `Authorization: Bearer <token>`.

pub mod identity;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::error::ServiceError;

pub use identity::{HttpIdentityProvider, IdentityProfile, IdentityProvider};

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Session middleware: resolves the bearer token and stores the `User`
/// as a request extension for the handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return ServiceError::Unauthorized.into_response();
    };

    match state.services.users.resolve(&token, chrono::Utc::now()).await {
        Ok(user) => {
            tracing::debug!("👤 Authenticated request for user {}", user.id);
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
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
    fn parses_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer   abc123 ")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Basic abc123")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
