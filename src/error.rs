/// Service-level error type
///
/// Services return `ServiceError` so the API layer can map every failure to a
/// stable HTTP status. Startup and wiring code keeps using `anyhow`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Entity does not exist (or is not visible to the caller)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Status change not allowed by the lifecycle
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Entity exists but belongs to another user
    #[error("access to this {0} is not allowed")]
    Forbidden(&'static str),

    /// Missing, unknown or expired session
    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    /// Identity provider rejected the token or was unreachable
    #[error("identity provider error: {0}")]
    Identity(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// HTTP status reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Identity(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("❌ Request failed: {}", self);
            "internal server error".to_string()
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ServiceError::NotFound("task").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::transition("received", "ordered").status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::Forbidden("project").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::Identity("timeout".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ServiceError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transition_message_names_both_states() {
        let err = ServiceError::transition("completed", "in_progress");
        assert_eq!(err.to_string(), "cannot change status from completed to in_progress");
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let response = ServiceError::Internal(anyhow::anyhow!("secret path /var/db")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
