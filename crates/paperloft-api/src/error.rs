//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use paperloft_search::SearchError;
use paperloft_sync::AuthError;

/// Handler error rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    Internal(paperloft_core::Error),
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
}

impl From<paperloft_core::Error> for ApiError {
    fn from(err: paperloft_core::Error) -> Self {
        use paperloft_core::Error;
        match err {
            Error::NotFound(_) | Error::BookmarkNotFound(_) | Error::ProjectNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::InvalidInput(msg) | Error::Config(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Busy(msg) => ApiError::Conflict(msg),
            Error::Request(_) | Error::Search(_) | Error::Inference(_) => {
                ApiError::Upstream(err.to_string())
            }
            other => ApiError::Internal(other),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Busy => ApiError::Conflict(err.user_message().to_string()),
            SearchError::NoInput => ApiError::BadRequest(err.user_message().to_string()),
            other => {
                tracing::warn!(subsystem = "api", component = "search", error = %other, "Search failed");
                ApiError::Upstream(other.user_message().to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Network(_) => ApiError::Upstream(err.to_string()),
            AuthError::NotConfigured => ApiError::Internal(err.into()),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_status() {
        let cases = [
            (
                ApiError::from(paperloft_core::Error::BookmarkNotFound("W1".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(paperloft_core::Error::InvalidInput("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(paperloft_core::Error::Unauthorized("Not signed in".into())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(paperloft_core::Error::Busy("loading".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(paperloft_core::Error::Storage("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        let response = ApiError::from(AuthError::WrongPassword).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_search_failure_is_bad_gateway() {
        let response = ApiError::from(SearchError::Status { status: 503 }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
