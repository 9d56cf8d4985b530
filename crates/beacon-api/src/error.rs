//! Error types for the request surface.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`] implementation.

use std::time::Duration;

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the request surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed or missed required fields.
    #[error("{0}")]
    Validation(String),

    /// The requested records do not exist (or have expired).
    #[error("{0}")]
    NotFound(String),

    /// No API key was supplied.
    #[error("Missing X-API-Key header")]
    Unauthorized,

    /// The supplied API key is wrong.
    #[error("Invalid API key")]
    Forbidden,

    /// The client exceeded its request budget.
    #[error("Too many requests, please try again later.")]
    RateLimited {
        /// Time until the client's window resets.
        retry_after: Duration,
    },

    /// The server has no API key configured, so no request can authenticate.
    #[error("Server configuration error")]
    Misconfigured,

    /// An unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Misconfigured | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let Self::RateLimited { retry_after } = self {
            // Round up so clients never retry early.
            let secs = retry_after.as_secs().saturating_add(u64::from(retry_after.subsec_nanos() > 0));
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(ApiError::Validation(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Misconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited {
            retry_after: Duration::from_millis(1_500),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER), Some(&HeaderValue::from(2_u64)));
    }
}
