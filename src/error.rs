//! HTTP-boundary errors of the launch flow
//!
//! Every failure of `/launch` and `/fhir_redirect` ends up as exactly one
//! [`LaunchError`], rendered as a status code plus a short plain-text body.
//! Internal causes are logged where the error is raised and never reach the
//! browser.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::response_builder::ResponseBuilder;

/// Message for a missing or expired cookie session
pub const SESSION_NOT_FOUND_MESSAGE: &str = "cookie session not found";

#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bad, missing or unauthorized request parameters (401)
    #[error("{0}")]
    Unauthorized(String),
    /// Malformed request parameters (400)
    #[error("{0}")]
    BadRequest(String),
    /// No usable session for the request's cookie (401)
    #[error("cookie session not found")]
    SessionNotFound,
    /// Session backend failure (500)
    #[error("{0}")]
    Store(String),
    /// Discovery or authorization URL construction failed (400)
    #[error("{0}")]
    Discovery(String),
    /// Code for token exchange failed (500)
    #[error("{0}")]
    TokenExchange(String),
}

impl LaunchError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl ResponseError for LaunchError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::SessionNotFound => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::Discovery(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::TokenExchange(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        ResponseBuilder::plain_text(self.status_code(), &self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LaunchError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (LaunchError::SessionNotFound, StatusCode::UNAUTHORIZED),
            (LaunchError::bad_request("x"), StatusCode::BAD_REQUEST),
            (LaunchError::Discovery("x".into()), StatusCode::BAD_REQUEST),
            (LaunchError::Store("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                LaunchError::TokenExchange("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[actix_web::test]
    async fn test_body_is_public_message() {
        let response = LaunchError::SessionNotFound.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body, SESSION_NOT_FOUND_MESSAGE.as_bytes());
    }
}
