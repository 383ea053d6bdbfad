//! HTTP-facing error taxonomy
//!
//! Every failure that reaches a handler becomes an `AppError`, rendered as
//! `{ "error": ..., "details": ... }` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::data::SessionError;
use crate::panel::PanelError;
use crate::votes::VoteError;

#[derive(Error, Debug)]
pub enum AppError {
    /// A required credential or key is not configured
    #[error("Service misconfigured: {0}")]
    Configuration(String),

    /// The upstream transit API rejected the token
    #[error("Could not authenticate with the transit API: {0}")]
    Authentication(String),

    /// The upstream transit API rejected the session credential
    #[error("Transit API session expired: {0}")]
    UpstreamUnauthorized(String),

    /// A collaborator failed or answered with an error status
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Bad client input
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The vote store failed
    #[error("Vote store error: {0}")]
    Store(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Configuration(_)
            | AppError::Authentication(_)
            | AppError::UpstreamUnauthorized(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            AppError::Validation(message) | AppError::NotFound(message) => ErrorBody {
                error: message.clone(),
                details: None,
            },
            AppError::MethodNotAllowed => ErrorBody {
                error: self.to_string(),
                details: None,
            },
            AppError::Configuration(details)
            | AppError::Authentication(details)
            | AppError::UpstreamUnauthorized(details)
            | AppError::UpstreamUnavailable(details) => ErrorBody {
                error: "Failed to process the request".to_string(),
                details: Some(details.clone()),
            },
            AppError::Store(details) => ErrorBody {
                error: "Failed to access vote counts".to_string(),
                details: Some(details.clone()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingToken => AppError::Configuration(e.to_string()),
            SessionError::Unauthorized => AppError::UpstreamUnauthorized(e.to_string()),
            _ if e.is_authentication() => AppError::Authentication(e.to_string()),
            _ => AppError::UpstreamUnavailable(e.to_string()),
        }
    }
}

impl From<PanelError> for AppError {
    fn from(e: PanelError) -> Self {
        match e {
            PanelError::Session(e) => e.into(),
        }
    }
}

impl From<VoteError> for AppError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::InvalidOption(_) => AppError::Validation(e.to_string()),
            VoteError::Store(e) => AppError::Store(e.to_string()),
        }
    }
}
