//! Error type shared by every HTTP handler, and its actix `ResponseError`
//! mapping. Bodies are JSON `{"detail": "..."}`.

use crate::services::certificates::archive::ArchiveError;
use crate::services::certificates::render::RenderError;
use crate::store::StoreError;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("access denied")]
    Forbidden,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Store(StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("background task failed: {0}")]
    Join(String),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{what} not found"))
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServiceError::not_found("record"),
            StoreError::Forbidden => ServiceError::Forbidden,
            other => ServiceError::Store(other),
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(e: tokio::task::JoinError) -> Self {
        ServiceError::Join(e.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_)
            | ServiceError::Io(_)
            | ServiceError::Render(_)
            | ServiceError::Archive(_)
            | ServiceError::Join(_)
            | ServiceError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "detail": self.to_string() }))
    }
}

/// Store lookups of a specific kind of record, with a readable 404 message.
pub trait OrNotFound<T> {
    fn or_not_found(self, what: &str) -> Result<T, ServiceError>;
}

impl<T> OrNotFound<T> for Result<T, StoreError> {
    fn or_not_found(self, what: &str) -> Result<T, ServiceError> {
        self.map_err(|e| match e {
            StoreError::NotFound => ServiceError::not_found(what),
            other => other.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let forbidden: ServiceError = StoreError::Forbidden.into();
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let missing: Result<(), _> = Err(StoreError::NotFound);
        let err = missing.or_not_found("event").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "event not found");

        let poisoned: ServiceError = StoreError::Poisoned.into();
        assert_eq!(poisoned.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response = ServiceError::Unauthorized.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
