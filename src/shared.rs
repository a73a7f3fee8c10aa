use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::directory::DirectoryService;
use crate::participation::ParticipationService;
use crate::player::service::PlayerService;

/// Shared application state containing the long-lived services
#[derive(Clone)]
pub struct AppState {
    pub player_service: Arc<PlayerService>,
    pub participation_service: Arc<ParticipationService>,
    pub directory_service: Arc<DirectoryService>,
}

impl AppState {
    pub fn new(
        player_service: Arc<PlayerService>,
        participation_service: Arc<ParticipationService>,
        directory_service: Arc<DirectoryService>,
    ) -> Self {
        Self {
            player_service,
            participation_service,
            directory_service,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// A required field is missing or malformed; never partially persists
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Uniqueness invariant violated; distinct from a generic validation
    /// failure so callers can suggest editing the existing record
    #[error("Duplicate player: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying storage temporarily unavailable; retryable by the caller
    #[error("Backend error: {0}")]
    Backend(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "field": field }),
            ),
            AppError::Duplicate(msg) => (
                StatusCode::CONFLICT,
                json!({ "error": msg, "code": "duplicate" }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Backend(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": format!("Backend error: {}", msg), "retryable": true }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
