//! Error types shared by the rules and the HTTP layer.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("complete a core task today to unlock reward minutes")]
    RewardsLocked,

    #[error("requested {requested} reward minutes but only {available} available")]
    InsufficientMinutes { requested: i64, available: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn task_not_found(id: impl ToString) -> Self {
        AppError::NotFound {
            kind: "task",
            id: id.to_string(),
        }
    }

    pub fn group_not_found(id: impl ToString) -> Self {
        AppError::NotFound {
            kind: "group",
            id: id.to_string(),
        }
    }

    pub fn goal_not_found(id: impl ToString) -> Self {
        AppError::NotFound {
            kind: "goal",
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "invalid_input",
            AppError::NotFound { .. } => "not_found",
            AppError::RewardsLocked => "rewards_locked",
            AppError::InsufficientMinutes { .. } => "insufficient_minutes",
            AppError::Conflict(_) => "conflict",
            AppError::Store(_) => "storage_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::RewardsLocked
            | AppError::InsufficientMinutes { .. }
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
