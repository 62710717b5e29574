//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    AlreadyPublished(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: serde_json::Value) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::InvalidSchema(_) => (StatusCode::BAD_REQUEST, "invalid_schema"),
            AppError::Conflict(_) => (StatusCode::BAD_REQUEST, "conflict"),
            AppError::AlreadyPublished(_) => (StatusCode::BAD_REQUEST, "already_published"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Db(e) => match db_error_class(e) {
                Some(DbErrorClass::Unique) => (StatusCode::BAD_REQUEST, "conflict"),
                Some(DbErrorClass::Data) => (StatusCode::BAD_REQUEST, "validation_error"),
                None => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
            AppError::Io(_) | AppError::Json(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

enum DbErrorClass {
    Unique,
    Data,
}

/// Constraint and data errors raised by Postgres are the client's fault; everything else is ours.
fn db_error_class(e: &sqlx::Error) -> Option<DbErrorClass> {
    let code = e.as_database_error()?.code()?;
    match code.as_ref() {
        "23505" => Some(DbErrorClass::Unique),
        "23502" | "22P02" | "22003" | "22001" | "22007" | "22008" => Some(DbErrorClass::Data),
        _ => None,
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else if let AppError::Db(e) = &self {
            e.as_database_error()
                .map(|d| d.message().to_string())
                .unwrap_or_else(|| self.to_string())
        } else {
            self.to_string()
        };
        let details = match self {
            AppError::Validation { details, .. } => details,
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
