//! Error handling for the Cafeteria Administration backend
//!
//! Every error leaves the service as a JSON body of the form
//! `{"error": {"code", "message", "field"?}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{ClockError, ParseEnumError, ScheduleError, StockError};
use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Insufficient stock of {supply}: requires {required}, {available} available")]
    InsufficientStock {
        supply: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not editable: {0}")]
    NotEditable(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidDate(_) => "INVALID_DATE",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotEditable(_) => "NOT_EDITABLE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::DatabaseError(e) if is_unique_violation(e) => "DUPLICATE_ENTRY",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::ValidationError(_) | AppError::InvalidDate(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateEntry(_) | AppError::Conflict(_) | AppError::NotEditable(_) => {
                StatusCode::CONFLICT
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::DatabaseError(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::Configuration(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Process exit code used by the admin CLI
    pub fn exit_code(&self) -> u8 {
        match self.status() {
            StatusCode::NOT_FOUND => 3,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => 2,
            _ => 1,
        }
    }

    fn detail(&self) -> ErrorDetail {
        let (message, field) = match self {
            AppError::Validation { field, message } => (message.clone(), Some(field.clone())),
            AppError::ValidationError(msg) | AppError::InvalidDate(msg) => (msg.clone(), None),
            AppError::InsufficientStock { supply, .. } => (self.to_string(), Some(supply.clone())),
            AppError::DuplicateEntry(field) => (
                format!("A record with this {} already exists", field),
                Some(field.clone()),
            ),
            AppError::Conflict(msg) | AppError::NotEditable(msg) => (msg.clone(), None),
            AppError::NotFound(resource) => (format!("{} not found", resource), None),
            AppError::Unauthorized(msg) => (msg.clone(), None),
            AppError::InvalidCredentials => ("Invalid email or password".to_string(), None),
            AppError::PermissionDenied(msg) => (msg.clone(), None),
            AppError::DatabaseError(e) if is_unique_violation(e) => {
                ("A record with the same unique value already exists".to_string(), None)
            }
            AppError::DatabaseError(_) => ("A database error occurred".to_string(), None),
            AppError::Configuration(msg) => (format!("Configuration error: {}", msg), None),
            AppError::Internal(msg) => (msg.clone(), None),
            AppError::InternalError(_) => ("An internal server error occurred".to_string(), None),
        };

        ErrorDetail {
            code: self.code().to_string(),
            message,
            field,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!(code = self.code(), "Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: self.detail() })).into_response()
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::InsufficientStock {
                supply_name,
                required,
                available,
                ..
            } => AppError::InsufficientStock {
                supply: supply_name,
                required,
                available,
            },
            StockError::EmptySale => AppError::validation("lines", err.to_string()),
            StockError::NonPositiveQuantity { .. } => AppError::validation("quantity", err.to_string()),
            StockError::UnknownProduct { .. } => AppError::NotFound("Product".to_string()),
            StockError::UnknownSupply { .. } => AppError::NotFound("Supply".to_string()),
            StockError::InactiveProduct { .. } | StockError::IncompatibleUnits { .. } => {
                AppError::ValidationError(err.to_string())
            }
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::InvalidDate(err.to_string())
    }
}

impl From<ClockError> for AppError {
    fn from(err: ClockError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<ParseEnumError> for AppError {
    fn from(err: ParseEnumError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// Attach a field name to the messages returned by `shared::validation`
pub trait FieldCheck {
    fn for_field(self, field: &str) -> AppResult<()>;
}

impl FieldCheck for Result<(), &'static str> {
    fn for_field(self, field: &str) -> AppResult<()> {
        self.map_err(|message| AppError::validation(field, message))
    }
}

/// Map unique-constraint violations to a domain error, pass everything else through
pub trait UniqueViolationExt<T> {
    fn on_unique_violation(self, err: impl FnOnce() -> AppError) -> AppResult<T>;
}

impl<T> UniqueViolationExt<T> for Result<T, sqlx::Error> {
    fn on_unique_violation(self, err: impl FnOnce() -> AppError) -> AppResult<T> {
        self.map_err(|e| if is_unique_violation(&e) { err() } else { AppError::DatabaseError(e) })
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
