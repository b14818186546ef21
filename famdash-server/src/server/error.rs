use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::storage::StorageError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lockout_remaining: Option<i64>,
}

#[derive(Debug)]
pub enum AppError {
    Validation(Vec<FieldError>),
    BadRequest(String),
    InsufficientPoints { balance: i64, required: i64 },
    /// Enough points on the ledger, but pending requests already hold them.
    PointsHeld {
        balance: i64,
        available: i64,
        required: i64,
    },
    NotFound(String),
    /// The acting member's role does not allow the operation.
    Forbidden(String),
    Conflict(String),
    PinRejected { remaining_attempts: u32, locked: bool },
    LockedOut { remaining_secs: i64 },
    Unauthorized,
    Internal(String),
}

impl AppError {
    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidInput(m) => AppError::BadRequest(m),
            e if e.is_foreign_key_violation() => {
                AppError::BadRequest("referenced record does not exist".into())
            }
            e => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body, detail) = match self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation failed".into(),
                    fields: Some(fields),
                    ..Default::default()
                },
                None,
            ),
            AppError::BadRequest(m) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: m,
                    ..Default::default()
                },
                None,
            ),
            AppError::InsufficientPoints { balance, required } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "insufficient points".into(),
                    balance: Some(balance),
                    required: Some(required),
                    ..Default::default()
                },
                None,
            ),
            AppError::PointsHeld {
                balance,
                available,
                required,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "insufficient points".into(),
                    balance: Some(balance),
                    available: Some(available),
                    required: Some(required),
                    ..Default::default()
                },
                None,
            ),
            AppError::NotFound(m) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: m,
                    ..Default::default()
                },
                None,
            ),
            AppError::Forbidden(m) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: m,
                    ..Default::default()
                },
                None,
            ),
            AppError::Conflict(m) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: m,
                    ..Default::default()
                },
                None,
            ),
            AppError::PinRejected {
                remaining_attempts,
                locked,
            } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "incorrect PIN".into(),
                    remaining_attempts: Some(remaining_attempts),
                    locked: Some(locked),
                    ..Default::default()
                },
                None,
            ),
            AppError::LockedOut { remaining_secs } => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "too many failed attempts".into(),
                    locked: Some(true),
                    lockout_remaining: Some(remaining_secs),
                    ..Default::default()
                },
                None,
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "PIN session required".into(),
                    ..Default::default()
                },
                None,
            ),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "internal server error".into(),
                    ..Default::default()
                },
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(status = %status, message = %body.error, detail = %detail, "request failed");
        } else {
            tracing::warn!(status = %status, message = %body.error, "request rejected");
        }
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_input_errors_are_client_errors() {
        let err: AppError = StorageError::InvalidInput("bad".into()).into();
        assert!(matches!(err, AppError::BadRequest(m) if m == "bad"));
    }

    #[test]
    fn status_codes_follow_the_error_kind() {
        let cases = [
            (AppError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (
                AppError::InsufficientPoints {
                    balance: 1,
                    required: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::PointsHeld {
                    balance: 15,
                    available: 5,
                    required: 10,
                },
                StatusCode::BAD_REQUEST,
            ),
            (AppError::not_found("x"), StatusCode::NOT_FOUND),
            (AppError::forbidden("x"), StatusCode::FORBIDDEN),
            (AppError::conflict("x"), StatusCode::CONFLICT),
            (
                AppError::PinRejected {
                    remaining_attempts: 4,
                    locked: false,
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::LockedOut { remaining_secs: 10 },
                StatusCode::FORBIDDEN,
            ),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
