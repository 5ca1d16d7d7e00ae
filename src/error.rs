//! Request-level error taxonomy.
//!
//! Every handler returns `Result<_, AppError>`; each variant maps to one fixed
//! status code and a stable `code` tag so clients can tell failures apart even
//! where the status is shared.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{auth::password::PasswordError, users::StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Token is missing")]
    Unauthenticated,

    #[error("Invalid token")]
    Forbidden,

    #[error("Invalid email or password")]
    UnknownEmail,

    #[error("Password not matched")]
    PasswordMismatch,

    #[error("User does not meet the criteria")]
    IneligibleApplicant,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UnknownEmail => StatusCode::BAD_REQUEST,
            AppError::PasswordMismatch => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::IneligibleApplicant => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::UnknownEmail => "unknown_email",
            AppError::PasswordMismatch => "password_mismatch",
            AppError::IneligibleApplicant => "ineligible_applicant",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::DuplicateEmail => "duplicate_email",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::BalanceOverflow => {
                AppError::InvalidInput("amount would overflow purchase power".into())
            }
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(e) = &self {
            error!(error = ?e, "request failed");
        }
        let body = Json(json!({
            "message": self.to_string(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}
