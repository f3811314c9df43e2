use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marquee_booking::{CommitError, PaymentError, PaymentValidationErrors, SelectionError};
use marquee_core::{BoxError, CoreError};
use marquee_store::{ReservationRepoError, UserRepoError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    InvalidPayment(PaymentValidationErrors),
    NotFoundError(String),
    ConflictError(String),
    PaymentDeclined(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidPayment(errors) => {
                let body = Json(json!({
                    "error": errors.to_string(),
                    "fields": errors.errors,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::PaymentDeclined(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<BoxError> for AppError {
    fn from(err: BoxError) -> Self {
        Self::InternalServerError(err.to_string())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => Self::ValidationError(msg),
            CoreError::NotFound(msg) => Self::NotFoundError(msg),
            CoreError::InternalError(msg) => Self::InternalServerError(msg),
        }
    }
}

impl From<SelectionError> for AppError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::CapacityReached { .. } => Self::ValidationError(err.to_string()),
            SelectionError::NotSelectable { .. } | SelectionError::AlreadySelected(_) => {
                Self::ConflictError(err.to_string())
            }
        }
    }
}

impl From<ReservationRepoError> for AppError {
    fn from(err: ReservationRepoError) -> Self {
        match err {
            ReservationRepoError::NotFound(_) => Self::NotFoundError(err.to_string()),
            other => Self::InternalServerError(other.to_string()),
        }
    }
}

impl From<UserRepoError> for AppError {
    fn from(err: UserRepoError) -> Self {
        match err {
            UserRepoError::UsernameTaken(_) | UserRepoError::EmailTaken(_) => Self::ConflictError(err.to_string()),
            UserRepoError::Storage(e) => Self::InternalServerError(e.to_string()),
        }
    }
}

impl From<CommitError> for AppError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::EmptySelection | CommitError::MissingShowtime => Self::ValidationError(err.to_string()),
            CommitError::InvalidPayment(errors) => Self::InvalidPayment(errors),
            CommitError::ShowtimeNotFound(_) | CommitError::NotFound(_) => Self::NotFoundError(err.to_string()),
            CommitError::InProgress | CommitError::SeatsTaken(_) | CommitError::AlreadyCancelled(_) => {
                Self::ConflictError(err.to_string())
            }
            CommitError::Forbidden(_) => Self::AuthorizationError(err.to_string()),
            CommitError::Payment(PaymentError::Declined(msg)) => Self::PaymentDeclined(msg),
            CommitError::Payment(PaymentError::Provider(msg)) => {
                Self::InternalServerError(format!("Payment provider failed: {}", msg))
            }
            CommitError::Storage(msg) => Self::InternalServerError(msg),
        }
    }
}
