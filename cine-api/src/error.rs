use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use cine_booking::{BookingError, SessionError};
use cine_catalog::InventoryError;

#[derive(Debug)]
pub enum ApiError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    GoneError(String),
    PaymentRequiredError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            ApiError::GoneError(msg) => (StatusCode::GONE, msg),
            ApiError::PaymentRequiredError(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Session(session) => session.into(),
            BookingError::SeatConflict => ApiError::ConflictError(err_msg(&err)),
            BookingError::PaymentFailed => ApiError::PaymentRequiredError(err_msg(&err)),
            BookingError::BookingUsed(_) => ApiError::ConflictError(err_msg(&err)),
            BookingError::UnknownMovie(_)
            | BookingError::UnknownCinema(_)
            | BookingError::UnknownShowtime(_)
            | BookingError::UnknownBooking(_) => ApiError::NotFoundError(err_msg(&err)),
            BookingError::NotOwner => ApiError::AuthorizationError(err_msg(&err)),
            BookingError::Inventory(inventory) => inventory.into(),
            BookingError::CodeAllocation => ApiError::InternalServerError(err_msg(&err)),
            BookingError::Store(store) => ApiError::InternalServerError(store.to_string()),
            BookingError::Payment(payment) => ApiError::InternalServerError(payment.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::InvalidStateTransition { .. } => ApiError::ConflictError(err_msg(&err)),
            SessionError::Expired => ApiError::GoneError(err_msg(&err)),
            SessionError::EmptySelection
            | SessionError::InvalidPaymentMethod(_)
            | SessionError::UnknownSeat(_)
            | SessionError::DuplicateSeat(_)
            | SessionError::Concession(_) => ApiError::ValidationError(err_msg(&err)),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match &err {
            InventoryError::UnknownShowtime(_) => ApiError::NotFoundError(err_msg(&err)),
            InventoryError::SeatUnavailable { .. }
            | InventoryError::InsufficientCapacity { .. } => ApiError::ConflictError(err_msg(&err)),
            InventoryError::SelectionMismatch(_) | InventoryError::InvalidSelection(_) => {
                ApiError::ValidationError(err_msg(&err))
            }
            InventoryError::Store(store) => ApiError::InternalServerError(store.to_string()),
        }
    }
}

fn err_msg(err: &dyn std::error::Error) -> String {
    err.to_string()
}
