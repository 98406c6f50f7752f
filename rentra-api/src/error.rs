use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rentra_booking::BookingError;
use rentra_core::authz::Forbidden;
use rentra_core::StoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<Forbidden> for ApiError {
    fn from(err: Forbidden) -> Self {
        ApiError::Booking(err.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Booking(err.into())
    }
}

/// Machine-readable error code used in response bodies.
fn code(err: &BookingError) -> &'static str {
    match err {
        BookingError::Validation(_) => "validation_error",
        BookingError::InvalidTransition { .. } => "invalid_transition",
        BookingError::Forbidden(_) => "forbidden",
        BookingError::CarUnavailable { .. } => "car_unavailable",
        BookingError::InvalidDepositState { .. } => "invalid_deposit_state",
        BookingError::AlreadyPaid { .. } => "already_paid",
        BookingError::NotFound(_) => "not_found",
        BookingError::Transient(_) => "transient",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", msg.clone())
            }
            ApiError::Booking(err) => {
                let status = match err {
                    BookingError::Validation(_) => StatusCode::BAD_REQUEST,
                    BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
                    BookingError::NotFound(_) => StatusCode::NOT_FOUND,
                    BookingError::InvalidTransition { .. }
                    | BookingError::CarUnavailable { .. }
                    | BookingError::InvalidDepositState { .. }
                    | BookingError::AlreadyPaid { .. } => StatusCode::CONFLICT,
                    BookingError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, code(err), err.to_string())
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": { "code": code, "message": message }
        }));
        (status, body).into_response()
    }
}
