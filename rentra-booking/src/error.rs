use rentra_core::authz::Forbidden;
use rentra_core::payment::PaymentError;
use rentra_core::StoreError;
use rentra_fleet::{CarStatus, FleetError};
use rentra_pricing::PricingError;
use uuid::Uuid;

use crate::lifecycle::TransitionViolation;
use crate::models::BookingStatus;

/// Error taxonomy for every booking-facing operation. Each variant
/// carries enough structure (entity id + current state) for the caller
/// to render a precise message; nothing is silently swallowed.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Malformed input; caller-fixable, no state changed.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("booking {booking_id}: cannot transition from {from} to {to}")]
    InvalidTransition {
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("car {car_id} is not available (status: {status})")]
    CarUnavailable { car_id: Uuid, status: CarStatus },

    #[error("booking {booking_id}: deposit state is {state}")]
    InvalidDepositState { booking_id: Uuid, state: String },

    #[error("booking {booking_id}: invoice is already paid")]
    AlreadyPaid { booking_id: Uuid },

    #[error("not found: {0}")]
    NotFound(Uuid),

    /// Infrastructure hiccup; retryable by the caller with backoff. The
    /// core never auto-retries mutating operations, to avoid double
    /// effects.
    #[error("transient failure, retry: {0}")]
    Transient(String),
}

impl From<Forbidden> for BookingError {
    fn from(err: Forbidden) -> Self {
        BookingError::Forbidden(err.to_string())
    }
}

impl From<TransitionViolation> for BookingError {
    fn from(err: TransitionViolation) -> Self {
        // Callers that know the booking id attach it via invalid_transition.
        BookingError::Validation(err.to_string())
    }
}

impl From<PricingError> for BookingError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidRange { .. } => BookingError::Validation(err.to_string()),
            PricingError::CarUnavailable { car_id, status } => {
                BookingError::CarUnavailable { car_id, status }
            }
        }
    }
}

impl From<FleetError> for BookingError {
    fn from(err: FleetError) -> Self {
        match err {
            FleetError::NotFound(id) => BookingError::NotFound(id),
            FleetError::CarUnavailable { car_id, status } => {
                BookingError::CarUnavailable { car_id, status }
            }
            FleetError::Conflict(_) | FleetError::Store(_) => {
                BookingError::Transient(err.to_string())
            }
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => BookingError::NotFound(id),
            StoreError::Duplicate(key) => BookingError::Validation(format!("duplicate: {key}")),
            StoreError::VersionConflict(_) | StoreError::Unavailable(_) => {
                BookingError::Transient(err.to_string())
            }
        }
    }
}

impl From<PaymentError> for BookingError {
    fn from(err: PaymentError) -> Self {
        BookingError::Transient(err.to_string())
    }
}

impl BookingError {
    pub fn invalid_transition(booking_id: Uuid, violation: TransitionViolation) -> Self {
        BookingError::InvalidTransition {
            booking_id,
            from: violation.from,
            to: violation.to,
        }
    }
}
