use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain events published on the booking broadcast channel and streamed
/// to back-office clients over SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookingEvent {
    BookingCreated {
        booking_id: Uuid,
        car_id: Uuid,
        occurred_at: i64,
    },
    BookingConfirmed {
        booking_id: Uuid,
        occurred_at: i64,
    },
    BookingCheckedIn {
        booking_id: Uuid,
        occurred_at: i64,
    },
    CarReturned {
        booking_id: Uuid,
        car_id: Uuid,
        occurred_at: i64,
    },
    BookingCanceled {
        booking_id: Uuid,
        occurred_at: i64,
    },
    FineAssessed {
        booking_id: Uuid,
        fine_id: Uuid,
        occurred_at: i64,
    },
    DepositSettled {
        booking_id: Uuid,
        disposition: String,
        occurred_at: i64,
    },
    InvoicePaid {
        booking_id: Uuid,
        occurred_at: i64,
    },
}
