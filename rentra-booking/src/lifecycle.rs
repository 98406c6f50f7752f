//! Pure transition rules for the booking state machine. No storage, no
//! side effects: the orchestrating service consults these and commits.

use rentra_fleet::CarStatus;

use crate::models::BookingStatus;

/// Transition targets reachable from each state. Terminal states map to
/// an empty slice.
pub fn allowed_targets(from: BookingStatus) -> &'static [BookingStatus] {
    match from {
        BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Canceled],
        BookingStatus::Confirmed => &[BookingStatus::Active, BookingStatus::Canceled],
        BookingStatus::Active => &[BookingStatus::Completed],
        BookingStatus::Completed | BookingStatus::Canceled => &[],
    }
}

/// A transition attempted outside the table. Never silently ignored.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("cannot transition booking from {from} to {to}")]
pub struct TransitionViolation {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

pub fn ensure_transition(
    from: BookingStatus,
    to: BookingStatus,
) -> Result<(), TransitionViolation> {
    if allowed_targets(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionViolation { from, to })
    }
}

/// Car status driven by a booking entering the given state. `None` means
/// the car does not move (confirm changes only the booking itself;
/// reservation already happened at creation).
pub fn car_status_on(status: BookingStatus) -> Option<CarStatus> {
    match status {
        BookingStatus::Active => Some(CarStatus::Rented),
        BookingStatus::Completed | BookingStatus::Canceled => Some(CarStatus::Available),
        BookingStatus::Pending | BookingStatus::Confirmed => None,
    }
}
