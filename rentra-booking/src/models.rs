use chrono::{DateTime, NaiveDate, Utc};
use rentra_pricing::{LineItem, Quote};
use rentra_shared::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Canceled,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Canceled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FineType {
    Damage,
    LateReturn,
    Cleaning,
    Other,
}

impl std::fmt::Display for FineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FineType::Damage => "damage",
            FineType::LateReturn => "late_return",
            FineType::Cleaning => "cleaning",
            FineType::Other => "other",
        };
        f.write_str(s)
    }
}

/// An assessed fine. Append-only: never edited or deleted once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fine {
    pub id: Uuid,
    pub fine_type: FineType,
    pub amount: Money,
    pub notes: Option<String>,
    pub assessed_at: DateTime<Utc>,
}

impl Fine {
    pub fn new(fine_type: FineType, amount: Money, notes: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fine_type,
            amount,
            notes,
            assessed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Held,
    Released,
    PartiallyReleased,
    Forfeited,
}

impl DepositStatus {
    /// Released, partially released and forfeited deposits are terminal:
    /// there is no path back to held.
    pub fn is_terminal(self) -> bool {
        !matches!(self, DepositStatus::Held)
    }
}

impl std::fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DepositStatus::Held => "held",
            DepositStatus::Released => "released",
            DepositStatus::PartiallyReleased => "partially_released",
            DepositStatus::Forfeited => "forfeited",
        };
        f.write_str(s)
    }
}

/// Security deposit ledger entry. At most one per booking, ever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub id: Uuid,
    pub amount: Money,
    pub status: DepositStatus,
    pub txn_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deposit {
    pub fn hold(amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            amount,
            status: DepositStatus::Held,
            txn_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move a held deposit to a terminal disposition. The provider's
    /// transaction reference arrives separately via [`Deposit::record_ref`].
    pub fn settle(&mut self, disposition: DepositStatus) {
        self.status = disposition;
        self.updated_at = Utc::now();
    }

    pub fn record_ref(&mut self, txn_ref: String) {
        self.txn_ref = Some(txn_ref);
        self.updated_at = Utc::now();
    }
}

/// Final bill, generated exactly once when the booking returns. Immutable
/// afterwards except for the paid marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub lines: Vec<LineItem>,
    pub total: Money,
    pub paid_at: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    pub fn mark_paid(&mut self, method: String) {
        let now = Utc::now();
        self.paid_at = Some(now);
        self.method = Some(method);
        self.updated_at = now;
    }

    pub fn record_payment_ref(&mut self, payment_ref: String) {
        self.payment_ref = Some(payment_ref);
        self.updated_at = Utc::now();
    }
}

/// A rental booking. Owns its fines, deposit and invoice; references its
/// car by id only. The quote is locked at creation and never recomputed,
/// so later pricing changes cannot reprice the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer_ref: String,
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub quote: Quote,
    pub fines: Vec<Fine>,
    pub deposit: Option<Deposit>,
    pub invoice: Option<Invoice>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl Booking {
    pub fn new(
        customer_ref: String,
        car_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        quote: Quote,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_ref,
            car_id,
            start_date,
            end_date,
            status: BookingStatus::Pending,
            quote,
            fines: Vec::new(),
            deposit: None,
            invoice: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn fines_total(&self) -> Money {
        self.fines.iter().map(|fine| fine.amount).sum()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_statuses_terminal_except_held() {
        assert!(!DepositStatus::Held.is_terminal());
        assert!(DepositStatus::Released.is_terminal());
        assert!(DepositStatus::PartiallyReleased.is_terminal());
        assert!(DepositStatus::Forfeited.is_terminal());
    }

    #[test]
    fn test_fines_total() {
        let quote = Quote::from_lines(vec![]);
        let mut booking = Booking::new(
            "cust-1".into(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            quote,
        );
        booking
            .fines
            .push(Fine::new(FineType::Damage, Money::from_major(75), None));
        booking
            .fines
            .push(Fine::new(FineType::Cleaning, Money::from_major(25), None));
        assert_eq!(booking.fines_total(), Money::from_major(100));
    }
}
