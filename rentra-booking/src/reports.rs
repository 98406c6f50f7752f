//! Back-office reports computed straight from the repositories.

use std::sync::Arc;

use chrono::NaiveDate;
use rentra_core::authz::{AuthContext, Permission};
use rentra_fleet::{CarFilter, CarRepository};
use rentra_shared::Money;
use serde::Serialize;

use crate::error::BookingError;
use crate::models::BookingStatus;
use crate::repository::BookingRepository;

#[derive(Debug, Serialize)]
pub struct UtilizationReport {
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub fleet_size: usize,
    /// Fleet capacity over the period, in car-days.
    pub fleet_days: i64,
    /// Rental days falling inside the period, canceled bookings excluded.
    pub booked_days: i64,
    pub utilization_pct: f64,
    pub total_bookings: usize,
}

#[derive(Debug, Serialize)]
pub struct FinancialReport {
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    /// Invoiced rental charges (locked quotes) for rentals in the period.
    pub rental_revenue: Money,
    pub fines_total: Money,
    /// Deposits currently held against bookings in the period.
    pub deposits_held: Money,
    pub invoices_outstanding: Money,
}

pub struct ReportService {
    bookings: Arc<dyn BookingRepository>,
    cars: Arc<dyn CarRepository>,
}

impl ReportService {
    pub fn new(bookings: Arc<dyn BookingRepository>, cars: Arc<dyn CarRepository>) -> Self {
        Self { bookings, cars }
    }

    pub async fn fleet_utilization(
        &self,
        actor: &AuthContext,
        period_from: NaiveDate,
        period_to: NaiveDate,
    ) -> Result<UtilizationReport, BookingError> {
        actor.require(Permission::ViewReports)?;
        if period_to <= period_from {
            return Err(BookingError::Validation(
                "period end must be after period start".to_string(),
            ));
        }

        let fleet_size = self.cars.list(&CarFilter::default()).await?.len();
        let period_days = (period_to - period_from).num_days();
        let fleet_days = fleet_size as i64 * period_days;

        let mut booked_days = 0i64;
        let mut total_bookings = 0usize;
        for booking in self.bookings.list().await? {
            if booking.status == BookingStatus::Canceled {
                continue;
            }
            let from = booking.start_date.max(period_from);
            let to = booking.end_date.min(period_to);
            if to > from {
                booked_days += (to - from).num_days();
                total_bookings += 1;
            }
        }

        let utilization_pct = if fleet_days > 0 {
            (booked_days as f64 / fleet_days as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };
        Ok(UtilizationReport {
            period_from,
            period_to,
            fleet_size,
            fleet_days,
            booked_days,
            utilization_pct,
            total_bookings,
        })
    }

    pub async fn financials(
        &self,
        actor: &AuthContext,
        period_from: NaiveDate,
        period_to: NaiveDate,
    ) -> Result<FinancialReport, BookingError> {
        actor.require(Permission::ViewReports)?;
        if period_to <= period_from {
            return Err(BookingError::Validation(
                "period end must be after period start".to_string(),
            ));
        }

        let mut rental_revenue = Money::ZERO;
        let mut fines_total = Money::ZERO;
        let mut deposits_held = Money::ZERO;
        let mut invoices_outstanding = Money::ZERO;

        for booking in self.bookings.list().await? {
            if booking.start_date >= period_to || booking.end_date <= period_from {
                continue;
            }
            if let Some(invoice) = &booking.invoice {
                rental_revenue += booking.quote.total;
                fines_total += booking.fines_total();
                if !invoice.is_paid() {
                    invoices_outstanding += invoice.total;
                }
            }
            if let Some(deposit) = &booking.deposit {
                if deposit.status == crate::models::DepositStatus::Held {
                    deposits_held += deposit.amount;
                }
            }
        }

        Ok(FinancialReport {
            period_from,
            period_to,
            rental_revenue,
            fines_total,
            deposits_held,
            invoices_outstanding,
        })
    }
}
