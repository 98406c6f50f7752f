use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rentra_core::authz::{AuthContext, Permission, Role};
use rentra_core::payment::PaymentProvider;
use rentra_fleet::{CarRepository, FleetInventory};
use rentra_pricing::{PricingEngine, Quote};
use rentra_shared::{BookingEvent, Money};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::BookingError;
use crate::invoice::InvoiceBuilder;
use crate::lifecycle;
use crate::models::{Booking, BookingStatus, Deposit, DepositStatus, Fine, FineType, Invoice};
use crate::repository::BookingRepository;

/// Business-rule knobs loaded from app config.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Suggested deposit as a percentage of the locked quote total.
    pub deposit_rate_pct: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            deposit_rate_pct: 30,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub deposit_suggested: Money,
}

/// Gate for every mutating booking operation. Transitions commit the
/// booking row first (the optimistic version picks a single winner among
/// concurrent callers), then apply the inventory side effect, rolling
/// the status back if the side effect fails.
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    cars: Arc<dyn CarRepository>,
    inventory: FleetInventory,
    pricing: PricingEngine,
    payments: Arc<dyn PaymentProvider>,
    events: broadcast::Sender<BookingEvent>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        cars: Arc<dyn CarRepository>,
        pricing: PricingEngine,
        payments: Arc<dyn PaymentProvider>,
        events: broadcast::Sender<BookingEvent>,
        policy: BookingPolicy,
    ) -> Self {
        let inventory = FleetInventory::new(cars.clone());
        Self {
            bookings,
            cars,
            inventory,
            pricing,
            payments,
            events,
            policy,
        }
    }

    /// Price a rental without touching any state.
    pub async fn quote(
        &self,
        car_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Quote, BookingError> {
        let car = self
            .cars
            .get(car_id)
            .await?
            .ok_or(BookingError::NotFound(car_id))?;
        Ok(self.pricing.quote(&car, start_date, end_date, Utc::now())?)
    }

    /// Create a booking: lock the quote, reserve the car, persist as
    /// pending. Reservation is a compare-and-set, so two concurrent
    /// creates against the same car end with exactly one pending booking.
    pub async fn create_booking(
        &self,
        actor: &AuthContext,
        car_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<CreatedBooking, BookingError> {
        if actor.role != Role::Customer {
            return Err(BookingError::Forbidden(
                "bookings are created by customers".to_string(),
            ));
        }
        let car = self
            .cars
            .get(car_id)
            .await?
            .ok_or(BookingError::NotFound(car_id))?;
        let quote = self.pricing.quote(&car, start_date, end_date, Utc::now())?;

        self.inventory.reserve(car_id).await?;

        let booking = Booking::new(
            actor.subject.clone(),
            car_id,
            start_date,
            end_date,
            quote.clone(),
        );
        let booking = match self.bookings.insert(booking).await {
            Ok(booking) => booking,
            Err(err) => {
                // The car must not stay reserved for a booking that was
                // never written.
                if let Err(release_err) = self.inventory.release(car_id).await {
                    tracing::error!(%car_id, error = %release_err, "failed to release car after aborted create");
                }
                return Err(err.into());
            }
        };

        tracing::info!(booking_id = %booking.id, %car_id, "booking created");
        self.publish(BookingEvent::BookingCreated {
            booking_id: booking.id,
            car_id,
            occurred_at: Utc::now().timestamp(),
        });

        let deposit_suggested = quote.total.percent(self.policy.deposit_rate_pct);
        Ok(CreatedBooking {
            booking,
            deposit_suggested,
        })
    }

    pub async fn confirm(&self, actor: &AuthContext, id: Uuid) -> Result<Booking, BookingError> {
        actor.require(Permission::OperateBookings)?;
        let mut booking = self.load(id).await?;
        lifecycle::ensure_transition(booking.status, BookingStatus::Confirmed)
            .map_err(|v| BookingError::invalid_transition(id, v))?;
        booking.status = BookingStatus::Confirmed;
        booking.touch();
        let booking = self.bookings.update(booking).await?;
        self.publish(BookingEvent::BookingConfirmed {
            booking_id: id,
            occurred_at: Utc::now().timestamp(),
        });
        Ok(booking)
    }

    pub async fn check_in(&self, actor: &AuthContext, id: Uuid) -> Result<Booking, BookingError> {
        actor.require(Permission::OperateBookings)?;
        let mut booking = self.load(id).await?;
        lifecycle::ensure_transition(booking.status, BookingStatus::Active)
            .map_err(|v| BookingError::invalid_transition(id, v))?;
        let previous = booking.status;
        booking.status = BookingStatus::Active;
        booking.touch();
        let booking = self.bookings.update(booking).await?;

        if let Err(err) = self.inventory.mark_rented(booking.car_id).await {
            self.rollback_status(&booking, previous).await;
            return Err(err.into());
        }

        self.publish(BookingEvent::BookingCheckedIn {
            booking_id: id,
            occurred_at: Utc::now().timestamp(),
        });
        Ok(booking)
    }

    /// Return transition: completes the booking, generates the invoice
    /// from the locked quote plus fines recorded so far, and frees the
    /// car. Invoice creation and the status change commit together.
    pub async fn return_booking(
        &self,
        actor: &AuthContext,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        actor.require(Permission::OperateBookings)?;
        let mut booking = self.load(id).await?;
        lifecycle::ensure_transition(booking.status, BookingStatus::Completed)
            .map_err(|v| BookingError::invalid_transition(id, v))?;

        let previous = booking.status;
        let invoice = InvoiceBuilder::new()
            .with_quote(&booking.quote)
            .with_fines(&booking.fines)
            .build();
        booking.status = BookingStatus::Completed;
        booking.invoice = Some(invoice);
        booking.touch();
        let booking = self.bookings.update(booking).await?;

        if let Err(err) = self.inventory.release(booking.car_id).await {
            let mut revert = booking.clone();
            revert.status = previous;
            revert.invoice = None;
            revert.touch();
            if let Err(rollback) = self.bookings.update(revert).await {
                tracing::error!(booking_id = %id, error = %rollback, "rollback after failed car release also failed");
            }
            return Err(err.into());
        }

        tracing::info!(booking_id = %id, "booking completed, invoice generated");
        self.publish(BookingEvent::CarReturned {
            booking_id: id,
            car_id: booking.car_id,
            occurred_at: Utc::now().timestamp(),
        });
        Ok(booking)
    }

    /// Cancellation, allowed to the booking's own customer as well as
    /// staff. A deposit still held at cancellation is released in full.
    pub async fn cancel(&self, actor: &AuthContext, id: Uuid) -> Result<Booking, BookingError> {
        let mut booking = self.load(id).await?;
        if actor.role == Role::Customer && !actor.is_subject(&booking.customer_ref) {
            return Err(BookingError::Forbidden(
                "only the booking's customer or staff may cancel".to_string(),
            ));
        }
        lifecycle::ensure_transition(booking.status, BookingStatus::Canceled)
            .map_err(|v| BookingError::invalid_transition(id, v))?;

        let previous = booking.status;
        let mut release_amount = None;
        if let Some(deposit) = booking.deposit.as_mut() {
            if deposit.status == DepositStatus::Held {
                deposit.settle(DepositStatus::Released);
                release_amount = Some(deposit.amount);
            }
        }
        booking.status = BookingStatus::Canceled;
        booking.touch();
        let mut booking = self.bookings.update(booking).await?;

        if let Err(err) = self.inventory.release(booking.car_id).await {
            let mut revert = booking.clone();
            revert.status = previous;
            if release_amount.is_some() {
                if let Some(deposit) = revert.deposit.as_mut() {
                    deposit.settle(DepositStatus::Held);
                }
            }
            revert.touch();
            if let Err(rollback) = self.bookings.update(revert).await {
                tracing::error!(booking_id = %id, error = %rollback, "rollback after failed car release also failed");
            }
            return Err(err.into());
        }

        self.publish(BookingEvent::BookingCanceled {
            booking_id: id,
            occurred_at: Utc::now().timestamp(),
        });

        // Provider release runs only after the winning commit, so a retried
        // cancel can never release twice. A provider failure at this point
        // leaves the recorded disposition standing and is settled out of
        // band.
        if let Some(amount) = release_amount {
            match self.payments.release_deposit(id, amount).await {
                Ok(txn_ref) => {
                    if let Some(deposit) = booking.deposit.as_mut() {
                        deposit.record_ref(txn_ref);
                    }
                    self.store_refs(&booking).await;
                    self.publish(BookingEvent::DepositSettled {
                        booking_id: id,
                        disposition: DepositStatus::Released.to_string(),
                        occurred_at: Utc::now().timestamp(),
                    });
                }
                Err(err) => {
                    tracing::error!(booking_id = %id, error = %err, "deposit release failed after cancellation, needs manual settlement");
                }
            }
        }
        Ok(booking)
    }

    /// Record a fine. Append-only; allowed in every non-canceled state,
    /// including after return (a post-return fine simply never reaches
    /// the already-generated invoice).
    pub async fn add_fine(
        &self,
        actor: &AuthContext,
        id: Uuid,
        fine_type: FineType,
        amount: Money,
        notes: Option<String>,
    ) -> Result<Fine, BookingError> {
        actor.require(Permission::AssessFines)?;
        if amount <= Money::ZERO {
            return Err(BookingError::Validation(
                "fine amount must be greater than zero".to_string(),
            ));
        }
        let mut booking = self.load(id).await?;
        if booking.status == BookingStatus::Canceled {
            return Err(BookingError::Validation(
                "cannot assess a fine on a canceled booking".to_string(),
            ));
        }
        let fine = Fine::new(fine_type, amount, notes);
        booking.fines.push(fine.clone());
        booking.touch();
        self.bookings.update(booking).await?;
        self.publish(BookingEvent::FineAssessed {
            booking_id: id,
            fine_id: fine.id,
            occurred_at: Utc::now().timestamp(),
        });
        Ok(fine)
    }

    pub async fn list_fines(
        &self,
        actor: &AuthContext,
        id: Uuid,
    ) -> Result<Vec<Fine>, BookingError> {
        let booking = self.visible_booking(actor, id).await?;
        Ok(booking.fines)
    }

    /// Hold the security deposit. Valid only while the booking is
    /// confirmed or active and no deposit has ever been taken; a settled
    /// deposit is terminal, so there is no re-hold.
    pub async fn hold_deposit(
        &self,
        actor: &AuthContext,
        id: Uuid,
        amount: Money,
    ) -> Result<Deposit, BookingError> {
        actor.require(Permission::SettleDeposits)?;
        if amount <= Money::ZERO {
            return Err(BookingError::Validation(
                "deposit amount must be greater than zero".to_string(),
            ));
        }
        let mut booking = self.load(id).await?;
        if !matches!(
            booking.status,
            BookingStatus::Confirmed | BookingStatus::Active
        ) {
            return Err(BookingError::InvalidDepositState {
                booking_id: id,
                state: format!("booking is {}", booking.status),
            });
        }
        if let Some(existing) = &booking.deposit {
            return Err(BookingError::InvalidDepositState {
                booking_id: id,
                state: existing.status.to_string(),
            });
        }
        booking.deposit = Some(Deposit::hold(amount));
        booking.touch();
        // The commit is the single winner among concurrent holds; the
        // provider hold happens only after it.
        let mut booking = self.bookings.update(booking).await?;

        let txn_ref = match self.payments.hold_deposit(id, amount).await {
            Ok(txn_ref) => txn_ref,
            Err(err) => {
                let mut revert = booking.clone();
                revert.deposit = None;
                revert.touch();
                if let Err(rollback) = self.bookings.update(revert).await {
                    tracing::error!(booking_id = %id, error = %rollback, "deposit rollback after provider failure also failed");
                }
                return Err(err.into());
            }
        };

        let deposit = match booking.deposit.as_mut() {
            Some(deposit) => {
                deposit.record_ref(txn_ref);
                deposit.clone()
            }
            None => {
                return Err(BookingError::InvalidDepositState {
                    booking_id: id,
                    state: "missing".to_string(),
                })
            }
        };
        self.store_refs(&booking).await;
        Ok(deposit)
    }

    pub async fn release_deposit(
        &self,
        actor: &AuthContext,
        id: Uuid,
        partial: bool,
    ) -> Result<Deposit, BookingError> {
        let disposition = if partial {
            DepositStatus::PartiallyReleased
        } else {
            DepositStatus::Released
        };
        self.settle_deposit(actor, id, disposition).await
    }

    pub async fn forfeit_deposit(
        &self,
        actor: &AuthContext,
        id: Uuid,
    ) -> Result<Deposit, BookingError> {
        self.settle_deposit(actor, id, DepositStatus::Forfeited).await
    }

    /// Pay the invoice. Settlement of the deposit is independent; only
    /// the paid marker moves here, exactly once.
    pub async fn pay_invoice(
        &self,
        actor: &AuthContext,
        id: Uuid,
        method: String,
    ) -> Result<Invoice, BookingError> {
        let mut booking = self.load(id).await?;
        if actor.role == Role::Customer && !actor.is_subject(&booking.customer_ref) {
            return Err(BookingError::Forbidden(
                "only the booking's customer or staff may pay the invoice".to_string(),
            ));
        }
        let invoice = booking
            .invoice
            .as_mut()
            .ok_or_else(|| BookingError::Validation("invoice not yet generated".to_string()))?;
        if invoice.is_paid() {
            return Err(BookingError::AlreadyPaid { booking_id: id });
        }
        let total = invoice.total;
        invoice.mark_paid(method.clone());
        booking.touch();
        // The paid marker commits before the charge; of two racing payment
        // attempts only one reaches the provider.
        let mut booking = self.bookings.update(booking).await?;

        let payment_ref = match self.payments.pay_invoice(id, total, &method).await {
            Ok(payment_ref) => payment_ref,
            Err(err) => {
                let mut revert = booking.clone();
                if let Some(invoice) = revert.invoice.as_mut() {
                    invoice.paid_at = None;
                    invoice.method = None;
                    invoice.updated_at = Utc::now();
                }
                revert.touch();
                if let Err(rollback) = self.bookings.update(revert).await {
                    tracing::error!(booking_id = %id, error = %rollback, "invoice rollback after provider failure also failed");
                }
                return Err(err.into());
            }
        };

        let paid = match booking.invoice.as_mut() {
            Some(invoice) => {
                invoice.record_payment_ref(payment_ref);
                invoice.clone()
            }
            None => {
                return Err(BookingError::Validation(
                    "invoice not yet generated".to_string(),
                ))
            }
        };
        self.store_refs(&booking).await;
        self.publish(BookingEvent::InvoicePaid {
            booking_id: id,
            occurred_at: Utc::now().timestamp(),
        });
        Ok(paid)
    }

    pub async fn get_booking(
        &self,
        actor: &AuthContext,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        self.visible_booking(actor, id).await
    }

    /// Staff see the whole book; customers only their own rentals.
    pub async fn list_bookings(&self, actor: &AuthContext) -> Result<Vec<Booking>, BookingError> {
        if actor.role == Role::Customer {
            Ok(self.bookings.list_for_customer(&actor.subject).await?)
        } else {
            Ok(self.bookings.list().await?)
        }
    }

    async fn settle_deposit(
        &self,
        actor: &AuthContext,
        id: Uuid,
        disposition: DepositStatus,
    ) -> Result<Deposit, BookingError> {
        actor.require(Permission::SettleDeposits)?;
        let mut booking = self.load(id).await?;
        if !matches!(
            booking.status,
            BookingStatus::Active | BookingStatus::Completed
        ) {
            return Err(BookingError::InvalidDepositState {
                booking_id: id,
                state: format!("booking is {}", booking.status),
            });
        }
        let deposit = booking
            .deposit
            .as_mut()
            .ok_or_else(|| BookingError::InvalidDepositState {
                booking_id: id,
                state: "missing".to_string(),
            })?;
        if deposit.status != DepositStatus::Held {
            return Err(BookingError::InvalidDepositState {
                booking_id: id,
                state: deposit.status.to_string(),
            });
        }
        let amount = deposit.amount;
        deposit.settle(disposition);
        booking.touch();
        // Commit the disposition first; a lost version race aborts here
        // with no external money movement, so a retry settles exactly once.
        let mut booking = self.bookings.update(booking).await?;

        let moved = match disposition {
            DepositStatus::Forfeited => self.payments.forfeit_deposit(id, amount).await,
            _ => self.payments.release_deposit(id, amount).await,
        };
        let txn_ref = match moved {
            Ok(txn_ref) => txn_ref,
            Err(err) => {
                let mut revert = booking.clone();
                if let Some(deposit) = revert.deposit.as_mut() {
                    deposit.settle(DepositStatus::Held);
                }
                revert.touch();
                if let Err(rollback) = self.bookings.update(revert).await {
                    tracing::error!(booking_id = %id, error = %rollback, "deposit rollback after provider failure also failed");
                }
                return Err(err.into());
            }
        };

        let settled = match booking.deposit.as_mut() {
            Some(deposit) => {
                deposit.record_ref(txn_ref);
                deposit.clone()
            }
            None => {
                return Err(BookingError::InvalidDepositState {
                    booking_id: id,
                    state: "missing".to_string(),
                })
            }
        };
        self.store_refs(&booking).await;
        self.publish(BookingEvent::DepositSettled {
            booking_id: id,
            disposition: disposition.to_string(),
            occurred_at: Utc::now().timestamp(),
        });
        Ok(settled)
    }

    async fn visible_booking(
        &self,
        actor: &AuthContext,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        let booking = self.load(id).await?;
        if actor.role == Role::Customer && !actor.is_subject(&booking.customer_ref) {
            return Err(BookingError::Forbidden(
                "booking belongs to another customer".to_string(),
            ));
        }
        Ok(booking)
    }

    async fn load(&self, id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .get(id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    /// Write back provider transaction refs recorded after a commit. The
    /// refs are bookkeeping, not state machine input, so a lost version
    /// race here is logged rather than retried.
    async fn store_refs(&self, booking: &Booking) {
        let mut with_refs = booking.clone();
        with_refs.touch();
        if let Err(err) = self.bookings.update(with_refs).await {
            tracing::warn!(booking_id = %booking.id, error = %err, "could not record provider transaction ref");
        }
    }

    async fn rollback_status(&self, committed: &Booking, previous: BookingStatus) {
        let mut revert = committed.clone();
        revert.status = previous;
        revert.touch();
        if let Err(err) = self.bookings.update(revert).await {
            tracing::error!(booking_id = %committed.id, error = %err, "status rollback failed");
        }
    }

    fn publish(&self, event: BookingEvent) {
        // Nobody listening is fine; the channel is best-effort fan-out.
        let _ = self.events.send(event);
    }
}
