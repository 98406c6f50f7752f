//! End-to-end lifecycle tests: the booking service wired to the
//! in-memory stores and the mock payment provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rentra_booking::{
    Booking, BookingError, BookingPolicy, BookingRepository, BookingService, BookingStatus,
    DepositStatus, FineType, ReportService,
};
use rentra_core::authz::{AuthContext, Role};
use rentra_core::payment::{MockPayProvider, PaymentError, PaymentProvider};
use rentra_core::StoreError;
use uuid::Uuid;
use rentra_fleet::{Car, CarDraft, CarRepository, CarStatus};
use rentra_pricing::{PricingConfig, PricingEngine};
use rentra_shared::{BookingEvent, Money};
use rentra_store::{MemoryBookingStore, MemoryCarStore};
use tokio::sync::broadcast;

/// Strategy-free pricing so expected totals are exactly rate x nights,
/// independent of the date the test runs.
fn flat_pricing() -> PricingEngine {
    PricingEngine::new(PricingConfig {
        duration_thresholds: vec![],
        per_year_depreciation_pct: 0,
        max_depreciation_pct: 0,
        seasons: vec![],
    })
}

struct Harness {
    service: BookingService,
    cars: Arc<dyn CarRepository>,
    bookings: Arc<dyn BookingRepository>,
    events: broadcast::Receiver<BookingEvent>,
}

async fn harness() -> (Harness, Car) {
    let cars: Arc<dyn CarRepository> = Arc::new(MemoryCarStore::new());
    let bookings: Arc<dyn BookingRepository> = Arc::new(MemoryBookingStore::new());
    let (tx, rx) = broadcast::channel(64);

    let car = cars
        .insert(Car::new(CarDraft {
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2022,
            vin: "JTDBU4EE9A9000001".into(),
            body_type: "sedan".into(),
            base_price_per_day: Money::from_major(50),
            odometer: 10_000,
            last_service_at: None,
        }))
        .await
        .unwrap();

    let service = BookingService::new(
        bookings.clone(),
        cars.clone(),
        flat_pricing(),
        Arc::new(MockPayProvider::default()),
        tx,
        BookingPolicy::default(),
    );
    (
        Harness {
            service,
            cars,
            bookings,
            events: rx,
        },
        car,
    )
}

fn customer() -> AuthContext {
    AuthContext::new("cust-1", Role::Customer)
}

fn manager() -> AuthContext {
    AuthContext::new("mgr-1", Role::Manager)
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

async fn car_status(cars: &Arc<dyn CarRepository>, id: uuid::Uuid) -> CarStatus {
    cars.get(id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn test_full_rental_scenario() {
    let (mut h, car) = harness().await;
    let customer = customer();
    let manager = manager();

    // Quote: 3 nights at 50.00
    let quote = h.service.quote(car.id, jan(1), jan(4)).await.unwrap();
    assert_eq!(quote.total, Money::from_major(150));
    assert_eq!(quote.lines.len(), 1);
    assert_eq!(quote.lines[0].label, "base");

    // Create: pending booking, car reserved, 30% deposit suggested
    let created = h
        .service
        .create_booking(&customer, car.id, jan(1), jan(4))
        .await
        .unwrap();
    let id = created.booking.id;
    assert_eq!(created.booking.status, BookingStatus::Pending);
    assert_eq!(created.deposit_suggested, Money::from_major(45));
    assert_eq!(car_status(&h.cars, car.id).await, CarStatus::Reserved);

    let booking = h.service.confirm(&manager, id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);

    let booking = h.service.check_in(&manager, id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Active);
    assert_eq!(car_status(&h.cars, car.id).await, CarStatus::Rented);

    h.service
        .add_fine(&manager, id, FineType::Damage, Money::from_major(75), None)
        .await
        .unwrap();

    // Return: completed, car free again, invoice = quote + fines
    let booking = h.service.return_booking(&manager, id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Completed);
    assert_eq!(car_status(&h.cars, car.id).await, CarStatus::Available);
    let invoice = booking.invoice.as_ref().unwrap();
    assert_eq!(invoice.total, Money::from_major(225));
    let labels: Vec<&str> = invoice.lines.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["base", "damage"]);
    assert!(invoice.paid_at.is_none());

    // Pay once, then fail on the second attempt
    let paid = h
        .service
        .pay_invoice(&customer, id, "card".into())
        .await
        .unwrap();
    assert!(paid.paid_at.is_some());
    assert_eq!(paid.method.as_deref(), Some("card"));

    let err = h
        .service
        .pay_invoice(&customer, id, "card".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::AlreadyPaid { .. }));

    // The channel saw the lifecycle
    let first = h.events.try_recv().unwrap();
    assert!(matches!(first, BookingEvent::BookingCreated { .. }));
}

#[tokio::test]
async fn test_concurrent_creates_one_winner() {
    let (h, car) = harness().await;
    let alice = AuthContext::new("alice", Role::Customer);
    let bob = AuthContext::new("bob", Role::Customer);

    let (a, b) = tokio::join!(
        h.service.create_booking(&alice, car.id, jan(1), jan(4)),
        h.service.create_booking(&bob, car.id, jan(1), jan(4)),
    );

    let outcomes = [a, b];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    let loss = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loss.as_ref().unwrap_err(),
        BookingError::CarUnavailable { .. }
    ));
    assert_eq!(car_status(&h.cars, car.id).await, CarStatus::Reserved);
}

#[tokio::test]
async fn test_invalid_transition_leaves_state_unchanged() {
    let (h, car) = harness().await;
    let created = h
        .service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();

    // Cannot check in a pending booking
    let err = h
        .service
        .check_in(&manager(), created.booking.id)
        .await
        .unwrap_err();
    match err {
        BookingError::InvalidTransition { from, to, .. } => {
            assert_eq!(from, BookingStatus::Pending);
            assert_eq!(to, BookingStatus::Active);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }

    let booking = h
        .service
        .get_booking(&manager(), created.booking.id)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(car_status(&h.cars, car.id).await, CarStatus::Reserved);
}

#[tokio::test]
async fn test_cancel_releases_car_and_held_deposit() {
    let (h, car) = harness().await;
    let customer = customer();
    let manager = manager();
    let created = h
        .service
        .create_booking(&customer, car.id, jan(1), jan(4))
        .await
        .unwrap();
    let id = created.booking.id;

    h.service.confirm(&manager, id).await.unwrap();
    h.service
        .hold_deposit(&manager, id, Money::from_major(45))
        .await
        .unwrap();

    let booking = h.service.cancel(&customer, id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Canceled);
    assert_eq!(car_status(&h.cars, car.id).await, CarStatus::Available);
    let deposit = booking.deposit.as_ref().unwrap();
    assert_eq!(deposit.status, DepositStatus::Released);

    // Terminal: no further lifecycle moves
    let err = h.service.cancel(&customer, id).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_cancel_forbidden_for_other_customer() {
    let (h, car) = harness().await;
    let created = h
        .service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();

    let stranger = AuthContext::new("cust-2", Role::Customer);
    let err = h
        .service
        .cancel(&stranger, created.booking.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden(_)));
}

#[tokio::test]
async fn test_transitions_require_staff_role() {
    let (h, car) = harness().await;
    let customer = customer();
    let created = h
        .service
        .create_booking(&customer, car.id, jan(1), jan(4))
        .await
        .unwrap();
    let id = created.booking.id;

    let err = h.service.confirm(&customer, id).await.unwrap_err();
    assert!(matches!(err, BookingError::Forbidden(_)));
    let err = h
        .service
        .add_fine(&customer, id, FineType::Other, Money::from_major(10), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden(_)));
}

#[tokio::test]
async fn test_deposit_disposition_is_terminal() {
    let (h, car) = harness().await;
    let manager = manager();
    let created = h
        .service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();
    let id = created.booking.id;
    h.service.confirm(&manager, id).await.unwrap();
    h.service.check_in(&manager, id).await.unwrap();

    h.service
        .hold_deposit(&manager, id, Money::from_major(45))
        .await
        .unwrap();
    let deposit = h.service.release_deposit(&manager, id, true).await.unwrap();
    assert_eq!(deposit.status, DepositStatus::PartiallyReleased);

    // No re-hold, no forfeit after settlement
    let err = h
        .service
        .hold_deposit(&manager, id, Money::from_major(45))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidDepositState { .. }));
    let err = h.service.forfeit_deposit(&manager, id).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidDepositState { .. }));
}

#[tokio::test]
async fn test_deposit_hold_requires_confirmed_or_active() {
    let (h, car) = harness().await;
    let created = h
        .service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();

    let err = h
        .service
        .hold_deposit(&manager(), created.booking.id, Money::from_major(45))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidDepositState { .. }));
}

#[tokio::test]
async fn test_fines_after_invoice_do_not_reprice_it() {
    let (h, car) = harness().await;
    let manager = manager();
    let created = h
        .service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();
    let id = created.booking.id;
    h.service.confirm(&manager, id).await.unwrap();
    h.service.check_in(&manager, id).await.unwrap();
    h.service.return_booking(&manager, id).await.unwrap();

    // Post-return fine is recorded but the invoice stays as generated
    h.service
        .add_fine(
            &manager,
            id,
            FineType::LateReturn,
            Money::from_major(30),
            Some("returned after hours".into()),
        )
        .await
        .unwrap();

    let booking = h.service.get_booking(&manager, id).await.unwrap();
    assert_eq!(booking.fines.len(), 1);
    assert_eq!(
        booking.invoice.as_ref().unwrap().total,
        Money::from_major(150)
    );
}

#[tokio::test]
async fn test_pay_before_return_is_rejected() {
    let (h, car) = harness().await;
    let created = h
        .service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();

    let err = h
        .service
        .pay_invoice(&customer(), created.booking.id, "card".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_utilization_counts_booked_days_in_period() {
    let (h, car) = harness().await;
    let manager = manager();
    h.service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();

    let reports = ReportService::new(h.bookings.clone(), h.cars.clone());
    let report = reports
        .fleet_utilization(
            &manager,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(report.fleet_size, 1);
    assert_eq!(report.fleet_days, 30);
    assert_eq!(report.booked_days, 3);
    assert_eq!(report.total_bookings, 1);
    assert_eq!(report.utilization_pct, 10.0);
}

#[tokio::test]
async fn test_quote_rejects_service_car_and_bad_range() {
    let (h, car) = harness().await;

    let err = h.service.quote(car.id, jan(4), jan(1)).await.unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    let mut flagged = h.cars.get(car.id).await.unwrap().unwrap();
    flagged.status = CarStatus::Service;
    // direct write through the repository version check
    let flagged = h.cars.update(flagged).await.unwrap();
    let err = h
        .service
        .quote(flagged.id, jan(1), jan(4))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::CarUnavailable { .. }));
}

/// Booking store that loses the next optimistic write, the way a racing
/// writer bumping the version first would force it to.
struct ContendedBookingStore {
    inner: MemoryBookingStore,
    fail_next_update: AtomicBool,
}

impl ContendedBookingStore {
    fn new() -> Self {
        Self {
            inner: MemoryBookingStore::new(),
            fail_next_update: AtomicBool::new(false),
        }
    }

    fn lose_next_write(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookingRepository for ContendedBookingStore {
    async fn insert(&self, booking: Booking) -> Result<Booking, StoreError> {
        self.inner.insert(booking).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        self.inner.list().await
    }

    async fn list_for_customer(&self, customer_ref: &str) -> Result<Vec<Booking>, StoreError> {
        self.inner.list_for_customer(customer_ref).await
    }

    async fn update(&self, booking: Booking) -> Result<Booking, StoreError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(StoreError::VersionConflict(booking.id));
        }
        self.inner.update(booking).await
    }
}

#[derive(Default)]
struct CountingProvider {
    holds: AtomicUsize,
    releases: AtomicUsize,
}

#[async_trait]
impl PaymentProvider for CountingProvider {
    async fn hold_deposit(&self, booking_id: Uuid, _amount: Money) -> Result<String, PaymentError> {
        self.holds.fetch_add(1, Ordering::SeqCst);
        Ok(format!("hold-{}", booking_id.simple()))
    }

    async fn release_deposit(
        &self,
        booking_id: Uuid,
        _amount: Money,
    ) -> Result<String, PaymentError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(format!("release-{}", booking_id.simple()))
    }

    async fn forfeit_deposit(
        &self,
        booking_id: Uuid,
        _amount: Money,
    ) -> Result<String, PaymentError> {
        Ok(format!("forfeit-{}", booking_id.simple()))
    }

    async fn pay_invoice(
        &self,
        booking_id: Uuid,
        _amount: Money,
        _method: &str,
    ) -> Result<String, PaymentError> {
        Ok(format!("invoice-{}", booking_id.simple()))
    }
}

/// Provider whose settlement calls fail, as an unreachable payment rail.
struct UnreachableSettlement;

#[async_trait]
impl PaymentProvider for UnreachableSettlement {
    async fn hold_deposit(&self, booking_id: Uuid, _amount: Money) -> Result<String, PaymentError> {
        Ok(format!("hold-{}", booking_id.simple()))
    }

    async fn release_deposit(&self, _id: Uuid, _amount: Money) -> Result<String, PaymentError> {
        Err(PaymentError::Unreachable("payment rail down".to_string()))
    }

    async fn forfeit_deposit(&self, _id: Uuid, _amount: Money) -> Result<String, PaymentError> {
        Err(PaymentError::Unreachable("payment rail down".to_string()))
    }

    async fn pay_invoice(
        &self,
        _id: Uuid,
        _amount: Money,
        _method: &str,
    ) -> Result<String, PaymentError> {
        Err(PaymentError::Unreachable("payment rail down".to_string()))
    }
}

async fn active_booking_with_deposit(
    service: &BookingService,
    cars: &Arc<dyn CarRepository>,
) -> Uuid {
    let manager = manager();
    let car = cars
        .insert(Car::new(CarDraft {
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2022,
            vin: "2HGFC2F59NH000001".into(),
            body_type: "sedan".into(),
            base_price_per_day: Money::from_major(50),
            odometer: 5_000,
            last_service_at: None,
        }))
        .await
        .unwrap();
    let created = service
        .create_booking(&customer(), car.id, jan(1), jan(4))
        .await
        .unwrap();
    let id = created.booking.id;
    service.confirm(&manager, id).await.unwrap();
    service.check_in(&manager, id).await.unwrap();
    service
        .hold_deposit(&manager, id, Money::from_major(45))
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn test_lost_settle_race_never_reaches_provider() {
    let cars: Arc<dyn CarRepository> = Arc::new(MemoryCarStore::new());
    let store = Arc::new(ContendedBookingStore::new());
    let provider = Arc::new(CountingProvider::default());
    let (tx, _rx) = broadcast::channel(64);
    let service = BookingService::new(
        store.clone(),
        cars.clone(),
        flat_pricing(),
        provider.clone(),
        tx,
        BookingPolicy::default(),
    );
    let manager = manager();
    let id = active_booking_with_deposit(&service, &cars).await;
    assert_eq!(provider.holds.load(Ordering::SeqCst), 1);

    // The settle commit loses its version race: no money may move.
    store.lose_next_write();
    let err = service
        .release_deposit(&manager, id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Transient(_)));
    assert_eq!(provider.releases.load(Ordering::SeqCst), 0);
    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.deposit.as_ref().unwrap().status, DepositStatus::Held);

    // The retry wins and releases exactly once.
    let deposit = service.release_deposit(&manager, id, false).await.unwrap();
    assert_eq!(deposit.status, DepositStatus::Released);
    assert_eq!(provider.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_provider_failure_rolls_back_settlement() {
    let cars: Arc<dyn CarRepository> = Arc::new(MemoryCarStore::new());
    let store: Arc<dyn BookingRepository> = Arc::new(MemoryBookingStore::new());
    let (tx, _rx) = broadcast::channel(64);
    let service = BookingService::new(
        store.clone(),
        cars.clone(),
        flat_pricing(),
        Arc::new(UnreachableSettlement),
        tx,
        BookingPolicy::default(),
    );
    let manager = manager();
    let id = active_booking_with_deposit(&service, &cars).await;

    let err = service.forfeit_deposit(&manager, id).await.unwrap_err();
    assert!(matches!(err, BookingError::Transient(_)));

    // The committed disposition was rolled back; the deposit can still
    // be settled once the provider recovers.
    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.deposit.as_ref().unwrap().status, DepositStatus::Held);
}
