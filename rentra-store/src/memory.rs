//! In-memory repositories behind the persistence boundary. Every write
//! goes through a per-store lock and an entity version check, so the
//! optimistic-concurrency semantics match what a database row version
//! would give: of two racing writers, one loses with a version conflict.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rentra_booking::{Booking, BookingRepository};
use rentra_core::StoreError;
use rentra_fleet::{Car, CarFilter, CarRepository, CarStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryCarStore {
    cars: RwLock<HashMap<Uuid, Car>>,
}

impl MemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CarRepository for MemoryCarStore {
    async fn insert(&self, mut car: Car) -> Result<Car, StoreError> {
        let mut cars = self.cars.write().await;
        if cars.values().any(|existing| existing.vin == car.vin) {
            return Err(StoreError::Duplicate(format!("vin {}", car.vin)));
        }
        car.version = 1;
        cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Car>, StoreError> {
        Ok(self.cars.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &CarFilter) -> Result<Vec<Car>, StoreError> {
        let cars = self.cars.read().await;
        let mut matching: Vec<Car> = cars
            .values()
            .filter(|car| filter.matches(car))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (&a.make, &a.model, a.year).cmp(&(&b.make, &b.model, b.year))
        });
        Ok(matching)
    }

    async fn update(&self, mut car: Car) -> Result<Car, StoreError> {
        let mut cars = self.cars.write().await;
        let existing = cars.get(&car.id).ok_or(StoreError::NotFound(car.id))?;
        if existing.version != car.version {
            return Err(StoreError::VersionConflict(car.id));
        }
        car.version += 1;
        cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: CarStatus,
        next: CarStatus,
    ) -> Result<Car, StoreError> {
        let mut cars = self.cars.write().await;
        let car = cars.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if car.status != expected {
            return Err(StoreError::VersionConflict(id));
        }
        car.status = next;
        car.updated_at = Utc::now();
        car.version += 1;
        Ok(car.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.cars
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.cars.read().await.len())
    }
}

#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingStore {
    async fn insert(&self, mut booking: Booking) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.write().await;
        booking.version = 1;
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        let mut all: Vec<Booking> = bookings.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_for_customer(&self, customer_ref: &str) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        let mut own: Vec<Booking> = bookings
            .values()
            .filter(|booking| booking.customer_ref == customer_ref)
            .cloned()
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(own)
    }

    async fn update(&self, mut booking: Booking) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.write().await;
        let existing = bookings
            .get(&booking.id)
            .ok_or(StoreError::NotFound(booking.id))?;
        if existing.version != booking.version {
            return Err(StoreError::VersionConflict(booking.id));
        }
        booking.version += 1;
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }
}
