use std::sync::Arc;
use uuid::Uuid;

use rentra_core::StoreError;

use crate::car::{Car, CarStatus};
use crate::repository::CarRepository;

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("car not found: {0}")]
    NotFound(Uuid),

    #[error("car {car_id} is not available (status: {status})")]
    CarUnavailable { car_id: Uuid, status: CarStatus },

    #[error("concurrent update on car {0}, retry")]
    Conflict(Uuid),

    #[error("fleet store failure: {0}")]
    Store(String),
}

impl From<StoreError> for FleetError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => FleetError::NotFound(id),
            StoreError::VersionConflict(id) => FleetError::Conflict(id),
            other => FleetError::Store(other.to_string()),
        }
    }
}

/// Owns car availability. Reservation is exclusive: the underlying
/// compare-and-set guarantees that of two concurrent `reserve` calls on
/// the same car, at most one succeeds.
pub struct FleetInventory {
    cars: Arc<dyn CarRepository>,
}

impl FleetInventory {
    pub fn new(cars: Arc<dyn CarRepository>) -> Self {
        Self { cars }
    }

    /// `available → reserved`, invoked when a booking is created.
    pub async fn reserve(&self, car_id: Uuid) -> Result<Car, FleetError> {
        match self
            .cars
            .compare_and_set_status(car_id, CarStatus::Available, CarStatus::Reserved)
            .await
        {
            Ok(car) => {
                tracing::debug!(%car_id, "car reserved");
                Ok(car)
            }
            Err(StoreError::VersionConflict(_)) => Err(self.unavailable(car_id).await),
            Err(other) => Err(other.into()),
        }
    }

    /// `reserved → rented`, invoked at check-in.
    pub async fn mark_rented(&self, car_id: Uuid) -> Result<Car, FleetError> {
        match self
            .cars
            .compare_and_set_status(car_id, CarStatus::Reserved, CarStatus::Rented)
            .await
        {
            Ok(car) => Ok(car),
            Err(StoreError::VersionConflict(_)) => Err(self.unavailable(car_id).await),
            Err(other) => Err(other.into()),
        }
    }

    /// Back to `available` on return or cancellation. A car flagged for
    /// service stays in service.
    pub async fn release(&self, car_id: Uuid) -> Result<Car, FleetError> {
        let car = self
            .cars
            .get(car_id)
            .await?
            .ok_or(FleetError::NotFound(car_id))?;
        match car.status {
            CarStatus::Service | CarStatus::Available => Ok(car),
            current => {
                let car = self
                    .cars
                    .compare_and_set_status(car_id, current, CarStatus::Available)
                    .await?;
                tracing::debug!(%car_id, "car released");
                Ok(car)
            }
        }
    }

    async fn unavailable(&self, car_id: Uuid) -> FleetError {
        match self.cars.get(car_id).await {
            Ok(Some(car)) => FleetError::CarUnavailable {
                car_id,
                status: car.status,
            },
            Ok(None) => FleetError::NotFound(car_id),
            Err(_) => FleetError::Conflict(car_id),
        }
    }
}
