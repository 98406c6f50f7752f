use async_trait::async_trait;
use rentra_core::StoreError;
use serde::Deserialize;
use uuid::Uuid;

use crate::car::{Car, CarStatus};

/// Search filter for fleet listings. All criteria are conjunctive;
/// `search` matches make or model, case-insensitively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarFilter {
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub body_type: Option<String>,
    pub status: Option<CarStatus>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub search: Option<String>,
}

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        if let Some(make) = &self.make {
            if !car.make.eq_ignore_ascii_case(make) {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if !car.model.eq_ignore_ascii_case(model) {
                return false;
            }
        }
        if let Some(body_type) = &self.body_type {
            if !car.body_type.eq_ignore_ascii_case(body_type) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if car.status != status {
                return false;
            }
        }
        if let Some(min) = self.year_min {
            if car.year < min {
                return false;
            }
        }
        if let Some(max) = self.year_max {
            if car.year > max {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !car.make.to_lowercase().contains(&needle)
                && !car.model.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Persistence boundary for the fleet. Implementations must apply
/// `compare_and_set_status` atomically: of two concurrent calls expecting
/// the same current status, exactly one may succeed.
#[async_trait]
pub trait CarRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the VIN already exists.
    async fn insert(&self, car: Car) -> Result<Car, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Car>, StoreError>;

    /// Matching cars ordered by make, model, year.
    async fn list(&self, filter: &CarFilter) -> Result<Vec<Car>, StoreError>;

    /// Write back a previously loaded car; fails with
    /// [`StoreError::VersionConflict`] when the stored version moved on.
    async fn update(&self, car: Car) -> Result<Car, StoreError>;

    /// Atomically move the car's status from `expected` to `next`.
    /// [`StoreError::VersionConflict`] signals the status was not
    /// `expected` at commit time.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: CarStatus,
        next: CarStatus,
    ) -> Result<Car, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}
