use chrono::{DateTime, NaiveDate, Utc};
use rentra_shared::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Car availability status. Transitions happen only through
/// [`crate::FleetInventory`], driven by booking lifecycle events; fleet
/// management may additionally move a car between `Available` and
/// `Service`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    Available,
    Reserved,
    Rented,
    Service,
}

impl std::fmt::Display for CarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CarStatus::Available => "available",
            CarStatus::Reserved => "reserved",
            CarStatus::Rented => "rented",
            CarStatus::Service => "service",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    /// Globally unique, immutable after creation.
    pub vin: String,
    pub body_type: String,
    pub base_price_per_day: Money,
    pub status: CarStatus,
    pub odometer: u32,
    pub last_service_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

/// Fields supplied when registering a car with the fleet.
#[derive(Debug, Clone, Deserialize)]
pub struct CarDraft {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub body_type: String,
    pub base_price_per_day: Money,
    #[serde(default)]
    pub odometer: u32,
    #[serde(default)]
    pub last_service_at: Option<NaiveDate>,
}

/// Partial update applied by fleet management. The VIN is immutable and
/// deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarPatch {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub body_type: Option<String>,
    pub base_price_per_day: Option<Money>,
    pub status: Option<CarStatus>,
    pub odometer: Option<u32>,
    pub last_service_at: Option<NaiveDate>,
}

impl Car {
    pub fn new(draft: CarDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            make: draft.make,
            model: draft.model,
            year: draft.year,
            vin: draft.vin,
            body_type: draft.body_type,
            base_price_per_day: draft.base_price_per_day,
            status: CarStatus::Available,
            odometer: draft.odometer,
            last_service_at: draft.last_service_at,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Apply a management patch. Booking-driven statuses (`reserved`,
    /// `rented`) cannot be set directly; only the inventory assigns them.
    pub fn apply_patch(&mut self, patch: CarPatch) -> Result<(), String> {
        if let Some(status) = patch.status {
            match status {
                CarStatus::Available | CarStatus::Service => self.status = status,
                CarStatus::Reserved | CarStatus::Rented => {
                    return Err(format!(
                        "car status {status} is assigned by the booking lifecycle, not directly"
                    ))
                }
            }
        }
        if let Some(make) = patch.make {
            self.make = make;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(body_type) = patch.body_type {
            self.body_type = body_type;
        }
        if let Some(rate) = patch.base_price_per_day {
            self.base_price_per_day = rate;
        }
        if let Some(odometer) = patch.odometer {
            self.odometer = odometer;
        }
        if let Some(serviced) = patch.last_service_at {
            self.last_service_at = Some(serviced);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
