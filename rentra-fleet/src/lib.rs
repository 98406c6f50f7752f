pub mod car;
pub mod inventory;
pub mod repository;

pub use car::{Car, CarDraft, CarPatch, CarStatus};
pub use inventory::{FleetError, FleetInventory};
pub use repository::{CarFilter, CarRepository};
