use async_trait::async_trait;
use rentra_core::StoreError;
use uuid::Uuid;

use crate::models::Booking;

/// Persistence boundary for bookings. `update` must enforce the
/// booking's optimistic version so two concurrent transitions of the
/// same booking cannot both commit.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> Result<Booking, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// All bookings, newest first.
    async fn list(&self) -> Result<Vec<Booking>, StoreError>;

    async fn list_for_customer(&self, customer_ref: &str) -> Result<Vec<Booking>, StoreError>;

    async fn update(&self, booking: Booking) -> Result<Booking, StoreError>;
}
