use std::sync::Arc;

use rentra_booking::{BookingService, ReportService};
use rentra_fleet::CarRepository;
use rentra_shared::BookingEvent;
use tokio::sync::broadcast;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BookingService>,
    pub reports: Arc<ReportService>,
    pub cars: Arc<dyn CarRepository>,
    pub events: broadcast::Sender<BookingEvent>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
}
