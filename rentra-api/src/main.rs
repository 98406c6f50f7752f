use std::net::SocketAddr;
use std::sync::Arc;

use rentra_api::{app, AppState, AuthConfig};
use rentra_booking::{BookingPolicy, BookingService, ReportService};
use rentra_core::payment::MockPayProvider;
use rentra_fleet::CarRepository;
use rentra_pricing::PricingEngine;
use rentra_store::{MemoryBookingStore, MemoryCarStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentra_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rentra_store::Config::load().expect("failed to load config");
    tracing::info!("starting rentra API on port {}", config.server.port);

    let cars: Arc<dyn CarRepository> = Arc::new(MemoryCarStore::new());
    let bookings = Arc::new(MemoryBookingStore::new());

    if config.business_rules.seed_demo_fleet {
        rentra_store::seed::seed_demo_fleet(cars.as_ref())
            .await
            .expect("failed to seed demo fleet");
    }

    let (events_tx, _) = tokio::sync::broadcast::channel(100);

    let provider = match config.business_rules.payment_provider.as_deref() {
        Some(name) => MockPayProvider::new(name),
        None => MockPayProvider::default(),
    };

    let service = Arc::new(BookingService::new(
        bookings.clone(),
        cars.clone(),
        PricingEngine::new(config.pricing.clone()),
        Arc::new(provider),
        events_tx.clone(),
        BookingPolicy {
            deposit_rate_pct: config.business_rules.deposit_rate_pct,
        },
    ));
    let reports = Arc::new(ReportService::new(bookings, cars.clone()));

    let metrics = Arc::new(rentra_api::metrics::Metrics::new().expect("failed to set up metrics"));

    let state = AppState {
        service,
        reports,
        cars,
        events: events_tx,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        metrics,
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
