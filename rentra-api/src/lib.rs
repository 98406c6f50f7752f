use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod cars;
pub mod error;
pub mod events;
pub mod metrics;
pub mod middleware;
pub mod payments;
pub mod pricing;
pub mod reports;
pub mod state;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/v1/cars", get(cars::list_cars))
        .route("/v1/cars/{id}", get(cars::get_car))
        .route("/v1/pricing/quote", get(pricing::quote));

    let protected = Router::new()
        .route("/v1/cars", post(cars::create_car))
        .route(
            "/v1/cars/{id}",
            axum::routing::patch(cars::update_car).delete(cars::delete_car),
        )
        .route(
            "/v1/bookings",
            post(bookings::create_booking).get(bookings::list_bookings),
        )
        .route("/v1/bookings/{id}", get(bookings::get_booking))
        .route("/v1/bookings/{id}/confirm", post(bookings::confirm))
        .route("/v1/bookings/{id}/checkin", post(bookings::check_in))
        .route("/v1/bookings/{id}/return", post(bookings::return_booking))
        .route("/v1/bookings/{id}/cancel", post(bookings::cancel))
        .route(
            "/v1/bookings/{id}/fines",
            get(bookings::list_fines).post(bookings::add_fine),
        )
        .route(
            "/v1/bookings/{id}/deposit/hold",
            post(payments::hold_deposit),
        )
        .route(
            "/v1/bookings/{id}/deposit/release",
            post(payments::release_deposit),
        )
        .route(
            "/v1/bookings/{id}/deposit/forfeit",
            post(payments::forfeit_deposit),
        )
        .route(
            "/v1/bookings/{id}/invoice/pay",
            post(payments::pay_invoice),
        )
        .route("/v1/reports/utilization", get(reports::utilization))
        .route("/v1/reports/financials", get(reports::financials))
        .route("/v1/events/stream", get(events::stream))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics::track_http,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
