use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rentra_booking::BookingError;
use rentra_core::authz::{AuthContext, Permission};
use rentra_fleet::{Car, CarDraft, CarFilter, CarPatch, CarStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CarListQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub body_type: Option<String>,
    pub status: Option<CarStatus>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CarListResponse {
    pub items: Vec<Car>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

pub async fn list_cars(
    State(state): State<AppState>,
    Query(query): Query<CarListQuery>,
) -> Result<Json<CarListResponse>, ApiError> {
    let filter = CarFilter {
        make: query.make,
        model: query.model,
        body_type: query.body_type,
        status: query.status,
        year_min: query.year_min,
        year_max: query.year_max,
        search: query.search,
    };
    let all = state.cars.list(&filter).await?;

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let total = all.len();
    let items = all
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Ok(Json(CarListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Car>, ApiError> {
    let car = state
        .cars
        .get(id)
        .await?
        .ok_or(BookingError::NotFound(id))?;
    Ok(Json(car))
}

pub async fn create_car(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(draft): Json<CarDraft>,
) -> Result<(StatusCode, Json<Car>), ApiError> {
    ctx.require(Permission::ManageFleet)?;
    if draft.vin.trim().is_empty() {
        return Err(BookingError::Validation("vin must not be empty".to_string()).into());
    }
    let car = state.cars.insert(Car::new(draft)).await?;
    tracing::info!(car_id = %car.id, vin = %car.vin, "car registered");
    Ok((StatusCode::CREATED, Json(car)))
}

pub async fn update_car(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CarPatch>,
) -> Result<Json<Car>, ApiError> {
    ctx.require(Permission::ManageFleet)?;
    let mut car = state
        .cars
        .get(id)
        .await?
        .ok_or(BookingError::NotFound(id))?;
    car.apply_patch(patch).map_err(BookingError::Validation)?;
    let car = state.cars.update(car).await?;
    Ok(Json(car))
}

pub async fn delete_car(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.require(Permission::ManageFleet)?;
    let car = state
        .cars
        .get(id)
        .await?
        .ok_or(BookingError::NotFound(id))?;
    // A car tied to a live rental cannot leave the fleet.
    if matches!(car.status, CarStatus::Reserved | CarStatus::Rented) {
        return Err(BookingError::CarUnavailable {
            car_id: id,
            status: car.status,
        }
        .into());
    }
    state.cars.delete(id).await?;
    tracing::info!(car_id = %id, "car removed from fleet");
    Ok(StatusCode::NO_CONTENT)
}
