use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use rentra_booking::{Booking, CreatedBooking, Fine, FineType};
use rentra_core::authz::AuthContext;
use rentra_shared::Money;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct FineRequest {
    pub fine_type: FineType,
    pub amount: Money,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreatedBooking>), ApiError> {
    let created = state
        .service
        .create_booking(&ctx, req.car_id, req.start_date, req.end_date)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.service.list_bookings(&ctx).await?))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.service.get_booking(&ctx, id).await?))
}

pub async fn confirm(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.service.confirm(&ctx, id).await?))
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.service.check_in(&ctx, id).await?))
}

pub async fn return_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.service.return_booking(&ctx, id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.service.cancel(&ctx, id).await?))
}

pub async fn list_fines(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Fine>>, ApiError> {
    Ok(Json(state.service.list_fines(&ctx, id).await?))
}

pub async fn add_fine(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<FineRequest>,
) -> Result<(StatusCode, Json<Fine>), ApiError> {
    let fine = state
        .service
        .add_fine(&ctx, id, req.fine_type, req.amount, req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(fine)))
}
