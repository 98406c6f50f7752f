use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rentra_booking::{Deposit, Invoice};
use rentra_core::authz::AuthContext;
use rentra_shared::Money;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HoldDepositRequest {
    pub amount: Money,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReleaseDepositRequest {
    #[serde(default)]
    pub partial: bool,
}

#[derive(Debug, Deserialize)]
pub struct PayInvoiceRequest {
    pub method: String,
}

pub async fn hold_deposit(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<HoldDepositRequest>,
) -> Result<Json<Deposit>, ApiError> {
    Ok(Json(state.service.hold_deposit(&ctx, id, req.amount).await?))
}

pub async fn release_deposit(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReleaseDepositRequest>>,
) -> Result<Json<Deposit>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    Ok(Json(
        state.service.release_deposit(&ctx, id, req.partial).await?,
    ))
}

pub async fn forfeit_deposit(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deposit>, ApiError> {
    Ok(Json(state.service.forfeit_deposit(&ctx, id).await?))
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<PayInvoiceRequest>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.service.pay_invoice(&ctx, id, req.method).await?))
}
