use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rentra_booking::{FinancialReport, UtilizationReport};
use rentra_core::authz::AuthContext;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub async fn utilization(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<UtilizationReport>, ApiError> {
    Ok(Json(
        state
            .reports
            .fleet_utilization(&ctx, period.from, period.to)
            .await?,
    ))
}

pub async fn financials(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<FinancialReport>, ApiError> {
    Ok(Json(
        state
            .reports
            .financials(&ctx, period.from, period.to)
            .await?,
    ))
}
