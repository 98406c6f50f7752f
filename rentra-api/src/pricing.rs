use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use rentra_pricing::Quote;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub car: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn quote(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<Quote>, ApiError> {
    let quote = state
        .service
        .quote(query.car, query.start, query.end)
        .await?;
    Ok(Json(quote))
}
