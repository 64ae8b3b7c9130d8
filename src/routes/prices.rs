use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::PriceSeries;
use crate::services::price_service;
use crate::state::AppState;

/// Optional `?start=YYYY-MM-DD&end=YYYY-MM-DD` window shared by the price and
/// chart endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker", get(get_prices))
}

pub async fn get_prices(
    Path(ticker): Path<String>,
    Query(params): Query<RangeParams>,
    State(state): State<AppState>,
) -> Result<Json<PriceSeries>, AppError> {
    info!("GET /api/prices/{} - Getting price history", ticker);
    let range = price_service::date_range(params.start, params.end)?;
    let series = price_service::fetch_price_series(state.market_data.as_ref(), &ticker, range)
        .await
        .map_err(|e| {
            error!("Failed to get price history for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(series))
}
