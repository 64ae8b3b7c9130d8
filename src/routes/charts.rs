use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::Figure;
use crate::routes::prices::RangeParams;
use crate::services::{charts, price_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker/price", get(get_price_chart))
        .route("/:ticker/indicators", get(get_indicator_chart))
}

pub async fn get_price_chart(
    Path(ticker): Path<String>,
    Query(params): Query<RangeParams>,
    State(state): State<AppState>,
) -> Result<Json<Figure>, AppError> {
    info!("GET /api/charts/{}/price - Building open/close chart", ticker);
    let range = price_service::date_range(params.start, params.end)?;
    let series = price_service::fetch_price_series(state.market_data.as_ref(), &ticker, range)
        .await
        .map_err(|e| {
            error!("Failed to build price chart for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(charts::get_stock_price_fig(&series)))
}

pub async fn get_indicator_chart(
    Path(ticker): Path<String>,
    Query(params): Query<RangeParams>,
    State(state): State<AppState>,
) -> Result<Json<Figure>, AppError> {
    info!("GET /api/charts/{}/indicators - Building EMA chart", ticker);
    let range = price_service::date_range(params.start, params.end)?;
    let series = price_service::fetch_price_series(state.market_data.as_ref(), &ticker, range)
        .await
        .map_err(|e| {
            error!("Failed to build indicator chart for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(charts::get_more(&series)))
}
