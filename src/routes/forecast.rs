use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{ForecastRequest, ForecastResult};
use crate::services::forecasting_service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub days: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker", get(get_forecast))
}

pub async fn get_forecast(
    Path(ticker): Path<String>,
    Query(params): Query<ForecastParams>,
    State(state): State<AppState>,
) -> Result<Json<ForecastResult>, AppError> {
    info!("GET /api/forecast/{} - Generating SVR forecast", ticker);
    let horizon_days = forecasting_service::parse_horizon(params.days.as_deref())?;
    let request = ForecastRequest { ticker, horizon_days };

    let result = forecasting_service::generate_forecast(
        state.market_data.as_ref(),
        &request,
        state.config.forecast_lookback_days,
        state.svr_grid.as_ref().clone(),
    )
    .await
    .map_err(|e| {
        match &e {
            AppError::Validation(msg) => warn!("Rejected forecast for {}: {}", request.ticker, msg),
            _ => error!("Failed to forecast {}: {}", request.ticker, e),
        }
        e
    })?;
    Ok(Json(result))
}
