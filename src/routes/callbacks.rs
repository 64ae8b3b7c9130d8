// Dashboard callback endpoints. The page posts the current widget values and
// renders whatever comes back into the matching output region.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{CallbackOutput, ChartInput, CompanyPanel, ForecastInput, Panel, SubmitInput};
use crate::services::dashboard_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update-data", post(update_data))
        .route("/stock-price", post(stock_price))
        .route("/indicators", post(indicators))
        .route("/forecast", post(forecast))
}

fn log_failure(callback: &str, e: &AppError) {
    match e {
        AppError::Validation(msg) => warn!("{} callback rejected input: {}", callback, msg),
        _ => error!("{} callback failed: {}", callback, e),
    }
}

async fn update_data(
    State(state): State<AppState>,
    Json(input): Json<SubmitInput>,
) -> Result<Json<CallbackOutput<CompanyPanel>>, AppError> {
    info!("POST /_callbacks/update-data - ticker={:?} clicks={:?}", input.ticker, input.n_clicks);
    let out = dashboard_service::update_data(state.market_data.as_ref(), &input)
        .await
        .inspect_err(|e| log_failure("update-data", e))?;
    Ok(Json(out))
}

async fn stock_price(
    State(state): State<AppState>,
    Json(input): Json<ChartInput>,
) -> Result<Json<CallbackOutput<Panel>>, AppError> {
    info!("POST /_callbacks/stock-price - ticker={:?} clicks={:?}", input.ticker, input.n_clicks);
    let out = dashboard_service::stock_price(state.market_data.as_ref(), &input)
        .await
        .inspect_err(|e| log_failure("stock-price", e))?;
    Ok(Json(out))
}

async fn indicators(
    State(state): State<AppState>,
    Json(input): Json<ChartInput>,
) -> Result<Json<CallbackOutput<Panel>>, AppError> {
    info!("POST /_callbacks/indicators - ticker={:?} clicks={:?}", input.ticker, input.n_clicks);
    let out = dashboard_service::indicators(state.market_data.as_ref(), &input)
        .await
        .inspect_err(|e| log_failure("indicators", e))?;
    Ok(Json(out))
}

async fn forecast(
    State(state): State<AppState>,
    Json(input): Json<ForecastInput>,
) -> Result<Json<CallbackOutput<Panel>>, AppError> {
    info!(
        "POST /_callbacks/forecast - ticker={:?} days={:?} clicks={:?}",
        input.ticker, input.input_days, input.n_clicks
    );
    let out = dashboard_service::forecast(
        state.market_data.as_ref(),
        &input,
        state.config.forecast_lookback_days,
        state.svr_grid.as_ref().clone(),
    )
    .await
    .inspect_err(|e| log_failure("forecast", e))?;
    Ok(Json(out))
}
