use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::CompanyInfo;
use crate::services::price_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker", get(get_company))
}

pub async fn get_company(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CompanyInfo>, AppError> {
    info!("GET /api/companies/{} - Getting company info", ticker);
    let company = price_service::fetch_company_info(state.market_data.as_ref(), &ticker)
        .await
        .map_err(|e| {
            error!("Failed to get company info for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(company))
}
