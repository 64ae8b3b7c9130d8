//! The four dashboard callbacks. Each one is stateless: it looks at the
//! triggering click count and the widget values, and either returns new
//! content for its output region or leaves the region alone.

use tracing::info;

use crate::errors::AppError;
use crate::external::market_data::MarketDataProvider;
use crate::models::{
    CallbackOutput, ChartInput, CompanyPanel, ForecastInput, ForecastRequest, Panel, SubmitInput,
};
use crate::services::forecasting_service::{self, SvrGrid};
use crate::services::{charts, price_service};

pub const WELCOME_MESSAGE: &str =
    "Hey there! Please enter a legitimate stock code to get the analysis.";
pub const DEFAULT_LOGO: &str = "/assets/stock.svg";

fn present(ticker: &Option<String>) -> Option<&str> {
    ticker.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// Company header for the submitted ticker.
pub async fn update_data(
    provider: &dyn MarketDataProvider,
    input: &SubmitInput,
) -> Result<CallbackOutput<CompanyPanel>, AppError> {
    if input.n_clicks.is_none() {
        return Ok(CallbackOutput::Update(CompanyPanel {
            description: WELCOME_MESSAGE.to_string(),
            logo: DEFAULT_LOGO.to_string(),
            ticker_name: None,
            reset_actions: true,
        }));
    }
    let Some(ticker) = present(&input.ticker) else {
        return Ok(CallbackOutput::NoUpdate);
    };

    let info = price_service::fetch_company_info(provider, ticker).await?;
    info!("Company panel updated for {}", info.ticker);

    let logo = if info.logo_url.is_empty() {
        DEFAULT_LOGO.to_string()
    } else {
        info.logo_url
    };

    Ok(CallbackOutput::Update(CompanyPanel {
        description: info.summary,
        logo,
        ticker_name: Some(info.name),
        reset_actions: true,
    }))
}

/// Open/close price chart.
pub async fn stock_price(
    provider: &dyn MarketDataProvider,
    input: &ChartInput,
) -> Result<CallbackOutput<Panel>, AppError> {
    if input.n_clicks.is_none() {
        return Ok(CallbackOutput::Update(Panel::Empty));
    }
    let Some(ticker) = present(&input.ticker) else {
        return Ok(CallbackOutput::NoUpdate);
    };

    let range = price_service::date_range(input.start_date, input.end_date)?;
    let series = price_service::fetch_price_series(provider, ticker, range).await?;

    Ok(CallbackOutput::Update(Panel::Graph {
        figure: charts::get_stock_price_fig(&series),
    }))
}

/// EMA-20 chart. Unlike the price chart, a missing ticker clears the panel.
pub async fn indicators(
    provider: &dyn MarketDataProvider,
    input: &ChartInput,
) -> Result<CallbackOutput<Panel>, AppError> {
    if input.n_clicks.is_none() {
        return Ok(CallbackOutput::Update(Panel::Empty));
    }
    let Some(ticker) = present(&input.ticker) else {
        return Ok(CallbackOutput::Update(Panel::Empty));
    };

    let range = price_service::date_range(input.start_date, input.end_date)?;
    let series = price_service::fetch_price_series(provider, ticker, range).await?;

    Ok(CallbackOutput::Update(Panel::Graph {
        figure: charts::get_more(&series),
    }))
}

pub async fn forecast(
    provider: &dyn MarketDataProvider,
    input: &ForecastInput,
    lookback_days: i64,
    grid: SvrGrid,
) -> Result<CallbackOutput<Panel>, AppError> {
    if input.n_clicks.is_none() {
        return Ok(CallbackOutput::Update(Panel::Empty));
    }
    let Some(ticker) = present(&input.ticker) else {
        return Ok(CallbackOutput::NoUpdate);
    };

    let horizon_days = forecasting_service::parse_horizon(input.input_days.as_deref())?;
    let request = ForecastRequest {
        ticker: ticker.to_string(),
        horizon_days,
    };
    let result = forecasting_service::generate_forecast(provider, &request, lookback_days, grid).await?;

    Ok(CallbackOutput::Update(Panel::Graph {
        figure: charts::get_forecast_fig(&result),
    }))
}
