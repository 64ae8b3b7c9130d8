use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::market_data::MarketDataProvider;
use crate::models::{CompanyInfo, DateRange, PriceBar, PriceSeries};

static TICKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9.\-^=]{1,15}$").expect("ticker pattern is valid"));

/// Trim and upper-case a ticker, rejecting anything that cannot be a symbol.
pub fn normalize_ticker(raw: &str) -> Result<String, AppError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AppError::Validation("Ticker must not be empty".into()));
    }
    if !TICKER_RE.is_match(&ticker) {
        return Err(AppError::Validation(format!("Invalid ticker symbol: {}", raw.trim())));
    }
    Ok(ticker)
}

/// Build a range from optional picker values. No start means full history.
pub fn date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Option<DateRange>, AppError> {
    match start {
        None => Ok(None),
        Some(start) => {
            if let Some(end) = end {
                if start > end {
                    return Err(AppError::Validation(format!(
                        "Start date {} is after end date {}",
                        start, end
                    )));
                }
            }
            Ok(Some(DateRange::new(start, end)))
        }
    }
}

/// Sort ascending, drop repeated dates, and clip to the requested window.
pub fn normalize_bars(
    mut bars: Vec<PriceBar>,
    range: Option<DateRange>,
    today: NaiveDate,
) -> Vec<PriceBar> {
    bars.sort_by(|a, b| a.date.cmp(&b.date));
    bars.dedup_by(|later, earlier| later.date == earlier.date);
    if let Some(range) = range {
        bars.retain(|b| range.contains(b.date, today));
    }
    bars
}

pub async fn fetch_price_series(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    range: Option<DateRange>,
) -> Result<PriceSeries, AppError> {
    let ticker = normalize_ticker(ticker)?;

    let bars = provider.fetch_history(&ticker, range).await.map_err(|e| {
        error!("Failed to fetch price history for {} from {}: {}", ticker, provider.name(), e);
        AppError::from(e)
    })?;

    let bars = normalize_bars(bars, range, Utc::now().date_naive());
    if bars.is_empty() {
        return Err(AppError::NotFound(format!("No price data found for ticker {}", ticker)));
    }

    info!("✓ Fetched {} bars for {}", bars.len(), ticker);
    Ok(PriceSeries::new(ticker, bars))
}

pub async fn fetch_company_info(
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Result<CompanyInfo, AppError> {
    let ticker = normalize_ticker(ticker)?;

    provider.fetch_company_info(&ticker).await.map_err(|e| {
        error!("Failed to fetch company info for {} from {}: {}", ticker, provider.name(), e);
        AppError::from(e)
    })
}
