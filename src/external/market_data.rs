use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CompanyInfo, DateRange, PriceBar};

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The provider refused the request (missing or stale session crumb).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily OHLCV bars for `ticker`. `None` asks for the full available history.
    async fn fetch_history(
        &self,
        ticker: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<PriceBar>, MarketDataError>;

    async fn fetch_company_info(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError>;

    fn name(&self) -> &'static str;
}
