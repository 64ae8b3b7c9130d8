use crate::external::market_data::{MarketDataError, MarketDataProvider};
use crate::models::{CompanyInfo, DateRange, PriceBar};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_SUMMARY_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

/// Yahoo Finance provider. No API key required, but quoteSummary needs a
/// session cookie plus the crumb issued for it.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    chart_url: String,
    summary_url: String,
    cookie_url: String,
}

/// Cookie header value and the crumb bound to it.
struct YahooSession {
    cookie: String,
    crumb: String,
}

impl YahooFinanceProvider {
    pub fn new(chart_url: impl Into<String>, summary_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; StockDash/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            chart_url: chart_url.into().trim_end_matches('/').to_string(),
            summary_url: summary_url.into().trim_end_matches('/').to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
        }
    }

    /// Override the host that hands out the session cookie.
    pub fn with_cookie_url(mut self, cookie_url: impl Into<String>) -> Self {
        self.cookie_url = cookie_url.into();
        self
    }
}

impl Default for YahooFinanceProvider {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_URL, DEFAULT_SUMMARY_URL)
    }
}

// Chart endpoint (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    meta: YahooMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    #[serde(default)]
    gmtoffset: i64,
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

// Quote summary endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryResponse {
    quote_summary: YahooSummary,
}

#[derive(Debug, Deserialize)]
struct YahooSummary {
    result: Option<Vec<YahooSummaryResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryResult {
    price: Option<YahooPrice>,
    asset_profile: Option<YahooAssetProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooPrice {
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooAssetProfile {
    website: Option<String>,
    sector: Option<String>,
    industry: Option<String>,
    long_business_summary: Option<String>,
}

// Error envelope used by the auth layer, e.g. a rejected crumb
#[derive(Debug, Deserialize)]
struct YahooFinanceEnvelope {
    finance: YahooFinanceBody,
}

#[derive(Debug, Deserialize)]
struct YahooFinanceBody {
    error: YahooError,
}

fn is_not_found(error: &YahooError) -> bool {
    error.code.as_deref() == Some("Not Found")
        || error.description.contains("No data found")
        || error.description.contains("not found")
}

fn classify_error(error: YahooError, ticker: &str) -> MarketDataError {
    if is_not_found(&error) {
        MarketDataError::NotFound(ticker.to_string())
    } else if error.code.as_deref() == Some("Unauthorized") {
        MarketDataError::Unauthorized(error.description)
    } else {
        MarketDataError::BadResponse(error.description)
    }
}

fn envelope_error(body: &str) -> Option<YahooError> {
    serde_json::from_str::<YahooFinanceEnvelope>(body)
        .ok()
        .map(|e| e.finance.error)
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn first_chart_result(body: &str, ticker: &str) -> Result<YahooResult, MarketDataError> {
    let body: YahooChartResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

    if let Some(error) = body.chart.error {
        return Err(classify_error(error, ticker));
    }

    body.chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| MarketDataError::NotFound(ticker.to_string()))
}

/// Turn a chart payload into bars. Rows with a missing open/high/low/close are
/// skipped; a missing volume counts as zero.
fn parse_chart(body: &str, ticker: &str) -> Result<Vec<PriceBar>, MarketDataError> {
    let result = first_chart_result(body, ticker)?;

    let Some(quote) = result.indicators.quote.first() else {
        return Err(MarketDataError::BadResponse("No quote data in response".into()));
    };

    let n = result.timestamp.len();
    if quote.close.len() != n || quote.open.len() != n {
        return Err(MarketDataError::Parse(
            "Timestamp and price arrays have different lengths".into(),
        ));
    }

    let offset = result.meta.gmtoffset;
    let mut bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let open = quote.open.get(i).copied().flatten()?;
            let high = quote.high.get(i).copied().flatten()?;
            let low = quote.low.get(i).copied().flatten()?;
            let close = quote.close.get(i).copied().flatten()?;
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);

            // exchange-local trading day
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)?.date_naive();

            Some(PriceBar { date, open, high, low, close, volume })
        })
        .collect();

    bars.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(bars)
}

fn parse_summary(body: &str, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
    if let Some(error) = envelope_error(body) {
        return Err(classify_error(error, ticker));
    }

    let body: YahooSummaryResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

    if let Some(error) = body.quote_summary.error {
        return Err(classify_error(error, ticker));
    }

    let result = body
        .quote_summary
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| MarketDataError::NotFound(ticker.to_string()))?;

    let name = result
        .price
        .and_then(|p| p.short_name.or(p.long_name))
        .unwrap_or_else(|| ticker.to_string());

    let (website, sector, industry, summary) = match result.asset_profile {
        Some(profile) => (
            profile.website,
            profile.sector,
            profile.industry,
            profile.long_business_summary.unwrap_or_default(),
        ),
        None => (None, None, None, String::new()),
    };

    Ok(CompanyInfo {
        ticker: ticker.to_string(),
        name,
        logo_url: website.as_deref().map(logo_url_for).unwrap_or_default(),
        summary,
        website,
        sector,
        industry,
    })
}

/// Company record from chart metadata alone: display name only, no summary or
/// logo.
fn parse_chart_profile(body: &str, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
    let meta = first_chart_result(body, ticker)?.meta;

    Ok(CompanyInfo {
        ticker: ticker.to_string(),
        name: meta
            .short_name
            .or(meta.long_name)
            .unwrap_or_else(|| ticker.to_string()),
        logo_url: String::new(),
        summary: String::new(),
        website: None,
        sector: None,
        industry: None,
    })
}

/// Cookie header value built from the `name=value` part of each Set-Cookie.
fn session_cookie(headers: &reqwest::header::HeaderMap) -> String {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Logo lookup keyed by the company's web domain.
pub fn logo_url_for(website: &str) -> String {
    let host = url::Url::parse(website)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| website.trim().to_string());
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        return String::new();
    }
    format!("https://logo.clearbit.com/{}", domain)
}

impl YahooFinanceProvider {
    async fn get_text(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, String), MarketDataError> {
        let resp = request
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;
        Ok((status, body))
    }

    async fn open_session(&self) -> Result<YahooSession, MarketDataError> {
        // the cookie host answers 404 but still sets the session cookie
        let resp = self
            .client
            .get(&self.cookie_url)
            .send()
            .await
            .map_err(|e| MarketDataError::Unauthorized(format!("session cookie request failed: {}", e)))?;
        let cookie = session_cookie(resp.headers());
        if cookie.is_empty() {
            return Err(MarketDataError::Unauthorized("no session cookie issued".into()));
        }

        let url = format!("{}/v1/test/getcrumb", self.summary_url);
        let (status, body) = self
            .get_text(self.client.get(&url).header(COOKIE, &cookie))
            .await?;
        let crumb = body.trim().to_string();
        if !status.is_success() || crumb.is_empty() || crumb.starts_with('{') || crumb.starts_with('<') {
            return Err(MarketDataError::Unauthorized(format!("crumb request failed: HTTP {}", status)));
        }

        Ok(YahooSession { cookie, crumb })
    }

    async fn fetch_summary(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
        let session = self.open_session().await?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.summary_url, ticker);

        let request = self
            .client
            .get(&url)
            .header(COOKIE, &session.cookie)
            .query(&[("modules", "price,assetProfile"), ("crumb", session.crumb.as_str())]);
        let (status, body) = self.get_text(request).await?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MarketDataError::Unauthorized(
                envelope_error(&body)
                    .map(|e| e.description)
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            )),
            StatusCode::NOT_FOUND => Err(MarketDataError::NotFound(ticker.to_string())),
            s if !s.is_success() => Err(MarketDataError::BadResponse(format!("HTTP {}", status))),
            _ => parse_summary(&body, ticker),
        }
    }

    /// Company name from the chart endpoint, which needs no crumb.
    async fn fetch_chart_profile(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", self.chart_url, ticker);
        let request = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", "5d")]);
        let (status, body) = self.get_text(request).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(MarketDataError::NotFound(ticker.to_string()));
        }
        if !status.is_success() {
            return Err(MarketDataError::BadResponse(format!("HTTP {}", status)));
        }

        parse_chart_profile(&body, ticker)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<PriceBar>, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", self.chart_url, ticker);

        let mut query: Vec<(&str, String)> = vec![
            ("interval", "1d".to_string()),
            ("includeAdjustedClose", "true".to_string()),
        ];
        match range {
            Some(range) => {
                let today = Utc::now().date_naive();
                // period2 is exclusive, so ask for one day past the inclusive end
                let end = range.end_or(today) + Duration::days(1);
                query.push(("period1", unix_midnight(range.start).to_string()));
                query.push(("period2", unix_midnight(end).to_string()));
            }
            None => query.push(("range", "max".to_string())),
        }

        let (status, body) = self.get_text(self.client.get(&url).query(&query)).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(MarketDataError::NotFound(ticker.to_string()));
        }
        if !status.is_success() {
            return Err(MarketDataError::BadResponse(format!("HTTP {}", status)));
        }

        parse_chart(&body, ticker)
    }

    async fn fetch_company_info(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
        match self.fetch_summary(ticker).await {
            Err(MarketDataError::Unauthorized(reason)) => {
                warn!(
                    "quoteSummary refused for {} ({}); falling back to chart metadata",
                    ticker, reason
                );
                self.fetch_chart_profile(ticker).await
            }
            other => other,
        }
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}
