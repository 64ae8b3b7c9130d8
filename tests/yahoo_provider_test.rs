/// Yahoo provider tests
///
/// Points `YahooFinanceProvider` at a local axum server that imitates the
/// cookie host, the crumb endpoint, quoteSummary and the chart endpoint.

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use stock_dash::external::market_data::{MarketDataError, MarketDataProvider};
use stock_dash::external::yahoo::YahooFinanceProvider;

const SESSION: &str = "A3=d=session";
const CRUMB: &str = "crumb-123";

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn cookie_host() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::SET_COOKIE, "A3=d=session; Path=/; Domain=.yahoo.com")],
        "",
    )
}

async fn crumb(headers: HeaderMap) -> (StatusCode, String) {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
    if cookie == Some(SESSION) {
        (StatusCode::OK, CRUMB.to_string())
    } else {
        (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
    }
}

fn invalid_crumb() -> (StatusCode, axum::Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({
            "finance": { "result": null, "error": { "code": "Unauthorized", "description": "Invalid Crumb" } }
        })),
    )
}

async fn quote_summary(
    Path(ticker): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
    if params.get("crumb").map(String::as_str) != Some(CRUMB) || cookie != Some(SESSION) {
        return invalid_crumb();
    }
    (
        StatusCode::OK,
        axum::Json(json!({
            "quoteSummary": {
                "result": [{
                    "price": { "shortName": format!("{} Holdings", ticker) },
                    "assetProfile": {
                        "website": "https://www.example.com",
                        "longBusinessSummary": "Makes examples."
                    }
                }],
                "error": null
            }
        })),
    )
}

async fn chart(Path(ticker): Path<String>) -> axum::Json<serde_json::Value> {
    axum::Json(json!({
        "chart": {
            "result": [{
                "meta": { "symbol": ticker, "shortName": "Chart Meta Inc.", "gmtoffset": 0 },
                "timestamp": [1704205800],
                "indicators": { "quote": [{
                    "open": [10.0], "high": [11.0], "low": [9.5], "close": [10.5], "volume": [1000]
                }] }
            }],
            "error": null
        }
    }))
}

fn yahoo_routes() -> Router {
    Router::new()
        .route("/cookie", get(cookie_host))
        .route("/v8/finance/chart/:ticker", get(chart))
}

#[tokio::test]
async fn test_company_info_sends_session_crumb() {
    let base = spawn_server(
        yahoo_routes()
            .route("/v1/test/getcrumb", get(crumb))
            .route("/v10/finance/quoteSummary/:ticker", get(quote_summary)),
    )
    .await;
    let provider = YahooFinanceProvider::new(&base, &base).with_cookie_url(format!("{}/cookie", base));

    let info = provider.fetch_company_info("ACME").await.unwrap();

    assert_eq!(info.name, "ACME Holdings");
    assert_eq!(info.summary, "Makes examples.");
    assert_eq!(info.logo_url, "https://logo.clearbit.com/example.com");
}

#[tokio::test]
async fn test_rejected_crumb_falls_back_to_chart_metadata() {
    let base = spawn_server(
        yahoo_routes()
            .route("/v1/test/getcrumb", get(crumb))
            .route("/v10/finance/quoteSummary/:ticker", get(|| async { invalid_crumb() })),
    )
    .await;
    let provider = YahooFinanceProvider::new(&base, &base).with_cookie_url(format!("{}/cookie", base));

    let info = provider.fetch_company_info("ACME").await.unwrap();

    assert_eq!(info.name, "Chart Meta Inc.");
    assert!(info.summary.is_empty());
    assert!(info.logo_url.is_empty());
}

#[tokio::test]
async fn test_missing_crumb_endpoint_falls_back_to_chart_metadata() {
    let base = spawn_server(yahoo_routes()).await;
    let provider = YahooFinanceProvider::new(&base, &base).with_cookie_url(format!("{}/cookie", base));

    let info = provider.fetch_company_info("ACME").await.unwrap();
    assert_eq!(info.name, "Chart Meta Inc.");
}

#[tokio::test]
async fn test_history_reads_chart_endpoint() {
    let base = spawn_server(yahoo_routes()).await;
    let provider = YahooFinanceProvider::new(&base, &base);

    let bars = provider.fetch_history("ACME", None).await.unwrap();
    assert_eq!(bars.len(), 1);
    assert!((bars[0].close - 10.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_unknown_symbol_is_not_found() {
    let base = spawn_server(Router::new()).await;
    let provider = YahooFinanceProvider::new(&base, &base).with_cookie_url(format!("{}/cookie", base));

    let err = provider.fetch_history("ZZZZ", None).await.unwrap_err();
    assert!(matches!(err, MarketDataError::NotFound(_)));
}
