use std::sync::Arc;

use tokio::net::TcpListener;

use stock_dash::app;
use stock_dash::config::{DashboardConfig, ProviderKind};
use stock_dash::external::market_data::MarketDataProvider;
use stock_dash::external::synthetic::SyntheticProvider;
use stock_dash::external::yahoo::YahooFinanceProvider;
use stock_dash::logging::{init_logging, LoggingConfig};
use stock_dash::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()?)?;

    let config = DashboardConfig::from_env()?;

    let provider: Arc<dyn MarketDataProvider> = match config.provider {
        ProviderKind::Yahoo => {
            tracing::info!("📊 Using market data provider: Yahoo Finance");
            Arc::new(YahooFinanceProvider::new(
                config.yahoo_chart_url.clone(),
                config.yahoo_summary_url.clone(),
            ))
        }
        ProviderKind::Synthetic => {
            tracing::info!("📊 Using market data provider: synthetic random walk");
            Arc::new(SyntheticProvider::new(DashboardConfig::min_picker_date()))
        }
    };

    let addr = config.socket_addr();
    let debug_enabled = config.debug;
    let app = app::create_app(AppState::new(provider, config));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Stock Dash running at http://{}/ (debug={})", addr, debug_enabled);
    axum::serve(listener, app).await?;

    Ok(())
}
