use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::external::market_data::MarketDataProvider;
use crate::services::forecasting_service::SvrGrid;

/// Application context handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub market_data: Arc<dyn MarketDataProvider>,
    pub config: Arc<DashboardConfig>,
    pub svr_grid: Arc<SvrGrid>,
}

impl AppState {
    pub fn new(market_data: Arc<dyn MarketDataProvider>, config: DashboardConfig) -> Self {
        Self {
            market_data,
            config: Arc::new(config),
            svr_grid: Arc::new(SvrGrid::default()),
        }
    }

    pub fn with_svr_grid(mut self, grid: SvrGrid) -> Self {
        self.svr_grid = Arc::new(grid);
        self
    }
}
