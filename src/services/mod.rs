pub mod charts;
pub mod dashboard_service;
pub mod forecasting_service;
pub mod indicators;
pub mod price_service;
