use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub ticker: String,
    pub horizon_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

/// Hyper-parameters of the RBF-kernel SVR selected by the grid search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvrParams {
    pub c: f64,
    pub epsilon: f64,
    pub gamma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub ticker: String,
    pub points: Vec<ForecastPoint>,
    pub params: SvrParams,
    pub holdout_mae: f64,
    pub training_size: usize,
    pub generated_at: DateTime<Utc>,
}
