use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Figure;

/// Result of a dashboard callback: either new content for its output region
/// or an instruction to leave the region untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum CallbackOutput<T> {
    Update(T),
    NoUpdate,
}

/// Content of a chart panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    Empty,
    Graph { figure: Figure },
}

/// Company header: description, logo, display name. `reset_actions` tells the
/// page to clear the click counts of the price/indicator/forecast buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyPanel {
    pub description: String,
    pub logo: String,
    pub ticker_name: Option<String>,
    pub reset_actions: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitInput {
    pub n_clicks: Option<u32>,
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartInput {
    pub n_clicks: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastInput {
    pub n_clicks: Option<u32>,
    pub input_days: Option<String>,
    pub ticker: Option<String>,
}
