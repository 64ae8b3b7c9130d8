//! Server-rendered dashboard page and its static assets.

use chrono::NaiveDate;

const DASHBOARD_TEMPLATE: &str = include_str!("dashboard.html");
pub const DEFAULT_LOGO_SVG: &str = include_str!("stock.svg");

/// Dashboard page with the date pickers bounded to `[min_date, today]` and the
/// end date preset to today.
pub fn render_dashboard(min_date: NaiveDate, today: NaiveDate) -> String {
    DASHBOARD_TEMPLATE
        .replace("{{MIN_DATE}}", &min_date.format("%Y-%m-%d").to_string())
        .replace("{{TODAY}}", &today.format("%Y-%m-%d").to_string())
}
