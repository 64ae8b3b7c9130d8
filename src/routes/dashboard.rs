use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use tracing::info;

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/assets/stock.svg", get(default_logo))
}

async fn index() -> Html<String> {
    info!("GET / - Rendering dashboard");
    Html(ui::render_dashboard(
        DashboardConfig::min_picker_date(),
        Utc::now().date_naive(),
    ))
}

async fn default_logo() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], ui::DEFAULT_LOGO_SVG)
}
