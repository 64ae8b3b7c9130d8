use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{callbacks, charts, companies, dashboard, forecast, health, prices};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let debug = state.config.debug;

    let app = Router::<AppState>::new()
        .merge(dashboard::router())
        .nest("/health", health::router())
        .nest("/_callbacks", callbacks::router())
        .nest("/api/prices", prices::router())
        .nest("/api/companies", companies::router())
        .nest("/api/charts", charts::router())
        .nest("/api/forecast", forecast::router())
        .layer(CorsLayer::permissive())
        .with_state(state);

    if debug {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}
