use axum::Router;
use axum::middleware::from_fn_with_state;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::{AppState, controllers::home_controller};

pub mod ai_routes;
pub mod alerts_routes;
pub mod auth_routes;
pub mod home_routes;
pub mod news_routes;
pub mod price_routes;
pub mod realtime_routes;

/// Everything under `/api`, without the site gate.
pub fn api_router() -> Router<AppState> {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = auth_routes::add_routes(router);
    let router = news_routes::add_routes(router);
    let router = price_routes::add_routes(router);
    let router = alerts_routes::add_routes(router);
    let router = ai_routes::add_routes(router);
    let router = realtime_routes::add_routes(router);

    router.fallback(home_controller::api_not_found)
}

pub fn app(state: AppState) -> Router {
    let static_dir = state.settings.static_dir.clone();
    let index = format!("{}/index.html", static_dir);

    Router::new()
        .nest("/api", api_router())
        // SPA: unknown paths get index.html
        .fallback_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(index)))
        .layer(from_fn_with_state(state.clone(), crate::auth::require_site_auth))
        // runs before the gate, so login attempts count too
        .layer(from_fn_with_state(state.clone(), crate::rate_limit::limit_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
