use axum::{Router, routing::get};
use crate::{AppState, controllers::price_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/price/btc", get(price_controller::get_btc))
        .route("/price/btc/history", get(price_controller::get_btc_history))
}
