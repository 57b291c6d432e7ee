use axum::{Router, routing::get};
use crate::{AppState, controllers::news_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/news", get(news_controller::get_news).post(news_controller::post_news))
        .route("/news/:id", get(news_controller::get_news_item))
}
